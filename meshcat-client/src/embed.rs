//! Static scene snapshots for embedding in HTML pages

use std::fmt;

/// Escape a document for use as an `srcdoc` attribute value
pub fn srcdoc_escape(html: &str) -> String {
    html.replace('&', "&amp;").replace('"', "&quot;")
}

/// A self-contained snapshot of the scene wrapped in a resizable iframe.
///
/// Later scene commands do not affect it, and it does not need a connection
/// to the server to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSnapshot {
    scene_html: String,
}

impl StaticSnapshot {
    pub fn new(scene_html: impl Into<String>) -> Self {
        Self {
            scene_html: scene_html.into(),
        }
    }

    /// The scene document as returned by the server
    pub fn scene_html(&self) -> &str {
        &self.scene_html
    }

    pub fn to_html(&self) -> String {
        format!(
            concat!(
                "<div style=\"height: 400px; width: 100%; overflow-x: auto; overflow-y: hidden; resize: both\">\n",
                "<iframe srcdoc=\"{}\" style=\"width: 100%; height: 100%; border: none\"></iframe>\n",
                "</div>\n",
            ),
            srcdoc_escape(&self.scene_html)
        )
    }
}

impl fmt::Display for StaticSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_order() {
        assert_eq!(srcdoc_escape(r#"a & "b""#), "a &amp; &quot;b&quot;");
        // Already-escaped text is escaped again, not passed through
        assert_eq!(srcdoc_escape("&quot;"), "&amp;quot;");
        assert_eq!(srcdoc_escape("<p>plain</p>"), "<p>plain</p>");
    }

    #[test]
    fn test_snapshot_wraps_escaped_scene() {
        let snapshot = StaticSnapshot::new(r#"<html lang="en">x & y</html>"#);
        let html = snapshot.to_string();

        assert!(html.contains(r#"srcdoc="<html lang=&quot;en&quot;>x &amp; y</html>""#));
        assert!(html.starts_with("<div"));
        assert_eq!(snapshot.scene_html(), r#"<html lang="en">x & y</html>"#);
    }
}
