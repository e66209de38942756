//! Path-scoped handle onto a window
//!
//! A [`Visualizer`] pairs a shared [`Window`] with a [`Path`]. Commands issued
//! through it target that path; [`Visualizer::child`] makes a view one level
//! deeper on the same window.

use std::fmt;
use std::sync::Arc;

use meshcat_protocol::{
    Animation, Command, Geometry, Material, Path, SceneObject, Transform, DEFAULT_ROOT,
};
use meshcat_utils::Result;

use crate::context::TransportContext;
use crate::embed::StaticSnapshot;
use crate::window::{Window, WindowOptions};

#[derive(Debug, Clone)]
pub struct Visualizer {
    window: Arc<Window>,
    path: Path,
}

impl Visualizer {
    /// Open a new window and view its root
    pub async fn new(context: &TransportContext, options: WindowOptions) -> Result<Self> {
        let window = Window::open_with(context, options).await?;
        Ok(Self::with_window(Arc::new(window)))
    }

    /// View the root of an existing window
    pub fn with_window(window: Arc<Window>) -> Self {
        Self::view_into(window, Path::root(DEFAULT_ROOT))
    }

    pub fn view_into(window: Arc<Window>, path: Path) -> Self {
        Self { window, path }
    }

    /// View of `segment` below this one, sharing the window
    pub fn child(&self, segment: impl Into<String>) -> Self {
        Self::view_into(Arc::clone(&self.window), self.path.append(segment))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn url(&self) -> &str {
        self.window.url()
    }

    pub fn open(&self) -> &Self {
        self.window.open();
        self
    }

    pub async fn wait(&self) -> Result<String> {
        self.window.wait().await
    }

    /// Place `geometry` at this path; Phong shading when `material` is `None`
    pub async fn set_object(&self, geometry: Geometry, material: Option<Material>) -> Result<()> {
        let command = Command::set_object(geometry, material, self.path.clone());
        self.window.send(&command).await
    }

    pub async fn set_scene_object(&self, object: SceneObject) -> Result<()> {
        let command = Command::set_scene_object(object, self.path.clone());
        self.window.send(&command).await
    }

    pub async fn set_transform(&self, matrix: Transform) -> Result<()> {
        let command = Command::set_transform(matrix, self.path.clone());
        self.window.send(&command).await
    }

    pub async fn set_animation(
        &self,
        animation: Animation,
        play: bool,
        repetitions: u32,
    ) -> Result<()> {
        let command = Command::set_animation(animation, play, repetitions, self.path.clone());
        self.window.send(&command).await
    }

    /// Remove this node and everything below it
    pub async fn delete(&self) -> Result<()> {
        let command = Command::delete(self.path.clone());
        self.window.send(&command).await
    }

    /// Standalone HTML document of the whole scene
    pub async fn static_html(&self) -> Result<String> {
        self.window.get_scene().await
    }

    pub async fn render_static(&self) -> Result<StaticSnapshot> {
        Ok(StaticSnapshot::new(self.static_html().await?))
    }

    /// Close the shared window; every view onto it stops working
    pub async fn close(&self) {
        self.window.close().await
    }
}

impl fmt::Display for Visualizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Visualizer using: {} at path: {}>", self.window, self.path)
    }
}
