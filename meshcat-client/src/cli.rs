//! Command-line argument parsing for the meshcat binary
//!
//! Uses clap for argument parsing with derive macros.

use clap::Parser;

use crate::server::ServerCommand;
use crate::window::WindowOptions;

/// meshcat - start or attach to a meshcat server and keep it alive
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ZeroMQ endpoint of the server (e.g. tcp://127.0.0.1:6000)
    ///
    /// Without it a new server is started. With it and no server arguments,
    /// the client attaches to the running server at that endpoint.
    pub endpoint: Option<String>,

    /// Arguments forwarded to a spawned server
    ///
    /// Given together with an endpoint, a new server is started and told to
    /// bind that endpoint.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub server_args: Vec<String>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether this invocation starts its own server
    pub fn starts_server(&self) -> bool {
        self.endpoint.is_none() || !self.server_args.is_empty()
    }

    /// Window options for this invocation on top of the configured server
    pub fn window_options(&self, server: ServerCommand) -> WindowOptions {
        WindowOptions {
            zmq_url: self.endpoint.clone(),
            start_server: self.starts_server(),
            server: server.with_extra_args(self.server_args.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_endpoint_spawns() {
        let args = Args::parse_from(["meshcat"]);
        assert!(args.endpoint.is_none());

        let options = args.window_options(ServerCommand::default());
        assert!(options.start_server);
        assert!(options.zmq_url.is_none());
    }

    #[test]
    fn test_endpoint_attaches() {
        let args = Args::parse_from(["meshcat", "tcp://127.0.0.1:6000"]);
        let options = args.window_options(ServerCommand::default());

        assert!(!options.start_server);
        assert_eq!(options.zmq_url.as_deref(), Some("tcp://127.0.0.1:6000"));
    }

    #[test]
    fn test_endpoint_with_server_args_spawns() {
        let args = Args::parse_from([
            "meshcat",
            "tcp://127.0.0.1:6000",
            "--ngrok_http_tunnel",
            "extra",
        ]);
        assert_eq!(args.server_args, vec!["--ngrok_http_tunnel", "extra"]);

        let options = args.window_options(ServerCommand::default());
        assert!(options.start_server);

        let argv = options
            .server
            .with_zmq_url(options.zmq_url)
            .argv();
        assert_eq!(
            &argv[3..],
            ["--ngrok_http_tunnel", "extra", "--zmq-url", "tcp://127.0.0.1:6000"]
        );
    }

    #[test]
    fn test_hyphen_args_after_endpoint_are_forwarded() {
        let args = Args::parse_from(["meshcat", "tcp://127.0.0.1:6000", "--open"]);
        assert_eq!(args.server_args, vec!["--open"]);
        assert!(args.starts_server());

        let options = args.window_options(ServerCommand::default());
        assert_eq!(options.server.extra_args, vec!["--open"]);
    }
}
