//! meshcat - keep a meshcat server session open from the command line
//!
//! Starts (or attaches to) a server, prints the viewer URL and idles until
//! interrupted. A server started here is stopped on exit.

use meshcat_client::cli::Args;
use meshcat_client::{ClientConfig, ConfigLoader, TransportContext, Window};
use meshcat_utils::{init_logging_with_config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    let config = match ConfigLoader::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(e);
        }
    };

    init_logging_with_config(config.log_config()?)?;
    tracing::debug!("CLI args: {:?}", args);

    match run(args, config).await {
        Ok(()) => {
            tracing::info!("meshcat exiting normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("meshcat error: {}", e);
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

async fn run(args: Args, config: ClientConfig) -> Result<()> {
    let context = TransportContext::with_request_timeout(config.request_timeout());

    let options = args.window_options(config.server_command());
    let window = Window::open_with(&context, options).await?;

    println!("You can open the visualizer by visiting the following URL:");
    println!("{}", window.url());

    wait_for_shutdown().await?;

    window.close().await;
    context.terminate();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        _ = sigint.recv() => tracing::info!("Received SIGINT"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl-C");
    Ok(())
}
