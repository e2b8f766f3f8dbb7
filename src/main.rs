use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use birdseye::dynmap::{DynmapClient, ServerConfig};
use birdseye::error::Result;
use birdseye::poll::{self, ViewChannels};
use birdseye::view::frame::{load_system_font, FrameRenderer};
use birdseye::window;

#[derive(Parser)]
#[command(name = "birdseye")]
#[command(about = "A tool for watching players on multiplayer Minecraft servers")]
struct Cli {
    /// URL to a dynmap server
    dynmap_url: String,

    /// Show a testing player
    #[arg(short = 't', long)]
    test: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("birdseye=info")),
        )
        .with_target(false)
        .compact()
        .init();

    // The configuration fetch doubles as the reachability check; nothing
    // can be shown without it.
    let (client, config) = match connect(&cli.dynmap_url) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("Failed to contact server");
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        title = %config.title,
        world = %config.defaultworld,
        worlds = config.worlds.len(),
        update_rate_ms = config.updaterate,
        "connected"
    );

    let title = format!("{} {}", cli.dynmap_url, config.title);
    let renderer = FrameRenderer::new(load_system_font(), cli.test);

    let (channels, poll_thread) = poll::spawn(client, config, cli.test, window::INITIAL_SIZE);
    let ViewChannels {
        snapshot,
        window_size,
        cancel,
    } = channels;

    let outcome = window::run(&title, renderer, snapshot, window_size);

    // Stop the poll thread before leaving so no request outlives the UI.
    cancel.send_replace(true);
    if poll_thread.join().is_err() {
        error!("poll thread panicked");
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn connect(url: &str) -> Result<(DynmapClient, ServerConfig)> {
    let client = DynmapClient::new(url)?;
    let config = client.configuration()?;
    Ok((client, config))
}
