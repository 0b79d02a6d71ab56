//! tern
//!
//! A minimal, non-reparenting X11 window manager. It claims substructure
//! redirect on the root window, records windows as they are created, maps
//! them on request and intercepts a few key and pointer chords.

mod config;
mod error;
mod wm;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use wm::session::X11Session;
use wm::WindowManager;

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tern=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tern");

    let config = match Config::builtin() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            println!("tern: built-in configuration is invalid: {}", e);
            std::process::exit(1);
        }
    };

    let session = match X11Session::open() {
        Ok(session) => session,
        Err(e) => {
            error!("{}", e);
            println!("Unable to open a X display.");
            std::process::exit(1);
        }
    };
    info!("Managing screen {}", session.screen_num());

    let mut wm = WindowManager::new(session, &config);
    let result = run(&mut wm, &config);

    // Closing is the last thing done, however `run` ended
    if let Err(e) = wm.into_display().close() {
        warn!("Failed to close X connection: {}", e);
    }

    if let Err(e) = result {
        error!("{:#}", e);
        println!("tern: {:#}", e);
        std::process::exit(1);
    }
}

/// Claim the display and serve events until the connection fails.
fn run(wm: &mut WindowManager<X11Session>, config: &Config) -> Result<()> {
    wm.setup(config).context("Failed to initialize window manager")?;
    info!(
        "Ready: {} key binding(s), registry capacity {}",
        wm.grabs().key_count(),
        wm.registry().capacity()
    );

    match wm.run() {
        Ok(never) => match never {},
        Err(e) => Err(e).context("Event loop stopped"),
    }
}
