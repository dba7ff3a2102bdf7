//! FretCoach - AI-powered guitar practice coach
//!
//! Main entry point: logging, gateway configuration from the environment,
//! orchestrator startup, then the window.

use anyhow::Context;
use eframe::egui;
use fretcoach::config::GatewayConfig;
use fretcoach::processor::{Orchestrator, OrchestratorConfig};
use fretcoach::ui::CoachApp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fretcoach=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FretCoach");

    // The gateway credential is required at process start
    let gateway = GatewayConfig::from_env().context("gateway configuration")?;

    let (orchestrator, handle) = Orchestrator::new(gateway, OrchestratorConfig::default())
        .context("orchestrator setup")?;
    let _workers = orchestrator.start().context("orchestrator startup")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([920.0, 680.0])
            .with_min_inner_size([520.0, 420.0])
            .with_title("FretCoach"),
        ..Default::default()
    };

    eframe::run_native(
        "FretCoach",
        options,
        Box::new(|cc| Ok(Box::new(CoachApp::new(cc, handle)))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))
}
