mod config;
mod core;
mod error;
mod installer;
mod models;
mod network_tools;
mod progress;
mod speed_probe;
mod ui;
mod wifi_probe;

use crate::config::AppConfig;
use crate::core::{init_logger, LogLevel};
use crate::error::{InstallError, SpeedProbeError};
use crate::installer::{InstallOutcome, Installer, Platform, SystemOps};
use crate::models::SpeedReport;
use crate::network_tools::SpeedtestClient;
use crate::progress::{ConsoleProgress, Ticker};
use crate::ui::{LineKind, RenderContext, Renderer};
use std::process::ExitCode;

const MODULE: &str = "main";

fn main() -> ExitCode {
    let config = AppConfig::default();
    setup_logging(&config);
    if let Err(e) = config.validate() {
        crate::log_error!(MODULE, "Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }
    crate::core::logging::log_info_with_metadata(
        MODULE,
        "Starting wsniet",
        serde_json::to_value(&config).unwrap_or_default(),
    );

    let mut renderer = Renderer::stdout(RenderContext::detect());

    match install(&config, &mut renderer) {
        Ok(InstallOutcome::Installed { command }) => {
            renderer.status(
                LineKind::Success,
                &format!("Tool installed successfully! Use '{}' to run.", command),
            );
            return ExitCode::SUCCESS;
        }
        Ok(_) => {}
        Err(e) => {
            crate::log_error!(MODULE, "{}", e);
            renderer.status(LineKind::Error, &format!("Error during setup: {}", e));
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = run_pipeline(&config, &mut renderer) {
        // The terminal went away; there is nobody left to report to
        crate::log_warning!(MODULE, "Failed to write report: {}", e);
    }
    ExitCode::SUCCESS
}

fn setup_logging(config: &AppConfig) {
    let logging = &config.logging;
    if !logging.enabled {
        return;
    }
    let level = LogLevel::from_name(&logging.level).unwrap_or(LogLevel::Warning);
    init_logger(logging.file_path.as_deref(), logging.console_output, level);
}

fn install(
    config: &AppConfig,
    renderer: &mut Renderer<std::io::Stdout>,
) -> Result<InstallOutcome, InstallError> {
    let current_exe = std::env::current_exe().map_err(InstallError::CurrentExe)?;
    let installer = Installer::new(
        SystemOps,
        Platform::current(),
        config.install_target(),
        current_exe,
    );

    if installer.needs_install() {
        renderer.status(LineKind::Notice, "Setting up the tool for system-wide usage...");
    }
    installer.ensure_installed()
}

fn run_pipeline(config: &AppConfig, renderer: &mut Renderer<std::io::Stdout>) -> std::io::Result<()> {
    renderer.welcome()?;

    let provider = wifi_probe::platform_provider();
    let wifi = wifi_probe::probe(provider.as_ref());

    let speed = run_speed_test(config);

    renderer.report(&wifi, &speed)
}

fn run_speed_test(config: &AppConfig) -> SpeedReport {
    let ticker = Ticker::new(config.speed.progress_steps, config.speed.progress_interval());
    let mut progress = ConsoleProgress::new();

    let mut client = SpeedtestClient::new(&config.speed).map_err(SpeedProbeError::from)?;
    speed_probe::run(&mut client, &mut progress, &ticker)
}
