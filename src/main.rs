use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use voicelink::{GatewayConfig, HttpGateway, SessionState, VoiceGateway, VoiceLink};

/// Minimal terminal frontend for the sync core: connects to the service,
/// starts the refresh loop, and prints state changes and notices until
/// interrupted. Set `VOICELINK_BASE_URL` to point at a remote machine.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = GatewayConfig::from_env();
    info!("connecting to voice service at {}", config.base_url);
    let gateway = Arc::new(HttpGateway::new(config).context("invalid gateway configuration")?);
    if let Err(err) = gateway.ping().await {
        warn!("service probe failed, continuing anyway: {err}");
    }

    let (client, mut notices) = VoiceLink::new(gateway);
    if let Err(err) = client.load_settings().await {
        warn!("continuing without settings: {err}");
    }
    client.start_sync().await;

    let mut session_rx = client.session().subscribe();
    let mut telemetry_rx = client.sync().telemetry();
    let mut log_rx = client.sync().recent_commands();
    let mut execution_rx = client.dispatcher().subscribe();

    println!("voicelink connected; press Ctrl-C to quit");
    loop {
        tokio::select! {
            Some(notice) = notices.recv() => {
                println!("! {}", notice.message);
            }
            Ok(()) = session_rx.changed() => {
                let line = match *session_rx.borrow() {
                    SessionState::Listening => "Listening...",
                    SessionState::Idle => "Ready",
                    SessionState::Transitioning(_) => "Working...",
                };
                println!("status: {line}");
            }
            Ok(()) = execution_rx.changed() => {
                if let Some(execution) = execution_rx.borrow().clone() {
                    println!("status: Executing: {}", execution.command);
                }
            }
            Ok(()) = telemetry_rx.changed() => {
                let telemetry = *telemetry_rx.borrow();
                let battery = telemetry
                    .battery_percent
                    .map(|level| format!("{level:.0}%"))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "cpu {:.0}%  mem {:.0}%  battery {battery}",
                    telemetry.cpu_percent, telemetry.memory_percent
                );
            }
            Ok(()) = log_rx.changed() => {
                if let Some(entry) = log_rx.borrow().first() {
                    println!("last command: {}", entry.command);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.stop_sync().await;
    Ok(())
}
