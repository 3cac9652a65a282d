use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::gateway::{CommandLogEntry, GatewayError, VoiceGateway};
use crate::notice::NoticeFeed;
use crate::session::ListeningSessionController;

use super::state::DeviceTelemetry;

pub(super) const REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// Telemetry is re-derived through the generic execute path, the same way the
/// service's own frontend does it. A dedicated query endpoint would be
/// cleaner; until the service grows one, these are the probe phrases.
const SYSTEM_INFO_COMMAND: &str = "show system information";
const BATTERY_COMMAND: &str = "check battery level";

/// Everything the refresh loop reads and writes, cloned into the loop task.
pub(super) struct SyncShared {
    pub gateway: Arc<dyn VoiceGateway>,
    pub session: ListeningSessionController,
    pub telemetry_tx: Arc<watch::Sender<DeviceTelemetry>>,
    pub commands_tx: Arc<watch::Sender<Vec<CommandLogEntry>>>,
    pub notices: NoticeFeed,
}

/// One cycle's worth of fetched state, applied atomically after the whole
/// cycle completes so a cancelled cycle never leaves a half-applied refresh.
struct Refresh {
    service_listening: bool,
    log: Vec<CommandLogEntry>,
    telemetry: Option<DeviceTelemetry>,
}

/// Periodic refresh: status, then recent commands, then best-effort
/// telemetry. The cycle runs inline in this task, so at most one cycle is
/// ever outstanding; ticks that fire while a cycle is still running are
/// skipped, not queued.
pub(super) async fn status_sync_loop(shared: SyncShared, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut connectivity_down = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = tokio::select! {
                    outcome = run_refresh_cycle(&shared.gateway) => outcome,
                    _ = cancel_token.cancelled() => {
                        // In-flight results are dropped unapplied.
                        debug!("refresh cycle cancelled mid-flight");
                        break;
                    }
                };

                match outcome {
                    Ok(refresh) => {
                        if connectivity_down {
                            connectivity_down = false;
                            info!("voice service connection restored");
                        }
                        apply_refresh(&shared, refresh).await;
                    }
                    Err(err) => {
                        // One notice per transition into the failing state;
                        // every further failing tick only logs.
                        if connectivity_down {
                            debug!("refresh still failing: {err}");
                        } else {
                            connectivity_down = true;
                            warn!("refresh failed: {err}");
                            shared
                                .notices
                                .error(format!("Could not reach the voice service: {err}"));
                        }
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("status sync loop shutting down");
                break;
            }
        }
    }
}

async fn run_refresh_cycle(gateway: &Arc<dyn VoiceGateway>) -> Result<Refresh, GatewayError> {
    let status = gateway.status().await?;

    let mut log = gateway.recent_commands().await?;
    // The service appends oldest-first; observers want most-recent-first.
    log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    // Telemetry only after a healthy status fetch, so a dead connection
    // cannot produce a confused half-display.
    let telemetry = probe_telemetry(gateway).await;

    Ok(Refresh {
        service_listening: status.is_listening,
        log,
        telemetry,
    })
}

/// Best-effort probes; any failure here is logged and swallowed, never
/// surfaced to the user.
async fn probe_telemetry(gateway: &Arc<dyn VoiceGateway>) -> Option<DeviceTelemetry> {
    let info = match gateway.execute(SYSTEM_INFO_COMMAND).await {
        Ok(outcome) => outcome,
        Err(err) => {
            debug!("system info probe failed: {err}");
            return None;
        }
    };

    // A success reply without the numeric fields is as useless as a failure;
    // discard it whole rather than display zeros.
    let (Some(cpu_percent), Some(memory_percent)) = (info.cpu_percent, info.memory_percent) else {
        debug!("system info probe reply carried no readings");
        return None;
    };

    let battery_percent = match gateway.execute(BATTERY_COMMAND).await {
        Ok(outcome) => outcome.battery_level,
        Err(err) => {
            // Desktops without a battery answer with an error; that is the
            // normal case, not a connectivity problem.
            debug!("battery probe failed: {err}");
            None
        }
    };

    Some(DeviceTelemetry {
        cpu_percent,
        memory_percent,
        battery_percent,
    })
}

async fn apply_refresh(shared: &SyncShared, refresh: Refresh) {
    shared.session.reconcile(refresh.service_listening).await;
    shared.commands_tx.send_replace(refresh.log);
    if let Some(telemetry) = refresh.telemetry {
        shared.telemetry_tx.send_replace(telemetry);
    }
}
