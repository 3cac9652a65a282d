//! Hand-rolled gateway double shared by the controller tests: scripted
//! per-operation replies (falling back to benign defaults), call counters,
//! and gates for holding a call in flight.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use tokio::sync::Semaphore;
use tokio::time::Duration;

use crate::gateway::{
    CommandLogEntry, ExecuteOutcome, GatewayError, MicrophoneInfo, StatusReport, VoiceGateway,
};
use crate::settings::SettingsDocument;

pub(crate) fn success_outcome() -> ExecuteOutcome {
    ExecuteOutcome {
        status: "success".to_string(),
        message: None,
        cpu_percent: None,
        memory_percent: None,
        disk_percent: None,
        battery_level: None,
        plugged_in: None,
    }
}

pub(crate) fn telemetry_outcome(cpu_percent: f32, memory_percent: f32) -> ExecuteOutcome {
    ExecuteOutcome {
        cpu_percent: Some(cpu_percent),
        memory_percent: Some(memory_percent),
        ..success_outcome()
    }
}

/// Log entry at a fixed base instant plus `offset_secs`, so ordering in tests
/// is explicit.
pub(crate) fn log_entry(command: &str, offset_secs: i64) -> CommandLogEntry {
    let base = Utc.with_ymd_and_hms(2024, 5, 11, 9, 0, 0).unwrap();
    CommandLogEntry {
        command: command.to_string(),
        timestamp: base + ChronoDuration::seconds(offset_secs),
        outcome: None,
    }
}

pub(crate) struct MockGateway {
    status_script: Mutex<VecDeque<Result<StatusReport, GatewayError>>>,
    start_script: Mutex<VecDeque<Result<(), GatewayError>>>,
    stop_script: Mutex<VecDeque<Result<(), GatewayError>>>,
    execute_script: Mutex<VecDeque<Result<ExecuteOutcome, GatewayError>>>,
    recent_script: Mutex<VecDeque<Result<Vec<CommandLogEntry>, GatewayError>>>,
    settings_script: Mutex<VecDeque<Result<SettingsDocument, GatewayError>>>,
    update_script: Mutex<VecDeque<Result<(), GatewayError>>>,
    microphones_script: Mutex<VecDeque<Result<Vec<MicrophoneInfo>, GatewayError>>>,

    status_calls: AtomicUsize,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    execute_calls: AtomicUsize,
    recent_calls: AtomicUsize,
    update_calls: AtomicUsize,

    hold_start_flag: AtomicBool,
    start_gate: Semaphore,
    hold_execute_flag: AtomicBool,
    execute_gate: Semaphore,

    status_delay: Mutex<Option<Duration>>,
    status_in_flight: AtomicUsize,
    max_status_in_flight: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            status_script: Mutex::new(VecDeque::new()),
            start_script: Mutex::new(VecDeque::new()),
            stop_script: Mutex::new(VecDeque::new()),
            execute_script: Mutex::new(VecDeque::new()),
            recent_script: Mutex::new(VecDeque::new()),
            settings_script: Mutex::new(VecDeque::new()),
            update_script: Mutex::new(VecDeque::new()),
            microphones_script: Mutex::new(VecDeque::new()),
            status_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
            recent_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            hold_start_flag: AtomicBool::new(false),
            start_gate: Semaphore::new(0),
            hold_execute_flag: AtomicBool::new(false),
            execute_gate: Semaphore::new(0),
            status_delay: Mutex::new(None),
            status_in_flight: AtomicUsize::new(0),
            max_status_in_flight: AtomicUsize::new(0),
        }
    }
}

impl MockGateway {
    pub fn script_status(&self, reply: Result<StatusReport, GatewayError>) {
        self.status_script.lock().unwrap().push_back(reply);
    }

    pub fn script_start(&self, reply: Result<(), GatewayError>) {
        self.start_script.lock().unwrap().push_back(reply);
    }

    pub fn script_stop(&self, reply: Result<(), GatewayError>) {
        self.stop_script.lock().unwrap().push_back(reply);
    }

    pub fn script_execute(&self, reply: Result<ExecuteOutcome, GatewayError>) {
        self.execute_script.lock().unwrap().push_back(reply);
    }

    pub fn script_recent(&self, reply: Result<Vec<CommandLogEntry>, GatewayError>) {
        self.recent_script.lock().unwrap().push_back(reply);
    }

    pub fn script_settings(&self, reply: Result<SettingsDocument, GatewayError>) {
        self.settings_script.lock().unwrap().push_back(reply);
    }

    pub fn script_update_settings(&self, reply: Result<(), GatewayError>) {
        self.update_script.lock().unwrap().push_back(reply);
    }

    pub fn script_microphones(&self, reply: Result<Vec<MicrophoneInfo>, GatewayError>) {
        self.microphones_script.lock().unwrap().push_back(reply);
    }

    /// Makes the next `start` calls block until [`release_start`] is called.
    pub fn hold_start(&self) {
        self.hold_start_flag.store(true, Ordering::SeqCst);
    }

    pub fn release_start(&self) {
        self.start_gate.add_permits(1);
    }

    pub fn hold_execute(&self) {
        self.hold_execute_flag.store(true, Ordering::SeqCst);
    }

    pub fn release_execute(&self) {
        self.execute_gate.add_permits(1);
    }

    /// Lets further `execute` calls through while an earlier held call is
    /// still waiting on its gate.
    pub fn unhold_execute(&self) {
        self.hold_execute_flag.store(false, Ordering::SeqCst);
    }

    /// Every `status` call sleeps this long, for pacing tests under paused
    /// time.
    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = Some(delay);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn recent_calls(&self) -> usize {
        self.recent_calls.load(Ordering::SeqCst)
    }

    pub fn update_settings_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_status_in_flight.load(Ordering::SeqCst)
    }

    fn pop<T>(&self, script: &Mutex<VecDeque<T>>) -> Option<T> {
        script.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl VoiceGateway for MockGateway {
    async fn status(&self) -> Result<StatusReport, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.status_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_status_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.status_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pop(&self.status_script)
            .unwrap_or(Ok(StatusReport { is_listening: false }))
    }

    async fn start(&self) -> Result<(), GatewayError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_start_flag.load(Ordering::SeqCst) {
            self.start_gate.acquire().await.expect("gate open").forget();
        }
        self.pop(&self.start_script).unwrap_or(Ok(()))
    }

    async fn stop(&self) -> Result<(), GatewayError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.pop(&self.stop_script).unwrap_or(Ok(()))
    }

    async fn execute(&self, _command: &str) -> Result<ExecuteOutcome, GatewayError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_execute_flag.load(Ordering::SeqCst) {
            self.execute_gate.acquire().await.expect("gate open").forget();
        }
        self.pop(&self.execute_script).unwrap_or_else(|| Ok(success_outcome()))
    }

    async fn recent_commands(&self) -> Result<Vec<CommandLogEntry>, GatewayError> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        self.pop(&self.recent_script).unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn settings(&self) -> Result<SettingsDocument, GatewayError> {
        self.pop(&self.settings_script)
            .unwrap_or_else(|| Ok(SettingsDocument::default()))
    }

    async fn update_settings(&self, _document: &SettingsDocument) -> Result<(), GatewayError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.pop(&self.update_script).unwrap_or(Ok(()))
    }

    async fn microphones(&self) -> Result<Vec<MicrophoneInfo>, GatewayError> {
        self.pop(&self.microphones_script).unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
