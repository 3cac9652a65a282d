pub mod controller;
mod loop_worker;
pub mod state;

pub use controller::StatusSyncController;
pub use state::DeviceTelemetry;
