pub mod controller;
pub mod state;

pub use controller::CommandDispatcher;
pub use state::{CommandExecution, ExecutionStatus};
