pub mod controller;
pub mod state;

pub use controller::ListeningSessionController;
pub use state::{SessionState, TransitionDirection};
