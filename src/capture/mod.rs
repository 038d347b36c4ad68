pub mod commands;
pub mod controller;
pub mod state;

pub use controller::CaptureController;
pub use state::{CapturePhase, CaptureState};
