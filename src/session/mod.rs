pub mod controller;
pub mod settings;

pub use controller::{TherapySession, TherapyState};
pub use settings::SessionSettings;
