//! Session mode controller: the state machine tying classification, hold
//! timing, collection and surprises together.

mod controller;
mod rotation;
mod types;


pub use controller::SessionController;
pub use rotation::{SceneRotation, ROTATION_GAIN, ROTATION_SMOOTHING};
pub use types::{Presentation, SessionInput, SessionMode, SessionSnapshot, Trigger};
