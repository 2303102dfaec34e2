//! Conversion of joystick input into velocity commands.
//!
//! Holds the pieces between a pointer displacement and a publishable message:
//! the velocity mapping itself, the message shapes for the two supported schemas,
//! and the throttle that limits how often commands leave the panel.

pub mod error;
pub mod messages;
pub mod throttle;
pub mod velocity;

// Re-exports für einfacheren Zugriff
pub use error::MappingError;
pub use messages::{CommandMessage, MessageSchema, Twist, Vector3};
pub use throttle::Throttle;
pub use velocity::{Deflection, Displacement, DragPoint, SpeedLimits};
