//! Joystick input handling
//!
//! `widget` draws the stick and reports raw pointer events, `gesture` tracks the drag
//! state, and `joystick_adapter` connects both to the velocity mapping and publishing.

pub mod gesture;
pub mod joystick_adapter;
pub mod widget;

pub use gesture::PointerEvent;
pub use joystick_adapter::{publish_command, JoystickAdapter, PublishTarget, SchemeSync};
pub use widget::JoystickWidget;
