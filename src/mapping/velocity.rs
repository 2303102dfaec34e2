//! Pointer displacement to velocity command mapping
//!
//! ```text
//! anchor ─► Displacement (px) ─► Deflection (normalized) ─► × SpeedLimits ─► Twist ─► CommandMessage
//! ```
//!
//! The deflection is computed when the pointer moves; the speed limits are applied
//! when the command is built, so a limit edited mid-gesture affects the next publish.

use crate::mapping::messages::{CommandMessage, MessageSchema, Twist};
use crate::mapping::MappingError;

/// Pixel distance that corresponds to one unit of deflection (the widget radius)
pub const FULL_DEFLECTION_PX: f64 = 100.0;

/// Horizontal deflection gain, roughly π/2
pub const ANGULAR_GAIN: f64 = 1.5707;

/// Pointer position in UI pixel units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragPoint {
    pub x: f64,
    pub y: f64,
}

impl DragPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Offset of the pointer from the drag anchor, `anchor - current`
///
/// Screen y grows downwards, so dragging up yields a positive `dy` (forward) and
/// dragging left a positive `dx` (counter-clockwise yaw).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
}

impl Displacement {
    pub fn between(anchor: DragPoint, current: DragPoint) -> Self {
        Self {
            dx: anchor.x - current.x,
            dy: anchor.y - current.y,
        }
    }
}

/// Normalized stick deflection before speed scaling
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Deflection {
    pub linear: f64,
    pub angular: f64,
}

impl Deflection {
    pub const ZERO: Deflection = Deflection {
        linear: 0.0,
        angular: 0.0,
    };
}

impl From<Displacement> for Deflection {
    fn from(d: Displacement) -> Self {
        Deflection {
            linear: d.dy / FULL_DEFLECTION_PX,
            angular: d.dx / FULL_DEFLECTION_PX * ANGULAR_GAIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimits {
    pub max_linear: f64,
    pub max_angular: f64,
}

/// Scales a deflection by the configured limits.
///
/// The result is not clamped: a drag past the widget radius exceeds the limits.
pub fn scale(deflection: Deflection, limits: SpeedLimits) -> Twist {
    Twist::planar(
        deflection.linear * limits.max_linear,
        deflection.angular * limits.max_angular,
    )
}

/// Builds the command for a topic announced with `schema_name`.
pub fn build_command(
    schema_name: &str,
    deflection: Deflection,
    limits: SpeedLimits,
    frame_id: &str,
) -> Result<CommandMessage, MappingError> {
    let schema: MessageSchema = schema_name.parse()?;
    Ok(CommandMessage::for_schema(
        schema,
        scale(deflection, limits),
        frame_id,
    ))
}
