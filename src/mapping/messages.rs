//! Velocity command messages in their `geometry_msgs` wire shapes.
//!
//! Only the two schemas the panel can drive are modelled here. The JSON produced by
//! [`CommandMessage::to_payload`] matches the field layout of the ROS 2 definitions
//! (`linear`/`angular`, `header.stamp.{sec,nsec}`, `header.frame_id`).

use crate::mapping::MappingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TWIST_SCHEMA: &str = "geometry_msgs/msg/Twist";
pub const TWIST_STAMPED_SCHEMA: &str = "geometry_msgs/msg/TwistStamped";

/// Message schemas the panel knows how to publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSchema {
    Twist,
    TwistStamped,
}

impl MessageSchema {
    /// Exact match against the schema name announced by the host.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TWIST_SCHEMA => Some(MessageSchema::Twist),
            TWIST_STAMPED_SCHEMA => Some(MessageSchema::TwistStamped),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MessageSchema::Twist => TWIST_SCHEMA,
            MessageSchema::TwistStamped => TWIST_STAMPED_SCHEMA,
        }
    }

    pub fn is_supported(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for MessageSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageSchema {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| MappingError::UnsupportedSchema(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// https://docs.ros.org/en/noetic/api/geometry_msgs/html/msg/Twist.html
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    pub const STOP: Twist = Twist {
        linear: Vector3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
        angular: Vector3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
    };

    /// Forward speed on `linear.x`, yaw rate on `angular.z`
    pub fn planar(linear_x: f64, angular_z: f64) -> Self {
        Twist {
            linear: Vector3 {
                x: linear_x,
                ..Vector3::default()
            },
            angular: Vector3 {
                z: angular_z,
                ..Vector3::default()
            },
        }
    }

    pub fn is_stop(&self) -> bool {
        *self == Twist::STOP
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Time {
    pub sec: i64,
    pub nsec: u32,
}

impl From<DateTime<Utc>> for Time {
    fn from(value: DateTime<Utc>) -> Self {
        Time {
            sec: value.timestamp(),
            nsec: value.timestamp_subsec_nanos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Time,
    pub frame_id: String,
}

impl Header {
    pub fn now(frame_id: impl Into<String>) -> Self {
        Header {
            stamp: Time::from(Utc::now()),
            frame_id: frame_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TwistStamped {
    pub header: Header,
    pub twist: Twist,
}

/// One publishable velocity command, shaped after the active topic's schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandMessage {
    Twist(Twist),
    TwistStamped(TwistStamped),
}

impl CommandMessage {
    pub fn for_schema(schema: MessageSchema, twist: Twist, frame_id: &str) -> Self {
        match schema {
            MessageSchema::Twist => CommandMessage::Twist(twist),
            MessageSchema::TwistStamped => CommandMessage::TwistStamped(TwistStamped {
                header: Header::now(frame_id),
                twist,
            }),
        }
    }

    pub fn schema(&self) -> MessageSchema {
        match self {
            CommandMessage::Twist(_) => MessageSchema::Twist,
            CommandMessage::TwistStamped(_) => MessageSchema::TwistStamped,
        }
    }

    pub fn twist(&self) -> &Twist {
        match self {
            CommandMessage::Twist(twist) => twist,
            CommandMessage::TwistStamped(stamped) => &stamped.twist,
        }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_names_match_exactly() {
        assert_eq!(
            MessageSchema::from_name("geometry_msgs/msg/Twist"),
            Some(MessageSchema::Twist)
        );
        assert_eq!(
            MessageSchema::from_name("geometry_msgs/msg/TwistStamped"),
            Some(MessageSchema::TwistStamped)
        );
        assert_eq!(MessageSchema::from_name("geometry_msgs/Twist"), None);
        assert!("std_msgs/msg/String".parse::<MessageSchema>().is_err());
    }

    #[test]
    fn test_twist_wire_shape() {
        let message = CommandMessage::for_schema(MessageSchema::Twist, Twist::planar(0.5, -0.25), "");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({
                "linear": { "x": 0.5, "y": 0.0, "z": 0.0 },
                "angular": { "x": 0.0, "y": 0.0, "z": -0.25 }
            })
        );
    }

    #[test]
    fn test_twist_stamped_wire_shape() {
        let message =
            CommandMessage::for_schema(MessageSchema::TwistStamped, Twist::planar(1.0, 0.0), "base_link");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["header"]["frame_id"], json!("base_link"));
        assert!(value["header"]["stamp"]["sec"].is_i64());
        assert!(value["header"]["stamp"]["nsec"].is_u64());
        assert_eq!(value["twist"]["linear"]["x"], json!(1.0));
        assert_eq!(message.schema(), MessageSchema::TwistStamped);
    }

    #[test]
    fn test_stop_twist() {
        assert!(Twist::planar(0.0, 0.0).is_stop());
        assert!(!Twist::planar(0.0, 0.1).is_stop());
    }
}
