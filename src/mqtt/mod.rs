//! # MQTT Bridge
//!
//! Carries panel output to an MQTT broker. The panel never touches the client
//! directly: it sends [`message_manager::HostCommand`]s over a bounded channel and
//! the [`mqtt_handler::MqttHandler`] task turns them into publishes.
//!
//! ```text
//! mqtt/
//! ├── config.rs           - broker address and credentials
//! ├── message_manager.rs  - host commands and their wire form
//! └── mqtt_handler.rs     - connection loop and status reporting
//! ```
//!
//! ## Wire mapping
//!
//! | Host call            | MQTT publish                                  |
//! |----------------------|-----------------------------------------------|
//! | `advertise(t, s)`    | `t/schema`, retained, payload `s`             |
//! | `unadvertise(t)`     | `t/schema`, retained, empty payload           |
//! | `publish(t, msg)`    | `t`, QoS 0, JSON payload                      |
//!
//! Connection state and counters are pushed to the UI through a `watch` channel as
//! [`mqtt_handler::MQTTStatus`].

pub mod config;
pub mod message_manager;
pub mod mqtt_handler;

pub use config::MqttConfig;
pub use message_manager::HostCommand;
pub use mqtt_handler::{ConnectionState, MQTTStatus, MqttHandler};
