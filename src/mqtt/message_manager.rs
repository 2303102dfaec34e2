use chrono::{DateTime, Local};
use rumqttc::QoS;
use std::fmt;

/// Suffix of the retained topic carrying an advertised schema name
pub const SCHEMA_SUFFIX: &str = "/schema";

/// Requests the panel side hands to the MQTT bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Advertise { topic: String, schema: String },
    Unadvertise { topic: String },
    Publish { topic: String, payload: Vec<u8> },
}

/// One MQTT publish as it goes on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
    pub payload: Vec<u8>,
    pub timestamp: DateTime<Local>,
}

impl OutboundMessage {
    pub fn schema_topic(topic: &str) -> String {
        format!("{}{}", topic.trim_end_matches('/'), SCHEMA_SUFFIX)
    }
}

impl From<HostCommand> for OutboundMessage {
    fn from(command: HostCommand) -> Self {
        let (topic, retain, payload) = match command {
            // Retained so late subscribers learn the schema
            HostCommand::Advertise { topic, schema } => {
                (Self::schema_topic(&topic), true, schema.into_bytes())
            }
            // An empty retained payload clears the retained schema
            HostCommand::Unadvertise { topic } => (Self::schema_topic(&topic), true, Vec::new()),
            HostCommand::Publish { topic, payload } => (topic, false, payload),
        };
        OutboundMessage {
            topic,
            qos: QoS::AtMostOnce,
            retain,
            payload,
            timestamp: Local::now(),
        }
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let content = String::from_utf8_lossy(&self.payload);
        let preview: String = content.chars().take(40).collect();
        write!(
            f,
            "{} - {}: {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.topic,
            preview
        )
    }
}
