//! The surface the panel needs from whatever application embeds it.

use crate::mapping::CommandMessage;
use crate::panel::settings::PanelConfig;

/// Errors reported by a host when it cannot carry out a request
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The receiving side of a host channel is gone or full
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Publish on a topic that was never advertised
    #[error("Topic not advertised: {0}")]
    NotAdvertised(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Publish registry and state storage provided by the embedding application.
///
/// The panel calls these from its event handlers; implementations must not block.
pub trait PanelHost {
    /// Registers intent to publish `schema` messages on `topic`.
    fn advertise(&mut self, topic: &str, schema: &str) -> Result<(), HostError>;

    fn unadvertise(&mut self, topic: &str) -> Result<(), HostError>;

    /// Emits one message; its shape matches the schema given at advertise time.
    fn publish(&mut self, topic: &str, message: &CommandMessage) -> Result<(), HostError>;

    /// Hands the current configuration back for persistence.
    fn save_state(&mut self, config: &PanelConfig) -> Result<(), HostError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Everything a test host was asked to do, in call order
    #[derive(Debug, Clone, PartialEq)]
    pub enum HostCall {
        Advertise { topic: String, schema: String },
        Unadvertise { topic: String },
        Publish { topic: String, message: CommandMessage },
        SaveState(PanelConfig),
    }

    #[derive(Debug, Default)]
    pub struct RecordingHost {
        pub calls: Vec<HostCall>,
        pub fail_publish: bool,
        pub fail_advertise: bool,
    }

    impl RecordingHost {
        pub fn published(&self) -> Vec<(String, CommandMessage)> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    HostCall::Publish { topic, message } => Some((topic.clone(), message.clone())),
                    _ => None,
                })
                .collect()
        }

        pub fn registry_calls(&self) -> Vec<HostCall> {
            self.calls
                .iter()
                .filter(|call| {
                    matches!(call, HostCall::Advertise { .. } | HostCall::Unadvertise { .. })
                })
                .cloned()
                .collect()
        }

        pub fn saved_states(&self) -> Vec<PanelConfig> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    HostCall::SaveState(config) => Some(config.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl PanelHost for RecordingHost {
        fn advertise(&mut self, topic: &str, schema: &str) -> Result<(), HostError> {
            if self.fail_advertise {
                return Err(HostError::ChannelError("advertise rejected".to_string()));
            }
            self.calls.push(HostCall::Advertise {
                topic: topic.to_string(),
                schema: schema.to_string(),
            });
            Ok(())
        }

        fn unadvertise(&mut self, topic: &str) -> Result<(), HostError> {
            self.calls.push(HostCall::Unadvertise {
                topic: topic.to_string(),
            });
            Ok(())
        }

        fn publish(&mut self, topic: &str, message: &CommandMessage) -> Result<(), HostError> {
            if self.fail_publish {
                return Err(HostError::ChannelError("publish rejected".to_string()));
            }
            self.calls.push(HostCall::Publish {
                topic: topic.to_string(),
                message: message.clone(),
            });
            Ok(())
        }

        fn save_state(&mut self, config: &PanelConfig) -> Result<(), HostError> {
            self.calls.push(HostCall::SaveState(config.clone()));
            Ok(())
        }
    }
}
