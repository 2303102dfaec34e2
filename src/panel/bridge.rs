//! [`PanelHost`] backed by channels into the background tasks
//!
//! Registry calls and publishes go to the MQTT bridge, state snapshots to the
//! persistence worker. All sends are `try_send` so the UI thread never waits.

use crate::mapping::CommandMessage;
use crate::mqtt::HostCommand;
use crate::panel::host::{HostError, PanelHost};
use crate::panel::settings::PanelConfig;
use std::collections::HashSet;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

fn channel_error<T>(what: &str, e: TrySendError<T>) -> HostError {
    match e {
        TrySendError::Full(_) => HostError::ChannelError(format!("{} channel full", what)),
        TrySendError::Closed(_) => HostError::ChannelError(format!("{} channel closed", what)),
    }
}

pub struct ChannelHost {
    commands: mpsc::Sender<HostCommand>,
    state: mpsc::Sender<PanelConfig>,
    advertised: HashSet<String>,
}

impl ChannelHost {
    pub fn new(commands: mpsc::Sender<HostCommand>, state: mpsc::Sender<PanelConfig>) -> Self {
        Self {
            commands,
            state,
            advertised: HashSet::new(),
        }
    }

    pub fn is_advertised(&self, topic: &str) -> bool {
        self.advertised.contains(topic)
    }

    fn send(&self, command: HostCommand) -> Result<(), HostError> {
        self.commands
            .try_send(command)
            .map_err(|e| channel_error("MQTT", e))
    }
}

impl PanelHost for ChannelHost {
    fn advertise(&mut self, topic: &str, schema: &str) -> Result<(), HostError> {
        self.send(HostCommand::Advertise {
            topic: topic.to_string(),
            schema: schema.to_string(),
        })?;
        self.advertised.insert(topic.to_string());
        Ok(())
    }

    fn unadvertise(&mut self, topic: &str) -> Result<(), HostError> {
        if !self.advertised.remove(topic) {
            debug!("Unadvertise for unknown topic {}", topic);
        }
        self.send(HostCommand::Unadvertise {
            topic: topic.to_string(),
        })
    }

    fn publish(&mut self, topic: &str, message: &CommandMessage) -> Result<(), HostError> {
        if !self.advertised.contains(topic) {
            warn!("Dropping publish on unadvertised topic {}", topic);
            return Err(HostError::NotAdvertised(topic.to_string()));
        }
        let payload = message.to_payload()?;
        self.send(HostCommand::Publish {
            topic: topic.to_string(),
            payload,
        })
    }

    fn save_state(&mut self, config: &PanelConfig) -> Result<(), HostError> {
        self.state
            .try_send(config.clone())
            .map_err(|e| channel_error("Persistence", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Twist;

    fn host(capacity: usize) -> (
        ChannelHost,
        mpsc::Receiver<HostCommand>,
        mpsc::Receiver<PanelConfig>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
        let (state_tx, state_rx) = mpsc::channel(capacity);
        (ChannelHost::new(cmd_tx, state_tx), cmd_rx, state_rx)
    }

    #[tokio::test]
    async fn test_forwards_registry_and_publish() {
        let (mut host, mut cmd_rx, _state_rx) = host(8);

        host.advertise("/cmd_vel", "geometry_msgs/msg/Twist").unwrap();
        host.publish("/cmd_vel", &CommandMessage::Twist(Twist::planar(0.5, 0.0)))
            .unwrap();
        host.unadvertise("/cmd_vel").unwrap();

        assert!(matches!(cmd_rx.recv().await, Some(HostCommand::Advertise { .. })));
        match cmd_rx.recv().await {
            Some(HostCommand::Publish { topic, payload }) => {
                assert_eq!(topic, "/cmd_vel");
                let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
                assert_eq!(json["linear"]["x"], 0.5);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(
            cmd_rx.recv().await,
            Some(HostCommand::Unadvertise {
                topic: "/cmd_vel".to_string()
            })
        );
        assert!(!host.is_advertised("/cmd_vel"));
    }

    #[tokio::test]
    async fn test_publish_requires_advertise() {
        let (mut host, mut cmd_rx, _state_rx) = host(8);
        let result = host.publish("/cmd_vel", &CommandMessage::Twist(Twist::STOP));
        assert!(matches!(result, Err(HostError::NotAdvertised(_))));
        assert!(cmd_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_save_state_is_forwarded() {
        let (mut host, _cmd_rx, mut state_rx) = host(8);
        let config = PanelConfig {
            publish_rate: 10.0,
            ..PanelConfig::default()
        };
        host.save_state(&config).unwrap();
        assert_eq!(state_rx.recv().await, Some(config));
    }

    #[tokio::test]
    async fn test_closed_and_full_channels_report_errors() {
        let (mut host, cmd_rx, state_rx) = host(1);
        drop(state_rx);
        assert!(matches!(
            host.save_state(&PanelConfig::default()),
            Err(HostError::ChannelError(_))
        ));

        host.advertise("/a", "geometry_msgs/msg/Twist").unwrap();
        assert!(matches!(
            host.advertise("/b", "geometry_msgs/msg/Twist"),
            Err(HostError::ChannelError(_))
        ));
        assert!(!host.is_advertised("/b"));
        drop(cmd_rx);
    }
}
