use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::MqttConfig;
use super::message_manager::{HostCommand, OutboundMessage};

const DEFAULT_PORT: u16 = 1883;
const REQUEST_CAPACITY: usize = 100;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_ERROR_MESSAGES: usize = 20;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    #[error("Invalid broker address: {0}")]
    InvalidAddress(String),

    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
    Reconnecting,
}

#[derive(Clone, Debug, Default)]
pub struct MQTTStatus {
    pub connection_state: ConnectionState,
    pub error_messages: Vec<String>,
    pub messages_received: usize,
    pub messages_sent: usize,
    pub last_activity: Option<chrono::DateTime<chrono::Local>>,
    pub last_message: Option<String>,
}

impl MQTTStatus {
    fn push_error(&mut self, message: String) {
        if self.error_messages.len() >= MAX_ERROR_MESSAGES {
            self.error_messages.remove(0);
        }
        self.error_messages.push(message);
    }
}

/// Splits `host:port` (optionally `mqtt://host:port`) into its parts.
pub fn parse_broker_url(url: &str) -> Result<(String, u16), MqttError> {
    let address = url
        .trim()
        .trim_start_matches("mqtt://")
        .trim_start_matches("tcp://")
        .trim_end_matches('/');
    let (host, port) = match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| MqttError::InvalidAddress(url.to_string()))?;
            (host, port)
        }
        None => (address, DEFAULT_PORT),
    };
    if host.is_empty() {
        return Err(MqttError::InvalidAddress(url.to_string()));
    }
    Ok((host.to_string(), port))
}

/// Owns the broker connection and forwards panel commands to it
pub struct MqttHandler {
    status: MQTTStatus,
    status_tx: watch::Sender<MQTTStatus>,
    client: AsyncClient,
    event_loop: EventLoop,
    config: MqttConfig,
    commands: mpsc::Receiver<HostCommand>,
}

impl MqttHandler {
    pub fn new(
        config: MqttConfig,
        commands: mpsc::Receiver<HostCommand>,
        status_tx: watch::Sender<MQTTStatus>,
    ) -> Result<Self, MqttError> {
        let (host, port) = parse_broker_url(&config.url)?;
        let mut mqtt_options = MqttOptions::new(config.client_id.clone(), host, port);
        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(1)));
        if !config.user.is_empty() {
            mqtt_options.set_credentials(config.user.clone(), config.pw.clone());
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);

        Ok(MqttHandler {
            status: MQTTStatus::default(),
            status_tx,
            client,
            event_loop,
            config,
            commands,
        })
    }

    /// Drives the connection until `cancel` fires or the command channel closes.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Starting MQTT bridge for {}", self.config);
        self.set_state(ConnectionState::Connecting);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown signal received for MQTT bridge");
                    break;
                }

                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.forward(command),
                        None => {
                            info!("Command channel closed, stopping MQTT bridge");
                            break;
                        }
                    }
                }

                event = self.event_loop.poll() => {
                    match event {
                        Ok(event) => self.on_event(event),
                        Err(e) => {
                            error!("MQTT connection error: {}", e);
                            let next = if self.status.connection_state == ConnectionState::Connected {
                                ConnectionState::Reconnecting
                            } else {
                                ConnectionState::Failed
                            };
                            self.status.push_error(e.to_string());
                            self.set_state(next);
                            // rumqttc reconnects on the next poll
                            if !self.wait_before_reconnect(&cancel).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.flush_and_disconnect().await;
        self.set_state(ConnectionState::Disconnected);
    }

    /// Waits out the reconnect delay while still forwarding commands.
    ///
    /// Returns `false` once the bridge should stop.
    async fn wait_before_reconnect(&mut self, cancel: &CancellationToken) -> bool {
        let delay = tokio::time::sleep(RECONNECT_DELAY);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown signal received for MQTT bridge");
                    return false;
                }
                _ = &mut delay => return true,
                command = self.commands.recv() => match command {
                    Some(command) => self.forward(command),
                    None => {
                        info!("Command channel closed, stopping MQTT bridge");
                        return false;
                    }
                },
            }
        }
    }

    /// Lets queued publishes (e.g. the final unadvertise) reach the broker.
    async fn flush_and_disconnect(&mut self) {
        if let Err(e) = self.client.try_disconnect() {
            warn!("Failed to disconnect cleanly: {}", e);
            return;
        }
        let flush = async {
            loop {
                match self.event_loop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(event) => self.on_event(event),
                }
            }
        };
        if tokio::time::timeout(FLUSH_TIMEOUT, flush).await.is_err() {
            debug!("MQTT flush timed out");
        }
    }

    fn forward(&mut self, command: HostCommand) {
        let message = OutboundMessage::from(command);
        debug!("Forwarding {}", message);
        let summary = message.to_string();
        match self
            .client
            .try_publish(message.topic, message.qos, message.retain, message.payload)
        {
            Ok(()) => {
                self.status.last_message = Some(summary);
                self.publish_status();
            }
            Err(e) => {
                let e = MqttError::from(e);
                error!("Failed to queue MQTT publish: {}", e);
                self.status.push_error(e.to_string());
                self.publish_status();
            }
        }
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                info!("Connected to MQTT broker {}", self.config.url);
                self.set_state(ConnectionState::Connected);
            }
            Event::Incoming(Packet::Publish(_)) => {
                self.status.messages_received += 1;
                self.touch();
            }
            Event::Outgoing(Outgoing::Publish(_)) => {
                self.status.messages_sent += 1;
                self.touch();
            }
            _ => {}
        }
    }

    fn touch(&mut self) {
        self.status.last_activity = Some(chrono::Local::now());
        self.publish_status();
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.status.connection_state != state {
            debug!("MQTT state {:?} -> {:?}", self.status.connection_state, state);
            self.status.connection_state = state;
            self.publish_status();
        }
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status.clone());
    }
}
