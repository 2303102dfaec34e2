use serde::{Deserialize, Serialize};
use std::fmt;

fn default_url() -> String {
    "localhost:1883".to_string()
}

fn default_client_id() -> String {
    "virtual-joystick".to_string()
}

fn default_keep_alive() -> u64 {
    5
}

/// Broker connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker address, `host:port` (an `mqtt://` prefix is accepted)
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pw: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user: String::new(),
            pw: String::new(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

impl fmt::Display for MqttConfig {
    /// `user@url`, the password is left out
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.user.is_empty() {
            write!(f, "{}", self.url)
        } else {
            write!(f, "{}@{}", self.user, self.url)
        }
    }
}
