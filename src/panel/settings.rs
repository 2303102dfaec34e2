//! Panel configuration and topic selection
//!
//! Owns the user-editable [`PanelConfig`], the live topic list and the single topic the
//! panel publishes on. Edits arrive as [`SettingsAction::Update`] with a dotted path
//! (`["general", "publishRate"]`); the first segment names the settings node and the
//! rest is applied to the serialized configuration as a nested set.
//!
//! ## Topic switching
//!
//! ```text
//! update(topic = "/b") ─► live list has "/b"? ──no──► keep current, field shows error
//!                                   │
//!                                  yes, differs from current
//!                                   ▼
//!                 unadvertise(old) ─► advertise("/b", schema) ─► messageSchema = schema
//! ```
//!
//! Every accepted edit is handed to the host through `save_state`.

use crate::controller::joystick_adapter::PublishTarget;
use crate::mapping::SpeedLimits;
use crate::panel::host::PanelHost;
use crate::panel::Topic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

pub const MIN_PUBLISH_RATE: f64 = 1.0;
pub const MIN_SPEED: f64 = 0.0;

pub const TOPIC_MISSING: &str = "Topic does not exist";
pub const SCHEMA_MISSING: &str = "Message schema not found";

/// Key of the only settings node
pub const GENERAL_NODE: &str = "general";

fn default_publish_rate() -> f64 {
    5.0
}

fn default_speed() -> f64 {
    1.0
}

/// User-editable panel settings, persisted by the host between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_schema: Option<String>,
    #[serde(default = "default_publish_rate")]
    pub publish_rate: f64,
    #[serde(default = "default_speed")]
    pub max_linear_speed: f64,
    #[serde(default = "default_speed")]
    pub max_angular_speed: f64,
    /// `header.frame_id` for stamped commands
    #[serde(default)]
    pub frame_id: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            topic: None,
            message_schema: None,
            publish_rate: default_publish_rate(),
            max_linear_speed: default_speed(),
            max_angular_speed: default_speed(),
            frame_id: String::new(),
        }
    }
}

impl PanelConfig {
    /// Raises the numeric fields to their floors. NaN ends up at the floor too.
    pub fn clamp_floors(&mut self) {
        self.publish_rate = self.publish_rate.max(MIN_PUBLISH_RATE);
        self.max_linear_speed = self.max_linear_speed.max(MIN_SPEED);
        self.max_angular_speed = self.max_angular_speed.max(MIN_SPEED);
    }

    pub fn speed_limits(&self) -> SpeedLimits {
        SpeedLimits {
            max_linear: self.max_linear_speed,
            max_angular: self.max_angular_speed,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings path too short: {0:?}")]
    InvalidPath(Vec<String>),

    #[error("Cannot set {path}: {source}")]
    InvalidValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Actions the settings editor emits
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    Update { path: Vec<String>, value: Value },
    Perform { id: String, path: Vec<String> },
}

/// Input widget kind plus current value of one settings field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Autocomplete { value: String, items: Vec<String> },
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsField {
    pub key: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
    pub error: Option<&'static str>,
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsNode {
    pub key: &'static str,
    pub label: &'static str,
    pub fields: Vec<SettingsField>,
}

impl SettingsNode {
    pub fn field(&self, key: &str) -> Option<&SettingsField> {
        self.fields.iter().find(|field| field.key == key)
    }
}

/// Description of the editor contents, rebuilt whenever it is requested
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsTree {
    pub nodes: Vec<SettingsNode>,
}

impl SettingsTree {
    pub fn node(&self, key: &str) -> Option<&SettingsNode> {
        self.nodes.iter().find(|node| node.key == key)
    }
}

/// Sets `value` at `path` inside `root`, creating objects along the way.
pub fn set_path(root: &mut Value, path: &[String], value: Value) -> Result<(), SettingsError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(SettingsError::InvalidPath(path.to_vec()));
    };

    let mut node = root;
    for key in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return Err(SettingsError::InvalidPath(path.to_vec()));
        };
        node = map
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
    Ok(())
}

/// Configuration plus topic selection state of one panel instance
#[derive(Debug)]
pub struct PanelSettings {
    config: PanelConfig,
    topics: Vec<Topic>,
    current_topic: Option<Topic>,
    /// Name handed to the last successful `advertise`
    advertised: Option<String>,
    last_edit: Option<String>,
}

impl PanelSettings {
    /// Builds the settings from the host-persisted state, defaults filled in.
    pub fn from_initial_state(initial: Option<PanelConfig>) -> Self {
        let mut config = initial.unwrap_or_default();
        config.clamp_floors();

        let current_topic = match (&config.topic, &config.message_schema) {
            (Some(name), Some(schema)) if !name.is_empty() && !schema.is_empty() => Some(Topic {
                name: name.clone(),
                schema_name: schema.clone(),
            }),
            _ => None,
        };

        Self {
            config,
            topics: Vec::new(),
            current_topic,
            advertised: None,
            last_edit: None,
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn current_topic(&self) -> Option<&Topic> {
        self.current_topic.as_ref()
    }

    pub fn advertised(&self) -> Option<&str> {
        self.advertised.as_deref()
    }

    /// Short description of the most recent accepted edit
    pub fn last_edit(&self) -> Option<&str> {
        self.last_edit.as_deref()
    }

    /// Replaces the live topic list. Returns `true` if it changed.
    pub fn set_topics(&mut self, topics: Vec<Topic>) -> bool {
        if topics == self.topics {
            return false;
        }
        debug!("Topic list updated: {} topics", topics.len());
        self.topics = topics;
        true
    }

    /// Advertises the current topic, e.g. right after mount.
    pub fn advertise_current<H: PanelHost>(&mut self, host: &mut H) {
        if let Some(topic) = self.current_topic.clone() {
            self.advertise(&topic, host);
        }
    }

    /// Releases the advertisement held by this panel.
    pub fn unadvertise<H: PanelHost>(&mut self, host: &mut H) {
        if let Some(old) = self.advertised.take() {
            if let Err(e) = host.unadvertise(&old) {
                warn!("Failed to unadvertise {}: {}", old, e);
            }
        }
    }

    fn advertise<H: PanelHost>(&mut self, topic: &Topic, host: &mut H) {
        self.unadvertise(host);
        match host.advertise(&topic.name, &topic.schema_name) {
            Ok(()) => {
                info!("Advertised {} ({})", topic.name, topic.schema_name);
                self.advertised = Some(topic.name.clone());
            }
            Err(e) => error!("Failed to advertise {}: {}", topic.name, e),
        }
    }

    /// Entry point for the settings editor. Anything but `Update` is ignored.
    ///
    /// Returns `true` when the configuration changed.
    pub fn handle_action<H: PanelHost>(&mut self, action: SettingsAction, host: &mut H) -> bool {
        match action {
            SettingsAction::Update { path, value } => match self.update(&path, value, host) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Rejected settings update: {}", e);
                    false
                }
            },
            SettingsAction::Perform { id, .. } => {
                debug!("Ignoring settings action {}", id);
                false
            }
        }
    }

    /// Applies one edit, re-validates, resolves the topic and persists the result.
    pub fn update<H: PanelHost>(
        &mut self,
        path: &[String],
        value: Value,
        host: &mut H,
    ) -> Result<(), SettingsError> {
        let field_path = match path.split_first() {
            Some((_node, rest)) if !rest.is_empty() => rest,
            _ => return Err(SettingsError::InvalidPath(path.to_vec())),
        };
        let edit = format!("{} {}", field_path.join("."), value);

        let mut raw = serde_json::to_value(&self.config).map_err(|source| {
            SettingsError::InvalidValue {
                path: field_path.join("."),
                source,
            }
        })?;
        set_path(&mut raw, field_path, value)?;
        let mut next: PanelConfig =
            serde_json::from_value(raw).map_err(|source| SettingsError::InvalidValue {
                path: field_path.join("."),
                source,
            })?;
        next.clamp_floors();

        if let Some(topic) = self.resolve_topic(next.topic.as_deref()) {
            // Compared against the advertisement so a failed advertise is retried
            if self.advertised.as_deref() != Some(topic.name.as_str()) {
                next.message_schema = Some(topic.schema_name.clone());
                self.advertise(&topic, host);
                self.current_topic = Some(topic);
            }
        } else if next.topic != self.config.topic {
            warn!("Topic {:?} is not available", next.topic);
        }

        self.config = next;
        self.last_edit = Some(edit);
        if let Err(e) = host.save_state(&self.config) {
            error!("Failed to save panel state: {}", e);
        }
        Ok(())
    }

    fn resolve_topic(&self, name: Option<&str>) -> Option<Topic> {
        let name = name?;
        self.topics.iter().find(|topic| topic.name == name).cloned()
    }

    pub fn topic_error(&self) -> Option<&'static str> {
        match self.config.topic.as_deref() {
            Some(name) if self.topics.iter().any(|topic| topic.name == name) => None,
            _ => Some(TOPIC_MISSING),
        }
    }

    pub fn schema_error(&self) -> Option<&'static str> {
        match self.config.message_schema.as_deref() {
            Some(schema) if !schema.is_empty() => None,
            _ => Some(SCHEMA_MISSING),
        }
    }

    /// What the joystick needs for one publish
    pub fn publish_target(&self) -> PublishTarget {
        PublishTarget {
            topic: self.current_topic.clone(),
            limits: self.config.speed_limits(),
            frame_id: self.config.frame_id.clone(),
        }
    }

    pub fn settings_tree(&self) -> SettingsTree {
        let general = SettingsNode {
            key: GENERAL_NODE,
            label: "General",
            fields: vec![
                SettingsField {
                    key: "topic",
                    label: "Topic",
                    input: FieldInput::Autocomplete {
                        value: self.config.topic.clone().unwrap_or_default(),
                        items: self.topics.iter().map(|t| t.name.clone()).collect(),
                    },
                    error: self.topic_error(),
                    readonly: false,
                },
                SettingsField {
                    key: "messageSchema",
                    label: "Message Schema",
                    input: FieldInput::Text(self.config.message_schema.clone().unwrap_or_default()),
                    error: self.schema_error(),
                    readonly: true,
                },
                SettingsField {
                    key: "publishRate",
                    label: "Publish rate",
                    input: FieldInput::Number(self.config.publish_rate),
                    error: None,
                    readonly: false,
                },
                SettingsField {
                    key: "maxLinearSpeed",
                    label: "Max linear",
                    input: FieldInput::Number(self.config.max_linear_speed),
                    error: None,
                    readonly: false,
                },
                SettingsField {
                    key: "maxAngularSpeed",
                    label: "Max angular",
                    input: FieldInput::Number(self.config.max_angular_speed),
                    error: None,
                    readonly: false,
                },
                SettingsField {
                    key: "frameId",
                    label: "Frame ID",
                    input: FieldInput::Text(self.config.frame_id.clone()),
                    error: None,
                    readonly: false,
                },
            ],
        };

        SettingsTree {
            nodes: vec![general],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::messages::{TWIST_SCHEMA, TWIST_STAMPED_SCHEMA};
    use crate::panel::host::testing::{HostCall, RecordingHost};
    use serde_json::json;

    fn path(field: &str) -> Vec<String> {
        vec![GENERAL_NODE.to_string(), field.to_string()]
    }

    fn topic(name: &str, schema: &str) -> Topic {
        Topic {
            name: name.to_string(),
            schema_name: schema.to_string(),
        }
    }

    fn settings_with_topics() -> PanelSettings {
        let mut settings = PanelSettings::from_initial_state(Some(PanelConfig {
            topic: Some("/cmd_vel".to_string()),
            message_schema: Some(TWIST_SCHEMA.to_string()),
            ..PanelConfig::default()
        }));
        settings.set_topics(vec![
            topic("/cmd_vel", TWIST_SCHEMA),
            topic("/stamped", TWIST_STAMPED_SCHEMA),
        ]);
        settings
    }

    #[test]
    fn test_defaults_filled_in() {
        let settings = PanelSettings::from_initial_state(None);
        let config = settings.config();
        assert_eq!(config.publish_rate, 5.0);
        assert_eq!(config.max_linear_speed, 1.0);
        assert_eq!(config.max_angular_speed, 1.0);
        assert!(settings.current_topic().is_none());
    }

    #[test]
    fn test_partial_state_deserializes_with_defaults() {
        let config: PanelConfig = serde_json::from_value(json!({ "topic": "/x", "maxLinearSpeed": 0.4 })).unwrap();
        assert_eq!(config.topic.as_deref(), Some("/x"));
        assert_eq!(config.max_linear_speed, 0.4);
        assert_eq!(config.publish_rate, 5.0);
        assert!(config.message_schema.is_none());
    }

    #[test]
    fn test_initial_current_topic_needs_topic_and_schema() {
        let settings = settings_with_topics();
        assert_eq!(settings.current_topic().map(|t| t.name.as_str()), Some("/cmd_vel"));

        let only_topic = PanelSettings::from_initial_state(Some(PanelConfig {
            topic: Some("/cmd_vel".to_string()),
            ..PanelConfig::default()
        }));
        assert!(only_topic.current_topic().is_none());
    }

    #[test]
    fn test_numeric_floors_are_enforced() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost::default();

        settings.update(&path("publishRate"), json!(0), &mut host).unwrap();
        settings.update(&path("maxLinearSpeed"), json!(-5), &mut host).unwrap();
        settings.update(&path("maxAngularSpeed"), json!(-0.1), &mut host).unwrap();

        assert_eq!(settings.config().publish_rate, 1.0);
        assert_eq!(settings.config().max_linear_speed, 0.0);
        assert_eq!(settings.config().max_angular_speed, 0.0);
    }

    #[test]
    fn test_every_update_is_saved() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost::default();

        settings.update(&path("publishRate"), json!(10.0), &mut host).unwrap();
        settings.update(&path("frameId"), json!("base_link"), &mut host).unwrap();

        let saved = host.saved_states();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].publish_rate, 10.0);
        assert_eq!(saved[1].frame_id, "base_link");
        assert_eq!(&saved[1], settings.config());
        assert_eq!(settings.last_edit(), Some("frameId \"base_link\""));
    }

    #[test]
    fn test_switching_to_live_topic_readvertises_once() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost::default();
        settings.advertise_current(&mut host);
        host.calls.clear();

        settings.update(&path("topic"), json!("/stamped"), &mut host).unwrap();

        assert_eq!(
            host.registry_calls(),
            vec![
                HostCall::Unadvertise {
                    topic: "/cmd_vel".to_string()
                },
                HostCall::Advertise {
                    topic: "/stamped".to_string(),
                    schema: TWIST_STAMPED_SCHEMA.to_string()
                },
            ]
        );
        assert_eq!(settings.current_topic().map(|t| t.name.as_str()), Some("/stamped"));
        assert_eq!(settings.config().message_schema.as_deref(), Some(TWIST_STAMPED_SCHEMA));
        assert_eq!(settings.advertised(), Some("/stamped"));
    }

    #[test]
    fn test_switching_to_unknown_topic_keeps_current() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost::default();
        settings.advertise_current(&mut host);
        host.calls.clear();

        settings.update(&path("topic"), json!("/missing"), &mut host).unwrap();

        assert!(host.registry_calls().is_empty());
        assert_eq!(settings.current_topic().map(|t| t.name.as_str()), Some("/cmd_vel"));
        assert_eq!(settings.config().topic.as_deref(), Some("/missing"));
        assert_eq!(settings.topic_error(), Some(TOPIC_MISSING));
    }

    #[test]
    fn test_same_topic_does_not_readvertise() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost::default();
        settings.advertise_current(&mut host);
        host.calls.clear();

        settings.update(&path("topic"), json!("/cmd_vel"), &mut host).unwrap();
        assert!(host.registry_calls().is_empty());
    }

    #[test]
    fn test_failed_advertise_is_retried_on_reselect() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost {
            fail_advertise: true,
            ..RecordingHost::default()
        };
        settings.advertise_current(&mut host);
        assert_eq!(settings.advertised(), None);

        settings.update(&path("topic"), json!("/stamped"), &mut host).unwrap();
        assert_eq!(settings.current_topic().map(|t| t.name.as_str()), Some("/stamped"));
        assert_eq!(settings.advertised(), None);

        host.fail_advertise = false;
        settings.update(&path("topic"), json!("/stamped"), &mut host).unwrap();

        assert_eq!(
            host.registry_calls(),
            vec![HostCall::Advertise {
                topic: "/stamped".to_string(),
                schema: TWIST_STAMPED_SCHEMA.to_string()
            }]
        );
        assert_eq!(settings.advertised(), Some("/stamped"));
        assert_eq!(settings.config().message_schema.as_deref(), Some(TWIST_STAMPED_SCHEMA));
    }

    #[test]
    fn test_first_selection_advertises_without_unadvertise() {
        let mut settings = PanelSettings::from_initial_state(None);
        settings.set_topics(vec![topic("/cmd_vel", TWIST_SCHEMA)]);
        let mut host = RecordingHost::default();

        settings.update(&path("topic"), json!("/cmd_vel"), &mut host).unwrap();

        assert_eq!(
            host.registry_calls(),
            vec![HostCall::Advertise {
                topic: "/cmd_vel".to_string(),
                schema: TWIST_SCHEMA.to_string()
            }]
        );
    }

    #[test]
    fn test_malformed_updates_leave_config_unchanged() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost::default();
        let before = settings.config().clone();

        assert!(settings.update(&path("publishRate"), json!("fast"), &mut host).is_err());
        assert!(settings.update(&["general".to_string()], json!(1), &mut host).is_err());
        assert!(settings.update(&[], json!(1), &mut host).is_err());

        assert_eq!(settings.config(), &before);
        assert!(host.saved_states().is_empty());
    }

    #[test]
    fn test_only_update_actions_are_handled() {
        let mut settings = settings_with_topics();
        let mut host = RecordingHost::default();

        let changed = settings.handle_action(
            SettingsAction::Perform {
                id: "reset".to_string(),
                path: vec![GENERAL_NODE.to_string()],
            },
            &mut host,
        );
        assert!(!changed);
        assert!(host.calls.is_empty());

        let changed = settings.handle_action(
            SettingsAction::Update {
                path: path("maxAngularSpeed"),
                value: json!(2.5),
            },
            &mut host,
        );
        assert!(changed);
        assert_eq!(settings.config().max_angular_speed, 2.5);
    }

    #[test]
    fn test_settings_tree_reports_errors() {
        let settings = PanelSettings::from_initial_state(None);
        let tree = settings.settings_tree();
        let general = tree.node(GENERAL_NODE).unwrap();

        assert_eq!(general.field("topic").unwrap().error, Some(TOPIC_MISSING));
        let schema = general.field("messageSchema").unwrap();
        assert_eq!(schema.error, Some(SCHEMA_MISSING));
        assert!(schema.readonly);

        let ok = settings_with_topics().settings_tree();
        let general = ok.node(GENERAL_NODE).unwrap();
        assert_eq!(general.field("topic").unwrap().error, None);
        assert_eq!(general.field("messageSchema").unwrap().error, None);
        match &general.field("topic").unwrap().input {
            FieldInput::Autocomplete { items, .. } => {
                assert_eq!(items, &vec!["/cmd_vel".to_string(), "/stamped".to_string()])
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_set_path_creates_nested_objects() {
        let mut root = json!({ "a": 1 });
        set_path(&mut root, &["b".to_string(), "c".to_string()], json!(true)).unwrap();
        assert_eq!(root, json!({ "a": 1, "b": { "c": true } }));

        set_path(&mut root, &["a".to_string()], json!(2)).unwrap();
        assert_eq!(root["a"], json!(2));

        assert!(set_path(&mut root, &[], json!(0)).is_err());
    }
}
