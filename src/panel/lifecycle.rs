//! Render tick handling
//!
//! The host only delivers ticks for fields the panel watches, and it does not deliver
//! the next tick until `done` of the previous one has been called.

use crate::mapping::MessageSchema;
use crate::panel::settings::PanelSettings;
use crate::panel::{ColorScheme, Topic};
use std::collections::HashSet;
use tracing::{debug, info};

/// Fields of [`RenderState`] a panel can watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderField {
    Topics,
    ColorScheme,
}

/// Snapshot the host hands over on a render tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub topics: Option<Vec<Topic>>,
    pub color_scheme: Option<ColorScheme>,
}

/// What a tick changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    pub topics_changed: bool,
    pub scheme_changed: bool,
}

/// Keeps only topics whose schema the panel can publish.
pub fn supported_topics(topics: Vec<Topic>) -> Vec<Topic> {
    topics
        .into_iter()
        .filter(|topic| MessageSchema::is_supported(&topic.schema_name))
        .collect()
}

#[derive(Debug)]
pub struct PanelLifecycle {
    watched: HashSet<RenderField>,
    color_scheme: ColorScheme,
    ticks: u64,
}

impl PanelLifecycle {
    pub fn new(color_scheme: ColorScheme) -> Self {
        Self {
            watched: HashSet::new(),
            color_scheme,
            ticks: 0,
        }
    }

    pub fn watch(&mut self, field: RenderField) {
        if self.watched.insert(field) {
            debug!("Watching render field {:?}", field);
        }
    }

    pub fn watches(&self, field: RenderField) -> bool {
        self.watched.contains(&field)
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.color_scheme
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Applies one tick and then signals `done`, exactly once.
    pub fn on_render<F: FnOnce()>(
        &mut self,
        state: RenderState,
        settings: &mut PanelSettings,
        done: F,
    ) -> RenderOutcome {
        let mut outcome = RenderOutcome::default();
        self.ticks += 1;

        if self.watches(RenderField::Topics) {
            if let Some(topics) = state.topics {
                outcome.topics_changed = settings.set_topics(supported_topics(topics));
            }
        }

        if self.watches(RenderField::ColorScheme) {
            if let Some(scheme) = state.color_scheme {
                if scheme != self.color_scheme {
                    info!("Color scheme changed to {}", scheme);
                    self.color_scheme = scheme;
                    outcome.scheme_changed = true;
                }
            }
        }

        done();
        outcome
    }
}
