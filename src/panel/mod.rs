//! # Virtual Joystick Panel
//!
//! Ties the joystick, the settings and the render lifecycle together behind a
//! [`PanelHost`]. The panel is driven entirely from the outside: the host calls
//! [`JoystickPanel::on_render`] for render ticks, [`JoystickPanel::handle_pointer`]
//! for widget events, [`JoystickPanel::handle_settings_action`] for editor edits and
//! [`JoystickPanel::tick`] from its frame loop so parked commands get delivered.
//!
//! ## Ownership
//!
//! The current topic and the last seen color scheme are owned by one
//! `JoystickPanel` value, so two panels never share them.
//!
//! ```text
//!                ┌──────────── JoystickPanel<H> ─────────────┐
//!  render tick ─►│ PanelLifecycle ─► PanelSettings            │
//!  pointer     ─►│ JoystickAdapter ─► Throttle ─► publish ────┼─► H: PanelHost
//!  settings    ─►│ PanelSettings ─► (un)advertise, save_state ┼─►
//!                └────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod host;
pub mod lifecycle;
pub mod settings;

use crate::controller::{publish_command, JoystickAdapter, JoystickWidget, PointerEvent, SchemeSync};
use crate::mapping::Deflection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

pub use host::{HostError, PanelHost};
pub use lifecycle::{PanelLifecycle, RenderField, RenderOutcome, RenderState};
pub use settings::{PanelConfig, PanelSettings, SettingsAction, SettingsTree};

/// A named, schema-typed channel offered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    pub schema_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorScheme::Light => write!(f, "light"),
            ColorScheme::Dark => write!(f, "dark"),
        }
    }
}

pub struct JoystickPanel<H: PanelHost> {
    host: H,
    settings: PanelSettings,
    lifecycle: PanelLifecycle,
    joystick: JoystickAdapter,
}

impl<H: PanelHost> JoystickPanel<H> {
    /// Builds the panel from the persisted state and performs the mount effects:
    /// watch registration, advertising the restored topic, creating the widget.
    pub fn mount(mut host: H, initial_state: Option<PanelConfig>, scheme: ColorScheme) -> Self {
        let mut settings = PanelSettings::from_initial_state(initial_state);
        let mut lifecycle = PanelLifecycle::new(scheme);
        lifecycle.watch(RenderField::Topics);
        lifecycle.watch(RenderField::ColorScheme);

        settings.advertise_current(&mut host);

        let mut joystick = JoystickAdapter::new(settings.config().publish_rate);
        joystick.mount(scheme);

        info!(
            "Panel mounted, topic: {}",
            settings
                .current_topic()
                .map(|t| t.name.as_str())
                .unwrap_or("<none>")
        );

        Self {
            host,
            settings,
            lifecycle,
            joystick,
        }
    }

    pub fn watches(&self, field: RenderField) -> bool {
        self.lifecycle.watches(field)
    }

    /// Handles one render tick; `done` is called once the tick has been applied.
    pub fn on_render<F: FnOnce()>(&mut self, state: RenderState, done: F) -> RenderOutcome {
        let outcome = self.lifecycle.on_render(state, &mut self.settings, done);
        match self.joystick.sync_scheme(self.lifecycle.color_scheme()) {
            SchemeSync::Unchanged => {}
            SchemeSync::Rebuilt => {
                debug!("Joystick rebuilt for {} scheme", self.lifecycle.color_scheme());
            }
            SchemeSync::RebuiltDuringDrag => {
                // The release of the dropped gesture will never arrive
                info!("Joystick rebuilt mid-drag, sending stop");
                let target = self.settings.publish_target();
                publish_command(&mut self.host, &target, Deflection::ZERO);
            }
        }
        outcome
    }

    /// Applies an edit from the settings editor.
    pub fn handle_settings_action(&mut self, action: SettingsAction) -> bool {
        let changed = self.settings.handle_action(action, &mut self.host);
        if changed {
            self.joystick
                .set_publish_rate(self.settings.config().publish_rate);
        }
        changed
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        let target = self.settings.publish_target();
        self.joystick
            .handle_event(event, now, &target, &mut self.host);
    }

    /// Delivers parked commands that became due.
    pub fn tick(&mut self, now: Instant) {
        let target = self.settings.publish_target();
        self.joystick.tick(now, &target, &mut self.host);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.joystick.next_deadline()
    }

    pub fn settings_tree(&self) -> SettingsTree {
        self.settings.settings_tree()
    }

    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.lifecycle.color_scheme()
    }

    pub fn is_dragging(&self) -> bool {
        self.joystick.is_dragging()
    }

    pub fn joystick_widget(&mut self) -> Option<&mut JoystickWidget> {
        self.joystick.widget_mut()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Teardown: releases the widget, drops parked commands and the advertisement.
    pub fn unmount(mut self) -> H {
        self.joystick.unmount();
        self.settings.unadvertise(&mut self.host);
        info!("Panel unmounted");
        self.host
    }
}
