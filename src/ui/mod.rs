//! # Virtual Joystick Window
//!
//! The eframe application hosting one [`JoystickPanel`]. Each frame it
//!
//! 1. delivers due throttled commands (`panel.tick`),
//! 2. hands a render tick to the panel when a watched field changed,
//! 3. draws the settings editor, the joystick and the status bar,
//! 4. schedules the next repaint no later than the next publish deadline.
//!
//! ```text
//! ┌ top ──────────────────────────────────────────────┐
//! │ Virtual Joystick                        [theme]   │
//! ├ side ─────────┬ central ──────────────────────────┤
//! │ settings tree │            ( joystick )           │
//! ├ bottom ───────┴───────────────────────────────────┤
//! │ ● broker  topic  sent/received  last edit         │
//! └───────────────────────────────────────────────────┘
//! ```

pub mod common;
pub mod render_driver;
pub mod settings_menu;

use eframe::egui::{self, Layout, RichText};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::controller::widget::color_scheme_of;
use crate::mqtt::MQTTStatus;
use crate::panel::bridge::ChannelHost;
use crate::panel::{ColorScheme, JoystickPanel, Topic};

use self::common::{connection_color, theme_for, toggled};
use self::render_driver::RenderDriver;
use self::settings_menu::SettingsMenu;

/// Upper bound between repaints, roughly 30 fps
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Time until the next repaint: the frame interval, or earlier if a command is due.
pub fn repaint_delay(now: Instant, deadline: Option<Instant>) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(now).min(FRAME_INTERVAL),
        None => FRAME_INTERVAL,
    }
}

pub struct VirtualJoystickUI {
    panel: Option<JoystickPanel<ChannelHost>>,
    driver: RenderDriver,
    settings_menu: SettingsMenu,
    catalog: Vec<Topic>,
    broker: String,
    mqtt_status: watch::Receiver<MQTTStatus>,
}

impl VirtualJoystickUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        panel: JoystickPanel<ChannelHost>,
        catalog: Vec<Topic>,
        broker: String,
        mqtt_status: watch::Receiver<MQTTStatus>,
    ) -> Self {
        cc.egui_ctx.set_theme(theme_for(panel.color_scheme()));
        VirtualJoystickUI {
            panel: Some(panel),
            driver: RenderDriver::default(),
            settings_menu: SettingsMenu::default(),
            catalog,
            broker,
            mqtt_status,
        }
    }

    fn deliver_render_tick(&mut self, scheme: ColorScheme) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        if let Some((state, done)) =
            self.driver
                .next_tick(&self.catalog, scheme, |field| panel.watches(field))
        {
            let outcome = panel.on_render(state, move || done.signal());
            if outcome.topics_changed || outcome.scheme_changed {
                debug!("Render tick applied: {:?}", outcome);
            }
        }
    }

    fn render_status(&self, ui: &mut egui::Ui, panel: &JoystickPanel<ChannelHost>) {
        let status = self.mqtt_status.borrow().clone();
        ui.horizontal_centered(|ui| {
            ui.label(
                RichText::new("●").color(connection_color(&status.connection_state)),
            );
            ui.label(format!("{} ({:?})", self.broker, status.connection_state));
            ui.separator();

            let topic = panel
                .settings()
                .current_topic()
                .map(|t| t.name.clone())
                .unwrap_or_else(|| "no topic".to_string());
            ui.label(topic);
            ui.separator();
            ui.label(format!(
                "sent {} / received {}",
                status.messages_sent, status.messages_received
            ));
            if let Some(last) = status.last_activity {
                ui.label(last.format("%H:%M:%S").to_string());
            }
            if let Some(edit) = panel.settings().last_edit() {
                ui.separator();
                ui.label(format!("last edit: {}", edit));
            }
            if let Some(error) = status.error_messages.last() {
                ui.separator();
                ui.label(RichText::new(error).color(common::UiColors::INACTIVE));
            }
        });
    }
}

impl eframe::App for VirtualJoystickUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(panel) = self.panel.as_mut() {
            panel.tick(Instant::now());
        }

        let scheme = color_scheme_of(ctx);
        self.deliver_render_tick(scheme);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Virtual Joystick");
                ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = match scheme {
                        ColorScheme::Light => "Dark mode",
                        ColorScheme::Dark => "Light mode",
                    };
                    if ui.button(label).clicked() {
                        ctx.set_theme(theme_for(toggled(scheme)));
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            if let Some(panel) = self.panel.as_ref() {
                self.render_status(ui, panel);
            }
        });

        egui::SidePanel::left("settings_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                if let Some(panel) = self.panel.as_mut() {
                    let tree = panel.settings_tree();
                    for action in self.settings_menu.render(ui, &tree) {
                        panel.handle_settings_action(action);
                    }
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(panel) = self.panel.as_mut() {
                let events = panel
                    .joystick_widget()
                    .map(|widget| widget.show(ui))
                    .unwrap_or_default();
                let now = Instant::now();
                for event in events {
                    panel.handle_pointer(event, now);
                }
            }
        });

        let deadline = self.panel.as_ref().and_then(|p| p.next_deadline());
        ctx.request_repaint_after(repaint_delay(Instant::now(), deadline));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(panel) = self.panel.take() {
            // Dropping the host closes the channels, the background tasks drain and stop
            drop(panel.unmount());
        }
        info!("Window closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repaint_delay_capped_by_frame_interval() {
        let now = Instant::now();
        assert_eq!(repaint_delay(now, None), FRAME_INTERVAL);
        assert_eq!(
            repaint_delay(now, Some(now + Duration::from_secs(1))),
            FRAME_INTERVAL
        );
    }

    #[test]
    fn test_repaint_delay_follows_deadline() {
        let now = Instant::now();
        assert_eq!(
            repaint_delay(now, Some(now + Duration::from_millis(10))),
            Duration::from_millis(10)
        );
        assert_eq!(repaint_delay(now, Some(now)), Duration::ZERO);
    }
}
