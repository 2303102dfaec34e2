//! On-screen thumbstick
//!
//! A static joystick drawn in the middle of the available area. It renders the base
//! and knob and turns egui drag responses into [`PointerEvent`]s; what those events
//! mean is decided by the adapter. The knob is drawn clamped to the base radius,
//! the reported positions are not.

use crate::controller::gesture::PointerEvent;
use crate::mapping::DragPoint;
use crate::panel::ColorScheme;
use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use tracing::debug;

/// Appearance of a joystick instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickOptions {
    pub color: Color32,
    pub size: f32,
    /// Opacity while no drag is active
    pub rest_opacity: f32,
}

impl JoystickOptions {
    pub fn for_scheme(scheme: ColorScheme) -> Self {
        Self {
            color: match scheme {
                ColorScheme::Light => Color32::BLACK,
                ColorScheme::Dark => Color32::WHITE,
            },
            size: 200.0,
            rest_opacity: 0.8,
        }
    }
}

/// Translates one frame of drag state into pointer events.
pub fn pointer_events(
    drag_started: bool,
    dragged: bool,
    drag_stopped: bool,
    pointer: Option<Pos2>,
) -> Vec<PointerEvent> {
    let mut events = Vec::new();
    let point = pointer.map(|p| DragPoint::new(p.x as f64, p.y as f64));

    if drag_started {
        if let Some(point) = point {
            events.push(PointerEvent::Start(point));
        }
    } else if dragged {
        if let Some(point) = point {
            events.push(PointerEvent::Move(point));
        }
    }
    if drag_stopped {
        events.push(PointerEvent::End);
    }
    events
}

#[derive(Debug)]
pub struct JoystickWidget {
    generation: u64,
    scheme: ColorScheme,
    options: JoystickOptions,
    anchor: Option<Pos2>,
    knob_offset: Vec2,
}

impl JoystickWidget {
    pub fn create(generation: u64, scheme: ColorScheme) -> Self {
        debug!("Creating joystick #{} for {} scheme", generation, scheme);
        Self {
            generation,
            scheme,
            options: JoystickOptions::for_scheme(scheme),
            anchor: None,
            knob_offset: Vec2::ZERO,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn destroy(self) {
        debug!("Destroying joystick #{}", self.generation);
    }

    /// Draws the joystick and returns the pointer events of this frame.
    pub fn show(&mut self, ui: &mut Ui) -> Vec<PointerEvent> {
        let area = ui.available_rect_before_wrap();
        let rect = Rect::from_center_size(area.center(), Vec2::splat(self.options.size));
        let response = ui.allocate_rect(rect, Sense::drag());

        let events = pointer_events(
            response.drag_started(),
            response.dragged(),
            response.drag_stopped(),
            response.interact_pointer_pos(),
        );
        for event in &events {
            match event {
                PointerEvent::Start(p) => {
                    self.anchor = Some(Pos2::new(p.x as f32, p.y as f32));
                    self.knob_offset = Vec2::ZERO;
                }
                PointerEvent::Move(p) => {
                    if let Some(anchor) = self.anchor {
                        let radius = self.options.size / 2.0;
                        let offset = Pos2::new(p.x as f32, p.y as f32) - anchor;
                        self.knob_offset = if offset.length() > radius {
                            offset.normalized() * radius
                        } else {
                            offset
                        };
                    }
                }
                PointerEvent::End => {
                    self.anchor = None;
                    self.knob_offset = Vec2::ZERO;
                }
            }
        }

        self.paint(ui, rect);
        events
    }

    fn paint(&self, ui: &Ui, rect: Rect) {
        let opacity = if self.anchor.is_some() {
            1.0
        } else {
            self.options.rest_opacity
        };
        let color = self.options.color.gamma_multiply(opacity);
        let center = rect.center();
        let radius = self.options.size / 2.0;

        let painter = ui.painter_at(rect.expand(2.0));
        painter.circle_filled(center, radius, color.gamma_multiply(0.25));
        painter.circle_stroke(center, radius, Stroke::new(1.5, color));
        painter.circle_filled(center + self.knob_offset, radius / 2.0, color.gamma_multiply(0.6));

        if self.anchor.is_some() {
            ui.ctx().request_repaint();
        }
    }
}

/// Convenience for callers that only hold an `egui::Context`
pub fn color_scheme_of(ctx: &egui::Context) -> ColorScheme {
    if ctx.style().visuals.dark_mode {
        ColorScheme::Dark
    } else {
        ColorScheme::Light
    }
}
