//! # UI Common Components
//!
//! Shared colors and small helpers for the panel window.

use eframe::egui::{Color32, Theme};

use crate::mqtt::ConnectionState;
use crate::panel::ColorScheme;

/// Fixed status colors; everything else follows the egui theme
pub struct UiColors;

impl UiColors {
    /// Border color for component separation (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Connected / valid (RGB: 50, 200, 20)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Disconnected / validation errors (RGB: 200, 50, 20)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);

    /// Connecting or reconnecting (RGB: 220, 160, 20)
    pub const PENDING: Color32 = Color32::from_rgb(220, 160, 20);
}

pub fn connection_color(state: &ConnectionState) -> Color32 {
    match state {
        ConnectionState::Connected => UiColors::ACTIVE,
        ConnectionState::Connecting | ConnectionState::Reconnecting => UiColors::PENDING,
        ConnectionState::Disconnected | ConnectionState::Failed => UiColors::INACTIVE,
    }
}

pub fn theme_for(scheme: ColorScheme) -> Theme {
    match scheme {
        ColorScheme::Light => Theme::Light,
        ColorScheme::Dark => Theme::Dark,
    }
}

pub fn toggled(scheme: ColorScheme) -> ColorScheme {
    match scheme {
        ColorScheme::Light => ColorScheme::Dark,
        ColorScheme::Dark => ColorScheme::Light,
    }
}
