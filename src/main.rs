pub mod config;
pub mod controller;
pub mod mapping;
pub mod mqtt;
pub mod panel;
pub mod persistence;
pub mod ui;

use crate::config::AppSettings;
use crate::mqtt::{MQTTStatus, MqttHandler};
use crate::panel::bridge::ChannelHost;
use crate::panel::{ColorScheme, JoystickPanel};
use crate::persistence::PersistenceWorker;
use crate::ui::VirtualJoystickUI;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const COMMAND_CHANNEL_CAPACITY: usize = 100;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings_path = AppSettings::default_path();
    let settings = AppSettings::load_or_default(&settings_path).await?;
    let state_path = settings.state_path();
    let initial_state = persistence::load_panel_state_or_default(&state_path).await;

    let cancel = CancellationToken::new();

    // MQTT-Bridge starten
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (status_tx, status_rx) = watch::channel(MQTTStatus::default());
    let handler = MqttHandler::new(settings.mqtt.clone(), command_rx, status_tx)
        .map_err(|e| eyre!("Failed to set up MQTT bridge: {}", e))?;
    let mqtt_handle = tokio::spawn(handler.run(cancel.clone()));

    let persistence = PersistenceWorker::spawn(state_path, cancel.clone());

    let scheme = if settings.dark_mode {
        ColorScheme::Dark
    } else {
        ColorScheme::Light
    };
    let host = ChannelHost::new(command_tx, persistence.get_sender());
    let panel = JoystickPanel::mount(host, initial_state, scheme);

    info!("Starting UI");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Virtual Joystick")
            .with_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    let catalog = settings.topics.clone();
    let broker = settings.mqtt.to_string();
    let result = eframe::run_native(
        "Virtual Joystick",
        native_options,
        Box::new(|cc| {
            Ok(Box::new(VirtualJoystickUI::new(
                cc, panel, catalog, broker, status_rx,
            )))
        }),
    );

    // The window owned the host; its channels are closed now and the tasks drain
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, mqtt_handle).await.is_err() {
        warn!("MQTT bridge did not stop in time");
    }
    cancel.cancel();
    persistence.join().await;

    result.map_err(|e| eyre!("eframe error: {}", e))?;
    info!("Application exited normally");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
