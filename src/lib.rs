//! Social Campaign - record or upload a video, fill the form, enter the
//! lucky draw.
//!
//! The crate owns the contest booth's state: camera capture and recording,
//! the upload path, and the entry form with its simulated submission. The
//! optional `desktop` feature wraps it in a Tauri application.

pub mod campaign;
pub mod capture;
pub mod config;
pub mod form;
pub mod links;
pub mod notify;
pub mod recorder;
pub mod upload;
pub mod utils;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(feature = "desktop")]
use commands::campaign::{CampaignState, CAPTURE_EVENT, NOTIFICATION_EVENT};
#[cfg(feature = "desktop")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Forward everything published on `rx` to the webview as `event`
#[cfg(feature = "desktop")]
fn forward_events<T>(
    app: tauri::AppHandle,
    event: &'static str,
    mut rx: tokio::sync::broadcast::Receiver<T>,
) where
    T: Clone + serde::Serialize + Send + 'static,
{
    use tauri::Emitter;
    use tokio::sync::broadcast::error::RecvError;

    tauri::async_runtime::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    if let Err(e) = app.emit(event, payload) {
                        tracing::warn!("Failed to emit {}: {}", event, e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} {} events", skipped, event);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Initialize the application
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "social_campaign=debug,tauri=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Social Campaign v{}", env!("CARGO_PKG_VERSION"));

    let config = config::CampaignConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Using default campaign config: {:#}", e);
        config::CampaignConfig::default()
    });
    let notifications = notify::NotificationCenter::new();
    let campaign = CampaignState::new(config, notifications.clone());
    let capture_rx = campaign.session.blocking_lock().subscribe_capture();
    let notification_rx = notifications.subscribe();

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(campaign)
        .invoke_handler(tauri::generate_handler![
            // Campaign commands
            commands::campaign::get_campaign_state,
            commands::campaign::get_video_criteria,
            commands::campaign::acknowledge_criteria,
            commands::campaign::start_camera,
            commands::campaign::stop_camera,
            commands::campaign::start_recording,
            commands::campaign::push_recording_chunk,
            commands::campaign::stop_recording,
            commands::campaign::read_recorded_video,
            commands::campaign::reset_video,
            commands::campaign::select_file,
            commands::campaign::pick_video_file,
            commands::campaign::update_field,
            commands::campaign::toggle_consent,
            commands::campaign::set_consent,
            commands::campaign::open_social_page,
            commands::campaign::submit_entry,
            commands::campaign::reload_campaign,
            // Device commands
            commands::devices::get_cameras,
            commands::devices::get_audio_devices,
        ])
        .setup(move |app| {
            forward_events(app.handle().clone(), NOTIFICATION_EVENT, notification_rx);
            forward_events(app.handle().clone(), CAPTURE_EVENT, capture_rx);
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
