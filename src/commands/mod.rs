//! Tauri command handlers
//!
//! IPC command handlers the webview calls via Tauri's invoke system.

pub mod campaign;
pub mod devices;
