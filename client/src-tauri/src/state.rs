use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tauri::{AppHandle, Emitter, Manager};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, warn};

use feed_gateway::config::FeedConfig;
use feed_render::ui::UiState;
use feed_render::{FeedPipeline, FeedView, RenderContext};
use feed_store::SettingsStore;
use feed_types::events::{FEED_UPDATED_EVENT, NEW_MESSAGE_EVENT};

const SETTINGS_FILE: &str = "settings.db";

// ---------------------------------------------------------------------------
// Managed State
// ---------------------------------------------------------------------------

/// Tauri managed state, shared by every command.
pub struct FeedState {
    pub store: SettingsStore,
    pipeline: Mutex<FeedPipeline>,
    ui: Mutex<UiState>,
}

impl FeedState {
    pub fn new(store: SettingsStore) -> Self {
        let pipeline = FeedPipeline::from_store(&store);
        Self {
            store,
            pipeline: Mutex::new(pipeline),
            ui: Mutex::new(UiState::default()),
        }
    }

    pub fn pipeline(&self) -> Result<MutexGuard<'_, FeedPipeline>, String> {
        self.pipeline.lock().map_err(|e| e.to_string())
    }

    pub fn ui(&self) -> Result<MutexGuard<'_, UiState>, String> {
        self.ui.lock().map_err(|e| e.to_string())
    }

    pub fn render(&self) -> Result<FeedView, String> {
        Ok(self.pipeline()?.render(&RenderContext::local()))
    }
}

/// Open the settings database, falling back to a volatile store so the
/// window still comes up when the file is unusable.
pub fn open_store(app: &AppHandle, config: &FeedConfig) -> anyhow::Result<SettingsStore> {
    let path = match &config.settings_path {
        Some(path) => path.clone(),
        None => default_settings_path(app),
    };

    match SettingsStore::open(&path) {
        Ok(store) => Ok(store),
        Err(e) => {
            error!(
                "Failed to open settings at {}: {:#}; changes will not persist",
                path.display(),
                e
            );
            SettingsStore::open_in_memory()
        }
    }
}

fn default_settings_path(app: &AppHandle) -> PathBuf {
    match app.path().app_config_dir() {
        Ok(dir) => dir.join(SETTINGS_FILE),
        Err(e) => {
            warn!("No app config dir ({}), using working directory", e);
            PathBuf::from(SETTINGS_FILE)
        }
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Drain the listener's channel into the pipeline, in arrival order, and
/// notify the webview.
pub async fn pump_messages(app: AppHandle, mut rx: UnboundedReceiver<Value>) {
    while let Some(payload) = rx.recv().await {
        let state = app.state::<FeedState>();
        let accepted = match state.pipeline() {
            Ok(mut pipeline) => pipeline.ingest(payload.clone()),
            Err(e) => {
                error!("Feed pipeline unavailable: {}", e);
                continue;
            }
        };

        if let Err(e) = app.emit(NEW_MESSAGE_EVENT, &payload) {
            warn!("Failed to emit {}: {}", NEW_MESSAGE_EVENT, e);
        }
        if accepted {
            notify_feed_updated(&app);
        }
    }
}

pub fn notify_feed_updated(app: &AppHandle) {
    if let Err(e) = app.emit(FEED_UPDATED_EVENT, ()) {
        warn!("Failed to emit {}: {}", FEED_UPDATED_EVENT, e);
    }
}
