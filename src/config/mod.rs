use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::documents::{ActiveDocument, DocumentId};
use crate::viewer::tools::ToolState;
use crate::viewer::{ThemeMode, ZoomLevel};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

fn default_dark_mode() -> bool {
    true
}

/// Reader preferences persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Document shown on the last run; dropped at load if it no longer exists
    #[serde(default)]
    pub active_document: Option<DocumentId>,

    #[serde(default)]
    pub tool: ToolState,

    #[serde(default = "default_dark_mode")]
    pub dark_mode: bool,

    #[serde(default)]
    pub zoom: ZoomLevel,
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            active_document: None,
            tool: ToolState::default(),
            dark_mode: default_dark_mode(),
            zoom: ZoomLevel::default(),
        }
    }
}

impl AppConfigData {
    /// Snapshot of the live preference resources.
    pub fn capture(
        active: &ActiveDocument,
        tool: &ToolState,
        theme: &ThemeMode,
        zoom: &ZoomLevel,
    ) -> Self {
        Self {
            active_document: active.id().cloned(),
            tool: tool.clone(),
            dark_mode: theme.dark,
            zoom: *zoom,
        }
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Result of loading config from disk
struct LoadConfigResult {
    data: AppConfigData,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Load configuration from disk
fn load_config(config_path: &std::path::Path) -> LoadConfigResult {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(config_path) {
            Ok(json) => match serde_json::from_str::<AppConfigData>(&json) {
                Ok(mut data) => {
                    info!("Loaded config from {:?}", config_path);
                    data.tool = data.tool.sanitized();
                    data.zoom = ZoomLevel::new(data.zoom.get());
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        AppConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    LoadConfigResult { data, reset_reason }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                debug!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(&config.config_path);
    config.data = result.data;
    config.dirty = false;

    // Set notification if config was reset due to an error
    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// Startup system pushing the loaded preferences into the live resources
fn apply_preferences(
    config: Res<AppConfig>,
    mut active: ResMut<ActiveDocument>,
    mut tool: ResMut<ToolState>,
    mut theme: ResMut<ThemeMode>,
    mut zoom: ResMut<ZoomLevel>,
) {
    let data = &config.data;
    match &data.active_document {
        Some(id) => active.set(id.clone()),
        None => active.clear(),
    }
    *tool = data.tool.clone();
    theme.dark = data.dark_mode;
    *zoom = data.zoom;
}

/// Mark the config dirty whenever a preference resource diverges from it
fn track_preference_changes(
    active: Res<ActiveDocument>,
    tool: Res<ToolState>,
    theme: Res<ThemeMode>,
    zoom: Res<ZoomLevel>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    if !(active.is_changed() || tool.is_changed() || theme.is_changed() || zoom.is_changed()) {
        return;
    }
    let current = AppConfigData::capture(&active, &tool, &theme, &zoom);
    if current != config.data {
        config.data = current;
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_systems(
                Startup,
                (load_config_system, apply_preferences)
                    .chain()
                    .in_set(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    track_preference_changes,
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}
