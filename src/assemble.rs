//! Emulator settings assembly
//!
//! Turns a game entry plus its resolved profile into the flat settings
//! document the emulator library reads at process start. Validation
//! fails fast, in a fixed order, naming the offending field; nothing is
//! written to disk until every check has passed.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::emu;
use crate::error::LauncherError;
use crate::game::GameEntry;
use crate::identity::ProductId;
use crate::paths::{Layout, api_filename};
use crate::profile::EffectiveProfile;

/// Flat key/value settings consumed by the injected emulator library.
/// Field order is the serialization order.
#[derive(Debug, Clone, Serialize)]
pub struct EmuSettings {
    pub language: String,
    pub log_level: String,
    pub username: String,
    pub epic_id: String,
    pub productuserid: String,
    pub appid: String,
    pub gamename: String,
    pub savepath: String,
    /// Comma-joined supported language codes
    pub languages: String,
    pub disable_online_networking: bool,
    pub enable_overlay: bool,
    pub unlock_dlcs: bool,
}

impl EmuSettings {
    /// Validate and assemble the settings for one launch.
    ///
    /// The effective profile must already carry a materialized primary
    /// identity; resolution reports `None` for the caller to derive one
    /// first.
    pub fn assemble(
        game: &GameEntry,
        effective: &EffectiveProfile,
        layout: &Layout,
    ) -> Result<Self, LauncherError> {
        let emu_dir = layout.emu_api_dir(game.arch);
        if !emu_dir.is_dir() {
            return Err(LauncherError::InvalidField {
                field: "emulator_folder",
                reason: format!("not found: {}", emu_dir.display()),
            });
        }

        let emu_file = layout.emu_api_file(game.arch);
        if !emu_file.is_file() {
            return Err(LauncherError::InvalidField {
                field: "emulator_library",
                reason: format!("not found: {}", emu_file.display()),
            });
        }

        let expected = api_filename(game.arch);
        let found = game
            .api_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if found != expected {
            return Err(LauncherError::WrongLibraryName {
                expected: expected.to_string(),
                found,
            });
        }

        if effective.language.is_empty() {
            return Err(LauncherError::MissingField("language"));
        }
        if effective.username.is_empty() {
            return Err(LauncherError::MissingField("username"));
        }

        let epic_id = match &effective.product_id {
            Some(id) if !id.is_unset() => id.clone(),
            _ => return Err(LauncherError::MissingField("epic_id")),
        };

        if game.app_id.is_empty() {
            return Err(LauncherError::MissingField("app_id"));
        }
        if game.app_name.is_empty() {
            return Err(LauncherError::MissingField("app_name"));
        }
        // At least one supported language code, even for hand-edited
        // configs that bypass the entry defaults
        if game.languages.iter().all(|l| l.trim().is_empty()) {
            return Err(LauncherError::MissingField("languages"));
        }

        let save_dir = resolve_save_dir(game, &epic_id, layout)?;
        fs::create_dir_all(&save_dir).map_err(|source| LauncherError::SaveDirCreateFailed {
            path: save_dir.clone(),
            source,
        })?;

        // Secondary identity axis: stable even when never configured
        let productuserid = effective.account_id.clone().unwrap_or_else(|| {
            let derived = ProductId::from_seed(&format!("{}{}", game.app_name, epic_id));
            debug!(app_id = %game.app_id, id = %derived, "derived product user id");
            derived
        });

        Ok(Self {
            language: effective.language.clone(),
            log_level: effective.log_level.to_string(),
            username: effective.username.clone(),
            epic_id: epic_id.to_string(),
            productuserid: productuserid.to_string(),
            appid: game.app_id.clone(),
            gamename: game.app_name.clone(),
            savepath: save_dir.to_string_lossy().into_owned(),
            languages: game.languages.join(","),
            disable_online_networking: game.disable_online_networking,
            enable_overlay: effective.enable_overlay.unwrap_or(false),
            unlock_dlcs: effective.unlock_entitlements.unwrap_or(false),
        })
    }

    /// Rewrite (never merge) the fixed-name settings file next to the
    /// game executable.
    pub fn write_beside(&self, exe_path: &Path) -> Result<PathBuf, LauncherError> {
        let dir = exe_path.parent().unwrap_or_else(|| Path::new("."));
        let path = dir.join(emu::SETTINGS_FILENAME);
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            LauncherError::SettingsWriteFailed {
                path: path.clone(),
                source: source.into(),
            }
        })?;
        fs::write(&path, json).map_err(|source| LauncherError::SettingsWriteFailed {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote emulator settings");
        Ok(path)
    }
}

/// Emulator save directory for one game: save root per the three-rule
/// save-path field, then `<namespace>/<product id>/<app id>`.
pub fn resolve_save_dir(
    game: &GameEntry,
    product_id: &ProductId,
    layout: &Layout,
) -> Result<PathBuf, LauncherError> {
    let raw = game.save_path.trim();
    let root = if raw.is_empty() {
        layout.games_dir()
    } else if raw == emu::SAVE_PATH_APPDATA {
        dirs::data_dir().ok_or(LauncherError::InvalidField {
            field: "save_path",
            reason: "no user data directory on this platform".to_string(),
        })?
    } else {
        game.start_folder.join(raw)
    };

    Ok(root
        .join(emu::SAVE_NAMESPACE)
        .join(product_id.as_str())
        .join(&game.app_id))
}
