//! Managed game entries
//!
//! A `GameEntry` is one configured external application the launcher can
//! start under the emulator: its catalog id, display name, filesystem
//! paths, target architecture, supported languages, environment
//! overrides and per-game profile.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::launch;
use crate::identity::ProductId;
use crate::profile::{AppProfile, EffectiveProfile};

/// Target architecture of the game executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
    X64,
}

/// One environment variable override applied at launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEntry {
    /// Caller-supplied stable id (catalog id)
    pub app_id: String,
    pub app_name: String,
    /// Random 128-bit hex used for shortcut addressing
    #[serde(default = "new_guid")]
    pub guid: String,
    /// Absolute, or empty when never set / normalization failed
    #[serde(default)]
    exe_path: PathBuf,
    /// Path to the game's real EOS SDK library; same normalization rule
    #[serde(default)]
    api_path: PathBuf,
    #[serde(default)]
    pub start_folder: PathBuf,
    /// Empty → launcher-owned games dir; `"appdata"` → OS user-data
    /// root; anything else → relative to `start_folder`
    #[serde(default)]
    pub save_path: String,
    #[serde(default = "default_arch")]
    pub arch: Arch,
    /// At least one entry
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,
    /// Launch-argument override; blank means "use generated defaults"
    #[serde(default)]
    pub parameters: String,
    #[serde(default)]
    pub disable_online_networking: bool,
    #[serde(default)]
    pub profile: AppProfile,
}

fn new_guid() -> String {
    ProductId::random().as_str().to_string()
}

fn default_arch() -> Arch {
    Arch::X64
}

fn default_languages() -> Vec<String> {
    vec![crate::constants::emu::DEFAULT_LANGUAGE.to_string()]
}

impl GameEntry {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
            guid: new_guid(),
            exe_path: PathBuf::new(),
            api_path: PathBuf::new(),
            start_folder: PathBuf::new(),
            save_path: String::new(),
            arch: default_arch(),
            languages: default_languages(),
            env_vars: Vec::new(),
            parameters: String::new(),
            disable_online_networking: false,
            profile: AppProfile::default(),
        }
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }

    pub fn api_path(&self) -> &Path {
        &self.api_path
    }

    /// Set the executable path, normalized to absolute form.
    /// Cleared to empty when normalization fails, never left relative.
    pub fn set_exe_path(&mut self, path: impl AsRef<Path>) {
        self.exe_path = normalize(path.as_ref());
    }

    /// Same normalization rule as [`Self::set_exe_path`]
    pub fn set_api_path(&mut self, path: impl AsRef<Path>) {
        self.api_path = normalize(path.as_ref());
    }

    /// Arguments passed to the game: the per-game override when present,
    /// else the generated defaults with the fixed auth placeholders and
    /// the resolved identity values.
    pub fn launch_args(&self, effective: &EffectiveProfile) -> Vec<String> {
        if !self.parameters.trim().is_empty() {
            return self.parameters.split_whitespace().map(str::to_string).collect();
        }
        self.default_args(effective)
    }

    fn default_args(&self, effective: &EffectiveProfile) -> Vec<String> {
        let id = effective
            .product_id
            .clone()
            .unwrap_or_else(|| ProductId::from_seed(&effective.username));
        vec![
            launch::AUTH_LOGIN.to_string(),
            launch::AUTH_PASSWORD.to_string(),
            launch::AUTH_TYPE.to_string(),
            format!("-epicapp={}", self.app_id),
            launch::EPIC_ENV.to_string(),
            launch::EPIC_PORTAL.to_string(),
            format!("-epicusername={}", effective.username),
            format!("-epicuserid={id}"),
        ]
    }
}

fn normalize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_default()
}
