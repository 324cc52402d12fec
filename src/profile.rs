//! Two-tier emulator profiles
//!
//! A `GlobalProfile` carries platform-wide defaults for every setting; an
//! `AppProfile` is a per-game override layer where every field may be
//! left alone. Resolution is pure and field-wise: an override value wins,
//! anything else falls back to the global layer.
//!
//! Each override field is an explicit `Unset | Inherit | Value` tagged
//! type. `Unset` (never touched) and `Inherit` (explicitly pinned back to
//! the global value in an editor) resolve identically; they only differ
//! in what gets round-tripped through the saved configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::emu;
use crate::error::LauncherError;
use crate::identity::ProductId;

/// Emulator log verbosity, ordered from silent to most verbose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[default]
    Off,
    Fatal,
    #[serde(rename = "ERR")]
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Off,
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

/// One per-game override slot.
///
/// `Unset` and `Inherit` both fall through to the global layer; the
/// distinction only matters to an editing surface (and survives
/// serialization so it round-trips).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideField<T> {
    #[default]
    Unset,
    Inherit,
    Value(T),
}

impl<T> OverrideField<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            OverrideField::Value(v) => Some(v),
            _ => None,
        }
    }

}

/// Platform-wide defaults, always fully populated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalProfile {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub log_level: LogLevel,
    /// Tri-state at this layer too: `None` falls through to "disabled"
    #[serde(default = "default_flag")]
    pub unlock_entitlements: Option<bool>,
    #[serde(default = "default_flag")]
    pub enable_overlay: Option<bool>,
    /// Primary identity. Left unset until supplied or lazily derived
    /// from the resolved username at first launch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    /// Secondary identity axis (product user id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<ProductId>,
}

fn default_username() -> String {
    "DefaultName".to_string()
}

fn default_language() -> String {
    emu::DEFAULT_LANGUAGE.to_string()
}

fn default_flag() -> Option<bool> {
    Some(false)
}

impl Default for GlobalProfile {
    fn default() -> Self {
        Self {
            username: default_username(),
            language: default_language(),
            log_level: LogLevel::Off,
            unlock_entitlements: default_flag(),
            enable_overlay: default_flag(),
            product_id: None,
            account_id: None,
        }
    }
}

/// Per-game override layer; every field may be left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppProfile {
    #[serde(default)]
    pub username: OverrideField<String>,
    #[serde(default)]
    pub language: OverrideField<String>,
    #[serde(default)]
    pub log_level: OverrideField<LogLevel>,
    #[serde(default)]
    pub unlock_entitlements: OverrideField<bool>,
    #[serde(default)]
    pub enable_overlay: OverrideField<bool>,
    #[serde(default)]
    pub product_id: OverrideField<ProductId>,
    #[serde(default)]
    pub account_id: OverrideField<ProductId>,
}

/// Fully resolved settings for one game
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveProfile {
    pub username: String,
    pub language: String,
    pub log_level: LogLevel,
    pub unlock_entitlements: Option<bool>,
    pub enable_overlay: Option<bool>,
    /// `None` means unresolved at both layers: the caller derives one
    /// from the resolved username and caches it on the global profile.
    pub product_id: Option<ProductId>,
    pub account_id: Option<ProductId>,
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn set_id(id: Option<&ProductId>) -> Option<ProductId> {
    id.filter(|id| !id.is_unset()).cloned()
}

impl AppProfile {
    /// Merge this override layer over the global defaults.
    ///
    /// Pure; the only failure is a username empty at both layers. An
    /// unresolved identity is reported as `None` rather than derived
    /// here, so the caller can materialize and persist it.
    pub fn resolve(&self, global: &GlobalProfile) -> Result<EffectiveProfile, LauncherError> {
        let username = self
            .username
            .value()
            .and_then(|s| non_blank(s))
            .or_else(|| non_blank(&global.username))
            .ok_or(LauncherError::MissingField("username"))?
            .to_string();

        let language = self
            .language
            .value()
            .and_then(|s| non_blank(s))
            .or_else(|| non_blank(&global.language))
            .unwrap_or_default()
            .to_string();

        Ok(EffectiveProfile {
            username,
            language,
            log_level: self.log_level.value().copied().unwrap_or(global.log_level),
            unlock_entitlements: self
                .unlock_entitlements
                .value()
                .copied()
                .or(global.unlock_entitlements),
            enable_overlay: self.enable_overlay.value().copied().or(global.enable_overlay),
            product_id: set_id(self.product_id.value()).or_else(|| set_id(global.product_id.as_ref())),
            account_id: set_id(self.account_id.value()).or_else(|| set_id(global.account_id.as_ref())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> GlobalProfile {
        GlobalProfile {
            username: "GlobalName".to_string(),
            language: "english".to_string(),
            log_level: LogLevel::Warn,
            unlock_entitlements: Some(false),
            enable_overlay: Some(true),
            product_id: None,
            account_id: None,
        }
    }

    #[test]
    fn test_resolve_override_wins() {
        let profile = AppProfile {
            username: OverrideField::Value("PerGame".to_string()),
            language: OverrideField::Value("french".to_string()),
            log_level: OverrideField::Value(LogLevel::Trace),
            unlock_entitlements: OverrideField::Value(true),
            enable_overlay: OverrideField::Value(false),
            product_id: OverrideField::Value(ProductId::parse("deadbeef").unwrap()),
            account_id: OverrideField::Unset,
        };

        let effective = profile.resolve(&global()).unwrap();
        assert_eq!(effective.username, "PerGame");
        assert_eq!(effective.language, "french");
        assert_eq!(effective.log_level, LogLevel::Trace);
        assert_eq!(effective.unlock_entitlements, Some(true));
        assert_eq!(effective.enable_overlay, Some(false));
        assert_eq!(effective.product_id.unwrap().as_str(), "deadbeef");
    }

    #[test]
    fn test_resolve_falls_back_to_global() {
        let effective = AppProfile::default().resolve(&global()).unwrap();
        assert_eq!(effective.username, "GlobalName");
        assert_eq!(effective.language, "english");
        assert_eq!(effective.log_level, LogLevel::Warn);
        assert_eq!(effective.unlock_entitlements, Some(false));
        assert_eq!(effective.enable_overlay, Some(true));
        assert_eq!(effective.product_id, None);
        assert_eq!(effective.account_id, None);
    }

    #[test]
    fn test_resolve_inherit_behaves_like_unset() {
        let profile = AppProfile {
            username: OverrideField::Inherit,
            enable_overlay: OverrideField::Inherit,
            ..AppProfile::default()
        };
        let effective = profile.resolve(&global()).unwrap();
        assert_eq!(effective.username, "GlobalName");
        assert_eq!(effective.enable_overlay, Some(true));
    }

    #[test]
    fn test_resolve_missing_username_at_both_layers() {
        let mut g = global();
        g.username = "   ".to_string();
        let err = AppProfile::default().resolve(&g).unwrap_err();
        assert!(matches!(err, LauncherError::MissingField("username")));
    }

    #[test]
    fn test_resolve_flags_unset_at_both_layers_stay_unset() {
        let mut g = global();
        g.unlock_entitlements = None;
        g.enable_overlay = None;
        let effective = AppProfile::default().resolve(&g).unwrap();
        assert_eq!(effective.unlock_entitlements, None);
        assert_eq!(effective.enable_overlay, None);
    }

    #[test]
    fn test_resolve_blank_override_id_falls_through() {
        // An empty-string id is the "unset" sentinel even when wrapped
        // in an explicit Value
        let mut g = global();
        g.product_id = Some(ProductId::parse("abcd").unwrap());
        let profile = AppProfile {
            product_id: OverrideField::Value(ProductId::default()),
            ..AppProfile::default()
        };
        let effective = profile.resolve(&g).unwrap();
        assert_eq!(effective.product_id.unwrap().as_str(), "abcd");
    }

    #[test]
    fn test_log_level_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
        }
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!("err".parse::<LogLevel>().unwrap(), LogLevel::Error);
    }

    #[test]
    fn test_override_field_serde_round_trip() {
        let fields = [
            OverrideField::Unset,
            OverrideField::Inherit,
            OverrideField::Value("french".to_string()),
        ];
        for field in fields {
            let json = serde_json::to_string(&field).unwrap();
            let back: OverrideField<String> = serde_json::from_str(&json).unwrap();
            assert_eq!(back, field);
        }
        // Unset and Inherit serialize distinctly
        assert_ne!(
            serde_json::to_string(&OverrideField::<String>::Unset).unwrap(),
            serde_json::to_string(&OverrideField::<String>::Inherit).unwrap(),
        );
    }
}
