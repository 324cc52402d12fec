//! Application-wide constants
//!
//! This module contains the magic strings and file names used throughout
//! the launcher, providing a single source of truth for constant values.

/// Saved launcher configuration location
pub mod config {
    /// Subdirectory under the user config dir
    pub const APP_DIR: &str = "eos-emu-launcher";

    /// Saved configuration file (game list + global profile)
    pub const FILENAME: &str = "launcher.json";
}

/// Emulator file layout and naming
pub mod emu {
    /// Fixed-name settings file the emulator library reads, written
    /// next to the game executable on every launch
    pub const SETTINGS_FILENAME: &str = "EpicOnlineEmu.json";

    /// Namespace segment prepended to every emulator save folder
    pub const SAVE_NAMESPACE: &str = "EpicOnlineEmu";

    /// Save-path sentinel meaning "use the OS per-user data directory"
    pub const SAVE_PATH_APPDATA: &str = "appdata";

    /// Subfolder of the launcher directory holding launcher-owned saves
    pub const GAMES_DIR: &str = "games";

    /// Language used for newly created game entries
    pub const DEFAULT_LANGUAGE: &str = "english";
}

/// Literals for the generated default launch arguments
pub mod launch {
    pub const AUTH_LOGIN: &str = "-AUTH_LOGIN=unused";

    pub const AUTH_PASSWORD: &str = "-AUTH_PASSWORD=cdcdcdcdcdcdcdcdcdcdcdcdcdcdcdcd";

    pub const AUTH_TYPE: &str = "-AUTH_TYPE=exchangecode";

    pub const EPIC_ENV: &str = "-epicenv=Prod";

    pub const EPIC_PORTAL: &str = "-EpicPortal";
}
