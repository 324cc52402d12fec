//! Launcher-adjacent filesystem layout
//!
//! The emulator ships one subfolder per target architecture next to the
//! launcher binary, each holding the platform's emulator library; backups
//! of original game libraries live in per-game subfolders of the same
//! architecture folder.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::constants::emu;
use crate::game::Arch;

/// Name of the EOS SDK library the game links against on this platform
pub fn api_filename(arch: Arch) -> &'static str {
    if cfg!(target_os = "windows") {
        match arch {
            Arch::X64 => "EOSSDK-Win64-Shipping.dll",
            Arch::X86 => "EOSSDK-Win32-Shipping.dll",
        }
    } else if cfg!(target_os = "macos") {
        "libEOSSDK-Mac-Shipping.dylib"
    } else {
        "libEOSSDK-Linux-Shipping.so"
    }
}

fn arch_dir(arch: Arch) -> &'static str {
    if cfg!(target_os = "windows") {
        match arch {
            Arch::X64 => "win64",
            Arch::X86 => "win32",
        }
    } else if cfg!(target_os = "macos") {
        "macosx"
    } else {
        match arch {
            Arch::X64 => "linux64",
            Arch::X86 => "linux32",
        }
    }
}

/// Filesystem layout rooted at the launcher directory
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted next to the running launcher binary
    pub fn discover() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate the launcher binary")?;
        let root = exe
            .parent()
            .context("Launcher binary has no parent directory")?
            .to_path_buf();
        Ok(Self::new(root))
    }

    /// Architecture folder holding the emulator library
    pub fn emu_api_dir(&self, arch: Arch) -> PathBuf {
        self.root.join(arch_dir(arch))
    }

    /// The emulator library itself
    pub fn emu_api_file(&self, arch: Arch) -> PathBuf {
        self.emu_api_dir(arch).join(api_filename(arch))
    }

    /// Launcher-owned save root used when a game has no save path
    pub fn games_dir(&self) -> PathBuf {
        self.root.join(emu::GAMES_DIR)
    }

    /// Backup folder for one (architecture, game id) pair
    pub fn backup_dir(&self, arch: Arch, app_id: &str) -> PathBuf {
        self.emu_api_dir(arch).join(app_id)
    }

    /// Preserved original library for one (architecture, game id) pair
    pub fn backup_file(&self, arch: Arch, app_id: &str) -> PathBuf {
        self.backup_dir(arch, app_id).join(api_filename(arch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_layout_paths_nest_under_arch_dir() {
        let layout = Layout::new("/opt/launcher");
        let dir = layout.emu_api_dir(Arch::X64);
        assert_eq!(dir.parent().unwrap(), Path::new("/opt/launcher"));

        let file = layout.emu_api_file(Arch::X64);
        assert_eq!(file.parent().unwrap(), dir);
        assert_eq!(file.file_name().unwrap(), api_filename(Arch::X64));

        let backup = layout.backup_file(Arch::X64, "game1");
        assert_eq!(backup.parent().unwrap(), dir.join("game1"));
        assert_eq!(backup.file_name().unwrap(), api_filename(Arch::X64));
    }

    #[test]
    fn test_games_dir_is_next_to_launcher() {
        let layout = Layout::new("/opt/launcher");
        assert_eq!(layout.games_dir(), Path::new("/opt/launcher/games"));
    }
}
