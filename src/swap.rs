//! API library swap-install and restore
//!
//! Before a launch, the game's original EOS SDK library is preserved in
//! a per-(architecture, game id) backup folder and the emulator library
//! is copied over it. The backup is written exactly once: re-installing
//! must never re-save it, or an already-swapped emulator library would
//! later be "restored" as the original, corrupting the game for good.
//!
//! Restore runs from process-exit callbacks with no interactive caller
//! left, so its failures are logged rather than surfaced.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::LauncherError;
use crate::game::{Arch, GameEntry};
use crate::paths::{Layout, api_filename};

pub struct ApiSwap {
    layout: Layout,
    /// Serializes the backup check-then-copy per (architecture, game id)
    /// pair; different pairs install concurrently without coordination
    pair_locks: Mutex<HashMap<(Arch, String), Arc<Mutex<()>>>>,
}

impl ApiSwap {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            pair_locks: Mutex::new(HashMap::new()),
        }
    }

    fn pair_lock(&self, arch: Arch, app_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.pair_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry((arch, app_id.to_string()))
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Back up the game's original library (first install only) and copy
    /// the emulator library over it. Safe to call repeatedly.
    pub fn install(&self, game: &GameEntry) -> Result<(), LauncherError> {
        if game.app_id.is_empty() {
            return Err(LauncherError::MissingField("app_id"));
        }
        if game.app_name.is_empty() {
            return Err(LauncherError::MissingField("app_name"));
        }
        if game.exe_path().as_os_str().is_empty() || !game.exe_path().is_file() {
            return Err(LauncherError::InvalidField {
                field: "exe_path",
                reason: format!("not found: {}", game.exe_path().display()),
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
        if !game.api_path().is_file() {
            return Err(LauncherError::InvalidField {
                field: "api_path",
                reason: format!("not found: {}", game.api_path().display()),
            });
        }

        let lock = self.pair_lock(game.arch, &game.app_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let backup_dir = self.layout.backup_dir(game.arch, &game.app_id);
        fs::create_dir_all(&backup_dir).map_err(|source| {
            LauncherError::BackupDirCreateFailed {
                path: backup_dir.clone(),
                source,
            }
        })?;

        let backup_file = self.layout.backup_file(game.arch, &game.app_id);
        if !backup_file.exists() {
            // First install for this pair: the current library is the
            // original. Once this copy exists it is never overwritten.
            fs::copy(game.api_path(), &backup_file).map_err(|source| {
                LauncherError::BackupCopyFailed {
                    from: game.api_path().to_path_buf(),
                    to: backup_file.clone(),
                    source,
                }
            })?;
            info!(app_id = %game.app_id, backup = %backup_file.display(), "backed up original api library");
        } else {
            debug!(app_id = %game.app_id, "backup already present, keeping it");
        }

        let emu_file = self.layout.emu_api_file(game.arch);
        fs::copy(&emu_file, game.api_path()).map_err(|source| {
            LauncherError::InstallCopyFailed {
                from: emu_file.clone(),
                to: game.api_path().to_path_buf(),
                source,
            }
        })?;
        info!(app_id = %game.app_id, target = %game.api_path().display(), "installed emulator library");

        Ok(())
    }

    /// Best-effort restore of the preserved original library over the
    /// game's api path. Failures are logged only.
    pub fn restore(&self, game: &GameEntry) {
        let backup_file = self.layout.backup_file(game.arch, &game.app_id);
        match fs::copy(&backup_file, game.api_path()) {
            Ok(_) => {
                info!(app_id = %game.app_id, target = %game.api_path().display(), "restored original api library");
            }
            Err(e) => {
                warn!(
                    app_id = %game.app_id,
                    backup = %backup_file.display(),
                    target = %game.api_path().display(),
                    error = %e,
                    "failed to restore original api library"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        swap: ApiSwap,
        game: GameEntry,
    }

    fn fixture() -> Fixture {
        let root = TempDir::new().unwrap();
        let layout = Layout::new(root.path());

        let emu_dir = layout.emu_api_dir(Arch::X64);
        fs::create_dir_all(&emu_dir).unwrap();
        fs::write(layout.emu_api_file(Arch::X64), b"emulator bytes").unwrap();

        let game_dir = root.path().join("the_game");
        fs::create_dir_all(&game_dir).unwrap();
        let exe = game_dir.join("game.exe");
        fs::write(&exe, b"exe").unwrap();
        let api = game_dir.join(api_filename(Arch::X64));
        fs::write(&api, b"original bytes").unwrap();

        let mut game = GameEntry::new("game1", "Game One");
        game.set_exe_path(&exe);
        game.set_api_path(&api);
        game.start_folder = game_dir;

        Fixture { _root: root, swap: ApiSwap::new(layout), game }
    }

    #[test]
    fn test_install_swaps_library_and_backs_up_original() {
        let f = fixture();
        f.swap.install(&f.game).unwrap();

        assert_eq!(fs::read(f.game.api_path()).unwrap(), b"emulator bytes");
        let backup = f.swap.layout.backup_file(Arch::X64, "game1");
        assert_eq!(fs::read(backup).unwrap(), b"original bytes");
    }

    #[test]
    fn test_second_install_never_overwrites_backup() {
        let f = fixture();
        f.swap.install(&f.game).unwrap();
        // The api path now holds the emulator library; a second install
        // must not capture it as "the original"
        f.swap.install(&f.game).unwrap();

        let backup = f.swap.layout.backup_file(Arch::X64, "game1");
        assert_eq!(fs::read(backup).unwrap(), b"original bytes");
    }

    #[test]
    fn test_install_then_restore_round_trips_library() {
        let f = fixture();
        f.swap.install(&f.game).unwrap();
        f.swap.restore(&f.game);
        assert_eq!(fs::read(f.game.api_path()).unwrap(), b"original bytes");

        // Restore is idempotent
        f.swap.restore(&f.game);
        assert_eq!(fs::read(f.game.api_path()).unwrap(), b"original bytes");
    }

    #[test]
    fn test_install_rejects_wrong_library_name_before_touching_files() {
        let f = fixture();
        let mut game = f.game.clone();
        let bogus = game.start_folder.join("foo.dll");
        fs::write(&bogus, b"bogus").unwrap();
        game.set_api_path(&bogus);

        let err = f.swap.install(&game).unwrap_err();
        assert!(matches!(err, LauncherError::WrongLibraryName { .. }));
        assert!(!f.swap.layout.backup_dir(Arch::X64, "game1").exists());
        assert_eq!(fs::read(&bogus).unwrap(), b"bogus");
    }

    #[test]
    fn test_install_validates_fields() {
        let f = fixture();
        let mut game = f.game.clone();
        game.app_id = String::new();
        assert!(matches!(
            f.swap.install(&game).unwrap_err(),
            LauncherError::MissingField("app_id")
        ));

        let mut game = f.game.clone();
        game.set_exe_path("/does/not/exist");
        assert!(matches!(
            f.swap.install(&game).unwrap_err(),
            LauncherError::InvalidField { field: "exe_path", .. }
        ));
    }

    #[test]
    fn test_restore_without_backup_is_swallowed() {
        let f = fixture();
        // Never installed: no backup exists, restore just logs
        f.swap.restore(&f.game);
        assert_eq!(fs::read(f.game.api_path()).unwrap(), b"original bytes");
    }

    #[test]
    fn test_backups_are_namespaced_per_game() {
        let f = fixture();
        f.swap.install(&f.game).unwrap();

        let game_dir = f.game.start_folder.clone();
        let api2 = game_dir.join(api_filename(Arch::X64));
        fs::write(&api2, b"second original").unwrap();
        let mut game2 = f.game.clone();
        game2.app_id = "game2".to_string();
        f.swap.install(&game2).unwrap();

        assert_eq!(
            fs::read(f.swap.layout.backup_file(Arch::X64, "game1")).unwrap(),
            b"original bytes"
        );
        assert_eq!(
            fs::read(f.swap.layout.backup_file(Arch::X64, "game2")).unwrap(),
            b"second original"
        );
    }
}
