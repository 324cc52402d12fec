//! Launch pipeline and live-process tracking
//!
//! `start_game` runs the whole launch sequence: resolve the profile,
//! materialize a missing identity, assemble and write the emulator
//! settings, swap in the emulator library, then spawn the game. Each
//! spawned process gets a watcher thread that waits for it to exit (any
//! exit code, including crashes) and restores the original library.
//!
//! The pid→entry map is shared between the launch path and the watcher
//! threads; the launch path holds its lock across spawn+insert so a
//! fast-exiting process can never race its own registration.

use std::collections::HashMap;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

use crate::assemble::EmuSettings;
use crate::error::LauncherError;
use crate::game::GameEntry;
use crate::identity::ProductId;
use crate::paths::Layout;
use crate::profile::GlobalProfile;
use crate::swap::ApiSwap;

/// Outcome of a successful launch
#[derive(Debug)]
pub struct Launched {
    pub pid: u32,
    /// Set when the primary identity was derived this launch and cached
    /// onto the global profile; the caller should persist the profile
    pub derived_id: Option<ProductId>,
}

pub struct Orchestrator {
    layout: Layout,
    swap: Arc<ApiSwap>,
    running: Arc<Mutex<HashMap<u32, GameEntry>>>,
    watchers: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(layout: Layout) -> Self {
        Self {
            swap: Arc::new(ApiSwap::new(layout.clone())),
            layout,
            running: Arc::new(Mutex::new(HashMap::new())),
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Run the full launch sequence for one game.
    ///
    /// Validation and install failures abort before any process is
    /// spawned; a spawn failure restores the library immediately, so a
    /// failed launch leaves no partial state behind.
    pub fn start_game(
        &self,
        game: &GameEntry,
        global: &mut GlobalProfile,
    ) -> Result<Launched, LauncherError> {
        let mut effective = game.profile.resolve(global)?;

        let mut derived_id = None;
        if effective.product_id.is_none() {
            let derived = ProductId::from_seed(&effective.username);
            info!(username = %effective.username, id = %derived, "derived identity from username");
            global.product_id = Some(derived.clone());
            effective.product_id = Some(derived.clone());
            derived_id = Some(derived);
        }

        let settings = EmuSettings::assemble(game, &effective, &self.layout)?;
        settings.write_beside(game.exe_path())?;

        self.swap.install(game)?;

        let args = game.launch_args(&effective);
        let pid = match self.spawn(game, &args) {
            Ok(pid) => pid,
            Err(e) => {
                // Nothing is running: undo the swap right away
                self.swap.restore(game);
                return Err(e);
            }
        };

        info!(app_id = %game.app_id, pid, "game started");
        Ok(Launched { pid, derived_id })
    }

    fn spawn(&self, game: &GameEntry, args: &[String]) -> Result<u32, LauncherError> {
        let mut cmd = Command::new(game.exe_path());
        cmd.args(args);
        if !game.start_folder.as_os_str().is_empty() {
            cmd.current_dir(&game.start_folder);
        }
        for var in &game.env_vars {
            cmd.env(&var.key, &var.value);
        }

        // Hold the map lock across spawn+insert: the watcher thread
        // takes the same lock on exit, so the pid is always registered
        // before the exit path can look it up.
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        let mut child = cmd.spawn().map_err(|source| LauncherError::SpawnFailed {
            exe: game.exe_path().to_path_buf(),
            source,
        })?;
        let pid = child.id();
        running.insert(pid, game.clone());
        drop(running);

        let running = Arc::clone(&self.running);
        let swap = Arc::clone(&self.swap);
        let handle = thread::spawn(move || {
            match child.wait() {
                Ok(status) => info!(pid, status = %status, "game exited"),
                Err(e) => error!(pid, error = %e, "failed to wait for game process"),
            }

            let entry = running.lock().unwrap_or_else(|e| e.into_inner()).remove(&pid);
            match entry {
                Some(game) => swap.restore(&game),
                // Should not happen: registration precedes the watcher
                None => warn!(pid, "exited process was not in the live map"),
            }
        });
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);

        Ok(pid)
    }

    /// Number of processes currently tracked
    pub fn running_count(&self) -> usize {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Block until every launched process has exited and its library
    /// has been restored
    pub fn wait_all(&self) {
        loop {
            let handle = self
                .watchers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop();
            match handle {
                Some(h) => {
                    if h.join().is_err() {
                        error!("watcher thread panicked");
                    }
                }
                None => break,
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::game::Arch;
    use crate::paths::api_filename;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        orch: Orchestrator,
        global: GlobalProfile,
        game: GameEntry,
    }

    /// Full launch fixture: emulator layout plus a game whose
    /// "executable" is a copy of /bin/sh so it really runs and exits
    fn fixture(app_id: &str) -> Fixture {
        let root = TempDir::new().unwrap();
        let layout = Layout::new(root.path());

        let emu_dir = layout.emu_api_dir(Arch::X64);
        fs::create_dir_all(&emu_dir).unwrap();
        fs::write(layout.emu_api_file(Arch::X64), b"emulator bytes").unwrap();

        let game_dir = root.path().join(app_id);
        fs::create_dir_all(&game_dir).unwrap();
        let exe = game_dir.join("sh");
        fs::copy("/bin/sh", &exe).unwrap();
        let api = game_dir.join(api_filename(Arch::X64));
        fs::write(&api, b"original bytes").unwrap();

        let mut game = GameEntry::new(app_id, "Test Game");
        game.set_exe_path(&exe);
        game.set_api_path(&api);
        game.start_folder = game_dir;
        game.parameters = "-c true".to_string();

        Fixture {
            _root: root,
            orch: Orchestrator::new(layout),
            global: GlobalProfile::default(),
            game,
        }
    }

    #[test]
    fn test_launch_tracks_and_restores_on_exit() {
        let mut f = fixture("game1");
        let launched = f.orch.start_game(&f.game, &mut f.global).unwrap();
        assert!(launched.pid > 0);

        f.orch.wait_all();
        assert_eq!(f.orch.running_count(), 0);
        // Exit callback restored the original library
        assert_eq!(fs::read(f.game.api_path()).unwrap(), b"original bytes");
    }

    #[test]
    fn test_launch_derives_and_caches_identity() {
        let mut f = fixture("game1");
        f.global.username = "Alice".to_string();
        f.global.product_id = None;

        let launched = f.orch.start_game(&f.game, &mut f.global).unwrap();
        let expected = ProductId::from_seed("Alice");
        assert_eq!(launched.derived_id.as_ref(), Some(&expected));
        assert_eq!(f.global.product_id.as_ref(), Some(&expected));

        f.orch.wait_all();

        // Cached identity: a second launch derives nothing
        let launched = f.orch.start_game(&f.game, &mut f.global).unwrap();
        assert!(launched.derived_id.is_none());
        f.orch.wait_all();
    }

    #[test]
    fn test_concurrent_launches_do_not_cross_contaminate() {
        let mut f1 = fixture("game1");
        let f2 = fixture("game2");

        // Both games run under the same orchestrator
        let launched1 = f1.orch.start_game(&f1.game, &mut f1.global).unwrap();
        let launched2 = f1.orch.start_game(&f2.game, &mut f1.global).unwrap();
        assert_ne!(launched1.pid, launched2.pid);

        f1.orch.wait_all();
        assert_eq!(f1.orch.running_count(), 0);
        assert_eq!(fs::read(f1.game.api_path()).unwrap(), b"original bytes");
        assert_eq!(fs::read(f2.game.api_path()).unwrap(), b"original bytes");
    }

    #[test]
    fn test_spawn_failure_restores_library_and_reports() {
        let mut f = fixture("game1");
        // Strip the execute bit so spawn fails after a successful swap
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(f.game.exe_path(), fs::Permissions::from_mode(0o644)).unwrap();

        let err = f.orch.start_game(&f.game, &mut f.global).unwrap_err();
        assert!(matches!(err, LauncherError::SpawnFailed { .. }));
        assert_eq!(f.orch.running_count(), 0);
        assert_eq!(fs::read(f.game.api_path()).unwrap(), b"original bytes");
    }

    #[test]
    fn test_validation_failure_aborts_before_any_swap() {
        let mut f = fixture("game1");
        f.game.app_name = String::new();
        // app_name fails inside assemble, before install runs
        let err = f.orch.start_game(&f.game, &mut f.global).unwrap_err();
        assert!(matches!(err, LauncherError::MissingField("app_name")));
        assert_eq!(fs::read(f.game.api_path()).unwrap(), b"original bytes");
        assert_eq!(f.orch.running_count(), 0);
    }
}
