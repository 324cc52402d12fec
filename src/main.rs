#![forbid(unsafe_code)]

mod assemble;
mod constants;
mod error;
mod game;
mod identity;
mod orchestrator;
mod paths;
mod persistence;
mod profile;
mod swap;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use game::{Arch, GameEntry};
use identity::ProductId;
use orchestrator::Orchestrator;
use paths::Layout;
use persistence::SavedConfig;
use swap::ApiSwap;

#[derive(Parser)]
#[command(
    name = "eos-emu-launcher",
    about = "Configure and launch games under the EOS emulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured games
    List,
    /// Add a game entry
    Add {
        app_id: String,
        app_name: String,
        /// Path to the game executable
        #[arg(long)]
        exe: PathBuf,
        /// Path to the game's EOS SDK library
        #[arg(long)]
        api: PathBuf,
        /// Working directory for the game (defaults to the exe folder)
        #[arg(long)]
        start_folder: Option<PathBuf>,
        /// Target a 32-bit executable
        #[arg(long)]
        x86: bool,
    },
    /// Remove a game entry
    Remove { app_id: String },
    /// Launch a game under the emulator and wait for it to exit
    Launch { app_id: String },
    /// Restore a game's original api library from its backup
    Restore { app_id: String },
    /// Derive an identity from a seed, or generate a random one
    GenId { seed: Option<String> },
    /// Pin the global identity to a hex string, or to a random one
    SetId {
        id: Option<String>,
        #[arg(long, conflicts_with = "id")]
        random: bool,
    },
    /// Print a game's emulator save directory
    SaveDir { app_id: String },
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match Cli::parse().command {
        Commands::List => cmd_list(),
        Commands::Add {
            app_id,
            app_name,
            exe,
            api,
            start_folder,
            x86,
        } => cmd_add(app_id, app_name, exe, api, start_folder, x86),
        Commands::Remove { app_id } => cmd_remove(&app_id),
        Commands::Launch { app_id } => cmd_launch(&app_id),
        Commands::Restore { app_id } => cmd_restore(&app_id),
        Commands::GenId { seed } => cmd_gen_id(seed.as_deref()),
        Commands::SetId { id, random } => cmd_set_id(id.as_deref(), random),
        Commands::SaveDir { app_id } => cmd_save_dir(&app_id),
    }
}

fn find_game(config: &SavedConfig, app_id: &str) -> Result<GameEntry> {
    config
        .find_game(app_id)
        .cloned()
        .with_context(|| format!("No game with id '{app_id}'"))
}

fn cmd_list() -> Result<()> {
    let config = SavedConfig::load()?;
    if config.games.is_empty() {
        println!("no games configured");
        return Ok(());
    }
    for game in &config.games {
        println!(
            "{}  {}  [{}]  {}",
            game.app_id,
            game.app_name,
            match game.arch {
                Arch::X64 => "x64",
                Arch::X86 => "x86",
            },
            game.exe_path().display(),
        );
    }
    Ok(())
}

fn cmd_add(
    app_id: String,
    app_name: String,
    exe: PathBuf,
    api: PathBuf,
    start_folder: Option<PathBuf>,
    x86: bool,
) -> Result<()> {
    let mut config = SavedConfig::load()?;
    if config.find_game(&app_id).is_some() {
        bail!("A game with id '{app_id}' already exists");
    }

    let mut game = GameEntry::new(app_id, app_name);
    game.set_exe_path(&exe);
    game.set_api_path(&api);
    if game.exe_path().as_os_str().is_empty() {
        bail!("Invalid executable path: {}", exe.display());
    }
    game.start_folder = match start_folder {
        Some(folder) => folder,
        None => game
            .exe_path()
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default(),
    };
    if x86 {
        game.arch = Arch::X86;
    }

    info!(app_id = %game.app_id, exe = %game.exe_path().display(), "added game");
    config.games.push(game);
    config.save()
}

fn cmd_remove(app_id: &str) -> Result<()> {
    let mut config = SavedConfig::load()?;
    let before = config.games.len();
    config.games.retain(|g| g.app_id != app_id);
    if config.games.len() == before {
        bail!("No game with id '{app_id}'");
    }
    config.save()
}

fn cmd_launch(app_id: &str) -> Result<()> {
    let mut config = SavedConfig::load()?;
    let game = find_game(&config, app_id)?;

    let orchestrator = Orchestrator::new(Layout::discover()?);
    let launched = orchestrator.start_game(&game, &mut config.global)?;
    if launched.derived_id.is_some() {
        // Keep later launches stable under the same derived identity
        config.save()?;
    }

    info!(pid = launched.pid, "waiting for the game to exit");
    orchestrator.wait_all();
    Ok(())
}

fn cmd_restore(app_id: &str) -> Result<()> {
    let config = SavedConfig::load()?;
    let game = find_game(&config, app_id)?;
    ApiSwap::new(Layout::discover()?).restore(&game);
    Ok(())
}

fn cmd_gen_id(seed: Option<&str>) -> Result<()> {
    let id = match seed {
        Some(seed) => ProductId::from_seed(seed),
        None => ProductId::random(),
    };
    println!("{id}");
    Ok(())
}

fn cmd_set_id(id: Option<&str>, random: bool) -> Result<()> {
    let mut config = SavedConfig::load()?;
    let id = if random {
        ProductId::random()
    } else {
        let raw = id.context("Provide an identity, or pass --random")?;
        ProductId::parse(raw)?
    };
    println!("{id}");
    config.global.product_id = Some(id);
    config.save()
}

fn cmd_save_dir(app_id: &str) -> Result<()> {
    let config = SavedConfig::load()?;
    let game = find_game(&config, app_id)?;

    let effective = game.profile.resolve(&config.global)?;
    let id = effective
        .product_id
        .unwrap_or_else(|| ProductId::from_seed(&effective.username));
    let dir = assemble::resolve_save_dir(&game, &id, &Layout::discover()?)?;
    println!("{}", dir.display());
    Ok(())
}
