//! codealarm - an alarm clock you can only silence by solving a coding problem
//!
//! When an alarm fires, the ringing screen stays up (with sound) until the
//! user's solved-problem count, as reported by a progress service, has gone
//! up since the alarm started.
//!
//! The TUI runs by default; the `login`, `logout`, `whoami`, `status` and
//! `config` subcommands work without it.

pub mod alarm;
pub mod challenge;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod service;
pub mod signal;
pub mod storage;
pub mod timer;
pub mod tui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use yansi::Paint;

use cli::{Cli, Commands, ConfigArgs, RunArgs};
use config::Config;
use error::{ExitCode, NotLoggedIn};
use identity::{Identity, IdentityStore};
use logging::LogTarget;
use service::{HttpProgressClient, ProgressService};
use storage::STORE_FILE_NAME;
use tui::{App, AppSettings, RunContext, Theme, TuiError};

/// Log file name inside the storage directory.
pub const LOG_FILE_NAME: &str = "codealarm.log";

/// Run the command described by `cli`.
///
/// Returns the exit code for normal outcomes (including an interrupted
/// TUI). Errors carry enough type information for
/// [`ExitCode::for_error`] to classify them.
pub fn run_app(mut cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let command = cli
        .command
        .take()
        .unwrap_or_else(|| Commands::Run(RunArgs::default()));

    let mut config = Config::load(cli.config.as_deref());
    if let Some(url) = &cli.base_url {
        config.service.base_url = url.clone();
    }

    let target = match (&cli.log_file, &command) {
        (Some(path), _) => LogTarget::File(path.clone()),
        // stderr belongs to the TUI while it runs
        (None, Commands::Run(_)) => match config.storage_dir() {
            Ok(dir) => LogTarget::File(dir.join(LOG_FILE_NAME)),
            Err(_) => LogTarget::File(std::env::temp_dir().join(LOG_FILE_NAME)),
        },
        (None, _) => LogTarget::Stderr,
    };
    logging::init_logging(cli.verbose, cli.quiet, target);
    log::debug!("Effective config: {:?}", config);

    match command {
        Commands::Run(args) => run_alarm_clock(&config, args),
        Commands::Login(args) => login(&config, &args.username),
        Commands::Logout => logout(&config),
        Commands::Whoami => whoami(&config),
        Commands::Status => status(&config),
        Commands::Config(args) => show_config(&config, &cli, &args),
    }
}

fn open_identity_store(config: &Config) -> Result<IdentityStore> {
    let path = config.storage_dir()?.join(STORE_FILE_NAME);
    IdentityStore::open(&path)
        .with_context(|| format!("Failed to open identity store at {}", path.display()))
}

fn build_client(config: &Config) -> Result<HttpProgressClient> {
    HttpProgressClient::new(&config.service.base_url, config.request_timeout())
        .with_context(|| format!("Invalid service URL '{}'", config.service.base_url))
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn require_identity(store: &IdentityStore) -> Result<Identity> {
    store.current().ok_or_else(|| NotLoggedIn.into())
}

fn run_alarm_clock(config: &Config, args: RunArgs) -> Result<ExitCode> {
    let handler = signal::install_handler()?;
    let runtime = build_runtime()?;
    let client = build_client(config)?;
    let store = open_identity_store(config)?;

    let mut settings = AppSettings::from_config(config);
    if let Some(theme) = args.theme {
        settings.theme = Theme::from_arg(theme);
    }
    if args.mute {
        settings.audio.enabled = false;
    }

    let mut app = App::new(settings, store);
    for spec in args.alarms {
        let label = spec.label.unwrap_or_else(|| config.default_label.clone());
        app.add_alarm(spec.time, label);
    }

    let context = RunContext {
        service: Arc::new(client),
        clock: Arc::new(clock::SystemClock),
        runtime: runtime.handle().clone(),
        tick_period: config.tick_period(),
        flicker_period: config.flicker_period(),
    };

    let result = tui::run_tui(&mut app, &context, Some(handler.get_flag()));
    drop(context);
    runtime.shutdown_background();

    match result {
        Ok(()) => {
            log::info!("Dismissed {} alarm(s) this session", app.dismissed_sessions());
            Ok(ExitCode::Success)
        }
        Err(TuiError::Interrupted) => Ok(ExitCode::Interrupted),
        Err(e) => Err(e).context("Alarm clock failed"),
    }
}

fn login(config: &Config, username: &str) -> Result<ExitCode> {
    let runtime = build_runtime()?;
    let client = build_client(config)?;
    let mut store = open_identity_store(config)?;

    match runtime.block_on(identity::login(&client, &mut store, username)) {
        Ok(identity) => {
            println!("{} {}", "Logged in as".green(), identity.username.bold());
            Ok(ExitCode::Success)
        }
        Err(e) => {
            let message = e.user_message();
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

fn logout(config: &Config) -> Result<ExitCode> {
    let mut store = open_identity_store(config)?;
    match store.current() {
        Some(identity) => {
            store.forget()?;
            println!("{} {}", "Logged out".green(), identity.username.dim());
        }
        None => println!("{}", "Nobody is logged in".dim()),
    }
    Ok(ExitCode::Success)
}

fn whoami(config: &Config) -> Result<ExitCode> {
    let store = open_identity_store(config)?;
    let identity = require_identity(&store)?;
    println!("{}", identity.username.bold());
    if let Some(avatar) = identity.avatar {
        println!("{} {}", "avatar:".dim(), avatar);
    }
    Ok(ExitCode::Success)
}

fn status(config: &Config) -> Result<ExitCode> {
    let store = open_identity_store(config)?;
    let identity = require_identity(&store)?;
    let runtime = build_runtime()?;
    let client = build_client(config)?;

    let count = runtime
        .block_on(client.solved_count(&identity.username))
        .with_context(|| format!("Failed to fetch solved count for {}", identity.username))?;

    println!(
        "{} has solved {} problem{}",
        identity.username.bold(),
        count.to_string().yellow().bold(),
        if count == 1 { "" } else { "s" }
    );
    Ok(ExitCode::Success)
}

fn show_config(config: &Config, cli: &Cli, args: &ConfigArgs) -> Result<ExitCode> {
    if args.init {
        let path: PathBuf = match &cli.config {
            Some(path) => path.clone(),
            None => Config::config_path()?,
        };
        if path.exists() && !args.force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        Config::default().save(&path)?;
        println!("{} {}", "Wrote default configuration to".green(), path.display());
        return Ok(ExitCode::Success);
    }

    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    print!("{rendered}");
    Ok(ExitCode::Success)
}
