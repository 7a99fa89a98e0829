use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;
mod commands;
mod component;
mod config;
mod project;
mod registry;
mod template;
mod version;

use cli::{Cli, Commands};
use config::{Config, LogLevel};

fn setup_logging(log_level: LogLevel) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sygaldry")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("sygaldry.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.as_filter());
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let root = match cli.cwd {
        Some(dir) => Config::expand_path(&dir),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let ctx = commands::Context {
        config,
        root,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Init {
            force,
            agent_dir,
            tool_dir,
            provider,
            model,
            registry,
        } => commands::init::run(
            commands::init::InitArgs {
                force,
                agent_dir,
                tool_dir,
                provider,
                model,
                registry,
            },
            &ctx,
        ),
        Commands::Add {
            component,
            source,
            provider,
            model,
            stream,
            with_lilypad,
            vars,
            force,
            no_deps,
            dry_run,
            format,
        } => commands::add::run(
            &component,
            source.as_deref(),
            commands::add::AddFlags {
                provider,
                model,
                stream,
                with_lilypad,
                vars,
                force,
                no_deps,
                dry_run,
            },
            format.unwrap_or(cli::OutputFormat::Text),
            &ctx,
        ),
        Commands::List {
            r#type,
            source,
            installed,
            format,
        } => commands::list::run(
            r#type.as_deref(),
            source.as_deref(),
            installed,
            cli::OutputFormat::resolve(format),
            &ctx,
        ),
        Commands::Search {
            query,
            r#type,
            source,
            format,
        } => commands::search::run(
            &query,
            r#type.as_deref(),
            source.as_deref(),
            cli::OutputFormat::resolve(format),
            &ctx,
        ),
        Commands::Build {
            registry_dir,
            output,
            check,
        } => commands::build::run(&registry_dir, output.as_deref(), check, &ctx),
        Commands::Docs { action } => commands::docs::run(action, &ctx),
        Commands::Source { action } => commands::source::run(action, &ctx),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let log_level = if cli.verbose { LogLevel::Debug } else { config.log_level };
    setup_logging(log_level).context("Failed to setup logging")?;

    info!("Starting sygaldry with config from: {:?}", cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}
