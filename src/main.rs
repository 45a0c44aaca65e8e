mod cli;
mod ui;

use scope_tui::app::AppState;
use scope_tui::config::{AppInfo, Config};
use scope_tui::plugin::export::{export_to_path, import, ExportFile, ImportOutcome};
use scope_tui::plugin::merge::{merge_with_options, DisplayRow, MergeOptions};
use scope_tui::plugin::scope::{ScopeResolver, SettingsLocations};
use scope_tui::plugin::CliBackend;
use scope_tui::utils::paths::{get_crash_log_path, get_home_dir, get_logs_dir};
use scope_tui::utils::unicode::{pad_to_width, truncate_to_width};
use scopetui_plugin_interface::{PluginBackend, ScopeTier};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::fs;
use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ui::theme::Theme;

fn install_crash_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if let Ok(crash_log_path) = get_crash_log_path() {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            let mut crash_report = format!("=== CRASH at {timestamp} ===\n");

            if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
                crash_report.push_str(&format!("Message: {message}\n"));
            } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
                crash_report.push_str(&format!("Message: {message}\n"));
            }

            if let Some(location) = panic_info.location() {
                crash_report.push_str(&format!(
                    "Location: {}:{}:{}\n",
                    location.file(),
                    location.line(),
                    location.column()
                ));
            }

            crash_report.push_str(&format!(
                "\nBacktrace:\n{}\n\n",
                std::backtrace::Backtrace::force_capture()
            ));

            if let Some(parent) = crash_log_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log_path)
            {
                let _ = file.write_all(crash_report.as_bytes());
                eprintln!("\nCrash logged to: {}", crash_log_path.display());
            }
        }

        default_hook(panic_info);
    }));
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// File logging for the TUI, which owns the terminal.
///
/// Logs go to `~/.local/share/scope-tui/logs/scopetui.log` (rolled daily).
/// Level comes from RUST_LOG, default info.
fn init_file_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = get_logs_dir().ok()?;

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Warning: Could not create logs directory: {e}");
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "scopetui.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    Some(guard)
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_working_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let current = env::current_dir().context("Could not determine the current directory")?;
    Ok(match dir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => current.join(dir),
        None => current,
    })
}

fn main() -> Result<()> {
    install_crash_handler();

    let cli = Cli::parse();
    let config = Config::load()?;
    let app_info = AppInfo::from_build();

    let working_dir = resolve_working_dir(cli.dir)?;
    let home_dir = get_home_dir()?;
    let locations = SettingsLocations::new(&working_dir, &home_dir);
    let backend = CliBackend::new(config.backend.command.clone());

    match cli.command {
        Some(command) => {
            init_stderr_logging();
            match command {
                Commands::List => handle_list(&backend, &config)?,
                Commands::Scopes => handle_scopes(&locations),
                Commands::Export { file } => handle_export(&backend, &file)?,
                Commands::Import { file, yes } => handle_import(&backend, &file, yes)?,
            }
        }
        None => {
            // Guard must outlive the TUI
            let _log_guard = init_file_logging();

            tracing::info!(
                version = %app_info.version,
                dir = %working_dir.display(),
                backend = %backend.command(),
                "scopetui starting"
            );

            let theme = Theme::from_config(&config);
            let state = AppState::new(Arc::new(backend), locations, &config, app_info);
            ui::run_tui(state, theme)?;

            tracing::info!("scopetui exiting gracefully");
        }
    }

    Ok(())
}

fn handle_list(backend: &dyn PluginBackend, config: &Config) -> Result<()> {
    let listing = backend
        .list_plugins(true)
        .context("Failed to list plugins")?;
    let rows = merge_with_options(
        &listing.installed,
        &listing.available,
        MergeOptions {
            include_orphans: config.display.show_orphaned_installs,
        },
    );

    if rows.is_empty() {
        println!("No plugins available.");
        return Ok(());
    }

    for row in &rows {
        match row {
            DisplayRow::Header { marketplace } => println!("\n{marketplace}"),
            DisplayRow::Plugin(plugin) => {
                let scope = if plugin.is_installed() {
                    format!(
                        "{} ({})",
                        plugin.scope,
                        if plugin.enabled { "enabled" } else { "disabled" }
                    )
                } else {
                    "-".to_string()
                };
                let update = if plugin.has_update() {
                    format!("  update: {}", plugin.latest_version)
                } else {
                    String::new()
                };
                println!(
                    "  {} {:<10} {}{}",
                    pad_to_width(&truncate_to_width(&plugin.name, 28), 28),
                    plugin.version,
                    scope,
                    update
                );
            }
        }
    }

    Ok(())
}

fn handle_scopes(locations: &SettingsLocations) {
    for (tier, path) in locations.iter() {
        let marker = if path.exists() { "" } else { " (missing)" };
        println!("{:<8} {}{}", tier.as_str(), path.display(), marker);
    }

    let scopes = ScopeResolver::resolve_locations(locations);
    if scopes.is_empty() {
        println!("\nNo plugins declared in any settings file.");
        return;
    }

    println!();
    for (id, tiers) in scopes.iter() {
        let flags: Vec<String> = ScopeTier::PERSISTED
            .iter()
            .filter_map(|tier| {
                tiers.get(tier).map(|enabled| {
                    format!("{}={}", tier, if *enabled { "on" } else { "off" })
                })
            })
            .collect();
        println!("{id}  {}", flags.join(" "));
    }
}

fn handle_export(backend: &dyn PluginBackend, path: &Path) -> Result<()> {
    let file = export_to_path(backend, path)
        .with_context(|| format!("Failed to export plugins to {}", path.display()))?;
    println!(
        "Exported {} plugin installation(s) to {}",
        file.plugins.len(),
        path.display()
    );
    Ok(())
}

fn handle_import(backend: &dyn PluginBackend, path: &Path, yes: bool) -> Result<()> {
    use dialoguer::Confirm;

    let file = ExportFile::read(path)
        .with_context(|| format!("Failed to read export file {}", path.display()))?;

    if file.plugins.is_empty() {
        println!("Export file lists no plugins.");
        return Ok(());
    }

    println!("Plugins in {}:", path.display());
    for plugin in &file.plugins {
        let state = if plugin.enabled { "" } else { " (disabled)" };
        println!("  {} @ {}{}", plugin.id, plugin.scope, state);
    }

    if !yes {
        let proceed = Confirm::new()
            .with_prompt("Install the plugins that are not installed yet?")
            .default(true)
            .interact()?;
        if !proceed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = import(backend, &file).context("Import failed")?;
    for entry in &report.entries {
        match &entry.outcome {
            ImportOutcome::Installed { disable_error: None } => {
                println!("  installed {} at {}", entry.id, entry.scope);
            }
            ImportOutcome::Installed {
                disable_error: Some(e),
            } => {
                println!(
                    "  installed {} at {} (could not disable: {e})",
                    entry.id, entry.scope
                );
            }
            ImportOutcome::Skipped => println!("  skipped {} (already installed)", entry.id),
            ImportOutcome::Failed(e) => println!("  failed {}: {e}", entry.id),
        }
    }
    println!("{report}");

    Ok(())
}
