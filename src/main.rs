//! Routesync CLI - manage backend routes and keep nginx config in sync
//!
//! Usage:
//!   routesync routes add --name <n> --path <p> --host <h> --port <n> --static-root <dir>
//!   routesync routes list             List routes
//!   routesync routes show <id>        Show route details
//!   routesync routes update <id>      Update route fields
//!   routesync routes remove <id>      Delete a route and its artifact
//!
//!   routesync regen                   Re-render every artifact from the registry
//!   routesync env                     View/set dotenv values
//!   routesync reload                  Check and reload the gateway

use anyhow::{Context, Result};
use routesync::config::Settings;
use routesync::db::{Environment, NewRoute, RouteRecord, RouteUpdate};
use routesync::envfile::EnvFile;
use routesync::manager::RouteManager;
use routesync::sync::SyncReport;
use routesync::{PKG_NAME, VERSION};
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};

/// Settings file used when --config is not given
const DEFAULT_SETTINGS_PATH: &str = "routesync.toml";

#[derive(Debug)]
enum Command {
    Routes(RoutesCommand),
    Regen { no_reload: bool },
    Env(EnvCommand),
    Reload,
    Help,
    Version,
}

#[derive(Debug)]
enum RoutesCommand {
    Add(Box<NewRoute>, bool),
    List { json: bool },
    Show { id: i64, json: bool },
    Update { id: i64, fields: Box<RouteUpdate>, no_reload: bool },
    Remove { id: i64, force: bool, no_reload: bool },
}

#[derive(Debug)]
enum EnvCommand {
    List,
    Get { key: String },
    Set { key: String, value: String },
    Unset { key: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("routesync=info".parse().expect("valid log directive")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // Global --config flag comes before the subcommand
    let settings_path = if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            anyhow::bail!("--config requires a path");
        }
        let path = PathBuf::from(args.remove(1));
        args.remove(0);
        Some(path)
    } else {
        None
    };

    let settings = load_settings(settings_path)?;

    if args.is_empty() {
        print_help();
        return Ok(());
    }

    match parse_command(&args)? {
        Command::Help => print_help(),
        Command::Version => print_version(),
        Command::Routes(cmd) => handle_routes(&settings, cmd)?,
        Command::Regen { no_reload } => handle_regen(&settings, no_reload)?,
        Command::Env(cmd) => handle_env(&settings, cmd)?,
        Command::Reload => run_gateway_reload(&settings)?,
    }

    Ok(())
}

fn load_settings(explicit: Option<PathBuf>) -> Result<Settings> {
    match explicit {
        Some(path) => {
            let settings = Settings::load(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            info!(path = %path.display(), "Settings loaded");
            Ok(settings)
        }
        None => {
            let path = PathBuf::from(DEFAULT_SETTINGS_PATH);
            if path.exists() {
                let settings = Settings::load(&path)
                    .with_context(|| format!("Failed to load settings from {}", path.display()))?;
                info!(path = %path.display(), "Settings loaded");
                Ok(settings)
            } else {
                Ok(Settings::default())
            }
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args[0].as_str() {
        "help" | "--help" | "-h" => Ok(Command::Help),
        "version" | "--version" | "-v" => Ok(Command::Version),
        "routes" | "route" => parse_routes_command(&args[1..]),
        "regen" | "regenerate" => Ok(Command::Regen {
            no_reload: has_flag(&args[1..], "--no-reload"),
        }),
        "env" => parse_env_command(&args[1..]),
        "reload" => Ok(Command::Reload),
        other => anyhow::bail!("Unknown command: {} (try `routesync help`)", other),
    }
}

fn parse_routes_command(args: &[String]) -> Result<Command> {
    if args.is_empty() {
        return Ok(Command::Routes(RoutesCommand::List { json: false }));
    }

    match args[0].as_str() {
        "add" | "create" => {
            let rest = &args[1..];
            let name = require_value(rest, "--name")?;
            let path = require_value(rest, "--path")?;
            let host = flag_value(rest, "--host").unwrap_or_else(|| "localhost".to_string());
            let port: u16 = require_value(rest, "--port")?
                .parse()
                .context("--port must be a number between 1 and 65535")?;
            let static_root = require_value(rest, "--static-root")?;

            let mut new = NewRoute::new(&name, &path, &host, port, &static_root);
            new.ssl_enabled = has_flag(rest, "--ssl");
            new.is_active = !has_flag(rest, "--inactive");
            new.description = flag_value(rest, "--description");
            new.notes = flag_value(rest, "--notes");
            new.config_path = flag_value(rest, "--config-path").map(PathBuf::from);
            new.environment = flag_value(rest, "--env")
                .map(|e| e.parse::<Environment>())
                .transpose()?;

            Ok(Command::Routes(RoutesCommand::Add(
                Box::new(new),
                has_flag(rest, "--no-reload"),
            )))
        }
        "list" | "ls" => Ok(Command::Routes(RoutesCommand::List {
            json: has_flag(&args[1..], "--json"),
        })),
        "show" | "info" => {
            let id = require_id(args.get(1), "routes show <id>")?;
            Ok(Command::Routes(RoutesCommand::Show {
                id,
                json: has_flag(&args[2..], "--json"),
            }))
        }
        "update" | "set" => {
            let id = require_id(args.get(1), "routes update <id> [fields]")?;
            let rest = &args[2..];

            let mut fields = RouteUpdate {
                name: flag_value(rest, "--name"),
                path: flag_value(rest, "--path"),
                host: flag_value(rest, "--host"),
                static_root: flag_value(rest, "--static-root"),
                description: flag_value(rest, "--description"),
                notes: flag_value(rest, "--notes"),
                config_path: flag_value(rest, "--config-path").map(PathBuf::from),
                ..Default::default()
            };
            if let Some(port) = flag_value(rest, "--port") {
                fields.port =
                    Some(port.parse().context("--port must be a number between 1 and 65535")?);
            }
            if has_flag(rest, "--ssl") {
                fields.ssl_enabled = Some(true);
            } else if has_flag(rest, "--no-ssl") {
                fields.ssl_enabled = Some(false);
            }
            if has_flag(rest, "--activate") {
                fields.is_active = Some(true);
            } else if has_flag(rest, "--deactivate") {
                fields.is_active = Some(false);
            }
            fields.environment = flag_value(rest, "--env")
                .map(|e| e.parse::<Environment>())
                .transpose()?;

            Ok(Command::Routes(RoutesCommand::Update {
                id,
                fields: Box::new(fields),
                no_reload: has_flag(rest, "--no-reload"),
            }))
        }
        "remove" | "rm" | "delete" => {
            let id = require_id(args.get(1), "routes remove <id>")?;
            Ok(Command::Routes(RoutesCommand::Remove {
                id,
                force: has_flag(&args[2..], "--force"),
                no_reload: has_flag(&args[2..], "--no-reload"),
            }))
        }
        other => anyhow::bail!("Unknown routes command: {}", other),
    }
}

fn parse_env_command(args: &[String]) -> Result<Command> {
    if args.is_empty() {
        return Ok(Command::Env(EnvCommand::List));
    }

    match args[0].as_str() {
        "list" | "ls" => Ok(Command::Env(EnvCommand::List)),
        "get" => Ok(Command::Env(EnvCommand::Get {
            key: args.get(1).cloned().context("Usage: env get <key>")?,
        })),
        "set" => Ok(Command::Env(EnvCommand::Set {
            key: args.get(1).cloned().context("Usage: env set <key> <value>")?,
            value: args.get(2).cloned().context("Usage: env set <key> <value>")?,
        })),
        "unset" | "rm" | "delete" => Ok(Command::Env(EnvCommand::Unset {
            key: args.get(1).cloned().context("Usage: env unset <key>")?,
        })),
        other => anyhow::bail!("Unknown env command: {}", other),
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn require_value(args: &[String], flag: &str) -> Result<String> {
    flag_value(args, flag).with_context(|| format!("{} is required", flag))
}

fn require_id(arg: Option<&String>, usage: &str) -> Result<i64> {
    arg.with_context(|| format!("Usage: routesync {}", usage))?
        .parse()
        .with_context(|| format!("Usage: routesync {}", usage))
}

fn handle_routes(settings: &Settings, cmd: RoutesCommand) -> Result<()> {
    let mgr = RouteManager::open(settings)?;

    match cmd {
        RoutesCommand::Add(new, no_reload) => {
            let (record, report) = mgr.create_route(&new)?;
            println!("Route {} created (id {})", record.name, record.id);
            println!("  Artifact: {}", record.config_path.display());
            finish_sync(settings, &report, no_reload)?;
        }
        RoutesCommand::List { json } => {
            let routes = mgr.list_routes()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&routes)?);
            } else if routes.is_empty() {
                println!("No routes yet. Create one with: routesync routes add");
            } else {
                println!("  ID   ACTIVE  SSL  NAME             HOST:PORT              PATH");
                for r in &routes {
                    println!(
                        "  {:<4} {:<7} {:<4} {:<16} {:<22} /{}/",
                        r.id,
                        if r.is_active { "yes" } else { "no" },
                        if r.ssl_enabled { "yes" } else { "no" },
                        r.name,
                        format!("{}:{}", r.host, r.port),
                        r.path,
                    );
                }
            }
        }
        RoutesCommand::Show { id, json } => {
            let record = mgr.get_route(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_route(&record);
            }
        }
        RoutesCommand::Update { id, fields, no_reload } => {
            let (record, report) = mgr.update_route(id, &fields)?;
            println!("Route {} updated", record.name);
            finish_sync(settings, &report, no_reload)?;
        }
        RoutesCommand::Remove { id, force, no_reload } => {
            let record = mgr.get_route(id)?;

            if !force {
                print!("Type the route name ({}) to confirm deletion: ", record.name);
                std::io::stdout().flush()?;
                let mut confirmation = String::new();
                std::io::stdin().read_line(&mut confirmation)?;
                if confirmation.trim() != record.name {
                    println!("Aborted - name did not match");
                    return Ok(());
                }
            }

            let (record, report) = mgr.delete_route(id)?;
            println!("Route {} deleted.", record.name);
            finish_sync(settings, &report, no_reload)?;
        }
    }

    Ok(())
}

fn handle_regen(settings: &Settings, no_reload: bool) -> Result<()> {
    let mgr = RouteManager::open(settings)?;
    let report = mgr.regenerate_all()?;
    println!(
        "Regenerated {} artifact(s), {} failure(s)",
        report.written.len(),
        report.failures.len()
    );
    finish_sync(settings, &report, no_reload)
}

fn handle_env(settings: &Settings, cmd: EnvCommand) -> Result<()> {
    let env = EnvFile::new(&settings.storage.env_path);

    match cmd {
        EnvCommand::List => {
            let all = env.read_all()?;
            if all.is_empty() {
                println!("No variables in {}", env.path().display());
            } else {
                for (key, value) in all {
                    println!("{}={}", key, value);
                }
            }
        }
        EnvCommand::Get { key } => match env.get(&key)? {
            Some(value) => println!("{}={}", key, value),
            None => println!("Key not found: {}", key),
        },
        EnvCommand::Set { key, value } => {
            env.set(&key, &value)?;
            println!("Set {} in {}", key, env.path().display());
        }
        EnvCommand::Unset { key } => {
            if env.unset(&key)? {
                println!("Removed {} from {}", key, env.path().display());
            } else {
                println!("Key not found: {}", key);
            }
        }
    }

    Ok(())
}

/// Print the sync outcome and, when every artifact reached disk, hand off to
/// the gateway reload. A dirty report never triggers a reload.
fn finish_sync(settings: &Settings, report: &SyncReport, no_reload: bool) -> Result<()> {
    for path in &report.written {
        println!("  Wrote {}", path.display());
    }
    for path in &report.removed {
        println!("  Removed {}", path.display());
    }

    if !report.is_clean() {
        println!();
        println!("WARNING: the registry change committed, but some artifacts failed:");
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
        println!("Fix the cause and run `routesync regen` to recover.");
        return Ok(());
    }

    if no_reload {
        return Ok(());
    }
    if settings.gateway.reload_command.is_none() {
        return Ok(());
    }
    run_gateway_reload(settings)
}

/// Run the configured check command, then the reload command
fn run_gateway_reload(settings: &Settings) -> Result<()> {
    let Some(reload) = settings.gateway.reload_command.as_deref() else {
        println!("No gateway.reload_command configured; skipping reload");
        return Ok(());
    };

    if let Some(check) = settings.gateway.check_command.as_deref() {
        run_command(check).context("Gateway config check failed; reload skipped")?;
        info!(command = check, "Gateway config check passed");
    }

    run_command(reload).context("Gateway reload failed")?;
    info!(command = reload, "Gateway reloaded");
    println!("Gateway reloaded.");
    Ok(())
}

fn run_command(command: &str) -> Result<()> {
    let words = shell_words::split(command)
        .with_context(|| format!("Invalid command: {}", command))?;
    let (program, cmd_args) = words
        .split_first()
        .with_context(|| format!("Empty command: {}", command))?;

    let status = std::process::Command::new(program)
        .args(cmd_args)
        .status()
        .with_context(|| format!("Failed to run: {}", command))?;

    if !status.success() {
        error!(command, code = status.code(), "Command failed");
        anyhow::bail!("`{}` exited with {}", command, status);
    }
    Ok(())
}

fn print_route(r: &RouteRecord) {
    println!("Route: {} (id {})", r.name, r.id);
    println!();
    println!("Path:        /{}/", r.path);
    println!("Backend:     {}:{}", r.host, r.port);
    println!("Static root: {}", r.static_root);
    println!("Active:      {}", if r.is_active { "yes" } else { "no" });
    println!("SSL:         {}", if r.ssl_enabled { "yes" } else { "no" });
    if let Some(env) = r.environment {
        println!("Environment: {}", env);
    }
    if let Some(desc) = &r.description {
        println!("Description: {}", desc);
    }
    if let Some(notes) = &r.notes {
        println!("Notes:       {}", notes);
    }
    println!("Artifact:    {}", r.config_path.display());
    println!("Created:     {}", r.created_at);
    println!("Updated:     {}", r.updated_at);
}

fn print_help() {
    println!(
        r#"
routesync - backend route registry with nginx config sync

USAGE:
    routesync [--config <path>] <command>

COMMANDS:
    routes add --name <n> --path <p> --port <n> --static-root <dir>
               [--host <h>] [--ssl] [--inactive] [--env <environment>]
               [--description <text>] [--notes <text>] [--config-path <file>]
                             Create a route and write its artifacts
    routes list [--json]     List routes
    routes show <id> [--json]
                             Show route details
    routes update <id> [--name <n>] [--path <p>] [--host <h>] [--port <n>]
               [--static-root <dir>] [--ssl | --no-ssl]
               [--activate | --deactivate] [--env <environment>]
                             Update fields and resynchronize
    routes remove <id> [--force]
                             Delete a route and its artifact

    regen                    Re-render every artifact from the registry
                             (recovery after manual edits or write failures)

    env list                 List dotenv variables
    env get <key>            Read a variable
    env set <key> <value>    Set a variable
    env unset <key>          Remove a variable

    reload                   Run the configured gateway check + reload commands

    help                     Show this help
    version                  Show version

Mutating commands reload the gateway automatically when a reload_command is
configured and every artifact was written; pass --no-reload to skip.

SETTINGS:
    Read from routesync.toml in the working directory, or --config <path>.
"#
    );
}

fn print_version() {
    println!("{} {}", PKG_NAME, VERSION);
}
