//! `todo` — task list client over the dual-endpoint router.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use todo_core::{
    Config, HealthMonitor, MirrorMode, Router, Task, TaskClient, TodoApi, UreqTransport,
};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("invalid TODO_* environment configuration")?;
    if let Some(url) = cli.primary_url.clone() {
        config.primary_url = url;
    }
    if let Some(url) = cli.secondary_url.clone() {
        config.secondary_url = url;
    }
    if let Some(collection) = cli.collection.clone() {
        config.collection = collection;
    }

    init_tracing(&config, cli.verbose);
    tracing::debug!(
        primary = %config.primary_url,
        secondary = %config.secondary_url,
        collection = %config.collection,
        "configuration loaded"
    );

    // The process exits right after the command, which would kill a detached mirror.
    let router = Router::from_config(&config).with_mirror_mode(MirrorMode::Await);
    let api = TodoApi::with_client(router, TaskClient::with_collection(&config.collection));

    match cli.command {
        Commands::List => {
            let tasks = api.list()?;
            print_tasks(&tasks, cli.json)?;
        }
        Commands::Add { name, description } => {
            let task = api.create(&name, description)?;
            print_task(&task, cli.json)?;
        }
        Commands::Toggle { id } => {
            let task = api.get(id).with_context(|| format!("loading task {id}"))?;
            let task = api.toggle(&task)?;
            print_task(&task, cli.json)?;
        }
        Commands::Rename { id, name } => {
            let task = api.get(id).with_context(|| format!("loading task {id}"))?;
            let task = api.rename(&task, &name)?;
            print_task(&task, cli.json)?;
        }
        Commands::Delete { id } => {
            api.delete(id)?;
            if !cli.json {
                println!("deleted {id}");
            }
        }
        Commands::Health { watch } => health(&config, api.router(), watch)?,
    }

    Ok(())
}

fn health(config: &Config, router: &Router<UreqTransport>, watch: bool) -> Result<()> {
    let monitors = [("primary", router.primary()), ("secondary", router.secondary())].map(
        |(label, endpoint)| {
            Arc::new(HealthMonitor::new(
                label,
                endpoint.clone(),
                &config.health_path,
                config.health_check_interval(),
                Arc::clone(router.transport()),
            ))
        },
    );

    if !watch {
        for (monitor, endpoint) in monitors.iter().zip([router.primary(), router.secondary()]) {
            let status = if monitor.check() { "up" } else { "down" };
            println!("{:<10} {:<5} {}", monitor.label(), status, endpoint.base_url());
        }
        return Ok(());
    }

    let handles = monitors
        .into_iter()
        .map(|monitor| monitor.spawn())
        .collect::<std::io::Result<Vec<_>>>()
        .context("starting health monitors")?;
    for handle in handles {
        handle.join();
    }
    Ok(())
}

fn print_tasks(tasks: &[Task], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("no tasks");
    }
    for task in tasks {
        println!("{}", format_task(task));
    }
    Ok(())
}

fn print_task(task: &Task, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        println!("{}", format_task(task));
    }
    Ok(())
}

fn format_task(task: &Task) -> String {
    let mark = if task.is_completed { 'x' } else { ' ' };
    match &task.description {
        Some(description) => format!("[{mark}] {} ({}) - {description}", task.name, task.id),
        None => format!("[{mark}] {} ({})", task.name, task.id),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v` and the configured level.
fn init_tracing(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
