// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod commands;
mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use commands::{CellEdit, ViewOptions};
use config::Config;
use leadbook_app::{NewRowInput, RowId};
use runtime::Backend;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "leadbook", version, about = "Browse and edit lead datasets")]
struct Cli {
    /// Config file (default: $LEADBOOK_CONFIG_PATH or the platform config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use a seeded in-memory store; the dataset is called `demo`.
    #[arg(long, global = true)]
    demo: bool,

    #[arg(long)]
    print_config_path: bool,

    #[arg(long)]
    print_example_config: bool,

    /// Validate config and reach the backend, then exit.
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List uploaded datasets, newest first.
    Datasets,
    /// Show one page of a dataset.
    View(ViewArgs),
    /// Change cells and save them as one batch.
    Edit(EditArgs),
    /// Insert a row.
    Add(AddArgs),
    /// Delete rows by id.
    Delete {
        dataset: String,
        #[arg(required = true, value_name = "ID")]
        ids: Vec<i64>,
    },
    /// List the known deal stages.
    Stages,
}

#[derive(Debug, Args)]
struct ViewArgs {
    dataset: String,
    /// Case-insensitive text matched against every searchable column.
    #[arg(long)]
    search: Option<String>,
    /// Keep only rows in this stage; repeat for several.
    #[arg(long = "stage", value_name = "STAGE")]
    stages: Vec<String>,
    /// Earliest date, YYYY-MM-DD.
    #[arg(long)]
    from: Option<String>,
    /// Latest date, YYYY-MM-DD.
    #[arg(long)]
    to: Option<String>,
    /// Sort column, optionally suffixed with `:desc`.
    #[arg(long, value_name = "FIELD[:asc|desc]")]
    sort: Option<String>,
    #[arg(long, value_name = "N")]
    page: Option<usize>,
}

#[derive(Debug, Args)]
struct EditArgs {
    dataset: String,
    #[arg(long = "set", value_name = "ID:FIELD=VALUE")]
    set: Vec<String>,
    /// Store null in a cell.
    #[arg(long = "clear", value_name = "ID:FIELD")]
    clear: Vec<String>,
}

#[derive(Debug, Args)]
struct AddArgs {
    dataset: String,
    #[arg(long)]
    date: String,
    #[arg(long)]
    stage: String,
    #[arg(long)]
    owner: Option<String>,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    account: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    company: Option<String>,
}

impl AddArgs {
    fn input(self) -> NewRowInput {
        NewRowInput {
            date: self.date,
            lead_owner: self.owner.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            deal_stage: self.stage,
            account_id: self.account.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
        }
    }
}

fn main() {
    if let Err(error) = run(Cli::parse()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    if cli.print_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }
    if cli.print_example_config {
        print!("{}", Config::example_config(&config_path));
        return Ok(());
    }

    let config = Config::load(&config_path).with_context(|| {
        format!(
            "load config {}; run `leadbook --print-example-config` to generate a v1 template",
            config_path.display()
        )
    })?;
    init_logging(&config.log_filter())?;

    let mut backend = Backend::open(&config, cli.demo)?;
    if cli.check {
        return backend.check();
    }

    let output = match cli.command.unwrap_or(Command::Datasets) {
        Command::Datasets => commands::datasets(backend.client())?.to_string(),
        Command::Stages => commands::stages().to_string(),
        Command::View(args) => {
            let dataset = backend.dataset(&args.dataset)?;
            let options = ViewOptions {
                search: args.search,
                stages: args.stages,
                from: args.from,
                to: args.to,
                sort: args.sort,
                page: args.page,
                page_size: config.page_size(),
            };
            commands::view(backend.client(), dataset, &options)?
        }
        Command::Edit(args) => {
            let dataset = backend.dataset(&args.dataset)?;
            let edits = parse_edits(&args.set, &args.clear)?;
            commands::edit(backend.client(), dataset, &edits)?
        }
        Command::Add(args) => {
            let dataset = backend.dataset(&args.dataset)?;
            commands::add(backend.client(), dataset, args.input())?
        }
        Command::Delete { dataset, ids } => {
            let dataset = backend.dataset(&dataset)?;
            let ids: Vec<RowId> = ids.into_iter().map(RowId::new).collect();
            commands::delete(backend.client(), dataset, &ids)?
        }
    };
    println!("{output}");
    Ok(())
}

fn parse_edits(set: &[String], clear: &[String]) -> Result<Vec<CellEdit>> {
    if set.is_empty() && clear.is_empty() {
        return Err(anyhow!(
            "nothing to edit -- pass --set ID:FIELD=VALUE or --clear ID:FIELD"
        ));
    }
    let mut edits = Vec::with_capacity(set.len() + clear.len());
    for raw in set {
        edits.push(CellEdit::parse_set(raw)?);
    }
    for raw in clear {
        edits.push(CellEdit::parse_clear(raw)?);
    }
    Ok(edits)
}

/// Diagnostics go to stderr so table output stays pipeable.
fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter {filter:?} -- fix [log].filter or LEADBOOK_LOG"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))
}
