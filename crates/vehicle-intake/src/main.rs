//! `vintake` - CLI for vehicle-intake
//!
//! This binary runs the intake web form and gives offline access to the
//! stored records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use vehicle_intake::cli::{Cli, Command, ConfigCommand};
use vehicle_intake::{export, init_logging, intake, Config, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config =
        Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => {
            if let Some(bind) = serve_cmd.bind {
                config.server.bind = bind;
                config.validate()?;
            }
            handle_serve(config)
        }
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Report(report_cmd) => {
            handle_report(&config, &report_cmd.vehicle_number, report_cmd.json)
        }
        Command::Export(export_cmd) => handle_export(&config, export_cmd.path),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_serve(config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(vehicle_intake::serve(config))?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "bind": config.server.bind,
            "database_path": config.database_path(),
            "upload_dir": config.upload_dir(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("vintake status");
        println!("--------------");
        println!("Bind address:  {}", config.server.bind);
        println!("Database:      {}", config.database_path().display());
        println!("Documents:     {}", config.upload_dir().display());
        println!("Records:       {}", stats.total_records);
        if let Some(oldest) = stats.oldest_record {
            println!("Oldest:        {}", oldest.to_rfc3339());
        }
        if let Some(newest) = stats.newest_record {
            println!("Newest:        {}", newest.to_rfc3339());
        }
        println!("Database size: {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_report(config: &Config, vehicle_number: &str, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let record = intake::lookup(&storage, Some(vehicle_number))
        .with_context(|| format!("no report for {vehicle_number}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        for (label, value) in record.columns() {
            println!("{label:<22} {value}");
        }
    }
    Ok(())
}

fn handle_export(config: &Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(|| config.workbook_path());
    let records = open_storage(config)?.all()?;

    export::save_xlsx(&records, &path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Upload directory:   {}", config.upload_dir().display());
                println!();
                println!("[Intake]");
                println!("  Min expiry date:    {}", config.intake.min_expiry_date);
                println!("  Max upload bytes:   {}", config.intake.max_upload_bytes);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
