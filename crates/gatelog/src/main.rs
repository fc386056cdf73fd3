//! `gatelog` - CLI for access logging and sensor-data processing
//!
//! This binary wires the operator commands to the library: the QR ingest
//! loop, CSV uploads, the batch processor, and the gated views.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use gatelog::auth::{self, Identity};
use gatelog::cli::{
    Cli, Command, ConfigCommand, LogsCommand, OutputFormat, ProcessCommand, ScanCommand,
    UploadCommand,
};
use gatelog::process::{self, LinearPlaceholder};
use gatelog::reading::Unit;
use gatelog::scanner::{DetectionSource, ScanSession, StdinSource};
use gatelog::{init_logging, upload, Config, Error, Storage};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;
    let operator = cli.operator.as_deref();

    // Execute the command
    match cli.command {
        Command::Scan(cmd) => handle_scan(&config, operator, &cmd),
        Command::Upload(cmd) => handle_upload(&config, &cmd),
        Command::Process(cmd) => handle_process(&config, &cmd),
        Command::Logs(cmd) => handle_logs(&config, operator, &cmd),
        Command::Dashboard => handle_dashboard(&config, operator),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Authenticate the operator and check the role a command requires.
fn gate(
    config: &Config,
    operator: Option<&str>,
    required: &str,
) -> Result<Identity, Error> {
    let identity = auth::authenticate(&config.access.operators, operator)?;
    identity.require_role(required)?;
    Ok(identity)
}

fn handle_scan(
    config: &Config,
    operator: Option<&str>,
    cmd: &ScanCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = gate(config, operator, &config.access.scan_role)?;

    let cooldown = match cmd.cooldown {
        Some(secs) if secs > 0.0 && secs.is_finite() => Duration::from_secs_f64(secs),
        Some(secs) => {
            return Err(Box::new(Error::ConfigValidation {
                message: format!("--cooldown must be a positive number, got {secs}"),
            }))
        }
        None => config.cooldown(),
    };

    let storage = Storage::open(config.database_path())?;

    println!("Scanning as '{}'.", identity.username);
    println!("One decoded payload per line on stdin; blank line = frame without a decode.");
    println!("End input (Ctrl-D) to stop the session.");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let accepted = runtime.block_on(async {
        let (tx, rx) = mpsc::channel(config.scanner.channel_capacity);
        let mut source = StdinSource::new();
        source.start(tx)?;

        let mut session = ScanSession::new(&storage, cooldown);
        Ok::<u64, Error>(session.run(rx).await)
    })?;

    println!("Recorded {accepted} access events.");
    Ok(())
}

fn handle_upload(config: &Config, cmd: &UploadCommand) -> Result<(), Box<dyn std::error::Error>> {
    let unit = Unit::from(cmd.unit);

    let file = File::open(&cmd.file)?;
    let readings = upload::read_readings(file)?;

    println!("Validated {} rows for {unit}.", readings.len());
    for reading in readings.iter().take(config.upload.preview_rows) {
        println!(
            "  {}  hp_mass_flow={} lp_mass_flow={} grs_mass_flow={} hp_pressure={} lp_pressure={}",
            reading.ts.to_rfc3339(),
            reading.hp_mass_flow,
            reading.lp_mass_flow,
            reading.grs_mass_flow,
            reading.hp_pressure,
            reading.lp_pressure,
        );
    }
    if readings.len() > config.upload.preview_rows {
        println!("  ... {} more", readings.len() - config.upload.preview_rows);
    }

    if !cmd.yes {
        println!("Nothing written. Re-run with --yes to upload.");
        return Ok(());
    }

    let mut storage = Storage::open(config.database_path())?;
    let count = storage.upsert_readings(unit, &readings)?;
    println!("Uploaded {count} rows to {unit}.");
    Ok(())
}

fn handle_process(
    config: &Config,
    cmd: &ProcessCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let unit = Unit::from(cmd.unit);
    let storage = Storage::open(config.database_path())?;

    let count = process::process_unit(&storage, unit, &LinearPlaceholder)?;
    if count == 0 {
        println!("No rows to process.");
    } else {
        println!("Processed {count} rows for {unit}.");
    }
    Ok(())
}

fn handle_logs(
    config: &Config,
    operator: Option<&str>,
    cmd: &LogsCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    gate(config, operator, &config.access.scan_role)?;

    let storage = Storage::open(config.database_path())?;
    let events = storage.recent_events(cmd.limit)?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Table => {
            println!("{:<6} {:<26} {:<8} CODE", "ID", "TIMESTAMP", "TYPE");
            for event in &events {
                println!(
                    "{:<6} {:<26} {:<8} {}",
                    event.id.unwrap_or_default(),
                    event.timestamp.to_rfc3339(),
                    event.code_type,
                    event.code_value,
                );
            }
        }
        OutputFormat::Plain => {
            for event in &events {
                println!(
                    "{} {} {}",
                    event.timestamp.to_rfc3339(),
                    event.code_type,
                    event.code_value
                );
            }
        }
    }
    Ok(())
}

fn handle_dashboard(
    config: &Config,
    operator: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    gate(config, operator, &config.access.dashboard_role)?;

    println!("Analytics dashboard");
    println!("[Analytics not yet implemented]");
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::open(config.database_path())?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "access_events": stats.access_events,
            "unit1": { "total": stats.unit1.total, "unprocessed": stats.unit1.unprocessed },
            "unit2": { "total": stats.unit2.total, "unprocessed": stats.unit2.unprocessed },
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("gatelog status");
        println!("--------------");
        println!("Database:        {}", config.database_path().display());
        println!("Access events:   {}", stats.access_events);
        println!(
            "Unit 1 readings: {} ({} unprocessed)",
            stats.unit1.total, stats.unit1.unprocessed
        );
        println!(
            "Unit 2 readings: {} ({} unprocessed)",
            stats.unit2.total, stats.unit2.unprocessed
        );
        println!("Database size:   {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Access]");
                println!("  Operators:      {}", config.access.operators.len());
                println!("  Scan role:      {}", config.access.scan_role);
                println!("  Dashboard role: {}", config.access.dashboard_role);
                println!();
                println!("[Scanner]");
                println!("  Cooldown (s):   {}", config.scanner.cooldown_secs);
                println!();
                println!("[Upload]");
                println!("  Preview rows:   {}", config.upload.preview_rows);
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
