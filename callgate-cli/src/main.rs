//! callgate
//!
//! Loads a home setup, then resolves and runs one service call
//! configuration against it.
//!
//! Usage:
//!   callgate --setup home.toml --call call.json --var level=40 --user guest
//!   callgate --setup home.toml --describe

use anyhow::{Context, Result};
use callgate_cli::{Home, parse_var};
use callgate_core::CallOptions;
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "callgate")]
#[command(about = "Resolve, authorize and run a service call")]
struct Args {
    /// Path to the TOML home setup
    #[arg(short, long)]
    setup: PathBuf,

    /// Path to the JSON call configuration
    #[arg(short, long, required_unless_present = "describe")]
    call: Option<PathBuf>,

    /// Template variable as KEY=VALUE (repeatable)
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<(String, Value)>,

    /// Run the call on behalf of this user instead of as a trusted caller
    #[arg(short, long)]
    user: Option<String>,

    /// Skip schema validation of the call configuration
    #[arg(long)]
    no_validate: bool,

    /// Print all service descriptions as JSON and exit
    #[arg(long)]
    describe: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let home = Home::load_from(&args.setup).await?;

    if args.describe {
        let descriptions = home.engine.get_all_descriptions().await;
        println!("{}", serde_json::to_string_pretty(&descriptions)?);
        return Ok(());
    }

    let Some(call_path) = args.call else {
        anyhow::bail!("--call is required unless --describe is given");
    };
    let raw = std::fs::read_to_string(&call_path)
        .with_context(|| format!("Failed to read call file {}", call_path.display()))?;
    let config: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Call file {} is not valid JSON", call_path.display()))?;

    let mut options = CallOptions::default().with_variables(args.vars.into_iter().collect());
    if let Some(user) = args.user {
        options = options.with_context(callgate_types::Context::for_user(user));
    }
    if args.no_validate {
        options = options.without_validation();
    }

    home.engine.call_from_config(Some(&config), options).await?;

    let invocations = home.handler.invocations();
    info!("{} entity invocations", invocations.len());
    for invocation in invocations {
        println!(
            "{} {} {}",
            invocation.service, invocation.entity_id, invocation.data
        );
    }

    Ok(())
}
