mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{debug, info};
use tokio::sync::Mutex;
use trellis_core::orchestrator::{ActivationReport, InstallReport};
use trellis_core::{Config, DefaultEnvironmentManager, Host, LocalHost, Orchestrator, PluginOptions};

/// Trellis: installs and updates remote editor plugins
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Configuration file (.json, .yaml or .toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More output; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the configured plugins
    Show,
    /// Inspect the environments on disk, then list the plugins
    Status,
    /// Install every plugin that has no healthy environment
    Setup,
    /// Update installed plugins (all of them when no name is given)
    Update {
        names: Vec<String>,
    },
    /// Install one more plugin without touching the configuration file
    Add {
        /// `<kind>:<payload>` or a plain requirement
        spec: String,
        /// Plugin name; defaults to the spec
        #[arg(long)]
        name: Option<String>,
        /// Run the worker in debug mode
        #[arg(long)]
        debug: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("{}", e);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = Arc::new(config);
    let host: Arc<dyn Host> = Arc::new(LocalHost::new());
    let environments = Arc::new(DefaultEnvironmentManager::new(Arc::clone(&config)));
    let orchestrator = Arc::new(Mutex::new(Orchestrator::new(config, host, environments)));

    let outcome = tokio::select! {
        outcome = run(Arc::clone(&orchestrator), args.command) => outcome,
        _ = tokio::signal::ctrl_c() => Err("Interrupted, stopping workers".to_string()),
    };

    let report = orchestrator.lock().await.shutdown().await;
    debug!("Stopped {} workers on exit", report.deactivated.len());

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// No editor is attached, so nothing is activated from the command line
fn load_config(path: Option<&std::path::Path>) -> Result<Config, String> {
    let mut config = match path {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    config.autostart = false;
    config.autoreboot = false;
    Ok(config)
}

/// Run one command. `Ok(false)` means some plugin failed.
async fn run(orchestrator: Arc<Mutex<Orchestrator>>, command: Commands) -> Result<bool, String> {
    let mut orchestrator = orchestrator.lock().await;
    let init = orchestrator.init().await.map_err(|e| e.to_string())?;
    for rejected in &init.rejected {
        eprintln!("Skipped plugin descriptor {}", rejected);
    }

    match command {
        Commands::Show => {
            print!("{}", orchestrator.show_configured());
            Ok(true)
        }
        Commands::Status => {
            let ready = orchestrator.refresh().await;
            info!("{} plugins ready", ready.len());
            print!("{}", orchestrator.show_configured());
            Ok(true)
        }
        Commands::Setup => {
            let setup = orchestrator.setup().await.map_err(|e| e.to_string())?;
            if !setup.already_ready.is_empty() {
                println!("already installed: {}", setup.already_ready.join(", "));
            }
            Ok(print_install(&setup.install))
        }
        Commands::Update { names } => {
            orchestrator.refresh().await;
            let report = orchestrator.update(&names).await.map_err(|e| e.to_string())?;
            Ok(print_install(&report))
        }
        Commands::Add { spec, name, debug } => {
            let options = PluginOptions {
                debug: Some(debug),
                ..PluginOptions::default()
            };
            orchestrator
                .add_plugin(&spec, name.as_deref(), options)
                .await
                .map_err(|e| e.to_string())?;
            let name = name.unwrap_or(spec);
            orchestrator.refresh().await;
            if orchestrator.state().is_ready(&name) {
                println!("{} is already installed", name);
                return Ok(true);
            }
            let report = orchestrator.install(&[name]).await.map_err(|e| e.to_string())?;
            Ok(print_install(&report))
        }
    }
}

fn print_install(report: &InstallReport) -> bool {
    println!("{}", report.message());
    if !report.unmatched.is_empty() {
        println!("not configured or not eligible: {}", report.unmatched.join(", "));
    }
    if let Some(activation) = &report.activation {
        print_activation(activation);
    }
    for reboot in &report.reboots {
        print_activation(&reboot.activation);
    }
    report.is_success()
}

fn print_activation(report: &ActivationReport) {
    for notice in report.notices() {
        println!("{}", notice);
    }
}
