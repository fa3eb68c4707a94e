use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

use demo_wallet::app::{App, RunOptions, RunOutcome};
use demo_wallet::config::Config;
use demo_wallet::env_vars;
use demo_wallet::flows::{StepId, Trigger};
use demo_wallet::logging;
use demo_wallet::network::Network;
use demo_wallet::settings::{ConfigService, Setting, SettingValue, SettingsForm};
use demo_wallet::ui::TerminalUi;

#[derive(Parser)]
#[command(name = "demo-wallet")]
#[command(about = "Walk through Stellar SEP-10 / SEP-24 anchor flows step by step")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    Withdraw,
    Deposit,
}

impl From<FlowArg> for Trigger {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::Withdraw => Trigger::StartWithdraw,
            FlowArg::Deposit => Trigger::StartDeposit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a deposit or withdraw flow (the default)
    Run {
        /// Flow to start (prompted for when omitted)
        #[arg(short, long, value_enum)]
        flow: Option<FlowArg>,

        /// Run every step without waiting for Enter
        #[arg(short, long)]
        auto_advance: bool,

        /// Use the public network
        #[arg(long)]
        mainnet: bool,

        /// Make the simulated anchor fail this step once (e.g., sep10_send)
        #[arg(long)]
        fail_step: Option<String>,
    },

    /// Inspect or create the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List the environment variables the wallet reads
    Env,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Check the settings are complete enough to run a flow
    Validate,
    /// Write the effective configuration to ./demo-wallet.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;
    let _logging_handle = logging::init_logging(&config, cli.debug)?;

    match cli.command {
        None => cmd_run(config, RunOptions::default(), false, false).await?,
        Some(Commands::Run {
            flow,
            auto_advance,
            mainnet,
            fail_step,
        }) => {
            let fail_step = match fail_step {
                Some(id) => match StepId::parse(&id) {
                    Some(step) => Some(step),
                    None => bail!("unknown step `{id}`"),
                },
                None => None,
            };
            let options = RunOptions {
                flow: flow.map(Trigger::from),
                fail_step,
            };
            cmd_run(config, options, auto_advance, mainnet).await?;
        }
        Some(Commands::Config { action }) => cmd_config(&config, action)?,
        Some(Commands::Env) => cmd_env(),
    }

    Ok(())
}

async fn cmd_run(config: Config, options: RunOptions, auto_advance: bool, mainnet: bool) -> Result<()> {
    let app = App::new(config, Arc::new(TerminalUi::stdio()));

    // Flags go through the settings service so listeners see them
    if auto_advance {
        app.settings().set(Setting::AutoAdvance, "true")?;
    }
    if mainnet {
        app.settings().set(Setting::Mainnet, "true")?;
    }

    match app.run(options).await? {
        RunOutcome::Finished { run_id, state } => {
            tracing::debug!(%run_id, "flow complete");
            println!();
            println!("Flow complete. Final state:");
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        RunOutcome::Aborted { run_id, remaining } => {
            tracing::debug!(%run_id, "flow aborted");
            if !remaining.is_empty() {
                println!();
                println!("Stopped with {} step(s) left: {}", remaining.len(), remaining.join(", "));
            }
        }
    }
    Ok(())
}

/// Prints settings as `KEY = value` lines, masking secrets.
struct PrintForm;

impl SettingsForm for PrintForm {
    fn populate(&mut self, setting: Setting, value: &SettingValue) {
        let raw = value.to_raw();
        let shown = if setting.is_secret() && raw.len() > 4 {
            format!("{}...", raw.chars().take(4).collect::<String>())
        } else {
            raw
        };
        println!("{:<14} = {}", setting.key(), shown);
    }
}

fn cmd_config(config: &Config, action: ConfigAction) -> Result<()> {
    let service = ConfigService::new(config.wallet.clone());
    match action {
        ConfigAction::Show => {
            service.bind_form(&mut PrintForm);
            let network = Network::from_mainnet_flag(service.mainnet());
            println!("{:<14} = {}", "NETWORK", network);
            println!("{:<14} = {}ms", "MIN_STEP", config.runner.min_step_ms);
        }
        ConfigAction::Validate => {
            service.validate()?;
            println!("Configuration is valid");
        }
        ConfigAction::Init { force } => {
            let path = Config::local_config_path();
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config
                .save()
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn cmd_env() {
    for (category, vars) in env_vars::env_vars_by_category() {
        println!("{}:", category.display_name());
        for var in vars {
            let default = var.default.unwrap_or("-");
            let required = if var.required { " (required)" } else { "" };
            println!("  {}{}", var.name, required);
            println!("      {} [default: {}]", var.description, default);
            if let Some(example) = var.example {
                println!("      e.g. {example}");
            }
        }
        println!();
    }
}
