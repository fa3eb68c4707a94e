//! Wires configuration, network selection, the terminal and the step runner
//! into one interactive flow run.

use anyhow::{bail, Result};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::flows::{Flows, StepId, Trigger};
use crate::network::{install_network_listener, NetworkContext};
use crate::runner::StepRunner;
use crate::sandbox::SimulatedAnchor;
use crate::settings::ConfigService;
use crate::state::FlowState;
use crate::ui::{TerminalUi, WalletUi, WALLET_PAGE};

/// Per-run choices made on the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Start this flow instead of prompting for one
    pub flow: Option<Trigger>,
    /// Make the simulated anchor fail this step once
    pub fail_step: Option<StepId>,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The queue ran to completion
    Finished { run_id: Uuid, state: FlowState },
    /// Input closed before the flow finished
    Aborted { run_id: Uuid, remaining: Vec<&'static str> },
}

pub struct App {
    config: Config,
    settings: Arc<ConfigService>,
    network: NetworkContext,
    ui: Arc<TerminalUi>,
}

impl App {
    pub fn new(config: Config, ui: Arc<TerminalUi>) -> Self {
        let settings = Arc::new(ConfigService::new(config.wallet.clone()));
        Self {
            config,
            settings,
            network: NetworkContext::default(),
            ui,
        }
    }

    pub fn settings(&self) -> &Arc<ConfigService> {
        &self.settings
    }

    pub fn network(&self) -> &NetworkContext {
        &self.network
    }

    fn catalog(&self, options: &RunOptions) -> SimulatedAnchor {
        let anchor = SimulatedAnchor::new(&self.settings.snapshot());
        match options.fail_step {
            Some(step) => anchor.failing(step, 1),
            None => anchor,
        }
    }

    pub async fn run(&self, options: RunOptions) -> Result<RunOutcome> {
        let ui: Arc<dyn WalletUi> = self.ui.clone();
        let listener = install_network_listener(&self.settings, self.network.clone(), ui.clone());

        let outcome = self.drive(options, ui).await;
        self.settings.unlisten(listener);
        outcome
    }

    async fn drive(&self, options: RunOptions, ui: Arc<dyn WalletUi>) -> Result<RunOutcome> {
        if let Err(e) = self.settings.validate() {
            ui.error(&e.to_string());
            bail!("{e}; fix them in demo-wallet.toml (see `demo-wallet config init`)");
        }

        let flows = Flows::from_catalog(&self.catalog(&options));
        let mut runner = StepRunner::new(flows, ui, self.settings.clone())
            .with_min_step_duration(self.config.min_step_duration());
        let run_id = runner.run_id();
        tracing::info!(
            run_id = %run_id,
            network = %self.network.current(),
            horizon = %self.network.horizon_url(),
            "wallet ready"
        );

        let signal = match options.flow {
            Some(trigger) => trigger.as_str().to_string(),
            None => match self.ui.wait_for_page_message(WALLET_PAGE).await {
                Some(signal) => signal,
                None => {
                    return Ok(RunOutcome::Aborted {
                        run_id,
                        remaining: Vec::new(),
                    })
                }
            },
        };

        match runner.select_queue(&signal).await {
            Ok(true) => {}
            Ok(false) => bail!("unrecognized flow signal `{signal}`"),
            // Already reported through the UI; the step stays current for a retry
            Err(e) => tracing::warn!(error = %e, "auto-advanced step failed"),
        }

        while !runner.is_finished() {
            if !self.ui.wait_for_action().await {
                tracing::info!(
                    run_id = %run_id,
                    step = ?runner.current_step().map(|s| s.id),
                    "input closed, leaving flow unfinished"
                );
                return Ok(RunOutcome::Aborted {
                    run_id,
                    remaining: runner.remaining(),
                });
            }
            if let Err(e) = runner.advance().await {
                tracing::warn!(run_id = %run_id, step = e.step(), "step failed, press Enter to retry");
            }
        }

        Ok(RunOutcome::Finished {
            run_id,
            state: runner.state().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;

    const SECRET: &str = "SCZANGBA5YHTNYVVV4C3U252E2B6P6F5T3U6MM63WBSBZATAQI3EBTQ4";

    fn config(mainnet: bool) -> Config {
        let mut config = Config::default();
        config.wallet.secret_key = SECRET.into();
        config.wallet.mainnet = mainnet;
        config.runner.min_step_ms = 0;
        config
    }

    fn terminal(input: &'static str) -> Arc<TerminalUi> {
        Arc::new(TerminalUi::new(Box::new(input.as_bytes()), Box::new(std::io::sink())))
    }

    #[tokio::test]
    async fn test_invalid_settings_stop_before_prompt() {
        let mut config = config(false);
        config.wallet.secret_key.clear();
        let app = App::new(config, terminal("d\n"));

        let err = app.run(RunOptions::default()).await.unwrap_err();
        assert!(err.to_string().contains("USER_SK"));
    }

    #[tokio::test]
    async fn test_closed_input_aborts_before_flow() {
        let app = App::new(config(false), terminal(""));
        let outcome = app.run(RunOptions::default()).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Aborted { ref remaining, .. } if remaining.is_empty()));
    }

    #[tokio::test]
    async fn test_mainnet_setting_selects_public_network() {
        let app = App::new(config(true), terminal(""));
        app.run(RunOptions::default()).await.unwrap();
        assert_eq!(app.network().current(), Network::Public);
        // Listener is removed once the run ends
        assert_eq!(app.settings().listener_count(), 0);
    }

    #[tokio::test]
    async fn test_horizon_override_reaches_network_context() {
        let mut config = config(false);
        config.wallet.horizon_url = "http://localhost:8000".into();
        let app = App::new(config, terminal(""));
        app.run(RunOptions::default()).await.unwrap();
        assert_eq!(app.network().horizon_url(), "http://localhost:8000");
    }
}
