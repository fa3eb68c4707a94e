//! Offline anchor simulation.
//!
//! Provides an action for every step of both flows that writes the state
//! fields a real anchor exchange would produce, using deterministic
//! placeholder values. Nothing here talks to the network or signs anything;
//! it exists so the flows can be walked end to end without an anchor.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::WalletConfig;
use crate::flows::{StepCatalog, StepId};
use crate::state::{FlowState, StateField};
use crate::step::{StepAction, StepError};
use crate::ui::WalletUi;

/// Catalog backed by the simulated anchor
#[derive(Clone)]
pub struct SimulatedAnchor {
    inner: Arc<Inner>,
}

struct Inner {
    home_domain: String,
    asset_code: String,
    latency: Duration,
    fail_step: Option<StepId>,
    failures_left: AtomicU32,
}

impl SimulatedAnchor {
    pub fn new(settings: &WalletConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                home_domain: settings.home_domain.clone(),
                asset_code: settings.asset_code.clone(),
                latency: Duration::ZERO,
                fail_step: None,
                failures_left: AtomicU32::new(0),
            }),
        }
    }

    /// Simulated round-trip time per step
    pub fn with_latency(self, latency: Duration) -> Self {
        self.rebuild(|inner| inner.latency = latency)
    }

    /// Make `step` fail `times` times before it succeeds
    pub fn failing(self, step: StepId, times: u32) -> Self {
        self.rebuild(|inner| {
            inner.fail_step = Some(step);
            inner.failures_left = AtomicU32::new(times);
        })
    }

    fn rebuild(self, f: impl FnOnce(&mut Inner)) -> Self {
        let mut inner = Inner {
            home_domain: self.inner.home_domain.clone(),
            asset_code: self.inner.asset_code.clone(),
            latency: self.inner.latency,
            fail_step: self.inner.fail_step,
            failures_left: AtomicU32::new(self.inner.failures_left.load(Ordering::SeqCst)),
        };
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl StepCatalog for SimulatedAnchor {
    fn action(&self, step: StepId) -> Option<Arc<dyn StepAction>> {
        Some(Arc::new(SimulatedStep {
            step,
            anchor: self.inner.clone(),
        }))
    }
}

struct SimulatedStep {
    step: StepId,
    anchor: Arc<Inner>,
}

impl SimulatedStep {
    fn should_fail(&self) -> bool {
        if self.anchor.fail_step != Some(self.step) {
            return false;
        }
        self.anchor
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn transfer_server(&self) -> String {
        format!("https://{}/sep24", self.anchor.home_domain)
    }
}

#[async_trait]
impl StepAction for SimulatedStep {
    async fn execute(&self, state: &mut FlowState, ui: &dyn WalletUi) -> Result<(), StepError> {
        if !self.anchor.latency.is_zero() {
            tokio::time::sleep(self.anchor.latency).await;
        }
        if self.should_fail() {
            return Err(StepError::Anchor(format!(
                "simulated failure in {}",
                self.step
            )));
        }

        let asset = &self.anchor.asset_code;
        match self.step {
            StepId::CheckInfo | StepId::DepositCheckInfo => {
                if asset.is_empty() {
                    return Err(StepError::Anchor("no asset code configured".into()));
                }
                ui.instruction(Some(&format!(
                    "{} supports {asset} via {}",
                    self.anchor.home_domain,
                    self.transfer_server()
                )));
            }
            StepId::Sep10Start => {
                state.record(StateField::ChallengeTransaction, "AAAAAgAAAAChallengeServerSigned")?;
            }
            StepId::Sep10Sign => {
                let challenge = state.require(StateField::ChallengeTransaction)?.to_string();
                state.record(StateField::SignedChallengeTx, format!("{challenge}+ClientSigned"))?;
            }
            StepId::Sep10Send => {
                state.require(StateField::SignedChallengeTx)?;
                state.record(StateField::Token, "eyJhbGciOiJIUzI1NiJ9.simulated.jwt")?;
            }
            StepId::GetWithdrawUnauth => {
                state.require(StateField::Token)?;
                state.record(
                    StateField::InteractiveUrl,
                    format!("{}/transactions/withdraw/webapp?asset_code={asset}", self.transfer_server()),
                )?;
            }
            StepId::GetDeposit => {
                state.require(StateField::Token)?;
                state.record(StateField::DepositMemo, "4242")?;
                state.record(StateField::DepositType, "id")?;
                state.record(
                    StateField::InteractiveUrl,
                    format!("{}/transactions/deposit/webapp?asset_code={asset}", self.transfer_server()),
                )?;
            }
            StepId::ShowInteractiveWebapp => {
                let url = state.require(StateField::InteractiveUrl)?.to_string();
                ui.set_device_page(&url);
                state.record(StateField::AnchorsStellarAddress, "GANCHORSIMULATEDRECEIVINGACCOUNT")?;
                state.record(StateField::StellarMemoType, "hash")?;
                state.record(StateField::StellarMemo, "c2ltdWxhdGVkLW1lbW8=")?;
            }
            StepId::ConfirmPayment => {
                state.require(StateField::AnchorsStellarAddress)?;
                state.require(StateField::StellarMemo)?;
            }
            StepId::SendStellarTransaction => {
                state.require(StateField::AnchorsStellarAddress)?;
                state.record(StateField::ExternalTransactionId, "sim-0001")?;
            }
            StepId::PollForSuccess => {
                let id = state.require(StateField::ExternalTransactionId)?;
                ui.instruction(Some(&format!("Transaction {id} completed")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::TerminalUi;

    fn quiet_ui() -> TerminalUi {
        TerminalUi::new(Box::new(&b""[..]), Box::new(std::io::sink()))
    }

    async fn run(anchor: &SimulatedAnchor, step: StepId, state: &mut FlowState) -> Result<(), StepError> {
        let action = anchor.action(step).unwrap();
        action.execute(state, &quiet_ui()).await
    }

    #[tokio::test]
    async fn test_sep10_steps_chain_through_state() {
        let anchor = SimulatedAnchor::new(&WalletConfig::default());
        let mut state = FlowState::new();

        run(&anchor, StepId::Sep10Start, &mut state).await.unwrap();
        run(&anchor, StepId::Sep10Sign, &mut state).await.unwrap();
        run(&anchor, StepId::Sep10Send, &mut state).await.unwrap();

        assert!(state.signed_challenge_tx.as_deref().unwrap().ends_with("+ClientSigned"));
        assert!(state.token.is_some());
    }

    #[tokio::test]
    async fn test_step_out_of_order_reports_missing_state() {
        let anchor = SimulatedAnchor::new(&WalletConfig::default());
        let mut state = FlowState::new();

        let err = run(&anchor, StepId::Sep10Sign, &mut state).await.unwrap_err();
        assert!(matches!(err, StepError::MissingState(StateField::ChallengeTransaction)));
    }

    #[tokio::test]
    async fn test_failing_step_recovers_after_configured_failures() {
        let anchor = SimulatedAnchor::new(&WalletConfig::default()).failing(StepId::Sep10Start, 2);
        let mut state = FlowState::new();

        assert!(run(&anchor, StepId::Sep10Start, &mut state).await.is_err());
        assert!(run(&anchor, StepId::Sep10Start, &mut state).await.is_err());
        assert!(run(&anchor, StepId::Sep10Start, &mut state).await.is_ok());
        // Other steps are unaffected
        assert!(run(&anchor, StepId::CheckInfo, &mut state).await.is_ok());
    }

    #[tokio::test]
    async fn test_deposit_interactive_url_uses_asset() {
        let settings = WalletConfig {
            asset_code: "USDC".into(),
            ..WalletConfig::default()
        };
        let anchor = SimulatedAnchor::new(&settings);
        let mut state = FlowState::new();
        state.record(StateField::Token, "jwt").unwrap();

        run(&anchor, StepId::GetDeposit, &mut state).await.unwrap();
        let url = state.interactive_url.unwrap();
        assert!(url.starts_with("https://testanchor.stellar.org/sep24/transactions/deposit"));
        assert!(url.ends_with("asset_code=USDC"));
        assert_eq!(state.deposit_type.as_deref(), Some("id"));
    }
}
