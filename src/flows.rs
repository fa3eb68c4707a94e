//! Flow-start signals and the statically composed withdraw and deposit queues.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::step::{Step, StepAction};

/// Signals that start a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    StartWithdraw,
    StartDeposit,
}

impl Trigger {
    /// Parse a page message; anything outside the closed set is None.
    pub fn parse(signal: &str) -> Option<Self> {
        match signal {
            "start-withdraw" => Some(Trigger::StartWithdraw),
            "start-deposit" => Some(Trigger::StartDeposit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::StartWithdraw => "start-withdraw",
            Trigger::StartDeposit => "start-deposit",
        }
    }

    pub fn flow_name(&self) -> &'static str {
        match self {
            Trigger::StartWithdraw => "withdraw",
            Trigger::StartDeposit => "deposit",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every step either flow is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    CheckInfo,
    DepositCheckInfo,
    Sep10Start,
    Sep10Sign,
    Sep10Send,
    GetWithdrawUnauth,
    GetDeposit,
    ShowInteractiveWebapp,
    ConfirmPayment,
    SendStellarTransaction,
    PollForSuccess,
}

impl StepId {
    pub fn all() -> &'static [StepId] {
        &[
            StepId::CheckInfo,
            StepId::DepositCheckInfo,
            StepId::Sep10Start,
            StepId::Sep10Sign,
            StepId::Sep10Send,
            StepId::GetWithdrawUnauth,
            StepId::GetDeposit,
            StepId::ShowInteractiveWebapp,
            StepId::ConfirmPayment,
            StepId::SendStellarTransaction,
            StepId::PollForSuccess,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::CheckInfo => "check_info",
            StepId::DepositCheckInfo => "deposit_check_info",
            StepId::Sep10Start => "sep10_start",
            StepId::Sep10Sign => "sep10_sign",
            StepId::Sep10Send => "sep10_send",
            StepId::GetWithdrawUnauth => "get_withdraw_unauth",
            StepId::GetDeposit => "get_deposit",
            StepId::ShowInteractiveWebapp => "show_interactive_webapp",
            StepId::ConfirmPayment => "confirm_payment",
            StepId::SendStellarTransaction => "send_stellar_transaction",
            StepId::PollForSuccess => "poll_for_success",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.as_str() == id)
    }

    fn device_page(self) -> Option<&'static str> {
        match self {
            StepId::ShowInteractiveWebapp => Some("pages/interactive.html"),
            StepId::ConfirmPayment => Some("pages/confirm-payment.html"),
            StepId::PollForSuccess => Some("pages/transaction-status.html"),
            _ => None,
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            StepId::CheckInfo => "Check the anchor's /info endpoint for withdrawable assets",
            StepId::DepositCheckInfo => "Check the anchor's /info endpoint for depositable assets",
            StepId::Sep10Start => "Request a SEP-10 challenge transaction from the anchor",
            StepId::Sep10Sign => "Sign the challenge transaction with the wallet key",
            StepId::Sep10Send => "Send the signed challenge back to receive a JWT",
            StepId::GetWithdrawUnauth => "Start an interactive withdrawal",
            StepId::GetDeposit => "Start an interactive deposit",
            StepId::ShowInteractiveWebapp => "Complete the anchor's interactive flow",
            StepId::ConfirmPayment => "Confirm the payment to the anchor",
            StepId::SendStellarTransaction => "Send the payment transaction to the Stellar network",
            StepId::PollForSuccess => "Poll the anchor until the withdrawal completes",
        }
    }

    fn action_label(self) -> &'static str {
        match self {
            StepId::CheckInfo | StepId::DepositCheckInfo => "GET /info",
            StepId::Sep10Start => "GET /auth",
            StepId::Sep10Sign => "Sign challenge",
            StepId::Sep10Send => "POST /auth",
            StepId::GetWithdrawUnauth => "POST /transactions/withdraw/interactive",
            StepId::GetDeposit => "POST /transactions/deposit/interactive",
            StepId::ShowInteractiveWebapp => "Open interactive webapp",
            StepId::ConfirmPayment => "Confirm payment",
            StepId::SendStellarTransaction => "Submit transaction",
            StepId::PollForSuccess => "GET /transaction",
        }
    }

    /// Steps that only hand off to the anchor run without waiting for input.
    fn auto_start(self) -> bool {
        matches!(self, StepId::Sep10Sign | StepId::PollForSuccess)
    }

    /// Descriptor for this step with its action resolved from `catalog`.
    pub fn descriptor(self, catalog: &dyn StepCatalog) -> Step {
        let mut step = Step::new(self.as_str())
            .instruction(self.instruction())
            .action(self.action_label())
            .auto_start(self.auto_start());
        if let Some(page) = self.device_page() {
            step = step.device_page(page);
        }
        if let Some(action) = catalog.action(self) {
            step = step.execute(action);
        }
        step
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of step actions.
///
/// A step without an action in the catalog is presented but never executed.
pub trait StepCatalog: Send + Sync {
    fn action(&self, step: StepId) -> Option<Arc<dyn StepAction>>;
}

pub const WITHDRAW_STEPS: &[StepId] = &[
    StepId::CheckInfo,
    StepId::Sep10Start,
    StepId::Sep10Sign,
    StepId::Sep10Send,
    StepId::GetWithdrawUnauth,
    StepId::ShowInteractiveWebapp,
    StepId::ConfirmPayment,
    StepId::SendStellarTransaction,
    StepId::PollForSuccess,
];

pub const DEPOSIT_STEPS: &[StepId] = &[
    StepId::DepositCheckInfo,
    StepId::Sep10Start,
    StepId::Sep10Sign,
    StepId::Sep10Send,
    StepId::GetDeposit,
    StepId::ShowInteractiveWebapp,
];

fn build(ids: &[StepId], catalog: &dyn StepCatalog) -> VecDeque<Step> {
    ids.iter().map(|id| id.descriptor(catalog)).collect()
}

pub fn withdraw_steps(catalog: &dyn StepCatalog) -> VecDeque<Step> {
    build(WITHDRAW_STEPS, catalog)
}

pub fn deposit_steps(catalog: &dyn StepCatalog) -> VecDeque<Step> {
    build(DEPOSIT_STEPS, catalog)
}

/// Both queues, selected by trigger.
pub struct Flows {
    pub withdraw: VecDeque<Step>,
    pub deposit: VecDeque<Step>,
}

impl Flows {
    pub fn from_catalog(catalog: &dyn StepCatalog) -> Self {
        Self {
            withdraw: withdraw_steps(catalog),
            deposit: deposit_steps(catalog),
        }
    }

    pub fn queue_for(&self, trigger: Trigger) -> VecDeque<Step> {
        match trigger {
            Trigger::StartWithdraw => self.withdraw.clone(),
            Trigger::StartDeposit => self.deposit.clone(),
        }
    }
}
