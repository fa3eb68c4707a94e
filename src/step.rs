//! Step descriptors and the action seam step implementations plug into.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::state::{FlowState, StateField};
use crate::ui::WalletUi;

/// Errors a step action can fail with
#[derive(Debug, Error)]
pub enum StepError {
    /// A field an earlier step should have written is absent
    #[error("missing state field `{0}`")]
    MissingState(StateField),

    /// A write to the flow state was refused
    #[error("invalid value for `{field}`: {reason}")]
    InvalidState { field: StateField, reason: String },

    /// The anchor answered with something the step cannot use
    #[error("anchor rejected the request: {0}")]
    Anchor(String),

    /// Anything else the action surfaced
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The executable part of a step.
///
/// Actions receive exclusive access to the flow state for the duration of
/// the call; the runner never runs two actions at once.
#[async_trait]
pub trait StepAction: Send + Sync {
    async fn execute(&self, state: &mut FlowState, ui: &dyn WalletUi) -> Result<(), StepError>;
}

/// One unit of a flow.
#[derive(Clone)]
pub struct Step {
    pub id: &'static str,
    pub device_page: Option<String>,
    pub instruction: Option<String>,
    pub action: Option<String>,
    pub auto_start: bool,
    pub execute: Option<Arc<dyn StepAction>>,
}

impl Step {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            device_page: None,
            instruction: None,
            action: None,
            auto_start: false,
            execute: None,
        }
    }

    pub fn device_page(mut self, page: impl Into<String>) -> Self {
        self.device_page = Some(page.into());
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.instruction = Some(text.into());
        self
    }

    pub fn action(mut self, label: impl Into<String>) -> Self {
        self.action = Some(label.into());
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn execute(mut self, action: Arc<dyn StepAction>) -> Self {
        self.execute = Some(action);
        self
    }

    pub fn is_executable(&self) -> bool {
        self.execute.is_some()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("device_page", &self.device_page)
            .field("instruction", &self.instruction)
            .field("action", &self.action)
            .field("auto_start", &self.auto_start)
            .field("executable", &self.is_executable())
            .finish()
    }
}
