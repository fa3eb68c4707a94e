//! Step runner: drives a flow's step queue one step at a time.
//!
//! The runner presents the head of the queue through the UI façade and runs
//! its action when the user activates the action control (or immediately,
//! for auto-start steps and when `AUTO_ADVANCE` is set). Every executed step
//! stays visible for at least the minimum step duration.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::flows::{Flows, Trigger};
use crate::settings::ConfigService;
use crate::state::FlowState;
use crate::step::{Step, StepAction, StepError};
use crate::ui::{WalletUi, DEFAULT_DEVICE_PAGE};

/// Default floor on how long an executed step stays on screen
pub const DEFAULT_MIN_STEP_DURATION: Duration = Duration::from_secs(1);

/// Label shown once the queue is exhausted
pub const FINISHED_LABEL: &str = "Finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerPhase {
    /// No flow selected yet
    Idle,
    /// A step is shown and waiting for the action control
    Presenting,
    /// A step action is in flight
    Executing,
    /// The queue is empty
    Finished,
    /// The current step's action failed; advancing retries it
    Failed,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("step `{step}` failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: StepError,
    },
}

impl RunnerError {
    pub fn step(&self) -> &'static str {
        match self {
            RunnerError::Step { step, .. } => *step,
        }
    }
}

pub struct StepRunner {
    flows: Flows,
    queue: VecDeque<Step>,
    current: Option<Step>,
    state: FlowState,
    ui: Arc<dyn WalletUi>,
    settings: Arc<ConfigService>,
    min_step_duration: Duration,
    phase: RunnerPhase,
    run_id: Uuid,
    trigger: Option<Trigger>,
}

impl StepRunner {
    pub fn new(flows: Flows, ui: Arc<dyn WalletUi>, settings: Arc<ConfigService>) -> Self {
        Self {
            flows,
            queue: VecDeque::new(),
            current: None,
            state: FlowState::new(),
            ui,
            settings,
            min_step_duration: DEFAULT_MIN_STEP_DURATION,
            phase: RunnerPhase::Idle,
            run_id: Uuid::new_v4(),
            trigger: None,
        }
    }

    /// Override the minimum step duration
    pub fn with_min_step_duration(mut self, duration: Duration) -> Self {
        self.min_step_duration = duration;
        self
    }

    pub fn phase(&self) -> RunnerPhase {
        self.phase
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn trigger(&self) -> Option<Trigger> {
        self.trigger
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.current.as_ref()
    }

    /// Ids of the steps still queued, head first
    pub fn remaining(&self) -> Vec<&'static str> {
        self.queue.iter().map(|s| s.id).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RunnerPhase::Finished
    }

    /// Start the flow named by `signal`.
    ///
    /// Returns `Ok(false)` without touching anything when the signal is not a
    /// known trigger or a flow was already selected.
    pub async fn select_queue(&mut self, signal: &str) -> Result<bool, RunnerError> {
        let Some(trigger) = Trigger::parse(signal) else {
            debug!(signal, "ignoring unknown flow signal");
            return Ok(false);
        };
        if self.phase != RunnerPhase::Idle {
            warn!(signal, "flow already selected, ignoring signal");
            return Ok(false);
        }

        self.queue = self.flows.queue_for(trigger);
        self.trigger = Some(trigger);
        info!(
            run_id = %self.run_id,
            flow = trigger.flow_name(),
            steps = self.queue.len(),
            "flow selected"
        );

        if self.present() {
            self.advance().await?;
        }
        Ok(true)
    }

    /// Show the head of the queue, or the finished state if it is empty.
    ///
    /// Returns true when the presented step should run without waiting for
    /// the action control.
    pub fn present(&mut self) -> bool {
        let Some(step) = self.queue.front().cloned() else {
            self.current = None;
            self.ui.set_action(Some(FINISHED_LABEL));
            self.ui.set_loading(false, Some(FINISHED_LABEL));
            self.phase = RunnerPhase::Finished;
            info!(
                run_id = %self.run_id,
                fields = ?self.state.populated(),
                "flow finished"
            );
            return false;
        };

        self.ui
            .set_device_page(step.device_page.as_deref().unwrap_or(DEFAULT_DEVICE_PAGE));
        self.ui.instruction(step.instruction.as_deref());
        self.ui.set_action(step.action.as_deref());

        let auto = step.auto_start || (step.is_executable() && self.settings.auto_advance());
        debug!(step = step.id, auto, "presenting step");
        self.current = Some(step);
        self.phase = RunnerPhase::Presenting;
        auto
    }

    /// Complete the current step and move on.
    ///
    /// Keeps going while the newly presented steps ask to auto-advance. On
    /// failure the queue is left as it was, so calling `advance` again
    /// retries the same step against whatever state it already wrote.
    pub async fn advance(&mut self) -> Result<(), RunnerError> {
        loop {
            let Some(step) = self.current.clone() else {
                debug!(phase = ?self.phase, "nothing to advance");
                return Ok(());
            };

            if let Some(action) = step.execute.clone() {
                self.execute(&step, action).await?;
            }
            self.queue.pop_front();

            if !self.present() {
                return Ok(());
            }
        }
    }

    async fn execute(&mut self, step: &Step, action: Arc<dyn StepAction>) -> Result<(), RunnerError> {
        self.phase = RunnerPhase::Executing;
        self.ui.set_loading(true, None);
        let started = Instant::now();

        let ui = self.ui.as_ref();
        let (result, ()) = tokio::join!(
            action.execute(&mut self.state, ui),
            tokio::time::sleep(self.min_step_duration)
        );

        match result {
            Ok(()) => {
                self.ui.set_loading(false, None);
                info!(
                    run_id = %self.run_id,
                    step = step.id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "step completed"
                );
                Ok(())
            }
            Err(source) => {
                self.ui.error(&source.to_string());
                self.ui.set_loading(false, None);
                self.phase = RunnerPhase::Failed;
                warn!(
                    run_id = %self.run_id,
                    step = step.id,
                    error = %source,
                    "step failed"
                );
                Err(RunnerError::Step {
                    step: step.id,
                    source,
                })
            }
        }
    }
}
