//! Line-oriented terminal front-end.
//!
//! Renders the device page, instruction, action label and loading state as
//! plain lines and reads user input (the flow choice and Enter presses) from
//! an async line source.

use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use super::{WalletUi, WALLET_PAGE};
use crate::flows::Trigger;

type LineSource = Lines<Box<dyn AsyncBufRead + Unpin + Send>>;

pub struct TerminalUi {
    input: tokio::sync::Mutex<LineSource>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl TerminalUi {
    /// Terminal bound to the process stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(BufReader::new(tokio::io::stdin())),
            Box::new(std::io::stdout()),
        )
    }

    pub fn new(input: Box<dyn AsyncBufRead + Unpin + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: tokio::sync::Mutex::new(input.lines()),
            output: Mutex::new(output),
        }
    }

    fn print(&self, line: &str) {
        // A poisoned or closed terminal is not worth failing a step over
        if let Ok(mut out) = self.output.lock() {
            if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                tracing::debug!(error = %e, "terminal write failed");
            }
        }
    }

    /// Next line of user input, or None once input is closed.
    pub async fn read_line(&self) -> Option<String> {
        let mut input = self.input.lock().await;
        match input.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read terminal input");
                None
            }
        }
    }

    /// Block until the user presses Enter on the action control.
    pub async fn wait_for_action(&self) -> bool {
        self.read_line().await.is_some()
    }
}

/// Map what the user typed on the wallet page to a flow-start signal.
fn wallet_page_choice(input: &str) -> Option<&'static str> {
    match input.trim().to_ascii_lowercase().as_str() {
        "w" | "withdraw" => Some(Trigger::StartWithdraw.as_str()),
        "d" | "deposit" => Some(Trigger::StartDeposit.as_str()),
        _ => None,
    }
}

#[async_trait]
impl WalletUi for TerminalUi {
    fn set_device_page(&self, page: &str) {
        self.print(&format!("[device] {page}"));
    }

    fn instruction(&self, text: Option<&str>) {
        if let Some(text) = text {
            self.print(&format!("  {text}"));
        }
    }

    fn set_action(&self, label: Option<&str>) {
        if let Some(label) = label {
            self.print(&format!("  > {label} [Enter]"));
        }
    }

    fn set_loading(&self, loading: bool, message: Option<&str>) {
        match (loading, message) {
            (true, Some(msg)) => self.print(&format!("  ... {msg}")),
            (true, None) => self.print("  ..."),
            (false, Some(msg)) => self.print(&format!("  {msg}")),
            (false, None) => {}
        }
    }

    fn error(&self, message: &str) {
        self.print(&format!("  ! {message}"));
    }

    fn set_mainnet_disclaimer(&self, visible: bool) {
        if visible {
            self.print("  !! MAINNET: this wallet moves real funds !!");
        }
    }

    async fn wait_for_page_message(&self, page: &str) -> Option<String> {
        if page != WALLET_PAGE {
            tracing::debug!(page, "no terminal prompt for page");
            return None;
        }
        loop {
            self.print("Start a [d]eposit or [w]ithdraw?");
            let line = self.read_line().await?;
            if let Some(signal) = wallet_page_choice(&line) {
                return Some(signal.to_string());
            }
        }
    }
}
