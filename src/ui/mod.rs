//! UI façade consumed by the step runner and step actions.
//!
//! The runner only ever talks to the user through [`WalletUi`]; the terminal
//! front-end lives in [`terminal`].

use async_trait::async_trait;

pub mod terminal;

pub use terminal::TerminalUi;

/// Page shown while a step has no page of its own.
pub const DEFAULT_DEVICE_PAGE: &str = "pages/loader.html";

/// Page the flow-start signal is expected from.
pub const WALLET_PAGE: &str = "pages/wallet.html";

#[async_trait]
pub trait WalletUi: Send + Sync {
    /// Switch the simulated device screen to `page`.
    fn set_device_page(&self, page: &str);

    /// Show the instruction text for the current step (None clears it).
    fn instruction(&self, text: Option<&str>);

    /// Set the label of the action control (None hides it).
    fn set_action(&self, label: Option<&str>);

    /// Toggle the loading indicator, optionally with a message.
    fn set_loading(&self, loading: bool, message: Option<&str>);

    /// Report a failure to the user.
    fn error(&self, message: &str);

    /// Show or hide the mainnet disclaimer.
    fn set_mainnet_disclaimer(&self, visible: bool);

    /// Wait for a one-shot message posted by `page`.
    ///
    /// Returns None if the message source closes before anything arrives.
    async fn wait_for_page_message(&self, page: &str) -> Option<String>;
}
