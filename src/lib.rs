//! Demo wallet - walks a user through Stellar SEP-10 authentication and
//! SEP-24 deposit/withdraw flows, one step at a time.
//!
//! The core is [`runner::StepRunner`], which drives a queue of
//! [`step::Step`]s against a shared [`state::FlowState`] and reports to a
//! [`ui::WalletUi`].

pub mod app;
pub mod config;
pub mod env_vars;
pub mod flows;
pub mod logging;
pub mod network;
pub mod runner;
pub mod sandbox;
pub mod settings;
pub mod state;
pub mod step;
pub mod ui;
