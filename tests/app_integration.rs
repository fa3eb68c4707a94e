//! Drives the terminal app with scripted input.

use std::sync::Arc;

use demo_wallet::app::{App, RunOptions, RunOutcome};
use demo_wallet::config::Config;
use demo_wallet::flows::{StepId, Trigger};
use demo_wallet::ui::TerminalUi;

fn config() -> Config {
    let mut config = Config::default();
    config.wallet.secret_key = "SCZANGBA5YHTNYVVV4C3U252E2B6P6F5T3U6MM63WBSBZATAQI3EBTQ4".into();
    config.runner.min_step_ms = 0;
    config
}

fn app(input: &'static str) -> App {
    let ui = TerminalUi::new(Box::new(input.as_bytes()), Box::new(std::io::sink()));
    App::new(config(), Arc::new(ui))
}

#[tokio::test]
async fn prompted_withdraw_finishes_after_seven_presses() {
    // sep10_sign and poll_for_success start on their own
    let input = "w\n\n\n\n\n\n\n\n";
    let outcome = app(input).run(RunOptions::default()).await.unwrap();

    let RunOutcome::Finished { state, .. } = outcome else {
        panic!("expected the withdraw flow to finish, got {outcome:?}");
    };
    assert_eq!(state.external_transaction_id.as_deref(), Some("sim-0001"));
}

#[tokio::test]
async fn input_closing_mid_flow_reports_remaining_steps() {
    let options = RunOptions {
        flow: Some(Trigger::StartDeposit),
        fail_step: None,
    };
    let outcome = app("\n").run(options).await.unwrap();

    let RunOutcome::Aborted { remaining, .. } = outcome else {
        panic!("expected an aborted run, got {outcome:?}");
    };
    assert_eq!(remaining, vec!["sep10_start", "sep10_sign", "sep10_send", "get_deposit", "show_interactive_webapp"]);
}

#[tokio::test]
async fn failed_step_needs_an_extra_press() {
    let options = RunOptions {
        flow: Some(Trigger::StartDeposit),
        fail_step: Some(StepId::GetDeposit),
    };
    // 5 presses finish the deposit flow; one more covers the failed attempt
    let outcome = app("\n\n\n\n\n\n").run(options).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Finished { .. }));
}
