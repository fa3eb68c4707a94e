//! End-to-end runs of the withdraw and deposit flows against the simulated
//! anchor, observed through a recording UI.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use demo_wallet::config::WalletConfig;
use demo_wallet::flows::{Flows, StepId, DEPOSIT_STEPS, WITHDRAW_STEPS};
use demo_wallet::network::{install_network_listener, Network, NetworkContext};
use demo_wallet::runner::{RunnerPhase, StepRunner, FINISHED_LABEL};
use demo_wallet::sandbox::SimulatedAnchor;
use demo_wallet::settings::{ConfigService, Setting};
use demo_wallet::state::StateField;
use demo_wallet::ui::WalletUi;

// ─── Test Helpers ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum UiEvent {
    Page(String),
    Action(Option<String>),
    Loading(bool, Option<String>),
    Error(String),
    Disclaimer(bool),
}

#[derive(Default)]
struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn count(&self, pred: impl Fn(&UiEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

#[async_trait]
impl WalletUi for RecordingUi {
    fn set_device_page(&self, page: &str) {
        self.record(UiEvent::Page(page.to_string()));
    }
    fn instruction(&self, _text: Option<&str>) {}
    fn set_action(&self, label: Option<&str>) {
        self.record(UiEvent::Action(label.map(str::to_string)));
    }
    fn set_loading(&self, loading: bool, message: Option<&str>) {
        self.record(UiEvent::Loading(loading, message.map(str::to_string)));
    }
    fn error(&self, message: &str) {
        self.record(UiEvent::Error(message.to_string()));
    }
    fn set_mainnet_disclaimer(&self, visible: bool) {
        self.record(UiEvent::Disclaimer(visible));
    }
    async fn wait_for_page_message(&self, _page: &str) -> Option<String> {
        None
    }
}

fn settings() -> WalletConfig {
    WalletConfig {
        secret_key: "SCZANGBA5YHTNYVVV4C3U252E2B6P6F5T3U6MM63WBSBZATAQI3EBTQ4".into(),
        ..WalletConfig::default()
    }
}

fn runner_for(anchor: &SimulatedAnchor, service: Arc<ConfigService>) -> (StepRunner, Arc<RecordingUi>) {
    let ui = Arc::new(RecordingUi::default());
    let runner = StepRunner::new(Flows::from_catalog(anchor), ui.clone(), service)
        .with_min_step_duration(Duration::from_millis(1000));
    (runner, ui)
}

/// Press the action control until the flow finishes, returning the number of presses.
async fn press_until_finished(runner: &mut StepRunner) -> usize {
    let mut presses = 0;
    while !runner.is_finished() {
        runner.advance().await.expect("step should succeed");
        presses += 1;
        assert!(presses <= 20, "flow did not finish");
    }
    presses
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn withdraw_flow_runs_all_nine_steps_then_finishes() {
    let service = Arc::new(ConfigService::new(settings()));
    let anchor = SimulatedAnchor::new(&service.snapshot());
    let (mut runner, ui) = runner_for(&anchor, service);

    assert!(runner.select_queue("start-withdraw").await.unwrap());
    assert_eq!(runner.remaining().len(), WITHDRAW_STEPS.len());
    assert_eq!(runner.remaining()[0], "check_info");

    let started = tokio::time::Instant::now();
    press_until_finished(&mut runner).await;

    // Every step executed, each holding the screen for the minimum duration
    assert!(started.elapsed() >= Duration::from_secs(9));
    assert_eq!(ui.count(|e| matches!(e, UiEvent::Loading(true, _))), 9);
    assert!(runner.remaining().is_empty());
    assert_eq!(runner.phase(), RunnerPhase::Finished);

    let events = ui.events();
    assert_eq!(
        &events[events.len() - 2..],
        &[
            UiEvent::Action(Some(FINISHED_LABEL.into())),
            UiEvent::Loading(false, Some(FINISHED_LABEL.into())),
        ]
    );

    let state = runner.state();
    assert!(state.token.is_some());
    assert_eq!(state.external_transaction_id.as_deref(), Some("sim-0001"));
}

#[tokio::test(start_paused = true)]
async fn deposit_flow_never_touches_withdraw_only_steps() {
    let service = Arc::new(ConfigService::new(settings()));
    let anchor = SimulatedAnchor::new(&service.snapshot());
    let (mut runner, ui) = runner_for(&anchor, service);

    runner.select_queue("start-deposit").await.unwrap();
    assert_eq!(runner.remaining().len(), DEPOSIT_STEPS.len());

    press_until_finished(&mut runner).await;

    assert_eq!(ui.count(|e| matches!(e, UiEvent::Loading(true, _))), 6);
    let state = runner.state();
    assert_eq!(state.deposit_memo.as_deref(), Some("4242"));
    // Only the withdraw payment step writes the transaction id
    assert!(state.get(StateField::ExternalTransactionId).is_none());
    assert!(!ui
        .events()
        .contains(&UiEvent::Page("pages/confirm-payment.html".into())));
}

#[tokio::test(start_paused = true)]
async fn auto_advance_completes_flow_on_selection() {
    let mut wallet = settings();
    wallet.auto_advance = true;
    let service = Arc::new(ConfigService::new(wallet));
    let anchor = SimulatedAnchor::new(&service.snapshot());
    let (mut runner, _ui) = runner_for(&anchor, service);

    runner.select_queue("start-withdraw").await.unwrap();
    assert!(runner.is_finished());
}

#[tokio::test(start_paused = true)]
async fn failed_step_is_retried_by_next_press() {
    let service = Arc::new(ConfigService::new(settings()));
    let anchor = SimulatedAnchor::new(&service.snapshot()).failing(StepId::Sep10Start, 1);
    let (mut runner, ui) = runner_for(&anchor, service);

    runner.select_queue("start-withdraw").await.unwrap();
    runner.advance().await.unwrap(); // check_info

    let before = runner.remaining();
    let err = runner.advance().await.unwrap_err();
    assert_eq!(err.step(), "sep10_start");
    assert_eq!(runner.remaining(), before);
    assert_eq!(runner.phase(), RunnerPhase::Failed);
    assert_eq!(ui.count(|e| matches!(e, UiEvent::Error(_))), 1);
    assert_eq!(ui.events().last(), Some(&UiEvent::Loading(false, None)));

    // Retry succeeds; sep10_sign auto-starts behind it
    runner.advance().await.unwrap();
    assert_eq!(runner.remaining()[0], "sep10_send");
    press_until_finished(&mut runner).await;
}

#[tokio::test(start_paused = true)]
async fn mainnet_toggle_switches_network_without_advancing() {
    let service = Arc::new(ConfigService::new(settings()));
    let anchor = SimulatedAnchor::new(&service.snapshot());
    let (mut runner, ui) = runner_for(&anchor, service.clone());
    let context = NetworkContext::new(Network::Testnet);

    install_network_listener(&service, context.clone(), ui.clone());
    runner.select_queue("start-withdraw").await.unwrap();
    let remaining = runner.remaining();

    service.set(Setting::Mainnet, "true").unwrap();

    assert_eq!(context.current(), Network::Public);
    assert_eq!(ui.events().last(), Some(&UiEvent::Disclaimer(true)));
    assert_eq!(runner.remaining(), remaining);
    assert_eq!(runner.phase(), RunnerPhase::Presenting);

    service.set(Setting::Mainnet, "false").unwrap();
    assert_eq!(context.current(), Network::Testnet);
    assert_eq!(ui.events().last(), Some(&UiEvent::Disclaimer(false)));
}

#[tokio::test(start_paused = true)]
async fn horizon_setting_overrides_network_default() {
    let service = Arc::new(ConfigService::new(settings()));
    let ui = Arc::new(RecordingUi::default());
    let context = NetworkContext::default();
    install_network_listener(&service, context.clone(), ui);
    assert_eq!(context.horizon_url(), "https://horizon-testnet.stellar.org");

    service.set(Setting::HorizonUrl, "http://localhost:8000").unwrap();
    service.set(Setting::Mainnet, "true").unwrap();
    assert_eq!(context.horizon_url(), "http://localhost:8000");

    service.set(Setting::HorizonUrl, "").unwrap();
    assert_eq!(context.horizon_url(), "https://horizon.stellar.org");
}

#[tokio::test(start_paused = true)]
async fn slow_anchor_is_not_padded_past_its_own_latency() {
    let service = Arc::new(ConfigService::new(settings()));
    let anchor = SimulatedAnchor::new(&service.snapshot()).with_latency(Duration::from_millis(1500));
    let (mut runner, _ui) = runner_for(&anchor, service);
    runner.select_queue("start-deposit").await.unwrap();

    // The floor runs alongside the action, so a 1.5s step takes 1.5s, not 2.5s
    let started = tokio::time::Instant::now();
    runner.advance().await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1500));
    assert!(elapsed < Duration::from_millis(2500));
    assert_eq!(runner.remaining()[0], "sep10_start");
}
