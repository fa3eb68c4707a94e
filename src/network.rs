//! Stellar network selection driven by the `MAINNET` setting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::config::WalletConfig;
use crate::settings::{ConfigService, ListenerId};
use crate::ui::WalletUi;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    #[default]
    Testnet,
    Public,
}

impl Network {
    pub fn from_mainnet_flag(mainnet: bool) -> Self {
        if mainnet {
            Network::Public
        } else {
            Network::Testnet
        }
    }

    /// Passphrase transactions are signed against
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Public => "Public Global Stellar Network ; September 2015",
        }
    }

    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Public => "https://horizon.stellar.org",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => f.write_str("testnet"),
            Network::Public => f.write_str("public"),
        }
    }
}

/// Network the wallet currently signs and submits against.
///
/// Cheap to clone; all clones share the same selection.
#[derive(Debug, Clone, Default)]
pub struct NetworkContext {
    current: Arc<RwLock<Selection>>,
}

#[derive(Debug, Default)]
struct Selection {
    network: Network,
    horizon_override: Option<String>,
}

impl NetworkContext {
    pub fn new(network: Network) -> Self {
        Self {
            current: Arc::new(RwLock::new(Selection {
                network,
                horizon_override: None,
            })),
        }
    }

    pub fn current(&self) -> Network {
        self.current.read().unwrap_or_else(|p| p.into_inner()).network
    }

    /// Horizon server for the current network, honoring the `HORIZON_URL` override
    pub fn horizon_url(&self) -> String {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        match &guard.horizon_override {
            Some(url) => url.clone(),
            None => guard.network.default_horizon_url().to_string(),
        }
    }

    pub fn use_network(&self, network: Network) {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        let previous = guard.network;
        if previous != network {
            tracing::info!(from = %previous, to = %network, "switching stellar network");
            guard.network = network;
        }
    }

    /// An empty `url` falls back to the network default
    pub fn set_horizon_override(&self, url: &str) {
        let url = url.trim();
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        guard.horizon_override = (!url.is_empty()).then(|| url.to_string());
    }
}

/// Keep `context` and the mainnet disclaimer in sync with the settings.
///
/// Applies the current settings immediately, then on every change.
pub fn install_network_listener(
    service: &ConfigService,
    context: NetworkContext,
    ui: Arc<dyn WalletUi>,
) -> ListenerId {
    let apply = move |settings: &WalletConfig| {
        ui.set_mainnet_disclaimer(settings.mainnet);
        context.use_network(Network::from_mainnet_flag(settings.mainnet));
        context.set_horizon_override(&settings.horizon_url);
    };
    apply(&service.snapshot());
    service.listen(apply)
}
