//! Registry of the environment variables the wallet reads.
//!
//! All variables use the `DEMO_WALLET__` prefix with `__` separating the
//! config section from the key (e.g., `DEMO_WALLET__WALLET__AUTO_ADVANCE`).
//! Printed by `demo-wallet env`.

/// An environment variable definition
#[derive(Debug, Clone)]
pub struct EnvVar {
    /// Environment variable name (e.g., "DEMO_WALLET__WALLET__MAINNET")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Category for grouping in output
    pub category: EnvVarCategory,
    /// Whether a flow can run without it
    pub required: bool,
    /// Default value if not set
    pub default: Option<&'static str>,
    /// Example value
    pub example: Option<&'static str>,
}

/// Categories for organizing environment variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarCategory {
    /// Wallet and anchor settings
    Wallet,
    /// Step runner pacing
    Runner,
    /// Logging configuration
    Logging,
}

impl EnvVarCategory {
    /// Display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            EnvVarCategory::Wallet => "Wallet",
            EnvVarCategory::Runner => "Runner",
            EnvVarCategory::Logging => "Logging",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [EnvVarCategory] {
        &[
            EnvVarCategory::Wallet,
            EnvVarCategory::Runner,
            EnvVarCategory::Logging,
        ]
    }
}

/// Static registry of all documented environment variables
pub static ENV_VARS: &[EnvVar] = &[
    // === Wallet ===
    EnvVar {
        name: "DEMO_WALLET__WALLET__SECRET_KEY",
        description: "Secret seed of the wallet account",
        category: EnvVarCategory::Wallet,
        required: true,
        default: None,
        example: Some("SCZANGBA5YHT..."),
    },
    EnvVar {
        name: "DEMO_WALLET__WALLET__HOME_DOMAIN",
        description: "Anchor home domain hosting stellar.toml",
        category: EnvVarCategory::Wallet,
        required: false,
        default: Some("testanchor.stellar.org"),
        example: Some("anchor.example.com"),
    },
    EnvVar {
        name: "DEMO_WALLET__WALLET__ASSET_CODE",
        description: "Asset code to deposit or withdraw",
        category: EnvVarCategory::Wallet,
        required: false,
        default: Some("SRT"),
        example: Some("USDC"),
    },
    EnvVar {
        name: "DEMO_WALLET__WALLET__AUTO_ADVANCE",
        description: "Run every step without waiting for Enter",
        category: EnvVarCategory::Wallet,
        required: false,
        default: Some("false"),
        example: Some("true"),
    },
    EnvVar {
        name: "DEMO_WALLET__WALLET__MAINNET",
        description: "Use the public network instead of testnet",
        category: EnvVarCategory::Wallet,
        required: false,
        default: Some("false"),
        example: Some("true"),
    },
    EnvVar {
        name: "DEMO_WALLET__WALLET__HORIZON_URL",
        description: "Horizon server override (empty = network default)",
        category: EnvVarCategory::Wallet,
        required: false,
        default: Some(""),
        example: Some("https://horizon-testnet.stellar.org"),
    },
    // === Runner ===
    EnvVar {
        name: "DEMO_WALLET__RUNNER__MIN_STEP_MS",
        description: "Minimum time in milliseconds each executed step stays on screen",
        category: EnvVarCategory::Runner,
        required: false,
        default: Some("1000"),
        example: Some("0"),
    },
    // === Logging ===
    EnvVar {
        name: "DEMO_WALLET__LOGGING__LEVEL",
        description: "Log level (trace, debug, info, warn, error)",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some("info"),
        example: Some("debug"),
    },
    EnvVar {
        name: "DEMO_WALLET__LOGGING__TO_FILE",
        description: "Write logs to a file instead of stderr",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some("false"),
        example: Some("true"),
    },
    EnvVar {
        name: "DEMO_WALLET__LOGGING__DIR",
        description: "Directory for log files",
        category: EnvVarCategory::Logging,
        required: false,
        default: Some(".demo-wallet/logs"),
        example: Some("/tmp/demo-wallet"),
    },
];

/// Get all environment variables for a given category
pub fn env_vars_for_category(category: EnvVarCategory) -> impl Iterator<Item = &'static EnvVar> {
    ENV_VARS.iter().filter(move |v| v.category == category)
}

/// Get environment variables grouped by category
pub fn env_vars_by_category() -> Vec<(EnvVarCategory, Vec<&'static EnvVar>)> {
    EnvVarCategory::all()
        .iter()
        .map(|cat| {
            let vars: Vec<&EnvVar> = env_vars_for_category(*cat).collect();
            (*cat, vars)
        })
        .filter(|(_, vars)| !vars.is_empty())
        .collect()
}
