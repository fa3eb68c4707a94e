//! Owned configuration service for the wallet settings.
//!
//! Consumers get an `Arc<ConfigService>` injected instead of reaching for a
//! global. Changes made through [`ConfigService::set`] notify every listener
//! registered with [`ConfigService::listen`] until it is removed again with
//! [`ConfigService::unlisten`].

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

use crate::config::WalletConfig;

/// Named settings, keyed the way the settings form labels them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    AutoAdvance,
    Mainnet,
    HomeDomain,
    AssetCode,
    UserSecretKey,
    HorizonUrl,
}

impl Setting {
    pub fn all() -> &'static [Setting] {
        &[
            Setting::AutoAdvance,
            Setting::Mainnet,
            Setting::HomeDomain,
            Setting::AssetCode,
            Setting::UserSecretKey,
            Setting::HorizonUrl,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Setting::AutoAdvance => "AUTO_ADVANCE",
            Setting::Mainnet => "MAINNET",
            Setting::HomeDomain => "HOME_DOMAIN",
            Setting::AssetCode => "ASSET_CODE",
            Setting::UserSecretKey => "USER_SK",
            Setting::HorizonUrl => "HORIZON_URL",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.key() == key)
    }

    /// Whether the value must not be echoed back in full
    pub fn is_secret(&self) -> bool {
        matches!(self, Setting::UserSecretKey)
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Flag(bool),
    Text(String),
}

impl SettingValue {
    /// Raw form representation
    pub fn to_raw(&self) -> String {
        match self {
            SettingValue::Flag(b) => b.to_string(),
            SettingValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown setting `{0}`")]
    UnknownSetting(String),

    #[error("`{setting}` expects true/false, got `{value}`")]
    InvalidFlag { setting: Setting, value: String },

    #[error("invalid settings: {}", format_issues(.0))]
    Invalid(Vec<SettingIssue>),
}

/// One problem found while validating the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingIssue {
    pub setting: Setting,
    pub reason: String,
}

fn format_issues(issues: &[SettingIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{} {}", i.setting, i.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

fn parse_flag(setting: Setting, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            setting,
            value: raw.to_string(),
        }),
    }
}

/// Handle returned by [`ConfigService::listen`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&WalletConfig) + Send + Sync>;

/// Anything that can display and edit the settings.
pub trait SettingsForm {
    /// Fill the form with the current value of `setting`.
    fn populate(&mut self, setting: Setting, value: &SettingValue);
}

pub struct ConfigService {
    settings: RwLock<WalletConfig>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: Mutex<u64>,
}

impl ConfigService {
    pub fn new(settings: WalletConfig) -> Self {
        Self {
            settings: RwLock::new(settings),
            listeners: Mutex::new(Vec::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> WalletConfig {
        self.settings
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn get(&self, setting: Setting) -> SettingValue {
        let s = self.snapshot();
        match setting {
            Setting::AutoAdvance => SettingValue::Flag(s.auto_advance),
            Setting::Mainnet => SettingValue::Flag(s.mainnet),
            Setting::HomeDomain => SettingValue::Text(s.home_domain),
            Setting::AssetCode => SettingValue::Text(s.asset_code),
            Setting::UserSecretKey => SettingValue::Text(s.secret_key),
            Setting::HorizonUrl => SettingValue::Text(s.horizon_url),
        }
    }

    pub fn auto_advance(&self) -> bool {
        self.snapshot().auto_advance
    }

    pub fn mainnet(&self) -> bool {
        self.snapshot().mainnet
    }

    /// Apply a raw form value and notify listeners.
    pub fn set(&self, setting: Setting, raw: &str) -> Result<(), ConfigError> {
        let updated = {
            let mut guard = self
                .settings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match setting {
                Setting::AutoAdvance => guard.auto_advance = parse_flag(setting, raw)?,
                Setting::Mainnet => guard.mainnet = parse_flag(setting, raw)?,
                Setting::HomeDomain => guard.home_domain = raw.trim().to_string(),
                Setting::AssetCode => guard.asset_code = raw.trim().to_string(),
                Setting::UserSecretKey => guard.secret_key = raw.trim().to_string(),
                Setting::HorizonUrl => guard.horizon_url = raw.trim().to_string(),
            }
            guard.clone()
        };
        tracing::debug!(setting = %setting, "setting changed");
        self.notify(&updated);
        Ok(())
    }

    /// Same as [`set`](Self::set) but addressed by form key.
    pub fn set_key(&self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let setting =
            Setting::from_key(key).ok_or_else(|| ConfigError::UnknownSetting(key.to_string()))?;
        self.set(setting, raw)
    }

    /// Register a change listener.
    pub fn listen<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&WalletConfig) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(|p| p.into_inner());
            *next += 1;
            ListenerId(*next)
        };
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was already gone.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn notify(&self, settings: &WalletConfig) {
        // Clone out so listeners can (un)register without deadlocking
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(settings);
        }
    }

    /// Check that the settings are complete enough to run a flow.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let issues = validate_settings(&self.snapshot());
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Fill `form` with every current setting.
    pub fn bind_form(&self, form: &mut dyn SettingsForm) {
        for setting in Setting::all() {
            form.populate(*setting, &self.get(*setting));
        }
    }
}

fn validate_settings(settings: &WalletConfig) -> Vec<SettingIssue> {
    let mut issues = Vec::new();

    if settings.home_domain.is_empty() {
        issues.push(SettingIssue {
            setting: Setting::HomeDomain,
            reason: "is required".to_string(),
        });
    } else if settings.home_domain.contains("://") || settings.home_domain.contains('/') {
        issues.push(SettingIssue {
            setting: Setting::HomeDomain,
            reason: "must be a bare domain without scheme or path".to_string(),
        });
    }

    let code_len = settings.asset_code.len();
    if code_len == 0 || code_len > 12 || !settings.asset_code.chars().all(|c| c.is_ascii_alphanumeric()) {
        issues.push(SettingIssue {
            setting: Setting::AssetCode,
            reason: "must be 1-12 alphanumeric characters".to_string(),
        });
    }

    // Stellar secret seeds are 56 base32 characters starting with S
    let sk = &settings.secret_key;
    if sk.len() != 56
        || !sk.starts_with('S')
        || !sk.chars().all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
    {
        issues.push(SettingIssue {
            setting: Setting::UserSecretKey,
            reason: "must be a 56 character secret seed starting with S".to_string(),
        });
    }

    if !settings.horizon_url.is_empty()
        && !(settings.horizon_url.starts_with("https://") || settings.horizon_url.starts_with("http://"))
    {
        issues.push(SettingIssue {
            setting: Setting::HorizonUrl,
            reason: "must be an http(s) URL".to_string(),
        });
    }

    issues
}
