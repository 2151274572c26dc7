use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{PilotError, PilotResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Root under which per-platform session directories live. Resolved
    /// via the OS data dir when absent.
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Per-platform overrides, keyed by platform slug ("eitaa", "bale",
    /// "rubika", "whatsapp").
    #[serde(default)]
    pub platforms: HashMap<String, PlatformEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// chromedriver binary; resolved through PATH when not absolute.
    #[serde(default = "default_driver_binary")]
    pub binary: String,
    /// Each session gets `base_port + platform index`, so concurrent
    /// per-platform sessions never collide.
    #[serde(default = "default_base_port")]
    pub base_port: u16,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary: default_driver_binary(),
            base_port: default_base_port(),
        }
    }
}

fn default_driver_binary() -> String {
    "chromedriver".into()
}

fn default_base_port() -> u16 {
    9515
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Page-load budget for full navigations.
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,
    /// Budget for the entry-surface anchor element after navigation.
    #[serde(default = "default_entry_timeout_ms")]
    pub entry_timeout_ms: u64,
    /// Default per-step readiness budget.
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,
    /// Outcome-confirmation polling cadence.
    #[serde(default = "default_confirm_interval_ms")]
    pub confirm_interval_ms: u64,
    #[serde(default = "default_confirm_attempts")]
    pub confirm_attempts: u32,
    /// Delay between batch items.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            nav_timeout_ms: default_nav_timeout_ms(),
            entry_timeout_ms: default_entry_timeout_ms(),
            step_timeout_ms: default_step_timeout_ms(),
            confirm_interval_ms: default_confirm_interval_ms(),
            confirm_attempts: default_confirm_attempts(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl TimingConfig {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    pub fn entry_timeout(&self) -> Duration {
        Duration::from_millis(self.entry_timeout_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn confirm_plan(&self) -> crate::poll::PollPlan {
        crate::poll::PollPlan::new(
            Duration::from_millis(self.confirm_interval_ms),
            self.confirm_attempts,
        )
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

fn default_nav_timeout_ms() -> u64 {
    90_000
}

fn default_entry_timeout_ms() -> u64 {
    20_000
}

fn default_step_timeout_ms() -> u64 {
    5_000
}

fn default_confirm_interval_ms() -> u64 {
    500
}

fn default_confirm_attempts() -> u32 {
    6
}

fn default_pacing_ms() -> u64 {
    1_500
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolicyConfig {
    /// What to report when the confirmation window closes without any
    /// signal. Optimistic is the shipped product behavior; see DESIGN.md
    /// before changing the default.
    #[serde(default)]
    pub unconfirmed: UnconfirmedPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnconfirmedPolicy {
    #[default]
    Optimistic,
    Pessimistic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEntry {
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Per-action pacing delay, mirroring the driver's slow-mo launch
    /// option.
    #[serde(default)]
    pub slow_mo_ms: u64,
    /// Some fronts gate features on the reported browser; override when
    /// needed.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for PlatformEntry {
    fn default() -> Self {
        Self {
            headless: true,
            slow_mo_ms: 0,
            user_agent: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn platform_entry(&self, slug: &str) -> PlatformEntry {
        self.platforms.get(slug).cloned().unwrap_or_default()
    }

    /// Session storage root: explicit `data_dir`, else the OS data dir,
    /// else the working directory.
    pub fn data_root(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        if let Some(base) = dirs::data_local_dir() {
            return base.join("msgpilot");
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

fn resolve_config_path() -> PilotResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("msgpilot.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("msgpilot.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(PilotError::Config(
        "msgpilot.toml not found next to executable or in working directory".into(),
    ))
}

/// Loads `msgpilot.toml`; callers that want defaults without a file use
/// `AppConfig::default()` directly.
pub fn load_config() -> PilotResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> PilotResult<()> {
    let path = resolve_config_path()?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_confirmation_window() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.timing.confirm_attempts, 6);
        assert_eq!(cfg.timing.confirm_interval_ms, 500);
        assert_eq!(cfg.policy.unconfirmed, UnconfirmedPolicy::Optimistic);
    }

    #[test]
    fn platform_entry_falls_back_to_defaults() {
        let mut cfg = AppConfig::default();
        cfg.platforms.insert(
            "bale".into(),
            PlatformEntry {
                headless: false,
                slow_mo_ms: 150,
                user_agent: None,
            },
        );
        assert!(!cfg.platform_entry("bale").headless);
        assert!(cfg.platform_entry("eitaa").headless);
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [timing]
            confirm_attempts = 12

            [policy]
            unconfirmed = "pessimistic"

            [platforms.whatsapp]
            headless = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timing.confirm_attempts, 12);
        assert_eq!(cfg.timing.confirm_interval_ms, 500);
        assert_eq!(cfg.policy.unconfirmed, UnconfirmedPolicy::Pessimistic);
        assert!(!cfg.platform_entry("whatsapp").headless);
    }
}
