use std::path::Path;

use async_trait::async_trait;

use crate::errors::PilotResult;
use crate::model::AuthResult;
use crate::storage;

/// Result of one interactive login attempt. On success the target
/// session directory has been replaced with a freshly authenticated
/// profile and `profile` carries the account snapshot.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
    pub profile: Option<AuthResult>,
}

impl LoginOutcome {
    pub fn succeeded(message: impl Into<String>, profile: AuthResult) -> Self {
        Self {
            success: true,
            message: message.into(),
            profile: Some(profile),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            profile: None,
        }
    }
}

/// The one-time interactive login/cookie-extraction flow. It feeds the
/// session store and has no recurring state machine, so only its output
/// contract lives here; implementations drive a visible browser and a
/// human.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn login(&self, target_dir: &Path) -> PilotResult<LoginOutcome>;
}

/// Finalizes a successful login: installs the staged browser profile
/// into the session directory and records the account snapshot beside
/// the cookies.
pub fn finish_login(staging: &Path, target_dir: &Path, profile: &AuthResult) -> PilotResult<()> {
    storage::install_profile(staging, target_dir)?;
    storage::write_profile(target_dir, profile)?;
    Ok(())
}
