use std::path::{Path, PathBuf};

use crate::errors::{PilotError, PilotResult};
use crate::model::AuthResult;

pub const COOKIE_FILE: &str = "cookies.json";
pub const PROFILE_FILE: &str = "profile.json";

/// Per-platform session directory under the data root, e.g.
/// `<root>/eitaa_session`.
pub fn session_dir(data_root: &Path, slug: &str) -> PathBuf {
    data_root.join(format!("{slug}_session"))
}

pub fn cookie_path(session_dir: &Path) -> PathBuf {
    session_dir.join(COOKIE_FILE)
}

pub fn profile_path(session_dir: &Path) -> PathBuf {
    session_dir.join(PROFILE_FILE)
}

/// Writes the profile snapshot produced by the login flow. Written once;
/// nothing else mutates it afterwards.
pub fn write_profile(session_dir: &Path, profile: &AuthResult) -> PilotResult<()> {
    std::fs::create_dir_all(session_dir)?;
    let path = profile_path(session_dir);
    std::fs::write(&path, serde_json::to_string_pretty(profile)?)?;
    tracing::info!(path = %path.display(), "profile snapshot written");
    Ok(())
}

pub fn read_profile(session_dir: &Path) -> PilotResult<Option<AuthResult>> {
    let path = profile_path(session_dir);
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Replaces `target` with the contents of `staging`: the new profile is
/// moved aside under a unique name first, the old directory removed, and
/// the staging tree moved in. A concurrent reader of `target` during the
/// swap is unsupported.
pub fn install_profile(staging: &Path, target: &Path) -> PilotResult<()> {
    if !staging.is_dir() {
        return Err(PilotError::Config(format!(
            "staging dir {} does not exist",
            staging.display()
        )));
    }
    let parent = target
        .parent()
        .ok_or_else(|| PilotError::Config(format!("target {} has no parent", target.display())))?;
    std::fs::create_dir_all(parent)?;

    let incoming = parent.join(format!(".incoming-{}", uuid::Uuid::new_v4()));
    move_or_copy(staging, &incoming)?;

    if target.exists() {
        std::fs::remove_dir_all(target)?;
    }
    std::fs::rename(&incoming, target)?;
    tracing::info!(target = %target.display(), "session profile installed");
    Ok(())
}

/// Rename when possible, recursive copy across filesystems otherwise.
fn move_or_copy(from: &Path, to: &Path) -> PilotResult<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_tree(from, to)?;
            std::fs::remove_dir_all(from)?;
            Ok(())
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> PilotResult<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_dir_uses_platform_slug() {
        let dir = session_dir(Path::new("/data"), "eitaa");
        assert_eq!(dir, PathBuf::from("/data/eitaa_session"));
    }

    #[test]
    fn profile_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = AuthResult {
            name: "Sara".into(),
            phone: "+989120001122".into(),
        };
        write_profile(tmp.path(), &profile).unwrap();
        assert_eq!(read_profile(tmp.path()).unwrap(), Some(profile));
    }

    #[test]
    fn missing_profile_reads_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(read_profile(tmp.path()).unwrap(), None);
    }

    #[test]
    fn install_profile_replaces_old_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("bale_session");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("stale.txt"), "old").unwrap();

        let staging = tmp.path().join("staging");
        std::fs::create_dir_all(staging.join("Default")).unwrap();
        std::fs::write(staging.join(COOKIE_FILE), "[]").unwrap();
        std::fs::write(staging.join("Default").join("Prefs"), "{}").unwrap();

        install_profile(&staging, &target).unwrap();

        assert!(!target.join("stale.txt").exists());
        assert!(target.join(COOKIE_FILE).exists());
        assert!(target.join("Default").join("Prefs").exists());
        assert!(!staging.exists());
    }

    #[test]
    fn install_profile_rejects_missing_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let err = install_profile(&tmp.path().join("nope"), &tmp.path().join("t")).unwrap_err();
        assert!(matches!(err, PilotError::Config(_)));
    }
}
