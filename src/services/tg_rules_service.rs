use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::RulesError;
use crate::models::TalkgroupRules;

fn io_error(path: &Path, source: std::io::Error) -> RulesError {
    RulesError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub async fn read_rules(path: impl AsRef<Path>) -> Result<TalkgroupRules, RulesError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// Replaces the rules file. The new contents go to a sibling temp file first
/// so the FNE never reads a half-written file.
pub async fn write_rules(path: impl AsRef<Path>, rules: &TalkgroupRules) -> Result<(), RulesError> {
    let path = path.as_ref();
    let yaml = serde_yaml::to_string(rules)?;

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    fs::write(&staging, yaml)
        .await
        .map_err(|e| io_error(path, e))?;
    fs::rename(&staging, path)
        .await
        .map_err(|e| io_error(path, e))?;

    info!(
        talkgroups = rules.total_talkgroups(),
        "Talkgroup rules written to {}",
        path.display()
    );
    Ok(())
}
