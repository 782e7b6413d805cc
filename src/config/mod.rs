//! Session file loading and saving
//!
//! Sessions are YAML by default; files ending in `.json` are read and written
//! as JSON.

use crate::automation::Session;
use anyhow::{Context, Result};
use std::path::Path;

/// Example session written by `lanes init`
pub const EXAMPLE_SESSION: &str = include_str!("../../session.example.yaml");

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parse a session from text in the given format
pub fn parse_session(contents: &str, json: bool) -> Result<Session> {
    let session: Session = if json {
        serde_json::from_str(contents).context("invalid JSON session")?
    } else {
        serde_yaml::from_str(contents).context("invalid YAML session")?
    };
    session.validate()?;
    for warning in session.warnings() {
        log::warn!("{}", warning);
    }
    Ok(session)
}

/// Load a session from a YAML or JSON file
pub fn load_session(path: &Path) -> Result<Session> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file: {:?}", path))?;
    parse_session(&contents, is_json(path))
        .with_context(|| format!("failed to load session from {:?}", path))
}

/// Save a session as YAML or JSON, chosen by file extension
pub fn save_session(session: &Session, path: &Path) -> Result<()> {
    let contents = if is_json(path) {
        serde_json::to_string_pretty(session)?
    } else {
        serde_yaml::to_string(session)?
    };
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write session file: {:?}", path))?;
    Ok(())
}
