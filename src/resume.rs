//! The local resume file that lets a relaunched device reattach to its game.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ResumeFileError;

/// What is persisted after a successful reset or join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    /// Address of the game's log group.
    pub log_address: String,
    /// Whether this device created the game.
    pub is_owner: bool,
}

impl ResumeState {
    /// Writes the state, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ResumeFileError> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reads a previously saved state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self, ResumeFileError> {
        let json = fs::read(path)?;
        Ok(serde_json::from_slice(&json)?)
    }
}
