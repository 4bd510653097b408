use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Required length of an assignee code.
pub const ASSIGNEE_CODE_LEN: usize = 3;

/// An inventory item.
///
/// `mac`, `name` and `ip` each identify the asset on their own and must be
/// unique across a store. `assignee` is either empty (unassigned) or a
/// three-character employee code. After creation only `assignee` changes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    pub mac: String,
    pub name: String,
    pub ip: String,
    pub assignee: String,
    pub description: String,
}

impl Asset {
    pub fn new(mac: impl Into<String>, name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self { mac: mac.into(), name: name.into(), ip: ip.into(), ..Default::default() }
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_assigned(&self) -> bool {
        !self.assignee.is_empty()
    }

    /// Check mandatory fields and the assignee code format.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.mac.is_empty() || self.name.is_empty() || self.ip.is_empty() {
            return Err(ModelError::Validation("mac, name and ip are mandatory fields".into()));
        }
        validate_assignee(&self.assignee)
    }

    /// True when any identifying attribute matches `other`.
    pub fn collides_with(&self, other: &Asset) -> bool {
        self.mac == other.mac || self.name == other.name || self.ip == other.ip
    }
}

/// An assignee is valid when empty or exactly [`ASSIGNEE_CODE_LEN`] characters.
pub fn validate_assignee(assignee: &str) -> Result<(), ModelError> {
    if !assignee.is_empty() && assignee.chars().count() != ASSIGNEE_CODE_LEN {
        return Err(ModelError::Validation(format!(
            "assignee code must be exactly {ASSIGNEE_CODE_LEN} characters long"
        )));
    }
    Ok(())
}
