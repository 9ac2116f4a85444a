//! Explicit capability passed into every mutation.
//!
//! There is no process-wide "current role"; callers build an
//! [`AccessContext`] (normally from [`crate::config::AppConfig::role`]) and hand
//! it to the operations that write.

use crate::errors::{Error, Result};
use serde::Deserialize;

/// What the operator is allowed to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May create, edit and delete
    #[default]
    Editor,
    /// Read-only
    Viewer,
}

/// Capability value threaded through mutating calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessContext {
    /// Role of the operator
    pub role: Role,
}

impl AccessContext {
    /// Context for an operator with the given role.
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self { role }
    }

    /// Full read/write access.
    #[must_use]
    pub const fn editor() -> Self {
        Self::new(Role::Editor)
    }

    /// Read-only access.
    #[must_use]
    pub const fn viewer() -> Self {
        Self::new(Role::Viewer)
    }

    /// Whether mutations are allowed.
    #[must_use]
    pub fn can_edit(self) -> bool {
        self.role == Role::Editor
    }

    /// Fails with [`Error::Forbidden`] unless the context may edit.
    pub fn require_editor(self, action: &str) -> Result<()> {
        if self.can_edit() {
            Ok(())
        } else {
            Err(Error::Forbidden {
                action: action.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_is_rejected() {
        let result = AccessContext::viewer().require_editor("delete client");
        assert!(matches!(result, Err(Error::Forbidden { action }) if action == "delete client"));
    }

    #[test]
    fn test_editor_is_allowed() {
        assert!(AccessContext::editor().require_editor("create deal").is_ok());
        assert!(AccessContext::default().can_edit());
    }
}
