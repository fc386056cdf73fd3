//! Operator identity and role gating.
//!
//! Gated commands receive an explicit [`Identity`] resolved from the
//! configured operators map. A missing or unknown operator and a wrong
//! role are distinct failures, and a denied command performs no further
//! work of any kind.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// An authenticated operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The operator name.
    pub username: String,
    /// The single role the operator holds.
    pub role: String,
}

impl Identity {
    /// One-shot gate: pass iff this identity holds `required`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] naming both roles on mismatch.
    pub fn require_role(&self, required: &str) -> Result<()> {
        if self.role == required {
            Ok(())
        } else {
            Err(Error::access_denied(required, &self.username, &self.role))
        }
    }
}

/// Resolve an operator name against the configured operators map.
///
/// # Errors
///
/// Returns [`Error::NotAuthenticated`] when no name is supplied and
/// [`Error::UnknownOperator`] when the name is not configured.
pub fn authenticate(
    operators: &BTreeMap<String, String>,
    username: Option<&str>,
) -> Result<Identity> {
    let username = username.ok_or(Error::NotAuthenticated)?;
    let role = operators
        .get(username)
        .ok_or_else(|| Error::UnknownOperator {
            username: username.to_string(),
        })?;
    Ok(Identity {
        username: username.to_string(),
        role: role.clone(),
    })
}
