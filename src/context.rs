//! Per-request context
//!
//! A [`RequestContext`] is an immutable value passed into every handler.
//! Signing in, signing out and admin elevation are pure functions that return
//! a new context; nothing is mutated in place.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{QualityError, Result, ValidationError};
use crate::types::{Role, Scope};

/// Who is asking, and for which branch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// `None` until someone signs in
    pub role: Option<Role>,

    /// Set only for the branch role
    pub branch: Option<String>,

    /// Admin elevation (export, diagnostics)
    #[serde(default)]
    pub admin: bool,
}

impl RequestContext {
    /// Nobody signed in
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Sign in as staff of `branch`
    pub fn sign_in_branch(&self, branch: &str) -> Result<Self> {
        let branch = branch.trim();
        if branch.is_empty() {
            return Err(ValidationError::new("branch", "choose a branch to continue").into());
        }

        Ok(Self {
            role: Some(Role::Branch),
            branch: Some(branch.to_string()),
            admin: self.admin,
        })
    }

    /// Sign in as headquarters
    pub fn sign_in_headquarters(&self) -> Self {
        Self {
            role: Some(Role::Headquarters),
            branch: None,
            admin: self.admin,
        }
    }

    /// Back to the landing state; admin elevation is kept
    pub fn sign_out(&self) -> Self {
        Self {
            role: None,
            branch: None,
            admin: self.admin,
        }
    }

    /// Grant admin rights when `password` matches `expected`
    pub fn elevate_admin(&self, password: &str, expected: &SecretString) -> Result<Self> {
        if password != expected.expose_secret() {
            return Err(QualityError::NotPermitted("wrong admin password".to_string()));
        }

        Ok(Self {
            admin: true,
            ..self.clone()
        })
    }

    pub fn drop_admin(&self) -> Self {
        Self {
            admin: false,
            ..self.clone()
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.role.is_some()
    }

    /// Scope a report defaults to for this context
    pub fn default_scope(&self) -> Scope {
        match (self.role, &self.branch) {
            (Some(Role::Branch), Some(branch)) => Scope::Branch(branch.clone()),
            _ => Scope::Network,
        }
    }

    /// Branch a submission is recorded against
    ///
    /// Branch staff always submit for their own branch; headquarters must
    /// name one explicitly.
    pub fn submission_branch(&self, requested: Option<&str>) -> Result<String> {
        match (self.role, &self.branch) {
            (None, _) => Err(QualityError::NotPermitted(
                "sign in as a branch or headquarters before submitting".to_string(),
            )),
            (Some(Role::Branch), Some(own)) => Ok(own.clone()),
            (Some(Role::Branch), None) => Err(QualityError::NotPermitted(
                "branch context has no branch selected".to_string(),
            )),
            (Some(Role::Headquarters), _) => match requested.map(str::trim) {
                Some(branch) if !branch.is_empty() => Ok(branch.to_string()),
                _ => Err(ValidationError::new("branch", "headquarters must name a branch").into()),
            },
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.admin {
            Ok(())
        } else {
            Err(QualityError::NotPermitted("admin sign-in required".to_string()))
        }
    }
}
