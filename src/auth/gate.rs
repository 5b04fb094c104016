//! Auth gate — authentication and delegated-scope checks per request.
//!
//! Identity itself is established upstream (the fronting OIDC proxy); this
//! module evaluates the request-scoped principal it hands us. Missing scopes
//! surface as a `ConsentChallenge`, which the request layer answers with an
//! interactive consent redirect.

use std::collections::HashSet;
use std::fmt;

use crate::error::AuthError;

/// Delegated scopes every compliance run needs, all required together.
pub const REQUIRED_SCOPES: [&str; 4] = [
    "Files.Read.All",
    "Sites.Read.All",
    "Mail.Send",
    "User.Read.All",
];

/// The scope set a user must grant interactively before a run can proceed.
///
/// This is a control-flow value, not a failure: it is the one thing allowed
/// to escape the orchestrator, so the caller can redirect into the consent
/// flow and re-enter afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentChallenge {
    scopes: Vec<String>,
}

impl ConsentChallenge {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// The challenge for the fixed set of required scopes.
    pub fn required() -> Self {
        Self::new(REQUIRED_SCOPES)
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

impl fmt::Display for ConsentChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scopes.join(" "))
    }
}

/// An authenticated user and the delegated scopes they have granted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub name: String,
    pub granted_scopes: HashSet<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            granted_scopes: HashSet::new(),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.granted_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

/// Gate that decides whether the current principal may enter a compliance run.
pub trait AuthGate: Send + Sync {
    /// Whether the request carries an authenticated principal at all.
    fn is_authenticated(&self) -> bool;

    /// Display name of the signed-in user, if any.
    fn user_name(&self) -> Option<&str>;

    /// Verify the principal holds every scope in `scopes`.
    ///
    /// Raises `AuthError::ConsentRequired` carrying the full requested set
    /// when any scope is missing. Incremental grant is the consent flow's
    /// concern, not ours.
    fn ensure_scopes(&self, scopes: &[&str]) -> Result<(), AuthError>;
}

/// `AuthGate` over the request-scoped [`Principal`].
pub struct PrincipalAuthGate {
    principal: Option<Principal>,
}

impl PrincipalAuthGate {
    pub fn new(principal: Option<Principal>) -> Self {
        Self { principal }
    }

    /// Gate for an unauthenticated request.
    pub fn anonymous() -> Self {
        Self { principal: None }
    }
}

impl AuthGate for PrincipalAuthGate {
    fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    fn user_name(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.name.as_str())
    }

    fn ensure_scopes(&self, scopes: &[&str]) -> Result<(), AuthError> {
        let Some(principal) = &self.principal else {
            return Err(AuthError::NotAuthenticated);
        };

        let missing: Vec<&str> = scopes
            .iter()
            .filter(|s| !principal.granted_scopes.contains(**s))
            .copied()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            tracing::info!(
                user = %principal.name,
                missing = %missing.join(" "),
                "Principal lacks delegated scopes, raising consent challenge"
            );
            Err(AuthError::ConsentRequired(ConsentChallenge::new(
                scopes.iter().copied(),
            )))
        }
    }
}
