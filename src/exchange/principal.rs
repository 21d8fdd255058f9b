//! Authenticated principal attached to an exchange.
//!
//! The hosting framework supplies the principal; this crate only reads it.
//! Principal identity is `Arc` pointer identity: replacing the principal on
//! the exchange is what the differ reports as a change.

use std::sync::Arc;

/// A single claim carried by an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
    pub value_type: String,
}

impl Claim {
    pub fn new(
        claim_type: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type: value_type.into(),
        }
    }
}

/// One identity of a principal.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    authenticated: bool,
    authentication_type: String,
    name: String,
    claims: Vec<Claim>,
}

impl Identity {
    /// An unauthenticated identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(
        authentication_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            authenticated: true,
            authentication_type: authentication_type.into(),
            name: name.into(),
            claims: Vec::new(),
        }
    }

    pub fn with_claim(
        mut self,
        claim_type: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        self.claims.push(Claim::new(claim_type, value, value_type));
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn authentication_type(&self) -> &str {
        &self.authentication_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }
}

/// The authenticated principal of an exchange: zero or more identities.
#[derive(Debug, Default)]
pub struct Principal {
    identities: Vec<Identity>,
}

impl Principal {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// A principal with no identities, shared as the pre-authentication
    /// default.
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }
}
