//! Caller identity, roles and the capabilities they grant.
//!
//! Services only ever ask a [`Principal`] whether it holds a [`Capability`]. How a role is
//! granted (today: an e-mail allowlist consulted by [`IdentityResolver`]) stays at the HTTP
//! boundary.

use std::collections::BTreeSet;
use std::fmt;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Identifier of an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create, edit and delete categories, periods and filters.
    ManageCatalog,
    /// Archive, renew or delete listings owned by other users.
    ModerateListings,
}

impl Role {
    pub fn grants(self, capability: Capability) -> bool {
        match self {
            Role::Admin => matches!(
                capability,
                Capability::ManageCatalog | Capability::ModerateListings
            ),
            Role::Member => false,
        }
    }
}

/// Authenticated caller as seen by the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: Option<String>,
    roles: BTreeSet<Role>,
}

impl Principal {
    pub fn member(user_id: UserId) -> Self {
        let mut roles = BTreeSet::new();
        roles.insert(Role::Member);
        Self {
            user_id,
            email: None,
            roles,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.roles.iter().any(|role| role.grants(capability))
    }
}

/// Elevated credential that bypasses row ownership. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredential(String);

impl ServiceCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceCredential(<redacted>)")
    }
}

/// Credential a write is performed with. Owner-scoped writes only touch rows owned by that user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteScope {
    Owner(UserId),
    Service(ServiceCredential),
}

impl WriteScope {
    pub fn permits(&self, owner: UserId) -> bool {
        match self {
            WriteScope::Owner(user_id) => *user_id == owner,
            WriteScope::Service(_) => true,
        }
    }
}

/// Turns gateway-supplied identity headers into a [`Principal`], granting the admin role to
/// allowlisted addresses.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    admin_emails: BTreeSet<String>,
}

impl IdentityResolver {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admin_emails = admin_emails
            .into_iter()
            .map(|email| email.as_ref().trim().to_ascii_lowercase())
            .filter(|email| !email.is_empty())
            .collect();
        Self { admin_emails }
    }

    pub fn resolve(&self, user_id: UserId, email: Option<&str>) -> Principal {
        let email = email.map(str::trim).filter(|value| !value.is_empty());
        let mut principal = Principal::member(user_id);
        if let Some(email) = email {
            if self.admin_emails.contains(&email.to_ascii_lowercase()) {
                principal = principal.with_role(Role::Admin);
            }
            principal = principal.with_email(email);
        }
        principal
    }

    /// Returns `None` when the request carries no (or an unparsable) user id.
    pub fn from_headers(&self, headers: &HeaderMap) -> Option<Principal> {
        let user_id = headers
            .get(USER_ID_HEADER)?
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(UserId)?;
        let email = headers
            .get(USER_EMAIL_HEADER)
            .and_then(|value| value.to_str().ok());
        Some(self.resolve(user_id, email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn allowlisted_email_grants_admin_capabilities() {
        let resolver = IdentityResolver::new(["Admin@Example.com"]);
        let principal = resolver.resolve(UserId::new(), Some("  admin@example.COM "));
        assert!(principal.has_role(Role::Admin));
        assert!(principal.can(Capability::ManageCatalog));
        assert!(principal.can(Capability::ModerateListings));
    }

    #[test]
    fn empty_allowlist_never_grants_admin() {
        let resolver = IdentityResolver::new(Vec::<String>::new());
        let principal = resolver.resolve(UserId::new(), Some(""));
        assert!(!principal.can(Capability::ManageCatalog));
        assert!(principal.email.is_none());
    }

    #[test]
    fn headers_without_valid_user_id_are_anonymous() {
        let resolver = IdentityResolver::default();
        let mut headers = HeaderMap::new();
        assert!(resolver.from_headers(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(resolver.from_headers(&headers).is_none());

        let user_id = UserId::new();
        let raw = HeaderValue::from_str(&user_id.to_string()).expect("header value");
        headers.insert(USER_ID_HEADER, raw);
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("jan@example.com"));
        let principal = resolver.from_headers(&headers).expect("principal");
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.email.as_deref(), Some("jan@example.com"));
        assert!(!principal.has_role(Role::Admin));
    }

    #[test]
    fn owner_scope_only_permits_own_rows() {
        let owner = UserId::new();
        assert!(WriteScope::Owner(owner).permits(owner));
        assert!(!WriteScope::Owner(owner).permits(UserId::new()));
        assert!(WriteScope::Service(ServiceCredential::new("s")).permits(owner));
        assert_eq!(
            format!("{:?}", ServiceCredential::new("secret")),
            "ServiceCredential(<redacted>)"
        );
    }
}
