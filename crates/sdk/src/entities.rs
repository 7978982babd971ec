use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Anything that carries a user id. Used to filter subsidiaries by user.
pub trait Identifiable: Send + Sync {
    fn id(&self) -> &str;
}

/// A user as returned by the Users API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: String,
    username: String,
    email: String,
    email_verified: bool,
    #[serde(default)]
    created: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    subsidiary_ids: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: String::new(),
            email: String::new(),
            email_verified: false,
            created: None,
            roles: Vec::new(),
            subsidiary_ids: Vec::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_email_verified(mut self, email_verified: bool) -> Self {
        self.email_verified = email_verified;
        self
    }

    pub fn with_created(mut self, created: Option<DateTime<FixedOffset>>) -> Self {
        self.created = created;
        self
    }

    /// Replace the roles. Duplicates are dropped, first occurrence wins.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.clear();
        for role in roles {
            self.add_role(role);
        }
        self
    }

    pub fn with_subsidiary_ids<I, S>(mut self, subsidiary_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subsidiary_ids = subsidiary_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Append a role unless it is already present. Returns whether it was added.
    pub fn add_role(&mut self, role: impl Into<String>) -> bool {
        let role = role.into();
        if self.roles.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|candidate| candidate == role)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        self.created
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn subsidiary_ids(&self) -> &[String] {
        &self.subsidiary_ids
    }
}

impl Identifiable for User {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsidiary {
    id: String,
    name: String,
}

impl Subsidiary {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The identity of an authenticated caller, as extracted from a bearer token
/// by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserIdentity {
    id: String,
    username: Option<String>,
    email: Option<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

impl Identifiable for UserIdentity {
    fn id(&self) -> &str {
        &self.id
    }
}
