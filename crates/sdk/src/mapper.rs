//! Translation of Users API payloads into [`User`] and [`Subsidiary`] values.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::entities::{Subsidiary, User};

/// Identifiers arrive as strings for users and as numbers for subsidiaries.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    id: RawId,
    username: String,
    email: String,
    email_verified: bool,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    subsidiary_ids: Option<Vec<RawId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubsidiaryRecord {
    id: RawId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    #[serde(rename = "_embedded")]
    embedded: T,
}

#[derive(Debug, Deserialize)]
struct UsersCollection {
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct SubsidiariesCollection {
    subsidiaries: Vec<SubsidiaryRecord>,
}

/// Parse an RFC 3339 timestamp; anything unparseable is treated as absent.
pub fn parse_created(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let mut user = User::new(record.id)
            .with_username(record.username)
            .with_email(record.email)
            .with_email_verified(record.email_verified)
            .with_created(record.created.as_deref().and_then(parse_created))
            .with_subsidiary_ids(record.subsidiary_ids.unwrap_or_default());

        for role in record.roles.unwrap_or_default() {
            user.add_role(role);
        }

        user
    }
}

impl From<SubsidiaryRecord> for Subsidiary {
    fn from(record: SubsidiaryRecord) -> Self {
        Subsidiary::new(record.id, record.name)
    }
}

/// Map a single user resource.
pub fn parse_user(body: &str) -> Result<User, serde_json::Error> {
    let record: UserRecord = serde_json::from_str(body)?;
    Ok(record.into())
}

/// Map the `_embedded.users` list of a users collection.
pub fn parse_users(body: &str) -> Result<Vec<User>, serde_json::Error> {
    let page: Embedded<UsersCollection> = serde_json::from_str(body)?;
    Ok(page.embedded.users.into_iter().map(User::from).collect())
}

/// Map the `_embedded.subsidiaries` list of a subsidiaries collection.
pub fn parse_subsidiaries(body: &str) -> Result<Vec<Subsidiary>, serde_json::Error> {
    let page: Embedded<SubsidiariesCollection> = serde_json::from_str(body)?;
    Ok(page
        .embedded
        .subsidiaries
        .into_iter()
        .map(Subsidiary::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_user_maps_every_field() {
        let body = json!({
            "id": "c84056a1-8d36-46c4-ae15-e3cb3db18ed2",
            "username": "john.doe",
            "email": "john.doe@email.com",
            "emailVerified": true,
            "created": "2023-02-14T09:31:07+01:00",
            "roles": ["role1", "role2"],
            "subsidiaryIds": ["1", 2]
        })
        .to_string();

        let user = parse_user(&body).unwrap();

        assert_eq!(user.id(), "c84056a1-8d36-46c4-ae15-e3cb3db18ed2");
        assert_eq!(user.username(), "john.doe");
        assert_eq!(user.email(), "john.doe@email.com");
        assert!(user.email_verified());
        assert_eq!(
            user.created().map(|created| created.to_rfc3339()),
            Some("2023-02-14T09:31:07+01:00".to_string())
        );
        assert_eq!(user.roles(), ["role1", "role2"]);
        assert_eq!(user.subsidiary_ids(), ["1", "2"]);
    }

    #[test]
    fn unparseable_created_becomes_none() {
        for created in [json!("14.02.2023"), json!(""), json!(null)] {
            let body = json!({
                "id": "1",
                "username": "john.doe",
                "email": "john.doe@email.com",
                "emailVerified": false,
                "created": created,
            })
            .to_string();

            let user = parse_user(&body).unwrap();
            assert_eq!(user.created(), None);
        }
    }

    #[test]
    fn optional_collections_default_to_empty() {
        let body = json!({
            "id": "1",
            "username": "john.doe",
            "email": "john.doe@email.com",
            "emailVerified": true
        })
        .to_string();

        let user = parse_user(&body).unwrap();
        assert!(user.roles().is_empty());
        assert!(user.subsidiary_ids().is_empty());
        assert_eq!(user.created(), None);
    }

    #[test]
    fn duplicate_roles_are_dropped_in_order() {
        let body = json!({
            "id": "1",
            "username": "john.doe",
            "email": "john.doe@email.com",
            "emailVerified": true,
            "roles": ["role2", "role1", "role2", "role3", "role1"]
        })
        .to_string();

        let user = parse_user(&body).unwrap();
        assert_eq!(user.roles(), ["role2", "role1", "role3"]);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let body = json!({ "id": "1", "username": "john.doe", "emailVerified": true }).to_string();

        assert!(parse_user(&body).is_err());
    }

    #[test]
    fn collections_require_embedded_list() {
        assert!(parse_users(r#"{"users": []}"#).is_err());
        assert!(parse_subsidiaries(r#"{"_embedded": {}}"#).is_err());
        assert!(parse_users(r#"{"_embedded": {"users": []}}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn subsidiaries_accept_numeric_ids() {
        let body = json!({
            "_embedded": {
                "subsidiaries": [
                    { "id": 1, "name": "Subsidiary 1" },
                    { "id": "2", "name": "Subsidiary 2" }
                ]
            }
        })
        .to_string();

        let subsidiaries = parse_subsidiaries(&body).unwrap();
        assert_eq!(
            subsidiaries,
            vec![
                Subsidiary::new("1", "Subsidiary 1"),
                Subsidiary::new("2", "Subsidiary 2"),
            ]
        );
    }
}
