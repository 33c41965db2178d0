//! User domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tripmate_core::{AccountType, Email, UserId};

/// A platform user (domain type).
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub account_type: AccountType,
    /// Whether an admin has approved the account.
    pub accepted: bool,
    pub username: String,
    pub email: Option<Email>,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(flatten)]
    pub profile: Profile,
    /// Wallet balance in base currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub wallet: Decimal,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role-specific descriptive attributes.
///
/// Tourists fill in nationality and date of birth, guides their experience,
/// advertisers and sellers their company details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_work: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotline: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub company_profile: Vec<String>,
}

/// Partial profile change. Absent fields are left untouched.
///
/// Serializes only the present fields, so it can be merged into a stored
/// profile document key by key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_work: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_profile: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Apply the present fields onto `profile`.
    pub fn apply(self, profile: &mut Profile) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    profile.$field = value.into();
                })*
            };
        }

        merge!(
            name,
            description,
            mobile_number,
            nationality,
            dob,
            job,
            years_of_experience,
            previous_work,
            website,
            hotline,
            company_profile,
        );
    }

    /// Whether nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_object().map(serde_json::Map::is_empty))
            .unwrap_or(true)
    }
}

/// Data needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub account_type: AccountType,
    pub username: String,
    pub email: Option<Email>,
    pub password_hash: String,
    pub accepted: bool,
    pub profile: Profile,
}

/// Partial user change.
///
/// `password_hash` is only set when the caller changed the password; the
/// stored hash is otherwise left alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<Email>,
    pub password_hash: Option<String>,
    pub profile: ProfileUpdate,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_applies_present_fields_only() {
        let mut profile = Profile {
            name: Some("Old".to_string()),
            job: Some("Guide".to_string()),
            ..Profile::default()
        };

        ProfileUpdate {
            name: Some("New".to_string()),
            previous_work: Some(vec!["Luxor tours".to_string()]),
            ..ProfileUpdate::default()
        }
        .apply(&mut profile);

        assert_eq!(profile.name.as_deref(), Some("New"));
        assert_eq!(profile.job.as_deref(), Some("Guide"));
        assert_eq!(profile.previous_work, vec!["Luxor tours".to_string()]);
    }

    #[test]
    fn test_profile_update_serializes_only_present_keys() {
        let update = ProfileUpdate {
            hotline: Some("19000".to_string()),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"hotline": "19000"}));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_user_json_hides_password_hash() {
        let user = User {
            id: UserId::generate(),
            account_type: AccountType::Tourist,
            accepted: true,
            username: "nour".to_string(),
            email: Some(Email::parse("nour@example.com").unwrap()),
            password_hash: "$argon2id$...".to_string(),
            profile: Profile {
                nationality: Some("Egyptian".to_string()),
                ..Profile::default()
            },
            wallet: Decimal::new(1250, 1),
            loyalty_points: 40,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["nationality"], "Egyptian");
        assert_eq!(json["account_type"], "Tourist");
        assert_eq!(json["wallet"].as_f64(), Some(125.0));
    }
}
