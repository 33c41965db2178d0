//! Account roles and tag kinds.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown enum label.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} {value:?}")]
pub struct LabelError {
    kind: &'static str,
    value: String,
}

/// The role a user account plays on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Tourist,
    Advertiser,
    Seller,
    TourGuide,
    TourismGovernor,
    Admin,
}

impl AccountType {
    /// All account types.
    pub const ALL: [Self; 6] = [
        Self::Tourist,
        Self::Advertiser,
        Self::Seller,
        Self::TourGuide,
        Self::TourismGovernor,
        Self::Admin,
    ];

    /// Stable label used on the wire and in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tourist => "Tourist",
            Self::Advertiser => "Advertiser",
            Self::Seller => "Seller",
            Self::TourGuide => "TourGuide",
            Self::TourismGovernor => "TourismGovernor",
            Self::Admin => "Admin",
        }
    }

    /// Whether a new account of this type is usable without admin approval.
    #[must_use]
    pub const fn accepted_on_registration(&self) -> bool {
        matches!(self, Self::Tourist)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LabelError {
                kind: "account type",
                value: s.to_owned(),
            })
    }
}

/// What a tag classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TagKind {
    /// Tourist interests (e.g. "beaches", "shopping").
    #[default]
    Preference,
    /// Historical-place classification used by museums.
    Historical,
}

impl TagKind {
    /// Stable label used on the wire and in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Preference => "Preference",
            Self::Historical => "Historical",
        }
    }
}

impl FromStr for TagKind {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Preference" => Ok(Self::Preference),
            "Historical" => Ok(Self::Historical),
            _ => Err(LabelError {
                kind: "tag kind",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_labels_round_trip() {
        for t in AccountType::ALL {
            assert_eq!(t.as_str().parse::<AccountType>().unwrap(), t);
            assert_eq!(
                serde_json::to_string(&t).unwrap(),
                format!("\"{}\"", t.as_str())
            );
        }
    }

    #[test]
    fn test_unknown_account_type() {
        let err = "Pirate".parse::<AccountType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown account type \"Pirate\"");
    }

    #[test]
    fn test_only_tourists_are_auto_accepted() {
        assert!(AccountType::Tourist.accepted_on_registration());
        assert!(!AccountType::Seller.accepted_on_registration());
        assert!(!AccountType::Admin.accepted_on_registration());
    }

    #[test]
    fn test_tag_kind() {
        assert_eq!("Historical".parse::<TagKind>().unwrap(), TagKind::Historical);
        assert!("Other".parse::<TagKind>().is_err());
    }
}
