//! Document identifiers.
//!
//! Every stored entity is addressed by a 12-byte [`ObjectId`] rendered as 24
//! hex characters. Use the `define_id!` macro to create per-entity wrappers so
//! a `ProductId` can never be passed where a `UserId` is expected.

use core::fmt;
use core::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a string is not a well-formed identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid identifier {0:?}: expected {len} hexadecimal characters", len = ObjectId::HEX_LENGTH)]
pub struct IdError(pub String);

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A 12-byte document identifier.
///
/// Layout: 4-byte big-endian unix timestamp, 5 random bytes, 3-byte
/// big-endian counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Length of the hex rendering.
    pub const HEX_LENGTH: usize = 24;

    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let [_, c0, c1, c2] = COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes();

        let mut bytes = [0u8; 12];
        let (ts, rest) = bytes.split_at_mut(4);
        let (random, counter) = rest.split_at_mut(5);
        ts.copy_from_slice(&seconds.to_be_bytes());
        random.copy_from_slice(&rand::random::<[u8; 5]>());
        counter.copy_from_slice(&[c0, c1, c2]);

        Self(bytes)
    }

    /// Returns `true` if `s` is a well-formed identifier.
    ///
    /// ```
    /// use tripmate_core::ObjectId;
    ///
    /// assert!(ObjectId::is_valid("507f1f77bcf86cd799439011"));
    /// assert!(!ObjectId::is_valid("not-an-id"));
    /// ```
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        s.len() == Self::HEX_LENGTH && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Parse an identifier from its hex rendering.
    ///
    /// # Errors
    ///
    /// Returns `IdError` unless `s` is exactly 24 hex characters.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if !Self::is_valid(s) {
            return Err(IdError(s.to_owned()));
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| IdError(s.to_owned()))?;
        Ok(Self(bytes))
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time embedded in the identifier.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        let [a, b, c, d, ..] = self.0;
        let seconds = u32::from_be_bytes([a, b, c, d]);
        DateTime::from_timestamp(i64::from(seconds), 0).unwrap_or_default()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ObjectId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::postgres::PgHasArrayType for ObjectId {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::postgres::PgHasArrayType>::array_type_info()
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ObjectId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ObjectId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.to_hex(), buf)
    }
}

/// Macro to define a type-safe identifier wrapper around [`ObjectId`].
///
/// Creates a newtype with:
/// - `Serialize`/`Deserialize` as a 24-char hex string
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `generate()`, `parse()`, `Display`, `FromStr`
/// - `sqlx` `Type`, `Encode`, `Decode` as TEXT (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use tripmate_core::define_id;
/// define_id!(ReviewId);
///
/// let id = ReviewId::generate();
/// let same: ReviewId = id.to_string().parse().unwrap();
/// assert_eq!(id, same);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::ObjectId);

        impl $name {
            /// Generate a fresh identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self($crate::ObjectId::generate())
            }

            /// Parse from a 24-char hex string.
            ///
            /// # Errors
            ///
            /// Returns `IdError` if the string is not a well-formed identifier.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::ObjectId::parse(s).map(Self)
            }

            /// Get the underlying object id.
            #[must_use]
            pub const fn object_id(&self) -> $crate::ObjectId {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$crate::ObjectId> for $name {
            fn from(id: $crate::ObjectId) -> Self {
                Self(id)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <$crate::ObjectId as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <$crate::ObjectId as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::postgres::PgHasArrayType for $name {
            fn array_type_info() -> ::sqlx::postgres::PgTypeInfo {
                <$crate::ObjectId as ::sqlx::postgres::PgHasArrayType>::array_type_info()
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <$crate::ObjectId as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <$crate::ObjectId as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(MuseumId);
define_id!(ActivityId);
define_id!(ItineraryId);
define_id!(TagId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(ObjectId::is_valid("507f1f77bcf86cd799439011"));
        assert!(ObjectId::is_valid("507F1F77BCF86CD799439011"));
        assert!(!ObjectId::is_valid(""));
        assert!(!ObjectId::is_valid("507f1f77bcf86cd79943901"));
        assert!(!ObjectId::is_valid("507f1f77bcf86cd7994390111"));
        assert!(!ObjectId::is_valid("507f1f77bcf86cd79943901z"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = ObjectId::parse("abc").unwrap_err();
        assert_eq!(err, IdError("abc".to_string()));
        assert!(ProductId::parse("not-a-product").is_err());
    }

    #[test]
    fn test_parse_normalizes_to_lowercase() {
        let id = ObjectId::parse("507F1F77BCF86CD799439011").unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_generate_is_unique_and_valid() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert_ne!(a, b);
        assert!(ObjectId::is_valid(&a.to_hex()));
    }

    #[test]
    fn test_timestamp_is_recent() {
        let id = ObjectId::generate();
        let age = Utc::now() - id.timestamp();
        assert!(age.num_seconds() < 5);
    }

    #[test]
    fn test_typed_id_serde() {
        let id = UserId::parse("507f1f77bcf86cd799439011").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"507f1f77bcf86cd799439011\"");

        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<UserId>("\"nope\"").is_err());
    }
}
