//! Typed identifiers
//!
//! Every row the billing core stores is keyed by a UUID. Each kind of row gets
//! its own newtype with a short display tag (`TEN-…`, `QUO-…`), so ids pasted
//! from a printed document parse back to the right type and a quotation id is
//! refused where a tenancy id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("expected a {expected} id, got a {found} id")]
    WrongKind {
        expected: &'static str,
        found: String,
    },

    #[error("malformed id: {0}")]
    Malformed(String),
}

/// Splits `TAG-uuid` into its tag and UUID part; bare UUIDs have no tag
fn split_tag(input: &str) -> (Option<&str>, &str) {
    let input = input.trim();
    match input.split_once('-') {
        Some((tag, rest)) if tag.len() == 3 && tag.chars().all(|c| c.is_ascii_uppercase()) => (Some(tag), rest),
        _ => (None, input),
    }
}

macro_rules! billing_id {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const TAG: &'static str = $tag;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Time-ordered id, used for rows whose insertion order matters
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn prefix() -> &'static str {
                Self::TAG
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", Self::TAG, self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (tag, raw) = split_tag(s);
                if let Some(tag) = tag {
                    if tag != Self::TAG {
                        return Err(IdParseError::WrongKind {
                            expected: Self::TAG,
                            found: tag.to_string(),
                        });
                    }
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|e| IdParseError::Malformed(format!("{} ({})", s.trim(), e)))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

billing_id!(
    /// One lease agreement
    TenancyId,
    "TEN"
);
billing_id!(
    /// One row of the rent payment ledger
    PaymentEntryId,
    "PLE"
);
billing_id!(PropertyId, "PRP");
billing_id!(
    /// A tenant or quotation recipient
    ClientId,
    "CLI"
);
billing_id!(QuotationId, "QUO");
billing_id!(LineItemId, "QLI");
