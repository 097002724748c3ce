//! Core data types for `lunch_and_learn`.
//!
//! - `Issue` - A work item as served by the issue service
//! - `Priority` - The three-level severity that replaced the `IsUrgent` flag

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Issue priority.
///
/// Stored and transmitted as `LOW` / `MEDIUM` / `HIGH`. The issue service's
/// ORM maps the same levels to `0` / `1` / `2`, so both encodings parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = crate::error::LalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_uppercase().as_str() {
            "LOW" | "0" => Ok(Self::Low),
            "MEDIUM" | "1" => Ok(Self::Medium),
            "HIGH" | "2" => Ok(Self::High),
            _ => Err(crate::error::LalError::InvalidPriority {
                priority: trimmed.to_string(),
            }),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriorityVisitor;

        impl Visitor<'_> for PriorityVisitor {
            type Value = Priority;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a priority name (LOW/MEDIUM/HIGH) or level 0-2")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Priority, E> {
                v.parse().map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Priority, E> {
                Priority::from_i64(v).ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Priority, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(Priority::from_i64)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }
        }

        deserializer.deserialize_any(PriorityVisitor)
    }
}

/// An issue as stored in the `Issues` table and served by `GET /issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub code: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl Issue {
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        short_description: impl Into<String>,
        long_description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            code: code.into(),
            short_description: short_description.into(),
            long_description: long_description.into(),
            priority,
        }
    }
}
