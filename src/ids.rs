//! Identifier types for the records of the service.
//!
//! The old data files mix `1` and `"1"` for the same origin or course. Every id
//! is converted once when it enters the service, so everything after that
//! compares plain typed values.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid id {0:?}")]
pub struct IdError(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Text(String),
}

fn parse_id(s: &str) -> Result<i64, IdError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(IdError(s.to_string()));
    }
    trimmed.parse::<i64>().map_err(|_| IdError(s.to_string()))
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, sqlx::Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match RawId::deserialize(deserializer)? {
                    RawId::Num(n) => Ok($name(n)),
                    RawId::Text(s) => parse_id(&s).map($name).map_err(de::Error::custom),
                }
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_id(s).map($name)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                $name(v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Academic origin (undergraduate, graduate, ...).
    OrigemId
);
id_type!(CursoId);
id_type!(AlunoId);
id_type!(
    /// Account linked to a student.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_and_string_are_the_same_id() {
        let a: OrigemId = serde_json::from_str("1").unwrap();
        let b: OrigemId = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&b).unwrap(), "1");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<CursoId>("\"abc\"").is_err());
        assert!(serde_json::from_str::<CursoId>("\"\"").is_err());
        assert!(serde_json::from_str::<CursoId>("\"-3\"").is_err());
        assert_eq!("x1".parse::<AlunoId>(), Err(IdError("x1".to_string())));
    }

    #[test]
    fn whitespace_around_digits_is_ignored() {
        assert_eq!(" 101 ".parse::<CursoId>().unwrap(), CursoId(101));
    }
}
