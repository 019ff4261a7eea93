use std::{convert::Infallible, str::FromStr};

use super::UserId;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Lecturer => "lecturer",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for Role {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "student" => Self::Student,
            "lecturer" => Self::Lecturer,
            "admin" => Self::Admin,
            _ => Self::Unknown,
        })
    }
}

/// Snapshot of the sender taken when the message was sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sender {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Role,
}
