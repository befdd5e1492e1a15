//! Attendance and deployment-mode enums.

use serde::{Deserialize, Deserializer, Serialize};

/// Tri-state attendance answer as submitted by a guest.
///
/// Only [`Attendance::Going`] and [`Attendance::NotGoing`] survive validation;
/// stored records carry a plain `bool`.
///
/// Deserializes from `true`/`false`, `null`, or the strings a form radio group
/// sends (`"yes"`, `"no"`, `"true"`, `"false"`, `"going"`, `"not_going"`).
/// Anything else, including an empty string, is [`Attendance::Undecided`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Attendance {
    Going,
    NotGoing,
    #[default]
    Undecided,
}

impl Attendance {
    /// Collapse to a boolean, or `None` while undecided.
    #[must_use]
    pub const fn resolve(self) -> Option<bool> {
        match self {
            Self::Going => Some(true),
            Self::NotGoing => Some(false),
            Self::Undecided => None,
        }
    }
}

impl From<Option<bool>> for Attendance {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Going,
            Some(false) => Self::NotGoing,
            None => Self::Undecided,
        }
    }
}

impl From<bool> for Attendance {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttendance {
    Flag(bool),
    Text(String),
}

impl<'de> Deserialize<'de> for Attendance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawAttendance>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawAttendance::Flag(flag)) => flag.into(),
            Some(RawAttendance::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "going" => Self::Going,
                "no" | "false" | "not_going" => Self::NotGoing,
                _ => Self::Undecided,
            },
            None => Self::Undecided,
        })
    }
}

/// Which contact fields a deployment requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContactMode {
    /// Name and a well-formed email are both required.
    #[default]
    NameAndEmail,
    /// Only a name is required; an email, when given, must still parse.
    NameOnly,
}

impl ContactMode {
    /// Whether the email field must be present.
    #[must_use]
    pub const fn requires_email(self) -> bool {
        matches!(self, Self::NameAndEmail)
    }
}

impl std::fmt::Display for ContactMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameAndEmail => write!(f, "name_and_email"),
            Self::NameOnly => write!(f, "name_only"),
        }
    }
}

impl std::str::FromStr for ContactMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name_and_email" => Ok(Self::NameAndEmail),
            "name_only" => Ok(Self::NameOnly),
            _ => Err(format!("invalid contact mode: {s}")),
        }
    }
}
