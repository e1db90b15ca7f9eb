use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Course catalogue offered on the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Course {
    English,
    French,
    German,
    Bureautique,
    Soutien,
    Medical,
    Other,
}

impl Course {
    pub const ALL: [Course; 7] = [
        Course::English,
        Course::French,
        Course::German,
        Course::Bureautique,
        Course::Soutien,
        Course::Medical,
        Course::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Course::English => "english",
            Course::French => "french",
            Course::German => "german",
            Course::Bureautique => "bureautique",
            Course::Soutien => "soutien",
            Course::Medical => "medical",
            Course::Other => "other",
        }
    }
}

impl core::fmt::Display for Course {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Course {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        Course::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::invalid_course(s))
    }
}
