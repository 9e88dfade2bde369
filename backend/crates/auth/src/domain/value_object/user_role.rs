use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role assigned at registration. Never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Resident,
    Officer,
    Developer,
}

impl UserRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Resident => "resident",
            Officer => "officer",
            Developer => "developer",
        }
    }

    /// Officers and developers administer the minimart
    #[inline]
    pub const fn is_staff(&self) -> bool {
        matches!(self, UserRole::Officer | UserRole::Developer)
    }

    #[inline]
    pub const fn is_resident(&self) -> bool {
        matches!(self, UserRole::Resident)
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        use UserRole::*;
        match code {
            "resident" => Ok(Resident),
            "officer" => Ok(Officer),
            "developer" => Ok(Developer),
            _ => Err(format!("Invalid UserRole code: {code}")),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
