use core::str::FromStr;

use serde::{Deserialize, Serialize};

use hotelsupply_core::DomainError;

/// Contract status lifecycle.
///
/// ```text
/// Draft -> Active <-> Suspended
///            |            |
///            +-> Terminated / Expired (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Active,
    Suspended,
    Terminated,
    Expired,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 5] = [
        ContractStatus::Draft,
        ContractStatus::Active,
        ContractStatus::Suspended,
        ContractStatus::Terminated,
        ContractStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Draft => "Draft",
            ContractStatus::Active => "Active",
            ContractStatus::Suspended => "Suspended",
            ContractStatus::Terminated => "Terminated",
            ContractStatus::Expired => "Expired",
        }
    }

    /// Statuses a contract may be in when moving to `self`.
    pub fn allowed_sources(self) -> &'static [ContractStatus] {
        use ContractStatus::*;
        match self {
            Draft => &[],
            Active => &[Draft, Suspended],
            Suspended => &[Active],
            Terminated | Expired => &[Active, Suspended],
        }
    }

    pub fn can_transition_to(self, target: ContractStatus) -> bool {
        target.allowed_sources().contains(&self)
    }

    pub fn allowed_targets(self) -> Vec<ContractStatus> {
        Self::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(*target))
            .collect()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ContractStatus::Terminated | ContractStatus::Expired)
    }
}

impl core::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(ContractStatus::Draft),
            "active" => Ok(ContractStatus::Active),
            "suspended" => Ok(ContractStatus::Suspended),
            "terminated" => Ok(ContractStatus::Terminated),
            "expired" => Ok(ContractStatus::Expired),
            other => Err(DomainError::validation(format!(
                "unknown contract status '{other}'"
            ))),
        }
    }
}
