//! Inventory policies
//!
//! Switches for behaviours the stored data leaves ambiguous: which transfer
//! statuses move stock, whether returned assignments restore it, and whether
//! a transfer may draw a base below zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TransferStatus;

/// Which transfers count toward balances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferScope {
    /// Every transfer counts on its transfer date, whatever its status
    #[default]
    All,
    /// Only completed transfers count
    Settled,
}

impl TransferScope {
    pub fn counts(&self, status: TransferStatus) -> bool {
        match self {
            TransferScope::All => true,
            TransferScope::Settled => status == TransferStatus::Completed,
        }
    }

    /// Status a transfer must carry to count, if any
    pub fn required_status(&self) -> Option<&'static str> {
        match self {
            TransferScope::All => None,
            TransferScope::Settled => Some(TransferStatus::Completed.as_str()),
        }
    }
}

/// Whether returned assignments put stock back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPolicy {
    /// Assignments reduce stock permanently
    #[default]
    Ignore,
    /// A return adds the assigned quantity back on its return date
    Restore,
}

/// Availability check applied when recording a transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityMode {
    /// Record transfers without checking source stock
    #[default]
    Permissive,
    /// Reject transfers exceeding stock on hand at the source base
    Strict,
}

/// Policies that shape balance computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePolicy {
    pub transfer_scope: TransferScope,
    pub return_policy: ReturnPolicy,
}

impl BalancePolicy {
    pub fn with_transfer_scope(mut self, scope: TransferScope) -> Self {
        self.transfer_scope = scope;
        self
    }

    pub fn with_return_policy(mut self, policy: ReturnPolicy) -> Self {
        self.return_policy = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} '{value}' (expected one of: {expected})")]
pub struct PolicyParseError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for TransferScope {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TransferScope::All),
            "settled" => Ok(TransferScope::Settled),
            _ => Err(PolicyParseError {
                kind: "transfer scope",
                value: s.to_string(),
                expected: "all, settled",
            }),
        }
    }
}

impl FromStr for ReturnPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(ReturnPolicy::Ignore),
            "restore" => Ok(ReturnPolicy::Restore),
            _ => Err(PolicyParseError {
                kind: "return policy",
                value: s.to_string(),
                expected: "ignore, restore",
            }),
        }
    }
}

impl FromStr for AvailabilityMode {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(AvailabilityMode::Permissive),
            "strict" => Ok(AvailabilityMode::Strict),
            _ => Err(PolicyParseError {
                kind: "availability mode",
                value: s.to_string(),
                expected: "permissive, strict",
            }),
        }
    }
}

impl fmt::Display for TransferScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferScope::All => f.write_str("all"),
            TransferScope::Settled => f.write_str("settled"),
        }
    }
}

impl fmt::Display for ReturnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnPolicy::Ignore => f.write_str("ignore"),
            ReturnPolicy::Restore => f.write_str("restore"),
        }
    }
}

impl fmt::Display for AvailabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityMode::Permissive => f.write_str("permissive"),
            AvailabilityMode::Strict => f.write_str("strict"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_recorded_behaviour() {
        let policy = BalancePolicy::default();
        assert_eq!(policy.transfer_scope, TransferScope::All);
        assert_eq!(policy.return_policy, ReturnPolicy::Ignore);
        assert_eq!(AvailabilityMode::default(), AvailabilityMode::Permissive);
    }

    #[test]
    fn test_settled_scope_counts_completed_only() {
        assert!(TransferScope::Settled.counts(TransferStatus::Completed));
        assert!(!TransferScope::Settled.counts(TransferStatus::Pending));
        assert!(!TransferScope::Settled.counts(TransferStatus::InTransit));
        assert!(TransferScope::All.counts(TransferStatus::Cancelled));
        assert_eq!(TransferScope::Settled.required_status(), Some("completed"));
        assert_eq!(TransferScope::All.required_status(), None);
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!("Settled".parse::<TransferScope>().unwrap(), TransferScope::Settled);
        assert_eq!(" restore ".parse::<ReturnPolicy>().unwrap(), ReturnPolicy::Restore);
        assert_eq!("strict".parse::<AvailabilityMode>().unwrap(), AvailabilityMode::Strict);

        let err = "sometimes".parse::<ReturnPolicy>().unwrap_err();
        assert!(err.to_string().contains("ignore, restore"));
    }
}
