//! Identifiers and reporting periods
//!
//! Both are validated before any store read so that malformed requests fail
//! fast instead of silently producing zero-filled balances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// Identifier of a base
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseId(i32);

/// Identifier of an equipment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentTypeId(i32);

fn positive_id(kind: &'static str, value: i64) -> Result<i32, DomainError> {
    match i32::try_from(value) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DomainError::InvalidIdentifier { kind, value }),
    }
}

impl BaseId {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        positive_id("base", value).map(Self)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl EquipmentTypeId {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        positive_id("equipment type", value).map(Self)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EquipmentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive reporting window `[start, end]`.
///
/// # Invariants
/// - `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The period that begins the day after this one ends and lasts until `end`.
    /// Returns `None` when `end` is not after this period.
    pub fn following_until(&self, end: NaiveDate) -> Option<Period> {
        let start = self.end.succ_opt()?;
        Period::new(start, end).ok()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
