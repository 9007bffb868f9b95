//! Balance snapshots
//!
//! A snapshot is computed per request and never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{BaseId, EquipmentTypeId, Period};

/// Movement totals over one date window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movements {
    pub purchased: i64,
    pub transferred_in: i64,
    pub transferred_out: i64,
    pub assigned: i64,
    /// Assignments given back; stays zero unless returns restore stock
    pub returned: i64,
}

impl Movements {
    /// Purchases plus transfers in, minus transfers out. Assignments excluded.
    pub fn net_movement(&self) -> i64 {
        self.purchased + self.transferred_in - self.transferred_out
    }

    /// Change in stock caused by every movement
    pub fn stock_change(&self) -> i64 {
        self.net_movement() - self.assigned + self.returned
    }
}

/// Stock of one equipment type at one base over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub base_id: BaseId,
    pub equipment_type_id: EquipmentTypeId,
    pub type_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub opening_balance: i64,
    pub closing_balance: i64,
    pub purchased: i64,
    pub transferred_in: i64,
    pub transferred_out: i64,
    pub assigned: i64,
    pub returned: i64,
    pub net_movement: i64,
    pub percent_change: f64,
}

impl BalanceSnapshot {
    /// Derive closing balance, net movement and percent change from the
    /// opening balance and the movements inside `period`.
    pub fn new(
        base_id: BaseId,
        equipment_type_id: EquipmentTypeId,
        type_name: impl Into<String>,
        period: Period,
        opening_balance: i64,
        movements: Movements,
    ) -> Self {
        let closing_balance = opening_balance + movements.stock_change();

        Self {
            base_id,
            equipment_type_id,
            type_name: type_name.into(),
            period_start: period.start(),
            period_end: period.end(),
            opening_balance,
            closing_balance,
            purchased: movements.purchased,
            transferred_in: movements.transferred_in,
            transferred_out: movements.transferred_out,
            assigned: movements.assigned,
            returned: movements.returned,
            net_movement: movements.net_movement(),
            percent_change: percent_change(opening_balance, closing_balance),
        }
    }

    pub fn movements(&self) -> Movements {
        Movements {
            purchased: self.purchased,
            transferred_in: self.transferred_in,
            transferred_out: self.transferred_out,
            assigned: self.assigned,
            returned: self.returned,
        }
    }

    /// True when no record touched this base and type, before or during the period
    pub fn is_empty(&self) -> bool {
        self.opening_balance == 0 && self.movements() == Movements::default()
    }
}

/// Relative change from opening to closing, in percent. Zero when opening is zero.
pub fn percent_change(opening: i64, closing: i64) -> f64 {
    if opening == 0 {
        return 0.0;
    }
    (closing - opening) as f64 / opening as f64 * 100.0
}
