//! Purchase Handler
//!
//! Records procurement. Unknown bases and equipment types are registered as
//! placeholders in the same store write as the purchase, so a failed purchase
//! leaves the catalog untouched.

use std::sync::Arc;

use crate::domain::{BaseId, DomainError, EquipmentTypeId, OperationContext, PurchaseRecord};
use crate::error::AppError;
use crate::store::TransactionStore;

use super::{parse_quantity, parse_unit_price, PurchaseResult, RecordPurchaseCommand};

/// Handler for purchases
pub struct PurchaseHandler<S> {
    store: Arc<S>,
}

impl<S> PurchaseHandler<S>
where
    S: TransactionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Execute the purchase command
    pub async fn execute(
        &self,
        command: RecordPurchaseCommand,
        context: &OperationContext,
    ) -> Result<PurchaseResult, AppError> {
        let base_id = BaseId::new(command.base_id)?;
        let type_id = EquipmentTypeId::new(command.type_id)?;
        let quantity = parse_quantity(command.quantity)?;
        let unit_price = parse_unit_price(&command.unit_price)?;
        let total_amount = unit_price
            .checked_total(quantity)
            .map_err(|e| DomainError::InvalidPrice(e.to_string()))?;

        let record = PurchaseRecord {
            base_id,
            type_id,
            quantity,
            unit_price,
            purchase_date: command.purchase_date,
            vendor_name: command.vendor_name,
            purchase_order_number: command.purchase_order_number,
            created_by: context.actor_id,
        };

        let recorded = self.store.record_purchase(&record).await?;

        if recorded.created_base {
            tracing::warn!(base_id = %base_id, "Registered placeholder base");
        }
        if recorded.created_type {
            tracing::warn!(type_id = %type_id, "Registered placeholder equipment type");
        }

        tracing::info!(
            purchase_id = recorded.purchase_id,
            base_id = %base_id,
            type_id = %type_id,
            quantity = %quantity,
            correlation_id = ?context.correlation_id,
            "Purchase recorded"
        );

        Ok(PurchaseResult {
            purchase_id: recorded.purchase_id,
            base_id: base_id.value(),
            type_id: type_id.value(),
            quantity: quantity.value(),
            total_amount,
            created_base: recorded.created_base,
            created_type: recorded.created_type,
        })
    }
}
