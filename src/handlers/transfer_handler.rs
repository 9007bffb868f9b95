//! Transfer Handler
//!
//! Records movement of equipment between bases. Under strict availability
//! the source base must hold enough stock on the transfer date and on every
//! later day something moves, so a backdated transfer cannot take stock that
//! later records already rely on.

use std::sync::Arc;

use crate::balance::BalanceAggregator;
use crate::domain::{
    AvailabilityMode, BalancePolicy, BaseId, DomainError, EquipmentTypeId, OperationContext,
    TransferRecord,
};
use crate::error::AppError;
use crate::store::{EquipmentCatalog, TransactionStore};

use super::{
    parse_quantity, RecordTransferCommand, TransferResult, TransferStatusResult,
    UpdateTransferStatusCommand,
};

/// Handler for base-to-base transfers
pub struct TransferHandler<S> {
    balances: BalanceAggregator<S>,
    availability: AvailabilityMode,
}

impl<S> TransferHandler<S>
where
    S: TransactionStore + EquipmentCatalog + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            balances: BalanceAggregator::new(store),
            availability: AvailabilityMode::default(),
        }
    }

    pub fn with_availability(mut self, availability: AvailabilityMode) -> Self {
        self.availability = availability;
        self
    }

    /// Policy used when measuring stock on hand for strict checks
    pub fn with_policy(mut self, policy: BalancePolicy) -> Self {
        self.balances = self.balances.with_policy(policy);
        self
    }

    /// Execute the transfer command
    pub async fn execute(
        &self,
        command: RecordTransferCommand,
        context: &OperationContext,
    ) -> Result<TransferResult, AppError> {
        let source_base_id = BaseId::new(command.source_base_id)?;
        let destination_base_id = BaseId::new(command.destination_base_id)?;
        let type_id = EquipmentTypeId::new(command.type_id)?;
        let quantity = parse_quantity(command.quantity)?;

        if source_base_id == destination_base_id {
            return Err(DomainError::SameBaseTransfer.into());
        }

        let record = TransferRecord {
            source_base_id,
            destination_base_id,
            type_id,
            quantity,
            transfer_date: command.transfer_date,
            transfer_order_number: command.transfer_order_number,
            status: command.status,
        };

        let store = self.balances.store();
        let transfer_id = match self.availability {
            AvailabilityMode::Permissive => store.insert_transfer(&record).await?,
            AvailabilityMode::Strict => {
                let lock = store.lock_stock(source_base_id, type_id).await?;
                let available = self
                    .balances
                    .minimum_stock_from(source_base_id, type_id, record.transfer_date)
                    .await?;

                if available < quantity.as_i64() {
                    tracing::warn!(
                        source_base_id = %source_base_id,
                        type_id = %type_id,
                        transfer_date = %record.transfer_date,
                        required = quantity.as_i64(),
                        available,
                        "Transfer rejected"
                    );
                    return Err(
                        DomainError::insufficient_stock(quantity.as_i64(), available).into(),
                    );
                }

                lock.insert_transfer(&record).await?
            }
        };

        tracing::info!(
            transfer_id,
            source_base_id = %source_base_id,
            destination_base_id = %destination_base_id,
            type_id = %type_id,
            quantity = %quantity,
            status = %record.status,
            actor_id = ?context.actor_id,
            correlation_id = ?context.correlation_id,
            "Transfer recorded"
        );

        Ok(TransferResult {
            transfer_id,
            source_base_id: source_base_id.value(),
            destination_base_id: destination_base_id.value(),
            type_id: type_id.value(),
            quantity: quantity.value(),
            status: record.status,
        })
    }

    /// Change the status of a recorded transfer.
    ///
    /// Completed and cancelled transfers are final.
    pub async fn update_status(
        &self,
        command: UpdateTransferStatusCommand,
        context: &OperationContext,
    ) -> Result<TransferStatusResult, AppError> {
        let store = self.balances.store();
        let transfer = store
            .get_transfer(command.transfer_id)
            .await?
            .ok_or_else(|| AppError::not_found("Transfer", command.transfer_id))?;

        let previous_status = transfer.details.status;
        if previous_status.is_final() {
            return Err(DomainError::TransferFinalized {
                transfer_id: transfer.transfer_id,
                status: previous_status,
            }
            .into());
        }

        store
            .set_transfer_status(transfer.transfer_id, command.status)
            .await?;

        tracing::info!(
            transfer_id = transfer.transfer_id,
            previous_status = %previous_status,
            status = %command.status,
            actor_id = ?context.actor_id,
            "Transfer status changed"
        );

        Ok(TransferStatusResult {
            transfer_id: transfer.transfer_id,
            previous_status,
            status: command.status,
        })
    }
}
