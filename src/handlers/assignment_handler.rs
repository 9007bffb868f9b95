//! Assignment Handler
//!
//! Issues equipment to personnel and records its return.

use std::sync::Arc;

use crate::domain::{
    AssignmentRecord, AssignmentStatus, BaseId, DomainError, EquipmentTypeId, OperationContext,
};
use crate::error::AppError;
use crate::store::TransactionStore;

use super::{
    parse_quantity, AssignmentResult, RecordAssignmentCommand, ReturnAssignmentCommand,
    ReturnResult,
};

/// Handler for assignments and their returns
pub struct AssignmentHandler<S> {
    store: Arc<S>,
}

impl<S> AssignmentHandler<S>
where
    S: TransactionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record a new active assignment
    pub async fn execute(
        &self,
        command: RecordAssignmentCommand,
        context: &OperationContext,
    ) -> Result<AssignmentResult, AppError> {
        let base_id = BaseId::new(command.base_id)?;
        let type_id = EquipmentTypeId::new(command.type_id)?;
        let quantity = parse_quantity(command.quantity)?;
        let assigned_to = personnel_id(command.assigned_to)?;

        let record = AssignmentRecord {
            base_id,
            type_id,
            quantity,
            assigned_to,
            assignment_date: command.assignment_date,
            return_date: None,
            status: AssignmentStatus::Active,
            notes: command.notes,
        };

        let assignment_id = self.store.insert_assignment(&record).await?;

        tracing::info!(
            assignment_id,
            base_id = %base_id,
            type_id = %type_id,
            quantity = %quantity,
            assigned_to,
            actor_id = ?context.actor_id,
            "Assignment recorded"
        );

        Ok(AssignmentResult {
            assignment_id,
            base_id: base_id.value(),
            type_id: type_id.value(),
            quantity: quantity.value(),
            status: record.status,
        })
    }

    /// Mark an assignment returned on the given date
    pub async fn return_assignment(
        &self,
        command: ReturnAssignmentCommand,
        context: &OperationContext,
    ) -> Result<ReturnResult, AppError> {
        let assignment = self
            .store
            .get_assignment(command.assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment", command.assignment_id))?;

        if assignment.details.is_returned() {
            return Err(DomainError::AssignmentAlreadyReturned(assignment.assignment_id).into());
        }

        if command.return_date < assignment.details.assignment_date {
            return Err(DomainError::InvalidReturnDate {
                assigned: assignment.details.assignment_date,
                returned: command.return_date,
            }
            .into());
        }

        self.store
            .mark_assignment_returned(assignment.assignment_id, command.return_date)
            .await?;

        tracing::info!(
            assignment_id = assignment.assignment_id,
            return_date = %command.return_date,
            actor_id = ?context.actor_id,
            "Assignment returned"
        );

        Ok(ReturnResult {
            assignment_id: assignment.assignment_id,
            return_date: command.return_date,
            status: AssignmentStatus::Returned,
        })
    }
}

fn personnel_id(value: i64) -> Result<i32, DomainError> {
    i32::try_from(value)
        .ok()
        .filter(|id| *id > 0)
        .ok_or(DomainError::InvalidIdentifier {
            kind: "personnel",
            value,
        })
}
