//! military_assets - inventory command-line front end
//!
//! Records purchases, transfers and assignments, and reports opening and
//! closing balances per base and equipment type. Results are printed to
//! stdout as JSON; logs go to stderr.

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use military_assets::balance::{BalanceAggregator, BalanceQuery};
use military_assets::config::LogFormat;
use military_assets::domain::{AvailabilityMode, ReturnPolicy, TransferScope, TransferStatus};
use military_assets::handlers::{
    AssignmentHandler, PurchaseHandler, RecordAssignmentCommand, RecordPurchaseCommand,
    RecordTransferCommand, ReturnAssignmentCommand, TransferHandler, UpdateTransferStatusCommand,
};
use military_assets::store::{EquipmentCatalog, ListFilter, PgInventoryStore, TransactionStore};
use military_assets::{db, AppError, AppResult, Config, ErrorResponse, OperationContext};

#[derive(Debug, Parser)]
#[command(name = "military_assets", version, about = "Military asset inventory")]
struct Cli {
    /// Personnel ID recorded as the actor of write commands
    #[arg(long, global = true)]
    actor: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing tables and seed the default catalog
    Init,
    /// Report connectivity and missing tables
    Check,
    /// List equipment types
    Types,
    /// List bases
    Bases,
    /// Opening and closing balances for a base over a period
    Balances {
        #[arg(long)]
        base: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Restrict to one equipment type
        #[arg(long = "type")]
        equipment_type: Option<i64>,
        /// Override TRANSFER_SCOPE (all, settled)
        #[arg(long)]
        scope: Option<TransferScope>,
        /// Override RETURN_POLICY (ignore, restore)
        #[arg(long)]
        returns: Option<ReturnPolicy>,
    },
    /// Record a purchase
    Purchase {
        #[arg(long)]
        base: i64,
        #[arg(long = "type")]
        equipment_type: i64,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        unit_price: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        vendor: Option<String>,
        #[arg(long)]
        order: Option<String>,
    },
    /// Record a transfer between bases
    Transfer {
        #[arg(long)]
        from: i64,
        #[arg(long)]
        to: i64,
        #[arg(long = "type")]
        equipment_type: i64,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        order: Option<String>,
        #[arg(long, default_value = "pending")]
        status: TransferStatus,
        /// Reject the transfer if the source base lacks stock
        #[arg(long)]
        strict: bool,
    },
    /// Assign equipment to personnel
    Assign {
        #[arg(long)]
        base: i64,
        #[arg(long = "type")]
        equipment_type: i64,
        #[arg(long)]
        quantity: i64,
        /// Personnel ID of the recipient
        #[arg(long)]
        to: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark an assignment returned
    Return {
        #[arg(long)]
        assignment: i32,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Move a transfer to a new status (completed and cancelled are final)
    TransferStatus {
        #[arg(long)]
        transfer: i32,
        #[arg(long)]
        status: TransferStatus,
    },
    /// Purchase history, newest first
    Purchases(HistoryArgs),
    /// Transfer history, newest first; --base matches either end
    Transfers(HistoryArgs),
    /// Assignment history, newest first
    Assignments(HistoryArgs),
}

#[derive(Debug, clap::Args)]
struct HistoryArgs {
    #[arg(long)]
    base: Option<i64>,
    #[arg(long = "type")]
    equipment_type: Option<i64>,
}

/// Initialize tracing/logging
fn init_tracing(format: LogFormat, default_filter: &str) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into()),
    );

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

async fn run(
    command: Command,
    config: &Config,
    pool: PgPool,
    context: OperationContext,
) -> AppResult<serde_json::Value> {
    let store = Arc::new(PgInventoryStore::new(pool.clone()));

    match command {
        Command::Init => {
            db::initialize_schema(&pool).await?;
            let missing = db::missing_tables(&pool).await?;
            Ok(serde_json::json!({ "initialized": true, "missing_tables": missing }))
        }
        Command::Check => {
            db::verify_connection(&pool).await?;
            let missing = db::missing_tables(&pool).await?;
            Ok(serde_json::json!({ "connected": true, "missing_tables": missing }))
        }
        Command::Types => to_json(&store.equipment_types().await?),
        Command::Bases => to_json(&store.bases().await?),
        Command::Balances {
            base,
            start,
            end,
            equipment_type,
            scope,
            returns,
        } => {
            let query = BalanceQuery::parse(base, start, end, equipment_type)?;

            let mut policy = config.balance_policy;
            if let Some(scope) = scope {
                policy = policy.with_transfer_scope(scope);
            }
            if let Some(returns) = returns {
                policy = policy.with_return_policy(returns);
            }

            let snapshots = BalanceAggregator::new(store)
                .with_policy(policy)
                .get_balances(&query)
                .await?;
            to_json(&snapshots)
        }
        Command::Purchase {
            base,
            equipment_type,
            quantity,
            unit_price,
            date,
            vendor,
            order,
        } => {
            let mut command =
                RecordPurchaseCommand::new(base, equipment_type, quantity, unit_price, date);
            if let Some(vendor) = vendor {
                command = command.with_vendor(vendor);
            }
            if let Some(order) = order {
                command = command.with_order_number(order);
            }

            let result = PurchaseHandler::new(store).execute(command, &context).await?;
            to_json(&result)
        }
        Command::Transfer {
            from,
            to,
            equipment_type,
            quantity,
            date,
            order,
            status,
            strict,
        } => {
            let mut command = RecordTransferCommand::new(from, to, equipment_type, quantity, date)
                .with_status(status);
            if let Some(order) = order {
                command = command.with_order_number(order);
            }

            let availability = if strict {
                AvailabilityMode::Strict
            } else {
                config.availability_mode
            };

            let result = TransferHandler::new(store)
                .with_availability(availability)
                .with_policy(config.balance_policy)
                .execute(command, &context)
                .await?;
            to_json(&result)
        }
        Command::Assign {
            base,
            equipment_type,
            quantity,
            to,
            date,
            notes,
        } => {
            let mut command = RecordAssignmentCommand::new(base, equipment_type, quantity, to, date);
            if let Some(notes) = notes {
                command = command.with_notes(notes);
            }

            let result = AssignmentHandler::new(store).execute(command, &context).await?;
            to_json(&result)
        }
        Command::Return { assignment, date } => {
            let result = AssignmentHandler::new(store)
                .return_assignment(ReturnAssignmentCommand::new(assignment, date), &context)
                .await?;
            to_json(&result)
        }
        Command::TransferStatus { transfer, status } => {
            let result = TransferHandler::new(store)
                .update_status(UpdateTransferStatusCommand::new(transfer, status), &context)
                .await?;
            to_json(&result)
        }
        Command::Purchases(args) => {
            let filter = ListFilter::parse(args.base, args.equipment_type)?;
            to_json(&store.list_purchases(filter).await?)
        }
        Command::Transfers(args) => {
            let filter = ListFilter::parse(args.base, args.equipment_type)?;
            to_json(&store.list_transfers(filter).await?)
        }
        Command::Assignments(args) => {
            let filter = ListFilter::parse(args.base, args.equipment_type)?;
            to_json(&store.list_assignments(filter).await?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format, config.default_log_filter());

    let mut context = OperationContext::new();
    if let Some(actor) = cli.actor {
        context = context.with_actor(actor);
    }
    let correlation_id = context.ensure_correlation_id();

    tracing::debug!(
        environment = %config.environment,
        transfer_scope = %config.balance_policy.transfer_scope,
        return_policy = %config.balance_policy.return_policy,
        availability = %config.availability_mode,
        %correlation_id,
        "Connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    let outcome = run(cli.command, &config, pool.clone(), context).await;
    pool.close().await;

    match outcome {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            if err.is_conflict() {
                tracing::warn!(error = %err, "Command conflicts with current inventory");
            } else if err.is_client_error() {
                tracing::warn!(error = %err, "Command rejected");
            } else {
                tracing::error!(error = ?err, "Command failed");
            }
            println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&err))?);
            std::process::exit(err.exit_code());
        }
    }
}
