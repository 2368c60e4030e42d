//! Cash register repository.
//!
//! Movement CRUD, closure sealing and the ledger queries. The open ledger
//! is every movement with `closure_id IS NULL`; sealing stamps that set
//! with the new closure id inside one transaction.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait, Value, sea_query::Expr,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use lavo_core::cash::calculator::{opening_amount, summarize};
use lavo_core::cash::validation::validate_date_range;
use lavo_core::cash::{
    CashError, LedgerSummary, MovementLine, MovementPatch, NewMovement, PreviousClosure,
    admit_patch, ensure_open, plan_closure,
};
use lavo_core::{Clock, SystemClock};
use lavo_shared::types::UserId;

use crate::entities::{cash_closures, cash_movements, users};

use super::user::StaffSummary;

/// Key of the transaction-scoped advisory lock that serializes closures.
pub const CASH_CLOSURE_LOCK_KEY: i64 = 0x4C41_564F_4341_5348;

/// A movement with the staff member it references, if any.
#[derive(Debug, Clone)]
pub struct MovementWithStaff {
    /// Movement row.
    pub movement: cash_movements::Model,
    /// Staff projection of `person_user_id`.
    pub staff: Option<StaffSummary>,
}

impl From<(cash_movements::Model, Option<users::Model>)> for MovementWithStaff {
    fn from((movement, user): (cash_movements::Model, Option<users::Model>)) -> Self {
        Self {
            movement,
            staff: user.map(StaffSummary::from),
        }
    }
}

/// Outcome of sealing the open ledger.
#[derive(Debug, Clone)]
pub struct ClosureResult {
    /// The persisted closure.
    pub closure: cash_closures::Model,
    /// Number of movements stamped with the closure id.
    pub moves_included: u64,
}

/// A closure and the movements it sealed.
#[derive(Debug, Clone)]
pub struct ClosureWithMovements {
    /// Closure row.
    pub closure: cash_closures::Model,
    /// Operator who performed the close.
    pub operator: Option<StaffSummary>,
    /// Sealed movements by `movement_at`.
    pub movements: Vec<MovementWithStaff>,
}

/// Preview of the next closure.
#[derive(Debug, Clone)]
pub struct OpenLedgerSummary {
    /// Most recent closure, if any.
    pub last_closure: Option<cash_closures::Model>,
    /// Totals of the open ledger.
    pub summary: LedgerSummary,
}

/// Inclusive `closed_at` bounds for listing closures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureFilter {
    /// Lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound.
    pub to: Option<DateTime<Utc>>,
}

/// Cash register repository.
#[derive(Debug, Clone)]
pub struct CashRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl CashRepository {
    /// Creates a new cash repository backed by the system clock.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Creates a cash repository with an explicit clock.
    #[must_use]
    pub fn with_clock(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Current time at the store's microsecond resolution.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Lists open movements by `movement_at` ascending, with staff.
    ///
    /// # Errors
    ///
    /// Returns `CashError::Database` if the query fails.
    pub async fn unclosed_movements(&self) -> Result<Vec<MovementWithStaff>, CashError> {
        let rows = cash_movements::Entity::find()
            .filter(cash_movements::Column::ClosureId.is_null())
            .find_also_related(users::Entity)
            .order_by_asc(cash_movements::Column::MovementAt)
            .order_by_asc(cash_movements::Column::CreatedAt)
            .order_by_asc(cash_movements::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(MovementWithStaff::from).collect())
    }

    /// Returns the most recent closure, if any.
    ///
    /// # Errors
    ///
    /// Returns `CashError::Database` if the query fails.
    pub async fn last_closure(&self) -> Result<Option<cash_closures::Model>, CashError> {
        latest_closure(&self.db).await
    }

    /// Lists closures inside the inclusive range, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `from` is after `to`, or
    /// `CashError::Database` if the query fails.
    pub async fn closures_in_range(
        &self,
        filter: ClosureFilter,
    ) -> Result<Vec<cash_closures::Model>, CashError> {
        validate_date_range(filter.from, filter.to)?;

        let mut query = cash_closures::Entity::find();
        if let Some(from) = filter.from {
            query = query.filter(cash_closures::Column::ClosedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(cash_closures::Column::ClosedAt.lte(to));
        }

        query
            .order_by_desc(cash_closures::Column::ClosedAt)
            .all(&self.db)
            .await
            .map_err(store_error)
    }

    /// Loads a closure with its operator and the movements it sealed.
    ///
    /// # Errors
    ///
    /// Returns `ClosureNotFound` if no closure has this id, or
    /// `CashError::Database` if a query fails.
    pub async fn closure_detail(&self, id: Uuid) -> Result<ClosureWithMovements, CashError> {
        let (closure, operator) = cash_closures::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or(CashError::ClosureNotFound(id))?;

        let movements = cash_movements::Entity::find()
            .filter(cash_movements::Column::ClosureId.eq(id))
            .find_also_related(users::Entity)
            .order_by_asc(cash_movements::Column::MovementAt)
            .order_by_asc(cash_movements::Column::CreatedAt)
            .order_by_asc(cash_movements::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(ClosureWithMovements {
            closure,
            operator: operator.map(StaffSummary::from),
            movements: movements.into_iter().map(MovementWithStaff::from).collect(),
        })
    }

    /// Summarizes the open ledger against the last closure.
    ///
    /// Both reads share one repeatable-read snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CashError::Database` if a query fails, or `TotalOutOfRange`
    /// if a subtotal overflows.
    pub async fn open_ledger_summary(&self) -> Result<OpenLedgerSummary, CashError> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(store_error)?;

        let last_closure = latest_closure(&txn).await?;
        let open = cash_movements::Entity::find()
            .filter(cash_movements::Column::ClosureId.is_null())
            .all(&txn)
            .await
            .map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;

        let lines: Vec<MovementLine> = open.iter().map(movement_line).collect();
        let opening = opening_amount(last_closure.as_ref().map(|c| c.counted_amount));

        Ok(OpenLedgerSummary {
            last_closure,
            summary: summarize(opening, &lines)?,
        })
    }

    // ========================================================================
    // Movement CRUD
    // ========================================================================

    /// Records a new open movement.
    ///
    /// # Errors
    ///
    /// Returns `CashError::Database` if the insert fails.
    pub async fn create_movement(&self, input: NewMovement) -> Result<MovementWithStaff, CashError> {
        let now = self.now();
        let movement_type = input.movement_type;

        let movement = cash_movements::ActiveModel {
            id: Set(Uuid::now_v7()),
            movement_type: Set(movement_type.into()),
            amount: Set(input.amount),
            note: Set(input.note),
            person_user_id: Set(input.person_user_id.map(UserId::into_inner)),
            person: Set(input.person),
            movement_at: Set(input.movement_at.unwrap_or(now).into()),
            closure_id: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await
        .map_err(store_error)?;

        let staff = staff_of(&self.db, movement.person_user_id).await?;

        info!(
            movement_id = %movement.id,
            movement_type = %movement_type,
            amount = %movement.amount,
            "Cash movement recorded"
        );

        Ok(MovementWithStaff { movement, staff })
    }

    /// Applies a validated patch to an open movement.
    ///
    /// The row is locked for the duration of the transaction, so a
    /// concurrent closure either seals it first or waits for the edit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The movement does not exist (`MovementNotFound`)
    /// - The movement is sealed (`MovementAlreadyClosed`)
    /// - Database operation fails
    pub async fn update_movement(
        &self,
        id: Uuid,
        patch: MovementPatch,
    ) -> Result<MovementWithStaff, CashError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let movement = lock_movement(&txn, id).await?;

        let movement = match admit_patch(movement.id, movement.closure_id, patch)? {
            None => movement,
            Some(patch) => {
                let mut active: cash_movements::ActiveModel = movement.into();
                if let Some(movement_type) = patch.movement_type {
                    active.movement_type = Set(movement_type.into());
                }
                if let Some(amount) = patch.amount {
                    active.amount = Set(amount);
                }
                if let Some(note) = patch.note {
                    active.note = Set(note);
                }
                if let Some(person_user_id) = patch.person_user_id {
                    active.person_user_id = Set(person_user_id.map(UserId::into_inner));
                }
                if let Some(person) = patch.person {
                    active.person = Set(person);
                }
                active.updated_at = Set(self.now().into());

                active.update(&txn).await.map_err(store_error)?
            }
        };

        let staff = staff_of(&txn, movement.person_user_id).await?;
        txn.commit().await.map_err(store_error)?;

        info!(movement_id = %movement.id, "Cash movement updated");

        Ok(MovementWithStaff { movement, staff })
    }

    /// Hard-deletes an open movement.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The movement does not exist (`MovementNotFound`)
    /// - The movement is sealed (`MovementAlreadyClosed`)
    /// - Database operation fails
    pub async fn delete_movement(&self, id: Uuid) -> Result<(), CashError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let movement = lock_movement(&txn, id).await?;
        ensure_open(movement.id, movement.closure_id)?;

        cash_movements::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(store_error)?;
        txn.commit().await.map_err(store_error)?;

        info!(movement_id = %id, "Cash movement deleted");

        Ok(())
    }

    // ========================================================================
    // Sealing
    // ========================================================================

    /// Closes the register: seals every open movement into a new closure.
    ///
    /// Steps, all in one transaction:
    /// 1. Take the closure advisory lock
    /// 2. Read the last closure and lock the open movements
    /// 3. Plan the closure and insert it
    /// 4. Stamp the movements read in step 2
    ///
    /// Movements recorded after step 2 stay open for the next closure.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the stamped count differs from
    /// the snapshot, `TotalOutOfRange` if the closure figures cannot be
    /// stored, or `CashError::Database` if any statement fails. Nothing is
    /// persisted in any of these cases.
    pub async fn close_register(
        &self,
        counted_amount: Decimal,
        notes: Option<String>,
        user_id: UserId,
    ) -> Result<ClosureResult, CashError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        txn.execute(Statement::from_sql_and_values(
            txn.get_database_backend(),
            "SELECT pg_advisory_xact_lock($1)",
            [Value::from(CASH_CLOSURE_LOCK_KEY)],
        ))
        .await
        .map_err(store_error)?;

        let previous = latest_closure(&txn).await?.map(|c| PreviousClosure {
            counted_amount: c.counted_amount,
            closed_at: c.closed_at.with_timezone(&Utc),
        });

        let open = cash_movements::Entity::find()
            .filter(cash_movements::Column::ClosureId.is_null())
            .order_by_asc(cash_movements::Column::MovementAt)
            .order_by_asc(cash_movements::Column::CreatedAt)
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(store_error)?;

        let lines: Vec<MovementLine> = open.iter().map(movement_line).collect();
        let plan = plan_closure(previous.as_ref(), &lines, counted_amount, self.now())?;

        let closure = cash_closures::ActiveModel {
            id: Set(Uuid::now_v7()),
            opening_amount: Set(plan.opening_amount),
            expected_amount: Set(plan.expected_amount),
            counted_amount: Set(plan.counted_amount),
            diff: Set(plan.diff),
            closed_at: Set(plan.closed_at.into()),
            user_id: Set(user_id.into_inner()),
            notes: Set(notes),
            created_at: Set(plan.closed_at.into()),
        }
        .insert(&txn)
        .await
        .map_err(store_error)?;

        let ids: Vec<Uuid> = open.iter().map(|m| m.id).collect();
        let stamped = if ids.is_empty() {
            0
        } else {
            cash_movements::Entity::update_many()
                .col_expr(cash_movements::Column::ClosureId, Expr::value(closure.id))
                .col_expr(cash_movements::Column::UpdatedAt, Expr::value(plan.closed_at))
                .filter(cash_movements::Column::Id.is_in(ids))
                .filter(cash_movements::Column::ClosureId.is_null())
                .exec(&txn)
                .await
                .map_err(store_error)?
                .rows_affected
        };

        if stamped != plan.movements_included {
            warn!(
                expected = plan.movements_included,
                stamped, "Open ledger changed during closure, rolling back"
            );
            return Err(CashError::ConcurrentModification {
                expected: plan.movements_included,
                stamped,
            });
        }

        txn.commit().await.map_err(store_error)?;

        info!(
            closure_id = %closure.id,
            moves_included = stamped,
            expected_amount = %closure.expected_amount,
            counted_amount = %closure.counted_amount,
            diff = %closure.diff,
            "Cash register closed"
        );

        Ok(ClosureResult {
            closure,
            moves_included: stamped,
        })
    }
}

fn store_error(err: DbErr) -> CashError {
    error!(error = %err, "Cash store operation failed");
    CashError::Database(err.to_string())
}

fn movement_line(movement: &cash_movements::Model) -> MovementLine {
    MovementLine::new(movement.movement_type.into(), movement.amount)
}

async fn latest_closure<C: ConnectionTrait>(
    conn: &C,
) -> Result<Option<cash_closures::Model>, CashError> {
    cash_closures::Entity::find()
        .order_by_desc(cash_closures::Column::ClosedAt)
        .one(conn)
        .await
        .map_err(store_error)
}

async fn lock_movement<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<cash_movements::Model, CashError> {
    cash_movements::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(store_error)?
        .ok_or(CashError::MovementNotFound(id))
}

async fn staff_of<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
) -> Result<Option<StaffSummary>, CashError> {
    let Some(user_id) = user_id else {
        return Ok(None);
    };

    Ok(users::Entity::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(store_error)?
        .map(StaffSummary::from))
}
