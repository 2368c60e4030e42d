//! Cash register schema.
//!
//! Creates the staff directory, the movement ledger, the closure chain and
//! the triggers that keep sealed rows immutable.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: STAFF
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: CLOSURES & MOVEMENTS
        // ============================================================
        db.execute_unprepared(CASH_CLOSURES_SQL).await?;
        db.execute_unprepared(CASH_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE cash_movement_type AS ENUM (
    'sale_cash_in',
    'withdrawal',
    'deposit',
    'refund_cash_out',
    'opening',
    'correction'
);
";

const USERS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const CASH_CLOSURES_SQL: &str = r"
CREATE TABLE cash_closures (
    id UUID PRIMARY KEY,
    opening_amount NUMERIC(19, 4) NOT NULL,
    expected_amount NUMERIC(19, 4) NOT NULL,
    counted_amount NUMERIC(19, 4) NOT NULL,
    diff NUMERIC(19, 4) NOT NULL,
    closed_at TIMESTAMPTZ NOT NULL UNIQUE,
    -- Weak reference: closures outlive staff records
    user_id UUID NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_cash_closures_closed_at ON cash_closures(closed_at DESC);
";

const CASH_MOVEMENTS_SQL: &str = r"
CREATE TABLE cash_movements (
    id UUID PRIMARY KEY,
    movement_type cash_movement_type NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    note TEXT,
    person_user_id UUID,
    person VARCHAR(255),
    movement_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    closure_id UUID REFERENCES cash_closures(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_cash_movement_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_cash_movements_open ON cash_movements(movement_at, created_at)
    WHERE closure_id IS NULL;
CREATE INDEX idx_cash_movements_closure ON cash_movements(closure_id)
    WHERE closure_id IS NOT NULL;
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_sealed_movement_modification
-- A movement stamped by a closure can no longer change
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_sealed_movement_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.closure_id IS NOT NULL THEN
        RAISE EXCEPTION 'Cannot modify cash movement % sealed by closure %', OLD.id, OLD.closure_id;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;

    IF NEW.movement_at <> OLD.movement_at THEN
        RAISE EXCEPTION 'Cannot change movement_at of cash movement %', OLD.id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_sealed_movement_mod
BEFORE UPDATE OR DELETE ON cash_movements
FOR EACH ROW
EXECUTE FUNCTION prevent_sealed_movement_modification();

-- ============================================================
-- FUNCTION: prevent_closure_modification
-- Closures are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_closure_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Cash closure % is immutable', OLD.id;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_closure_mod
BEFORE UPDATE OR DELETE ON cash_closures
FOR EACH ROW
EXECUTE FUNCTION prevent_closure_modification();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_prevent_closure_mod ON cash_closures;
DROP TRIGGER IF EXISTS trg_prevent_sealed_movement_mod ON cash_movements;
DROP FUNCTION IF EXISTS prevent_closure_modification();
DROP FUNCTION IF EXISTS prevent_sealed_movement_modification();
DROP TABLE IF EXISTS cash_movements;
DROP TABLE IF EXISTS cash_closures;
DROP TABLE IF EXISTS users;
DROP TYPE IF EXISTS cash_movement_type;
";
