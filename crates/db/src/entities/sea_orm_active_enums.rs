//! `SeaORM` active enums mapped to Postgres enum types.

use lavo_core::cash::MovementType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Postgres `cash_movement_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_movement_type")]
#[serde(rename_all = "snake_case")]
pub enum CashMovementType {
    #[sea_orm(string_value = "sale_cash_in")]
    SaleCashIn,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "refund_cash_out")]
    RefundCashOut,
    #[sea_orm(string_value = "opening")]
    Opening,
    #[sea_orm(string_value = "correction")]
    Correction,
}

impl From<MovementType> for CashMovementType {
    fn from(value: MovementType) -> Self {
        match value {
            MovementType::SaleCashIn => Self::SaleCashIn,
            MovementType::Withdrawal => Self::Withdrawal,
            MovementType::Deposit => Self::Deposit,
            MovementType::RefundCashOut => Self::RefundCashOut,
            MovementType::Opening => Self::Opening,
            MovementType::Correction => Self::Correction,
        }
    }
}

impl From<CashMovementType> for MovementType {
    fn from(value: CashMovementType) -> Self {
        match value {
            CashMovementType::SaleCashIn => Self::SaleCashIn,
            CashMovementType::Withdrawal => Self::Withdrawal,
            CashMovementType::Deposit => Self::Deposit,
            CashMovementType::RefundCashOut => Self::RefundCashOut,
            CashMovementType::Opening => Self::Opening,
            CashMovementType::Correction => Self::Correction,
        }
    }
}
