//! `SeaORM` entity definitions.

pub mod cash_closures;
pub mod cash_movements;
pub mod sea_orm_active_enums;
pub mod users;
