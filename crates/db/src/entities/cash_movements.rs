//! `SeaORM` Entity for cash_movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CashMovementType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub movement_type: CashMovementType,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub person_user_id: Option<Uuid>,
    pub person: Option<String>,
    pub movement_at: DateTimeWithTimeZone,
    pub closure_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_closures::Entity",
        from = "Column::ClosureId",
        to = "super::cash_closures::Column::Id"
    )]
    CashClosures,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::PersonUserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::cash_closures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashClosures.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
