//! `SeaORM` Entity for vat_returns table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::VatReturnStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vat_returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub period_start: Date,
    pub period_end: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub vat_due_sales: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub vat_due_acquisitions: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub vat_reclaimed: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_vat_due: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub net_vat_due: Decimal,
    pub status: VatReturnStatus,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub submitted_by: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
