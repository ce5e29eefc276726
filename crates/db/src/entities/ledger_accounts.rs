//! `SeaORM` Entity for ledger_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{AccountType, NormalBalance, VatCategory};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub normal_balance: NormalBalance,
    pub parent_id: Option<Uuid>,
    pub is_system: bool,
    pub is_active: bool,
    pub vat_category: Option<VatCategory>,
    /// Running balance in the normal direction, maintained by posting.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance: Decimal,
    /// Optimistic lock counter, bumped on every balance change.
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
    #[sea_orm(has_many = "super::budget_lines::Entity")]
    BudgetLines,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl Related<super::budget_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ledgerline_core::accounts::Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            code: model.code,
            name: model.name,
            account_type: model.account_type.into(),
            normal_balance: model.normal_balance.into(),
            parent_id: model.parent_id.map(Into::into),
            is_system: model.is_system,
            is_active: model.is_active,
            vat_category: model.vat_category.map(Into::into),
        }
    }
}

impl Model {
    /// What posting validation needs to know about the account.
    #[must_use]
    pub fn posting_info(&self) -> ledgerline_core::ledger::AccountInfo {
        ledgerline_core::ledger::AccountInfo {
            id: self.id.into(),
            organization_id: self.organization_id.into(),
            normal_balance: self.normal_balance.into(),
            is_active: self.is_active,
        }
    }
}
