//! Spreadsheets table: one row per tabular store, addressed by its URL.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "spreadsheets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub url: String,
    pub frozen_rows: i32,
    pub protected_column: Option<i32>,
    pub protection_description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::spreadsheet_cells::Entity")]
    Cells,
}

impl Related<super::spreadsheet_cells::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cells.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
