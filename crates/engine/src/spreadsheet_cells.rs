//! Cells of a spreadsheet. Rows and columns are 1-based.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "spreadsheet_cells")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub spreadsheet_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub row_index: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub col_index: i64,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::spreadsheets::Entity",
        from = "Column::SpreadsheetId",
        to = "super::spreadsheets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Spreadsheet,
}

impl Related<super::spreadsheets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Spreadsheet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
