//! Initial schema migration.
//!
//! - `users`: authentication
//! - `spreadsheets`: tabular stores addressed by URL
//! - `spreadsheet_cells`: one row per non-empty cell of a spreadsheet
//! - `user_properties`: per-user key/value scalars (expense counter, active URL)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Spreadsheets {
    Table,
    Id,
    Name,
    Url,
    FrozenRows,
    ProtectedColumn,
    ProtectionDescription,
}

#[derive(Iden)]
enum SpreadsheetCells {
    Table,
    SpreadsheetId,
    RowIndex,
    ColIndex,
    Value,
}

#[derive(Iden)]
enum UserProperties {
    Table,
    UserId,
    Key,
    Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Spreadsheets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Spreadsheets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Spreadsheets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Spreadsheets::Name).string().not_null())
                    .col(ColumnDef::new(Spreadsheets::Url).string().not_null())
                    .col(
                        ColumnDef::new(Spreadsheets::FrozenRows)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Spreadsheets::ProtectedColumn).integer())
                    .col(ColumnDef::new(Spreadsheets::ProtectionDescription).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-spreadsheets-url-unique")
                    .table(Spreadsheets::Table)
                    .col(Spreadsheets::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Spreadsheet cells
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SpreadsheetCells::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpreadsheetCells::SpreadsheetId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpreadsheetCells::RowIndex)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpreadsheetCells::ColIndex)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SpreadsheetCells::Value).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(SpreadsheetCells::SpreadsheetId)
                            .col(SpreadsheetCells::RowIndex)
                            .col(SpreadsheetCells::ColIndex),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-spreadsheet_cells-spreadsheet_id")
                            .from(SpreadsheetCells::Table, SpreadsheetCells::SpreadsheetId)
                            .to(Spreadsheets::Table, Spreadsheets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. User properties
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(UserProperties::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserProperties::UserId).string().not_null())
                    .col(ColumnDef::new(UserProperties::Key).string().not_null())
                    .col(ColumnDef::new(UserProperties::Value).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserProperties::UserId)
                            .col(UserProperties::Key),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_properties-user_id")
                            .from(UserProperties::Table, UserProperties::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProperties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SpreadsheetCells::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Spreadsheets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
