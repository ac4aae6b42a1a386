use sea_orm_migration::prelude::*;

use crate::m20260712_000001_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Campaigns {
    Table,
    Id,
    Name,
    Message,
    CountryCode,
    PhoneButton,
    LinkButton,
    Media,
    Recipients,
    RecipientCount,
    CreatedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::Name).string().not_null())
                    .col(ColumnDef::new(Campaigns::Message).text().not_null())
                    .col(ColumnDef::new(Campaigns::CountryCode).string().not_null())
                    .col(ColumnDef::new(Campaigns::PhoneButton).string())
                    .col(ColumnDef::new(Campaigns::LinkButton).string())
                    .col(ColumnDef::new(Campaigns::Media).string())
                    .col(ColumnDef::new(Campaigns::Recipients).text().not_null())
                    .col(
                        ColumnDef::new(Campaigns::RecipientCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Campaigns::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Campaigns::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-campaigns-created_by")
                            .from(Campaigns::Table, Campaigns::CreatedBy)
                            .to(Accounts::Table, Accounts::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-campaigns-created_by-created_at")
                    .table(Campaigns::Table)
                    .col(Campaigns::CreatedBy)
                    .col(Campaigns::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        Ok(())
    }
}
