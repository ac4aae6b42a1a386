pub use sea_orm_migration::prelude::*;

mod m20260712_000001_accounts;
mod m20260712_000002_campaigns;
mod m20260712_000003_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260712_000001_accounts::Migration),
            Box::new(m20260712_000002_campaigns::Migration),
            Box::new(m20260712_000003_transactions::Migration),
        ]
    }
}
