pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_listener_domain;
mod m20250101_000002_create_milestone_domain;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_listener_domain::Migration),
            Box::new(m20250101_000002_create_milestone_domain::Migration),
        ]
    }
}
