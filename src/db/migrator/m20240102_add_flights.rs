use crate::entities::{flights_data, prelude::*};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Flights)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(FlightsMeta)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(FlightsData)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Data points are always read per flight, in time order
        manager
            .create_index(
                Index::create()
                    .name("idx_flights_data_flight")
                    .table(FlightsData)
                    .col(flights_data::Column::FlightId)
                    .col(flights_data::Column::Timestamp)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FlightsData).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FlightsMeta).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Flights).to_owned())
            .await?;

        Ok(())
    }
}
