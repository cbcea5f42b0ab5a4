use sea_orm::entity::prelude::*;

/// A single recorded sample belonging to a flight.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flights_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub flight_id: i32,

    pub timestamp: i64,

    pub coordinate_x: f64,

    pub coordinate_y: f64,

    pub pressure: i32,

    pub temperature: i32,

    pub altitude: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::flights::Entity",
        from = "Column::FlightId",
        to = "super::flights::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Flight,
}

impl Related<super::flights::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flight.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
