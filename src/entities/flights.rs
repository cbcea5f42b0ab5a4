use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "flights")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::flights_meta::Entity")]
    Meta,

    #[sea_orm(has_many = "super::flights_data::Entity")]
    DataPoints,
}

impl Related<super::flights_meta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meta.def()
    }
}

impl Related<super::flights_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataPoints.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
