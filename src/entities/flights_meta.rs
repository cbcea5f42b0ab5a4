use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::db::repositories::meta::MetaTable;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "flights_meta")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub flight_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub meta_key: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub meta_value: Option<String>,

    pub created: String,
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

impl MetaTable for Entity {
    type Row = ActiveModel;

    const OWNER: Column = Column::FlightId;
    const KEY: Column = Column::MetaKey;
    const VALUE: Column = Column::MetaValue;

    fn row(owner_id: i32, key: &str, value: Option<String>, created: String) -> ActiveModel {
        ActiveModel {
            flight_id: Set(owner_id),
            meta_key: Set(key.to_string()),
            meta_value: Set(value),
            created: Set(created),
        }
    }

    fn key_of(model: &Model) -> &str {
        &model.meta_key
    }

    fn value_of(model: &Model) -> Option<&str> {
        model.meta_value.as_deref()
    }
}
