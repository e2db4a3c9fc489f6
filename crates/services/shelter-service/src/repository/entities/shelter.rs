//! Shelter database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Shelter;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shelters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub capacity: i32,
    /// Cached count of active check-ins
    pub current_occupancy: i32,
    pub address_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::check_in::Entity")]
    CheckIns,
}

impl Related<super::check_in::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckIns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Shelter {
    fn from(model: Model) -> Self {
        Shelter {
            id: model.id,
            name: model.name,
            capacity: model.capacity,
            current_occupancy: model.current_occupancy,
            address_id: model.address_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
