//! Person database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Person;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "people")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub national_id: String,
    pub birth_date: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub medical_condition: Option<String>,
    pub missing: bool,
    pub emergency_contact: Option<String>,
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
impl From<Model> for Person {
    fn from(model: Model) -> Self {
        Person {
            id: model.id,
            name: model.name,
            national_id: model.national_id,
            birth_date: model.birth_date,
            medical_condition: model.medical_condition,
            missing: model.missing,
            emergency_contact: model.emergency_contact,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
