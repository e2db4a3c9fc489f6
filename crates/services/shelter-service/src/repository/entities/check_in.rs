//! Check-in database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::CheckIn;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "check_ins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shelter_id: Uuid,
    pub person_id: Uuid,
    pub entry_time: DateTimeUtc,
    /// Exit timestamp (NULL = active, set = closed)
    pub exit_time: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shelter::Entity",
        from = "Column::ShelterId",
        to = "super::shelter::Column::Id",
        on_delete = "Cascade"
    )]
    Shelter,
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::PersonId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Person,
}

impl Related<super::shelter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shelter.def()
    }
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Person.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for CheckIn {
    fn from(model: Model) -> Self {
        CheckIn {
            id: model.id,
            shelter_id: model.shelter_id,
            person_id: model.person_id,
            entry_time: model.entry_time,
            exit_time: model.exit_time,
        }
    }
}

/// Build a fully-set active model from a domain record
impl From<&CheckIn> for ActiveModel {
    fn from(check_in: &CheckIn) -> Self {
        ActiveModel {
            id: Set(check_in.id),
            shelter_id: Set(check_in.shelter_id),
            person_id: Set(check_in.person_id),
            entry_time: Set(check_in.entry_time),
            exit_time: Set(check_in.exit_time),
        }
    }
}
