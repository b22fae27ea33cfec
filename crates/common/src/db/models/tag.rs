//! Tag entity. Names are stored normalized (trimmed, lowercase).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::paper_tag::Entity")]
    PaperTags,
}

impl Related<super::paper::Entity> for Entity {
    fn to() -> RelationDef {
        super::paper_tag::Relation::Paper.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::paper_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
