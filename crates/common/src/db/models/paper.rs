//! Paper entity
//!
//! Vote totals and tag names are not columns; they are resolved per query.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    #[sea_orm(column_name = "abstract", column_type = "Text", nullable)]
    pub abstract_text: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bib_entry: Option<String>,

    /// Comma-separated author list
    #[sea_orm(column_type = "Text", nullable)]
    pub authors: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub published_date: Option<String>,

    pub submitter_id: Uuid,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SubmitterId",
        to = "super::user::Column::Id"
    )]
    Submitter,

    #[sea_orm(has_many = "super::vote::Entity", on_delete = "Cascade")]
    Votes,

    #[sea_orm(has_many = "super::paper_tag::Entity", on_delete = "Cascade")]
    PaperTags,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submitter.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::paper_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::paper_tag::Relation::Paper.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
