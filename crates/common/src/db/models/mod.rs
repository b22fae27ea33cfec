//! SeaORM entity models
//!
//! Database entities for Paperboard

mod paper;
mod paper_tag;
mod tag;
mod user;
mod vote;

pub use paper::{
    Entity as PaperEntity,
    Model as Paper,
    ActiveModel as PaperActiveModel,
    Column as PaperColumn,
};

pub use paper_tag::{
    Entity as PaperTagEntity,
    Model as PaperTag,
    ActiveModel as PaperTagActiveModel,
    Column as PaperTagColumn,
};

pub use tag::{
    Entity as TagEntity,
    Model as Tag,
    ActiveModel as TagActiveModel,
    Column as TagColumn,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use vote::{
    Entity as VoteEntity,
    Model as Vote,
    ActiveModel as VoteActiveModel,
    Column as VoteColumn,
};
