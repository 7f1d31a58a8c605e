//! SeaORM entity models
//!
//! Every entity except `User` is owned by a user and must only be queried
//! through a [`UserScope`](crate::db::UserScope).

pub(crate) mod coffee;
pub(crate) mod coffee_tasting_note;
pub(crate) mod processing;
pub(crate) mod roaster;
pub(crate) mod tasting_note;
pub(crate) mod user;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use processing::{
    Entity as ProcessingEntity,
    Model as Processing,
    ActiveModel as ProcessingActiveModel,
    Column as ProcessingColumn,
};

pub use roaster::{
    Entity as RoasterEntity,
    Model as Roaster,
    ActiveModel as RoasterActiveModel,
    Column as RoasterColumn,
};

pub use tasting_note::{
    Entity as TastingNoteEntity,
    Model as TastingNote,
    ActiveModel as TastingNoteActiveModel,
    Column as TastingNoteColumn,
};

pub use coffee::{
    Entity as CoffeeEntity,
    Model as Coffee,
    ActiveModel as CoffeeActiveModel,
    Column as CoffeeColumn,
};

pub use coffee_tasting_note::{
    Entity as CoffeeTastingNoteEntity,
    Model as CoffeeTastingNote,
    ActiveModel as CoffeeTastingNoteActiveModel,
    Column as CoffeeTastingNoteColumn,
};
