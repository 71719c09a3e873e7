//! What the console caches and what each mutation invalidates.
//!
//! - `keys`: cache key builders for every cached view
//! - `query`: `Query`, the typed form of those keys
//! - `rules`: mutation kinds and the invalidation table

pub mod keys;
pub mod query;
pub mod rules;

pub use query::Query;
pub use rules::{
    id_field, is_destructive, label, register_defaults, ALL_KINDS, CREATE_CONTENT_ITEM, CREATE_VIDEO,
    DELETE_CONTENT_ITEM, DELETE_PROGRESS, DELETE_VIDEO, MARK_LESSON_COMPLETED, MARK_LESSON_INCOMPLETE,
    REORDER_CONTENT_ITEMS, UPDATE_CONTENT_ITEM, UPDATE_VIDEO,
};
