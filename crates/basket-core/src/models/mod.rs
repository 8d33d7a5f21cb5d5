//! Data models for Basket

mod category;
mod edit;
mod item;
mod list;
mod sync_conflict;

pub use category::{Category, CategoryId, ROOT_CATEGORY_ID, ROOT_CATEGORY_NAME};
pub use item::{Item, ItemId, ItemPatch, NewItem};
pub use list::{
    ListDocument, ListId, ListMode, SyncMetadata, UiPreferences, DEFAULT_LIST_TITLE,
    SCHEMA_VERSION,
};
pub use sync_conflict::{ConflictRecord, ResolutionStrategy};
