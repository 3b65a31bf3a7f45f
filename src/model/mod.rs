#[macro_use]
mod macros;

pub mod detail;
pub mod entity;
pub mod event;
pub mod event_index;
pub mod store;

pub use entity::{Entity, EntityField, EventGroup, EventGroups};
pub use event::{
    Column, ColumnData, ColumnKind, EventData, EventList, EventType, IndexEntry,
};
pub use event_index::EventIndex;
pub use store::{EntityRef, EntityState, EntityStore, StoreState};
