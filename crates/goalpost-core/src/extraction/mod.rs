//! Task and entity extraction capabilities.
//!
//! The composer only sees the [`TaskExtractor`] and [`EntityExtractor`]
//! traits; the rule-based implementations here are the defaults.

pub mod entities;
pub mod shared;
pub mod task;
pub mod traits;

pub use entities::PatternEntityExtractor;
pub use shared::{
    shared_entity_extractor, shared_task_extractor, ExclusiveEntityExtractor,
    ExclusiveTaskExtractor, Serialized,
};
pub use task::RuleTaskExtractor;
pub use traits::{EntityExtractor, EntityMap, TaskExtractor};
