//! Explicit resource exposure layer
//!
//! Maps each entity type to a description of its fields (persisted,
//! computed or relation) and its network-facing resource type name,
//! constructed once at process start.

pub mod descriptor;
pub mod registry;

pub use descriptor::{BindValue, FieldDescriptor, FieldKind, ResourceDescriptor, ValueType};
pub use registry::{OrderBy, Predicate, ResourceRegistry, GLOBAL_RATING, MOD_VERSION};
