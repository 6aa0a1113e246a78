//! md Core
//!
//! The runtime layer between the document model and the components:
//! - `Collection`: ordered, deduplicated node sets with chainable operations
//! - `Capabilities`: named operations callable on any collection
//! - `DataStore`: per-node keyed values with explicit disposal
//! - `events`: event objects and the delegation engine
//! - `options` / `schema`: declarative options and property reflection

pub mod collection;
pub mod capability;
pub mod data;
pub mod events;
pub mod options;
pub mod schema;

pub use collection::{Collection, Target};
pub use capability::{Capabilities, Capability, CapabilityHost};
pub use data::DataStore;
pub use events::{dispatch, Delegator, Event, EventHost, EventName, Handler, HandlerId};
pub use options::{parse_options, Options, OptionsError};
pub use schema::{Properties, PropertyChange, PropertyKind, PropertySchema, PropertySpec};

pub use md_dom::{Document, NodeId};
pub use serde_json::Value;
