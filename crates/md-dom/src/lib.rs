//! md DOM - Document Object Model
//!
//! Arena-based document tree used by the md runtime: nodes, attributes,
//! class lists, inline styles, selectors, focus state and the native
//! listener table that event delegation hangs off.

mod node;
mod tree;
mod document;
mod classlist;
mod style;
mod selector;
mod listeners;
mod error;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::{DomTree, Children, Ancestors, Descendants};
pub use document::Document;
pub use classlist::DOMTokenList;
pub use style::InlineStyle;
pub use selector::{SelectorList, SelectorCache};
pub use listeners::{ListenerId, NativeListeners};
pub use error::{DomError, DomResult, SelectorError};

/// Node identifier (index into arena plus slot generation)
///
/// Disposing a node bumps the generation of its slot, so an id held past
/// disposal never resolves to whatever node reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Invalid/null node ID
    pub const NONE: NodeId = NodeId { index: u32::MAX, generation: 0 };

    /// Check if this is a valid ID
    #[inline]
    pub fn is_valid(self) -> bool {
        self.index != u32::MAX
    }

    /// Arena slot of this node
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this id was issued
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}v{}", self.index, self.generation)
        } else {
            write!(f, "#none")
        }
    }
}
