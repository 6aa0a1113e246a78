//! DOM errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not resolve to a live node
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    /// Operation requires an element
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Reference node is not a child of the parent
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Selector could not be parsed
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Selector parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported selector `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: &'static str,
}

impl SelectorError {
    pub(crate) fn new(selector: &str, reason: &'static str) -> Self {
        Self {
            selector: selector.to_string(),
            reason,
        }
    }
}
