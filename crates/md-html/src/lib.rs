//! md HTML Parser
//!
//! HTML5 parsing on top of html5ever, producing `md_dom::Document`s and
//! inserting markup fragments into live documents.

mod parser;

pub use parser::HtmlParser;

use md_dom::{Document, DomError, NodeId};

/// Parse an HTML string into a document
pub fn parse_document(html: &str) -> HtmlResult<Document> {
    HtmlParser::new().parse(html)
}

/// Parse markup and append the resulting nodes to `parent`
pub fn parse_into(doc: &mut Document, parent: NodeId, html: &str) -> HtmlResult<Vec<NodeId>> {
    HtmlParser::new().parse_fragment(doc, parent, html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Dom(#[from] DomError),
}

pub type HtmlResult<T> = Result<T, HtmlError>;
