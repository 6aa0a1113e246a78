//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it into the arena tree.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use md_dom::{Document, DomError, DomTree, NodeId};

use crate::HtmlResult;

/// HTML5 parser
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    fn read(&self, html: &str) -> HtmlResult<RcDom> {
        Ok(parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())?)
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> HtmlResult<Document> {
        let dom = self.read(html)?;
        let mut tree = DomTree::new();
        let root = tree.root();
        self.convert_children(&dom.document, &mut tree, root);

        let document = Document::from_tree(tree);
        tracing::debug!("parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Parse markup as body content and append it to `parent`.
    ///
    /// Returns the top-level nodes that were inserted.
    pub fn parse_fragment(&self, doc: &mut Document, parent: NodeId, html: &str) -> HtmlResult<Vec<NodeId>> {
        if !doc.is_alive(parent) {
            return Err(DomError::NotFound(parent).into());
        }
        let dom = self.read(html)?;
        let Some(body) = find_element(&dom.document, "body") else {
            return Ok(Vec::new());
        };

        let tree = doc.tree_mut();
        let before: Vec<NodeId> = tree.children(parent).collect();
        self.convert_children(&body, tree, parent);
        let inserted = tree
            .children(parent)
            .filter(|c| !before.contains(c))
            .collect::<Vec<_>>();
        tracing::trace!("inserted {} fragment nodes under {}", inserted.len(), parent);
        Ok(inserted)
    }

    fn convert_children(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        for child in handle.children.borrow().iter() {
            self.convert_node(child, tree, parent);
        }
    }

    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        let id = match &handle.data {
            RcNodeData::Document => {
                self.convert_children(handle, tree, parent);
                return;
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if text.trim().is_empty() {
                    return;
                }
                tree.create_text(&text)
            }
            RcNodeData::Comment { contents } => tree.create_comment(&contents.to_string()),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(name.local.as_ref());
                if let Some(element) = tree.element_mut(id) {
                    for attr in attrs.borrow().iter() {
                        element.set_attr(attr.name.local.as_ref(), &attr.value.to_string());
                    }
                }
                id
            }
            RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => return,
        };

        if let Err(err) = tree.append_child(parent, id) {
            tracing::warn!("dropping parsed node: {}", err);
            tree.dispose(id);
            return;
        }
        self.convert_children(handle, tree, id);
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if name.local.as_ref() == tag {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}
