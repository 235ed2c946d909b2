use tessera_shared::node::NodeId;

use crate::parser::quirks::QuirksMode;
use crate::tokenizer::token::Attribute;
use crate::tree_adapter::{Namespace, NodeLocation};

/// Type of the node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Document,
    DocumentFragment,
    DocType,
    Element,
    Text,
    Comment,
}

/// Data that is specific for an element node
#[derive(Clone, Debug, PartialEq)]
pub struct ElementData {
    pub name: String,
    pub namespace: Namespace,
    /// Attributes in source order
    pub attributes: Vec<Attribute>,
    /// Contents of a template element
    pub template_contents: Option<NodeId>,
}

impl ElementData {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn is_html(&self, name: &str) -> bool {
        self.namespace == Namespace::Html && self.name == name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocTypeData {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

/// Different types of data a node can hold
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Document { mode: QuirksMode },
    DocumentFragment,
    DocType(DocTypeData),
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// A single node in the arena. Parent and children are stored as ids into the same arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
    pub location: Option<NodeLocation>,
}

impl Node {
    pub(crate) fn new(id: NodeId, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            data,
            location: None,
        }
    }

    pub fn type_of(&self) -> NodeType {
        match self.data {
            NodeData::Document { .. } => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::DocType(_) => NodeType::DocType,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn doctype(&self) -> Option<&DocTypeData> {
        match &self.data {
            NodeData::DocType(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the data of a text node
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match &self.data {
            NodeData::Comment(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true when this is an HTML element with the given name
    pub fn is_html_element(&self, name: &str) -> bool {
        self.element().is_some_and(|data| data.is_html(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_node() {
        let node = Node::new(
            NodeId::from(3usize),
            NodeData::Element(ElementData {
                name: "div".to_string(),
                namespace: Namespace::Html,
                attributes: vec![Attribute::new("id", "main")],
                template_contents: None,
            }),
        );

        assert_eq!(node.type_of(), NodeType::Element);
        assert!(node.is_html_element("div"));
        assert!(!node.is_html_element("span"));
        assert_eq!(node.element().and_then(|e| e.attribute("id")), Some("main"));
        assert!(node.text().is_none());
    }

    #[test]
    fn text_and_comment_nodes() {
        let text = Node::new(NodeId::from(1usize), NodeData::Text("hello".to_string()));
        assert_eq!(text.type_of(), NodeType::Text);
        assert_eq!(text.text(), Some("hello"));

        let comment = Node::new(NodeId::from(2usize), NodeData::Comment("note".to_string()));
        assert_eq!(comment.comment(), Some("note"));
        assert!(!comment.is_html_element("note"));
    }
}
