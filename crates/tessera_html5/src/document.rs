//! The default tree: an arena of nodes addressed by [`NodeId`].
//!
//! Every node created by the parser, including nodes that end up detached (template contents,
//! fragment roots, nodes removed by the adoption agency), lives in the arena for the lifetime of
//! the document. Node ids are indexes into the arena and are never reused.
use tessera_shared::byte_stream::Span;
use tessera_shared::node::NodeId;

use crate::node::{DocTypeData, ElementData, Node, NodeData};
use crate::parser::quirks::QuirksMode;
use crate::tokenizer::token::Attribute;
use crate::tree_adapter::{Namespace, NodeLocation, TreeAdapter};

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a new document that only holds the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(
                NodeId::root(),
                NodeData::Document {
                    mode: QuirksMode::NoQuirks,
                },
            )],
        }
    }

    /// Returns the node with the given id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_usize())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.as_usize())
    }

    /// Number of nodes in the arena, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or_default()
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.get_document_mode(&NodeId::root())
    }

    /// Returns the first element (depth-first) with the given tag name
    pub fn find_element(&self, name: &str) -> Option<NodeId> {
        let mut stack = vec![NodeId::root()];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if node.element().is_some_and(|data| data.name == name) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    fn register(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::from(self.nodes.len());
        self.nodes.push(Node::new(id, data));
        id
    }

    fn is_text(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.text().is_some())
    }

    fn append_text_to(&mut self, id: NodeId, text: &str) {
        if let Some(Node {
            data: NodeData::Text(value),
            ..
        }) = self.node_mut(id)
        {
            value.push_str(text);
        }
    }
}

impl TreeAdapter for Document {
    type Handle = NodeId;

    fn document(&self) -> NodeId {
        NodeId::root()
    }

    fn create_document_fragment(&mut self) -> NodeId {
        self.register(NodeData::DocumentFragment)
    }

    fn create_element(&mut self, name: &str, namespace: Namespace, attributes: Vec<Attribute>) -> NodeId {
        self.register(NodeData::Element(ElementData {
            name: name.to_string(),
            namespace,
            attributes,
            template_contents: None,
        }))
    }

    fn create_comment(&mut self, data: &str) -> NodeId {
        self.register(NodeData::Comment(data.to_string()))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach_node(child);
        if let Some(node) = self.node_mut(*child) {
            node.parent = Some(*parent);
        }
        if let Some(node) = self.node_mut(*parent) {
            node.children.push(*child);
        }
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        self.detach_node(child);
        let Some(position) = self.children(*parent).iter().position(|id| id == reference) else {
            self.append_child(parent, child);
            return;
        };

        if let Some(node) = self.node_mut(*child) {
            node.parent = Some(*parent);
        }
        if let Some(node) = self.node_mut(*parent) {
            node.children.insert(position, *child);
        }
    }

    fn set_template_content(&mut self, template: &NodeId, content: &NodeId) {
        if let Some(data) = self.node_mut(*template).and_then(Node::element_mut) {
            data.template_contents = Some(*content);
        }
    }

    fn get_template_content(&self, template: &NodeId) -> Option<NodeId> {
        self.node(*template)
            .and_then(Node::element)
            .and_then(|data| data.template_contents)
    }

    fn set_document_type(&mut self, document: &NodeId, name: &str, public_id: &str, system_id: &str) {
        let data = DocTypeData {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        };

        let existing = self
            .children(*document)
            .iter()
            .copied()
            .find(|id| self.node(*id).is_some_and(|node| node.doctype().is_some()));

        match existing {
            Some(id) => {
                if let Some(node) = self.node_mut(id) {
                    node.data = NodeData::DocType(data);
                }
            }
            None => {
                let id = self.register(NodeData::DocType(data));
                self.append_child(document, &id);
            }
        }
    }

    fn set_document_mode(&mut self, document: &NodeId, mode: QuirksMode) {
        if let Some(Node {
            data: NodeData::Document { mode: current },
            ..
        }) = self.node_mut(*document)
        {
            *current = mode;
        }
    }

    fn get_document_mode(&self, document: &NodeId) -> QuirksMode {
        match self.node(*document).map(|node| &node.data) {
            Some(NodeData::Document { mode }) => *mode,
            _ => QuirksMode::NoQuirks,
        }
    }

    fn detach_node(&mut self, node: &NodeId) {
        let Some(parent) = self.node_mut(*node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|id| id != node);
        }
    }

    fn insert_text(&mut self, parent: &NodeId, text: &str) {
        if let Some(&last) = self.children(*parent).last() {
            if self.is_text(last) {
                self.append_text_to(last, text);
                return;
            }
        }

        let id = self.register(NodeData::Text(text.to_string()));
        self.append_child(parent, &id);
    }

    fn insert_text_before(&mut self, parent: &NodeId, text: &str, reference: &NodeId) {
        let children = self.children(*parent);
        let previous = children
            .iter()
            .position(|id| id == reference)
            .and_then(|idx| idx.checked_sub(1))
            .map(|idx| children[idx]);

        if let Some(previous) = previous {
            if self.is_text(previous) {
                self.append_text_to(previous, text);
                return;
            }
        }

        let id = self.register(NodeData::Text(text.to_string()));
        self.insert_before(parent, &id, reference);
    }

    fn adopt_attributes(&mut self, recipient: &NodeId, attributes: &[Attribute]) {
        let Some(data) = self.node_mut(*recipient).and_then(Node::element_mut) else {
            return;
        };

        for attr in attributes {
            if !data.attributes.iter().any(|existing| existing.name == attr.name) {
                data.attributes.push(attr.clone());
            }
        }
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.children(*node).first().copied()
    }

    fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
        self.children(*node).to_vec()
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).and_then(|n| n.parent)
    }

    fn attr_list(&self, element: &NodeId) -> Vec<Attribute> {
        self.node(*element)
            .and_then(Node::element)
            .map(|data| data.attributes.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, element: &NodeId) -> &str {
        self.node(*element)
            .and_then(Node::element)
            .map(|data| data.name.as_str())
            .unwrap_or_default()
    }

    fn namespace(&self, element: &NodeId) -> Namespace {
        self.node(*element)
            .and_then(Node::element)
            .map(|data| data.namespace)
            .unwrap_or(Namespace::Html)
    }

    fn text_node_content(&self, node: &NodeId) -> &str {
        self.node(*node).and_then(Node::text).unwrap_or_default()
    }

    fn comment_node_content(&self, node: &NodeId) -> &str {
        self.node(*node).and_then(Node::comment).unwrap_or_default()
    }

    fn document_type_name(&self, node: &NodeId) -> &str {
        self.node(*node)
            .and_then(Node::doctype)
            .map(|data| data.name.as_str())
            .unwrap_or_default()
    }

    fn document_type_public_id(&self, node: &NodeId) -> &str {
        self.node(*node)
            .and_then(Node::doctype)
            .map(|data| data.public_id.as_str())
            .unwrap_or_default()
    }

    fn document_type_system_id(&self, node: &NodeId) -> &str {
        self.node(*node)
            .and_then(Node::doctype)
            .map(|data| data.system_id.as_str())
            .unwrap_or_default()
    }

    fn is_text_node(&self, node: &NodeId) -> bool {
        self.is_text(*node)
    }

    fn is_comment_node(&self, node: &NodeId) -> bool {
        self.node(*node).is_some_and(|n| n.comment().is_some())
    }

    fn is_document_type_node(&self, node: &NodeId) -> bool {
        self.node(*node).is_some_and(|n| n.doctype().is_some())
    }

    fn is_element_node(&self, node: &NodeId) -> bool {
        self.node(*node).is_some_and(|n| n.element().is_some())
    }

    fn set_node_source_location(&mut self, node: &NodeId, location: NodeLocation) {
        if let Some(node) = self.node_mut(*node) {
            node.location = Some(location);
        }
    }

    fn get_node_source_location(&self, node: &NodeId) -> Option<NodeLocation> {
        self.node(*node).and_then(|n| n.location)
    }

    fn update_node_source_location(&mut self, node: &NodeId, end_tag: Span) {
        if let Some(location) = self.node_mut(*node).and_then(|n| n.location.as_mut()) {
            location.span.end = end_tag.end;
            location.end_tag = Some(end_tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_shared::byte_stream::Location;

    use super::*;

    fn element(doc: &mut Document, name: &str) -> NodeId {
        doc.create_element(name, Namespace::Html, vec![])
    }

    #[test]
    fn append_and_insert_before() {
        let mut doc = Document::new();
        let root = doc.document();
        let html = element(&mut doc, "html");
        let head = element(&mut doc, "head");
        let body = element(&mut doc, "body");

        doc.append_child(&root, &html);
        doc.append_child(&html, &body);
        doc.insert_before(&html, &head, &body);

        assert_eq!(doc.child_nodes(&html), vec![head, body]);
        assert_eq!(doc.parent_node(&head), Some(html));
        assert_eq!(doc.first_child(&root), Some(html));
        assert_eq!(doc.find_element("body"), Some(body));
    }

    #[test]
    fn append_moves_node() {
        let mut doc = Document::new();
        let a = element(&mut doc, "a");
        let b = element(&mut doc, "b");
        let c = element(&mut doc, "c");

        doc.append_child(&a, &c);
        doc.append_child(&b, &c);

        assert!(doc.child_nodes(&a).is_empty());
        assert_eq!(doc.child_nodes(&b), vec![c]);

        doc.detach_node(&c);
        assert!(doc.child_nodes(&b).is_empty());
        assert_eq!(doc.parent_node(&c), None);
    }

    #[test]
    fn text_is_merged() {
        let mut doc = Document::new();
        let p = element(&mut doc, "p");
        let br = element(&mut doc, "br");

        doc.insert_text(&p, "a");
        doc.insert_text(&p, "b");
        doc.append_child(&p, &br);
        doc.insert_text_before(&p, "c", &br);
        doc.insert_text(&p, "d");

        let children = doc.child_nodes(&p);
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text_node_content(&children[0]), "abc");
        assert_eq!(doc.text_node_content(&children[2]), "d");
    }

    #[test]
    fn doctype_and_mode() {
        let mut doc = Document::new();
        let root = doc.document();
        doc.set_document_type(&root, "html", "", "about:legacy-compat");
        doc.set_document_mode(&root, QuirksMode::LimitedQuirks);

        let doctype = doc.first_child(&root).unwrap();
        assert!(doc.is_document_type_node(&doctype));
        assert_eq!(doc.document_type_name(&doctype), "html");
        assert_eq!(doc.document_type_system_id(&doctype), "about:legacy-compat");
        assert_eq!(doc.quirks_mode(), QuirksMode::LimitedQuirks);
    }

    #[test]
    fn adopt_attributes_keeps_existing() {
        let mut doc = Document::new();
        let body = doc.create_element("body", Namespace::Html, vec![Attribute::new("id", "1")]);
        doc.adopt_attributes(&body, &[Attribute::new("id", "2"), Attribute::new("class", "x")]);

        let attrs = doc.attr_list(&body);
        assert_eq!(attrs, vec![Attribute::new("id", "1"), Attribute::new("class", "x")]);
    }

    #[test]
    fn template_content_and_locations() {
        let mut doc = Document::new();
        let template = element(&mut doc, "template");
        let content = doc.create_document_fragment();
        doc.set_template_content(&template, &content);
        assert_eq!(doc.get_template_content(&template), Some(content));

        let start = Span::new(Location::new(1, 1, 0), Location::new(1, 11, 10));
        let end = Span::new(Location::new(1, 11, 10), Location::new(1, 22, 21));
        doc.set_node_source_location(&template, NodeLocation::for_start_tag(start));
        doc.update_node_source_location(&template, end);

        let location = doc.get_node_source_location(&template).unwrap();
        assert_eq!(location.span, Span::new(start.start, end.end));
        assert_eq!(location.end_tag, Some(end));
    }

    #[test]
    fn unknown_nodes_are_harmless() {
        let mut doc = Document::new();
        let missing = NodeId::from(99usize);
        assert_eq!(doc.tag_name(&missing), "");
        assert!(doc.child_nodes(&missing).is_empty());
        doc.detach_node(&missing);
        doc.insert_text(&missing, "x");
    }
}
