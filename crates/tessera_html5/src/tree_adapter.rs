//! The interface between the tree builder and the tree it builds.
//!
//! The parser never allocates nodes itself. Every node is created, moved and queried through a
//! [`TreeAdapter`], and the parser only holds on to the opaque handles the adapter gives back.
//! This makes it possible to plug in different tree representations without touching any of the
//! parsing logic. [`crate::document::Document`] is the default implementation.
use std::fmt::Debug;

use tessera_shared::byte_stream::Span;

use crate::parser::quirks::QuirksMode;
use crate::tokenizer::token::Attribute;

/// Namespaces that elements and attributes can live in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    Xmlns,
}

impl Namespace {
    /// Returns the namespace URI
    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::Xmlns => "http://www.w3.org/2000/xmlns/",
        }
    }

    /// Short name of the namespace as used in the html5lib tree format
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Html => "html",
            Namespace::MathMl => "math",
            Namespace::Svg => "svg",
            Namespace::XLink => "xlink",
            Namespace::Xml => "xml",
            Namespace::Xmlns => "xmlns",
        }
    }
}

/// Source location of a node. Elements carry the span of their start tag and, once the element
/// is closed by a matching end tag, the span of that end tag as well.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeLocation {
    /// From the start of the node up to the end of its end tag (or start tag when not closed)
    pub span: Span,
    pub start_tag: Option<Span>,
    pub end_tag: Option<Span>,
}

impl NodeLocation {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            start_tag: None,
            end_tag: None,
        }
    }

    pub fn for_start_tag(span: Span) -> Self {
        Self {
            span,
            start_tag: Some(span),
            end_tag: None,
        }
    }
}

/// Creates, mutates and queries the nodes of the tree being built.
///
/// Handles must be cheap to clone and compare: the parser keeps them on its stacks and compares
/// them for identity.
pub trait TreeAdapter {
    type Handle: Clone + PartialEq + Debug;

    /// Returns the document node
    fn document(&self) -> Self::Handle;
    fn create_document_fragment(&mut self) -> Self::Handle;
    fn create_element(&mut self, name: &str, namespace: Namespace, attributes: Vec<Attribute>) -> Self::Handle;
    fn create_comment(&mut self, data: &str) -> Self::Handle;

    fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle);
    /// Inserts `child` into `parent` right before `reference`
    fn insert_before(&mut self, parent: &Self::Handle, child: &Self::Handle, reference: &Self::Handle);
    fn set_template_content(&mut self, template: &Self::Handle, content: &Self::Handle);
    fn get_template_content(&self, template: &Self::Handle) -> Option<Self::Handle>;
    fn set_document_type(&mut self, document: &Self::Handle, name: &str, public_id: &str, system_id: &str);
    fn set_document_mode(&mut self, document: &Self::Handle, mode: QuirksMode);
    fn get_document_mode(&self, document: &Self::Handle) -> QuirksMode;
    /// Removes the node from its parent. The node itself stays alive and can be inserted again.
    fn detach_node(&mut self, node: &Self::Handle);
    /// Appends text to `parent`, merging with the last child when that is a text node
    fn insert_text(&mut self, parent: &Self::Handle, text: &str);
    /// Inserts text before `reference`, merging with the text node preceding it if there is one
    fn insert_text_before(&mut self, parent: &Self::Handle, text: &str, reference: &Self::Handle);
    /// Adds the attributes the element does not have yet
    fn adopt_attributes(&mut self, recipient: &Self::Handle, attributes: &[Attribute]);

    fn first_child(&self, node: &Self::Handle) -> Option<Self::Handle>;
    fn child_nodes(&self, node: &Self::Handle) -> Vec<Self::Handle>;
    fn parent_node(&self, node: &Self::Handle) -> Option<Self::Handle>;
    fn attr_list(&self, element: &Self::Handle) -> Vec<Attribute>;
    fn tag_name(&self, element: &Self::Handle) -> &str;
    fn namespace(&self, element: &Self::Handle) -> Namespace;
    fn text_node_content(&self, node: &Self::Handle) -> &str;
    fn comment_node_content(&self, node: &Self::Handle) -> &str;
    fn document_type_name(&self, node: &Self::Handle) -> &str;
    fn document_type_public_id(&self, node: &Self::Handle) -> &str;
    fn document_type_system_id(&self, node: &Self::Handle) -> &str;

    fn is_text_node(&self, node: &Self::Handle) -> bool;
    fn is_comment_node(&self, node: &Self::Handle) -> bool;
    fn is_document_type_node(&self, node: &Self::Handle) -> bool;
    fn is_element_node(&self, node: &Self::Handle) -> bool;

    /// Returns the namespace URI of the element
    fn namespace_uri(&self, element: &Self::Handle) -> &'static str {
        self.namespace(element).url()
    }

    /// Source location hooks. Only called when source locations are enabled; adapters that do not
    /// track locations can ignore them.
    fn set_node_source_location(&mut self, _node: &Self::Handle, _location: NodeLocation) {}

    fn get_node_source_location(&self, _node: &Self::Handle) -> Option<NodeLocation> {
        None
    }

    /// Records the end tag that closed the element
    fn update_node_source_location(&mut self, _node: &Self::Handle, _end_tag: Span) {}
}
