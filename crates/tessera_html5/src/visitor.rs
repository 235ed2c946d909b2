//! Depth-first traversal of a tree behind a [`TreeAdapter`]
use crate::tree_adapter::TreeAdapter;

/// Callbacks for [`walk`]. Template elements are entered once and their template contents are
/// visited as their children.
pub trait Visitor<A: TreeAdapter> {
    fn document_enter(&mut self, adapter: &A, node: &A::Handle);
    fn document_leave(&mut self, adapter: &A, node: &A::Handle);

    fn doctype_enter(&mut self, adapter: &A, node: &A::Handle);

    fn text_enter(&mut self, adapter: &A, node: &A::Handle);

    fn comment_enter(&mut self, adapter: &A, node: &A::Handle);

    fn element_enter(&mut self, adapter: &A, node: &A::Handle);
    fn element_leave(&mut self, adapter: &A, node: &A::Handle);
}

/// Visits `node` and everything below it. Documents and document fragments are both reported
/// through `document_enter`/`document_leave`.
pub fn walk<A: TreeAdapter, V: Visitor<A>>(adapter: &A, node: &A::Handle, visitor: &mut V) {
    if adapter.is_element_node(node) {
        visitor.element_enter(adapter, node);
        let children = match adapter.get_template_content(node) {
            Some(content) => adapter.child_nodes(&content),
            None => adapter.child_nodes(node),
        };
        for child in &children {
            walk(adapter, child, visitor);
        }
        visitor.element_leave(adapter, node);
    } else if adapter.is_text_node(node) {
        visitor.text_enter(adapter, node);
    } else if adapter.is_comment_node(node) {
        visitor.comment_enter(adapter, node);
    } else if adapter.is_document_type_node(node) {
        visitor.doctype_enter(adapter, node);
    } else {
        visitor.document_enter(adapter, node);
        for child in &adapter.child_nodes(node) {
            walk(adapter, child, visitor);
        }
        visitor.document_leave(adapter, node);
    }
}
