use crate::elements::is_void;
use crate::tree_adapter::{Namespace, TreeAdapter};
use crate::visitor::{walk, Visitor};

/// Elements whose text children are written without escaping
const RAW_TEXT_PARENTS: [&str; 7] = ["style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext"];

/// Writer to convert a tree to HTML, following the algorithm for serializing HTML fragments
pub struct DocumentWriter {
    /// The buffer to write to
    buffer: String,
    /// Whether noscript content is raw text
    scripting_enabled: bool,
    /// Name and namespace of the elements we are in
    parents: Vec<(String, Namespace)>,
}

impl DocumentWriter {
    /// Serializes `node` and everything below it
    pub fn write_from_node<A: TreeAdapter>(adapter: &A, node: &A::Handle) -> String {
        Self::write_with_scripting(adapter, node, true)
    }

    pub fn write_with_scripting<A: TreeAdapter>(adapter: &A, node: &A::Handle, scripting_enabled: bool) -> String {
        let mut writer = Self {
            buffer: String::new(),
            scripting_enabled,
            parents: Vec::new(),
        };

        walk(adapter, node, &mut writer);
        writer.buffer
    }

    fn in_raw_text(&self) -> bool {
        match self.parents.last() {
            Some((name, Namespace::Html)) => {
                RAW_TEXT_PARENTS.contains(&name.as_str()) || (self.scripting_enabled && name == "noscript")
            }
            _ => false,
        }
    }
}

fn escape_text(value: &str, buffer: &mut String) {
    for c in value.chars() {
        match c {
            '&' => buffer.push_str("&amp;"),
            '\u{00A0}' => buffer.push_str("&nbsp;"),
            '<' => buffer.push_str("&lt;"),
            '>' => buffer.push_str("&gt;"),
            _ => buffer.push(c),
        }
    }
}

fn escape_attribute(value: &str, buffer: &mut String) {
    for c in value.chars() {
        match c {
            '&' => buffer.push_str("&amp;"),
            '\u{00A0}' => buffer.push_str("&nbsp;"),
            '"' => buffer.push_str("&quot;"),
            _ => buffer.push(c),
        }
    }
}

impl<A: TreeAdapter> Visitor<A> for DocumentWriter {
    fn document_enter(&mut self, _adapter: &A, _node: &A::Handle) {}

    fn document_leave(&mut self, _adapter: &A, _node: &A::Handle) {}

    fn doctype_enter(&mut self, adapter: &A, node: &A::Handle) {
        self.buffer.push_str("<!DOCTYPE ");
        self.buffer.push_str(adapter.document_type_name(node));
        self.buffer.push('>');
    }

    fn text_enter(&mut self, adapter: &A, node: &A::Handle) {
        let text = adapter.text_node_content(node);
        if self.in_raw_text() {
            self.buffer.push_str(text);
        } else {
            escape_text(text, &mut self.buffer);
        }
    }

    fn comment_enter(&mut self, adapter: &A, node: &A::Handle) {
        self.buffer.push_str("<!--");
        self.buffer.push_str(adapter.comment_node_content(node));
        self.buffer.push_str("-->");
    }

    fn element_enter(&mut self, adapter: &A, node: &A::Handle) {
        let name = adapter.tag_name(node);
        let namespace = adapter.namespace(node);

        self.buffer.push('<');
        self.buffer.push_str(name);

        for attr in adapter.attr_list(node) {
            self.buffer.push(' ');
            self.buffer.push_str(&attr.qualified_name());
            self.buffer.push_str("=\"");
            escape_attribute(&attr.value, &mut self.buffer);
            self.buffer.push('"');
        }

        self.buffer.push('>');

        // The parser drops a newline directly after these start tags
        if namespace == Namespace::Html && matches!(name, "pre" | "textarea" | "listing") {
            let starts_with_lf = adapter
                .first_child(node)
                .filter(|child| adapter.is_text_node(child))
                .is_some_and(|child| adapter.text_node_content(&child).starts_with('\n'));
            if starts_with_lf {
                self.buffer.push('\n');
            }
        }

        self.parents.push((name.to_string(), namespace));
    }

    fn element_leave(&mut self, adapter: &A, node: &A::Handle) {
        self.parents.pop();

        let name = adapter.tag_name(node);
        if adapter.namespace(node) == Namespace::Html && is_void(name) {
            return;
        }

        self.buffer.push_str("</");
        self.buffer.push_str(name);
        self.buffer.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::tokenizer::token::Attribute;

    #[test]
    fn escapes_text_and_attributes() {
        let mut doc = Document::new();
        let root = doc.document();
        let p = doc.create_element("p", Namespace::Html, vec![Attribute::new("title", "a \"b\" & c")]);
        doc.append_child(&root, &p);
        doc.insert_text(&p, "1 < 2 & 3 > 2\u{a0}");

        assert_eq!(
            DocumentWriter::write_from_node(&doc, &root),
            r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp; 3 &gt; 2&nbsp;</p>"#
        );
    }

    #[test]
    fn raw_text_and_void_elements() {
        let mut doc = Document::new();
        let root = doc.document();
        let div = doc.create_element("div", Namespace::Html, vec![]);
        let style = doc.create_element("style", Namespace::Html, vec![]);
        let br = doc.create_element("br", Namespace::Html, vec![]);
        let noscript = doc.create_element("noscript", Namespace::Html, vec![]);
        doc.append_child(&root, &div);
        doc.append_child(&div, &style);
        doc.insert_text(&style, "a > b");
        doc.append_child(&div, &br);
        doc.append_child(&div, &noscript);
        doc.insert_text(&noscript, "<b>");

        assert_eq!(
            DocumentWriter::write_from_node(&doc, &root),
            "<div><style>a > b</style><br><noscript><b></noscript></div>"
        );
        assert_eq!(
            DocumentWriter::write_with_scripting(&doc, &root, false),
            "<div><style>a > b</style><br><noscript>&lt;b&gt;</noscript></div>"
        );
    }

    #[test]
    fn template_contents_and_comments() {
        let mut doc = Document::new();
        let root = doc.document();
        let template = doc.create_element("template", Namespace::Html, vec![]);
        let content = doc.create_document_fragment();
        doc.set_template_content(&template, &content);
        doc.append_child(&root, &template);
        let comment = doc.create_comment(" hi ");
        doc.append_child(&content, &comment);

        assert_eq!(
            DocumentWriter::write_from_node(&doc, &root),
            "<template><!-- hi --></template>"
        );
    }

    #[test]
    fn leading_newline_in_pre_is_kept() {
        let mut doc = Document::new();
        let root = doc.document();
        let pre = doc.create_element("pre", Namespace::Html, vec![]);
        doc.append_child(&root, &pre);
        doc.insert_text(&pre, "\nx");

        assert_eq!(DocumentWriter::write_from_node(&doc, &root), "<pre>\n\nx</pre>");
    }
}
