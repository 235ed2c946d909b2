use crate::tree_adapter::{Namespace, TreeAdapter};
use crate::visitor::{walk, Visitor};

/// Generates the html5lib tree-construction test output of a tree: one `| ` prefixed line per
/// node, indented by two spaces per level. The root itself is not part of the output.
pub struct TreeOutputGenerator {
    lines: Vec<String>,
    depth: usize,
}

impl TreeOutputGenerator {
    /// Generates the tree lines below `root`
    pub fn generate<A: TreeAdapter>(adapter: &A, root: &A::Handle) -> Vec<String> {
        let mut generator = Self {
            lines: Vec::new(),
            depth: 0,
        };

        if adapter.is_element_node(root) {
            for child in &adapter.child_nodes(root) {
                walk(adapter, child, &mut generator);
            }
        } else {
            walk(adapter, root, &mut generator);
        }

        generator.lines
    }

    fn push_line(&mut self, depth: usize, line: &str) {
        self.lines.push(format!("| {}{}", "  ".repeat(depth), line));
    }
}

/// Returns the tree below `root` in the html5lib format as a single string
pub fn dump_tree<A: TreeAdapter>(adapter: &A, root: &A::Handle) -> String {
    TreeOutputGenerator::generate(adapter, root).join("\n")
}

fn is_html_template<A: TreeAdapter>(adapter: &A, node: &A::Handle) -> bool {
    adapter.namespace(node) == Namespace::Html && adapter.tag_name(node) == "template"
}

impl<A: TreeAdapter> Visitor<A> for TreeOutputGenerator {
    fn document_enter(&mut self, _adapter: &A, _node: &A::Handle) {}

    fn document_leave(&mut self, _adapter: &A, _node: &A::Handle) {}

    fn doctype_enter(&mut self, adapter: &A, node: &A::Handle) {
        let name = adapter.document_type_name(node);
        let public_id = adapter.document_type_public_id(node);
        let system_id = adapter.document_type_system_id(node);

        let line = if public_id.is_empty() && system_id.is_empty() {
            format!("<!DOCTYPE {name}>")
        } else {
            format!(r#"<!DOCTYPE {name} "{public_id}" "{system_id}">"#)
        };
        self.push_line(self.depth, &line);
    }

    fn text_enter(&mut self, adapter: &A, node: &A::Handle) {
        let line = format!(r#""{}""#, adapter.text_node_content(node));
        self.push_line(self.depth, &line);
    }

    fn comment_enter(&mut self, adapter: &A, node: &A::Handle) {
        let line = format!("<!-- {} -->", adapter.comment_node_content(node));
        self.push_line(self.depth, &line);
    }

    fn element_enter(&mut self, adapter: &A, node: &A::Handle) {
        let prefix = match adapter.namespace(node) {
            Namespace::Svg => "svg ",
            Namespace::MathMl => "math ",
            _ => "",
        };
        let line = format!("<{prefix}{}>", adapter.tag_name(node));
        self.push_line(self.depth, &line);

        let mut attributes: Vec<(String, String)> = adapter
            .attr_list(node)
            .into_iter()
            .map(|attr| {
                let name = match attr.prefix {
                    Some(prefix) => format!("{prefix} {}", attr.name),
                    None => attr.name,
                };
                (name, attr.value)
            })
            .collect();
        attributes.sort();

        for (name, value) in &attributes {
            let line = format!(r#"{name}="{value}""#);
            self.push_line(self.depth + 1, &line);
        }

        self.depth += 1;

        // Template tags have an extra "content" node in the test tree output
        if is_html_template(adapter, node) {
            self.push_line(self.depth, "content");
            self.depth += 1;
        }
    }

    fn element_leave(&mut self, adapter: &A, node: &A::Handle) {
        self.depth = self.depth.saturating_sub(1);
        if is_html_template(adapter, node) {
            self.depth = self.depth.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::tokenizer::token::Attribute;

    #[test]
    fn dumps_nested_elements() {
        let mut doc = Document::new();
        let root = doc.document();
        doc.set_document_type(&root, "html", "", "");
        let html = doc.create_element("html", Namespace::Html, vec![]);
        doc.append_child(&root, &html);
        let body = doc.create_element(
            "body",
            Namespace::Html,
            vec![Attribute::new("id", "x"), Attribute::new("class", "y")],
        );
        doc.append_child(&html, &body);
        doc.insert_text(&body, "hi");
        let svg = doc.create_element("svg", Namespace::Svg, vec![]);
        doc.append_child(&body, &svg);
        let comment = doc.create_comment("c");
        doc.append_child(&body, &comment);

        assert_eq!(
            dump_tree(&doc, &root),
            [
                "| <!DOCTYPE html>",
                "| <html>",
                "|   <body>",
                "|     class=\"y\"",
                "|     id=\"x\"",
                "|     \"hi\"",
                "|     <svg svg>",
                "|     <!-- c -->",
            ]
            .join("\n")
        );
    }

    #[test]
    fn dumps_template_content_and_doctype_ids() {
        let mut doc = Document::new();
        let root = doc.document();
        doc.set_document_type(&root, "html", "-//W3C//DTD HTML 4.01//EN", "");
        let template = doc.create_element("template", Namespace::Html, vec![]);
        let content = doc.create_document_fragment();
        doc.set_template_content(&template, &content);
        doc.append_child(&root, &template);
        let p = doc.create_element("p", Namespace::Html, vec![]);
        doc.append_child(&content, &p);

        assert_eq!(
            dump_tree(&doc, &root),
            [
                r#"| <!DOCTYPE html "-//W3C//DTD HTML 4.01//EN" "">"#,
                "| <template>",
                "|   content",
                "|     <p>",
            ]
            .join("\n")
        );
    }
}
