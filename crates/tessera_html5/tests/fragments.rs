use tessera_html5::document::Document;
use tessera_html5::parser::Html5Parser;
use tessera_html5::testing::tree_dump::dump_tree;
use tessera_html5::tree_adapter::{Namespace, TreeAdapter};
use test_case::test_case;

fn fragment(html: &str, context: Option<&str>) -> String {
    let parsed = tessera_html5::parse_fragment(html, context, None);
    dump_tree(&parsed.adapter, &parsed.root)
}

#[test_case("<p>a<p>b", Some("div"), &["| <p>", "|   \"a\"", "| <p>", "|   \"b\""]; "paragraphs in div")]
#[test_case("<p>a<p>b", None, &["| <p>", "|   \"a\"", "| <p>", "|   \"b\""]; "paragraphs without context")]
#[test_case("<b>x</b>", Some("textarea"), &["| \"<b>x</b>\""]; "textarea is rcdata")]
#[test_case("a</plaintext>b", Some("plaintext"), &["| \"a</plaintext>b\""]; "plaintext context")]
#[test_case("<td>a", Some("template"), &["| <td>", "|   \"a\""]; "template context")]
#[test_case(
    "<tr><td>x",
    Some("table"),
    &["| <tbody>", "|   <tr>", "|     <td>", "|       \"x\""];
    "table context"
)]
#[test_case("<td>x", Some("tr"), &["| <td>", "|   \"x\""]; "row context")]
#[test_case("<option>1<option>2", Some("select"), &["| <option>", "|   \"1\"", "| <option>", "|   \"2\""]; "select context")]
fn parses_fragment(html: &str, context: Option<&str>, expected: &[&str]) {
    assert_eq!(fragment(html, context), expected.join("\n"));
}

#[test]
fn fragment_nodes_do_not_end_up_in_the_document() {
    let parsed = tessera_html5::parse_fragment("<span>x</span>", Some("div"), None);

    assert!(parsed.adapter.child_nodes(&parsed.adapter.document()).is_empty());
    assert_eq!(parsed.adapter.child_nodes(&parsed.root).len(), 1);
}

#[test]
fn svg_context_parses_foreign_content() {
    let mut document = Document::new();
    let context = document.create_element("svg", Namespace::Svg, Vec::new());

    let parsed = Html5Parser::parse_fragment(document, Some(context), "<circle/><p>x", None);

    assert_eq!(
        dump_tree(&parsed.adapter, &parsed.root),
        ["| <svg circle>", "| <p>", "|   \"x\""].join("\n")
    );
}

#[test]
fn form_ancestor_blocks_nested_form() {
    let mut document = Document::new();
    let root = document.document();
    let form = document.create_element("form", Namespace::Html, Vec::new());
    let div = document.create_element("div", Namespace::Html, Vec::new());
    document.append_child(&root, &form);
    document.append_child(&form, &div);

    let parsed = Html5Parser::parse_fragment(document, Some(div), "<form><input></form>", None);

    assert_eq!(dump_tree(&parsed.adapter, &parsed.root), "| <input>");
    assert!(!parsed.errors.is_empty());
}
