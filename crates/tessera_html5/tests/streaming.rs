use tessera_html5::document::Document;
use tessera_html5::parser::{Html5Parser, Html5ParserOptions, ParserStatus};
use tessera_html5::testing::tree_dump::dump_tree;
use tessera_html5::tree_adapter::TreeAdapter;
use test_case::test_case;

/// Feeds `html` in chunks of `size` characters and parses to the end
fn parse_in_chunks(html: &str, size: usize) -> (String, usize) {
    let mut parser = Html5Parser::new_document(Document::new(), None);

    let chars: Vec<char> = html.chars().collect();
    for chunk in chars.chunks(size) {
        parser.write(&chunk.iter().collect::<String>()).unwrap();
        assert_eq!(parser.run(), ParserStatus::NeedMoreInput);
    }

    let parsed = parser.finish();
    (dump_tree(&parsed.adapter, &parsed.root), parsed.errors.len())
}

#[test_case("<!DOCTYPE html><p class=\"a b\">One &amp; two&notin;<b>bold<i>both</b>it</i></p>"; "formatting and references")]
#[test_case("<table><tr><td>a</td></tr>b<caption>c</caption></table><!-- end -->"; "tables")]
#[test_case("<script>if (a <!-- b) { c = '</scr' + 'ipt>' }</script><p>after"; "script data")]
#[test_case("<textarea>\r\nx\r\ny</textarea><pre>\n\nz</pre>"; "newlines")]
#[test_case("<svg><foreignObject><math><mi>x</mi></math></foreignObject></svg><![CDATA[y]]>"; "foreign content")]
fn chunk_size_does_not_change_the_result(html: &str) {
    let (expected_tree, expected_errors) = parse_in_chunks(html, html.len());

    for size in 1..html.chars().count() {
        let (tree, errors) = parse_in_chunks(html, size);
        assert_eq!(tree, expected_tree, "chunk size {size}");
        assert_eq!(errors, expected_errors, "chunk size {size}");
    }
}

#[test]
fn write_after_end_is_an_error() {
    let mut parser = Html5Parser::new_document(Document::new(), None);
    parser.write("<p>x").unwrap();
    parser.end();

    assert!(parser.write("<p>y").is_err());
    assert_eq!(parser.run(), ParserStatus::Finished);
}

#[test]
fn run_without_end_waits_for_input() {
    let mut parser = Html5Parser::new_document(Document::new(), None);
    parser.write("<p>x").unwrap();

    assert_eq!(parser.run(), ParserStatus::NeedMoreInput);
    assert_eq!(parser.run(), ParserStatus::NeedMoreInput);

    parser.end();
    assert_eq!(parser.run(), ParserStatus::Finished);
}

fn script_options() -> Option<Html5ParserOptions> {
    Some(Html5ParserOptions::default().with_pause_on_script(true))
}

#[test]
fn script_end_suspends_parser() {
    let mut parser = Html5Parser::new_document(Document::new(), script_options());
    parser.write("<script>a</script><p>after").unwrap();

    let ParserStatus::ScriptPending(script) = parser.run() else {
        panic!("expected the parser to wait on the script");
    };
    assert_eq!(parser.adapter().tag_name(&script), "script");
    assert_eq!(parser.pending_script(), Some(&script));

    // Nothing after the script has been parsed yet
    assert!(parser.adapter().find_element("p").is_none());
    assert_eq!(parser.run(), ParserStatus::ScriptPending(script));

    parser.resume();
    assert_eq!(parser.pending_script(), None);
    assert_eq!(parser.run(), ParserStatus::NeedMoreInput);
    assert!(parser.adapter().find_element("p").is_some());
}

#[test]
fn document_write_is_inserted_in_call_order() {
    let mut parser = Html5Parser::new_document(Document::new(), script_options());
    parser.write("<script>a</script><p>after").unwrap();

    assert!(matches!(parser.run(), ParserStatus::ScriptPending(_)));
    parser.document_write("<i>1</i>");
    parser.document_write("<u>2</u>");
    parser.resume();

    let parsed = parser.finish();
    let expected = [
        "| <html>",
        "|   <head>",
        "|     <script>",
        "|       \"a\"",
        "|   <body>",
        "|     <i>",
        "|       \"1\"",
        "|     <u>",
        "|       \"2\"",
        "|     <p>",
        "|       \"after\"",
    ];
    assert_eq!(dump_tree(&parsed.adapter, &parsed.root), expected.join("\n"));
}

#[test]
fn script_split_over_chunks() {
    let mut parser = Html5Parser::new_document(Document::new(), script_options());

    parser.write("<p>1</p><scr").unwrap();
    assert_eq!(parser.run(), ParserStatus::NeedMoreInput);
    parser.write("ipt>x</scr").unwrap();
    assert_eq!(parser.run(), ParserStatus::NeedMoreInput);
    parser.write("ipt><p>2</p>").unwrap();
    assert!(matches!(parser.run(), ParserStatus::ScriptPending(_)));

    parser.document_write("<b>w</b>");
    parser.resume();

    let parsed = parser.finish();
    let expected = [
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <p>",
        "|       \"1\"",
        "|     <script>",
        "|       \"x\"",
        "|     <b>",
        "|       \"w\"",
        "|     <p>",
        "|       \"2\"",
    ];
    assert_eq!(dump_tree(&parsed.adapter, &parsed.root), expected.join("\n"));
}

#[test]
fn finish_resumes_pending_scripts() {
    let mut parser = Html5Parser::new_document(Document::new(), script_options());
    parser.write("<script></script><script></script><p>x").unwrap();
    assert!(matches!(parser.run(), ParserStatus::ScriptPending(_)));

    let parsed = parser.finish();
    assert!(parsed.adapter.find_element("p").is_some());
}
