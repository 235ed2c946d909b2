use tessera_html5::parser::quirks::QuirksMode;
use tessera_html5::parser::Html5ParserOptions;
use tessera_html5::testing::tree_dump::dump_tree;
use tessera_html5::writer::DocumentWriter;
use test_case::test_case;

fn tree(html: &str) -> String {
    let parsed = tessera_html5::parse(html, None);
    dump_tree(&parsed.adapter, &parsed.root)
}

#[test_case(
    "<p>One<p>Two",
    &["| <html>", "|   <head>", "|   <body>", "|     <p>", "|       \"One\"", "|     <p>", "|       \"Two\""];
    "implied paragraph end"
)]
#[test_case(
    "<b>1<i>2</b>3</i>",
    &[
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <b>",
        "|       \"1\"",
        "|       <i>",
        "|         \"2\"",
        "|     <i>",
        "|       \"3\"",
    ];
    "misnested formatting"
)]
#[test_case(
    "<a>1<p>2</a>3</p>",
    &[
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <a>",
        "|       \"1\"",
        "|     <p>",
        "|       <a>",
        "|         \"2\"",
        "|       \"3\"",
    ];
    "adoption agency with furthest block"
)]
#[test_case(
    "<table><tr><td>a</td></tr>b</table>",
    &[
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     \"b\"",
        "|     <table>",
        "|       <tbody>",
        "|         <tr>",
        "|           <td>",
        "|             \"a\"",
    ];
    "foster parented text"
)]
#[test_case(
    "<table><td>x",
    &[
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <table>",
        "|       <tbody>",
        "|         <tr>",
        "|           <td>",
        "|             \"x\"",
    ];
    "implied table sections"
)]
#[test_case(
    "<ul><li>a<li>b</ul>",
    &["| <html>", "|   <head>", "|   <body>", "|     <ul>", "|       <li>", "|         \"a\"", "|       <li>", "|         \"b\""];
    "list items close each other"
)]
#[test_case(
    "<select><option>1<option>2</select>",
    &[
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <select>",
        "|       <option>",
        "|         \"1\"",
        "|       <option>",
        "|         \"2\"",
    ];
    "select options"
)]
#[test_case(
    "<title>a<b></title>",
    &["| <html>", "|   <head>", "|     <title>", "|       \"a<b>\"", "|   <body>"];
    "rcdata title"
)]
#[test_case(
    "<textarea>\nfoo</textarea>",
    &["| <html>", "|   <head>", "|   <body>", "|     <textarea>", "|       \"foo\""];
    "leading newline in textarea is dropped"
)]
#[test_case(
    "<!--c--><!DOCTYPE html><p>x",
    &["| <!-- c -->", "| <!DOCTYPE html>", "| <html>", "|   <head>", "|   <body>", "|     <p>", "|       \"x\""];
    "comment before doctype"
)]
#[test_case(
    "<svg><circle/><foreignObject><p>x</p></foreignObject></svg>",
    &[
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <svg svg>",
        "|       <svg circle>",
        "|       <svg foreignObject>",
        "|         <p>",
        "|           \"x\"",
    ];
    "svg with html integration point"
)]
#[test_case(
    "<svg viewbox=\"0 0 1 1\" xlink:href=\"#a\"></svg>",
    &[
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <svg svg>",
        "|       viewBox=\"0 0 1 1\"",
        "|       xlink href=\"#a\"",
    ];
    "svg attribute adjustments"
)]
#[test_case(
    "<svg><script/><circle/></svg>",
    &["| <html>", "|   <head>", "|   <body>", "|     <svg svg>", "|       <svg script>", "|       <svg circle>"];
    "self-closing svg script is closed"
)]
#[test_case(
    "<math><mi>x</mi></math>",
    &["| <html>", "|   <head>", "|   <body>", "|     <math math>", "|       <math mi>", "|         \"x\""];
    "mathml"
)]
#[test_case(
    "<template><tr><td>x</template>",
    &[
        "| <html>",
        "|   <head>",
        "|     <template>",
        "|       content",
        "|         <tr>",
        "|           <td>",
        "|             \"x\"",
        "|   <body>",
    ];
    "template contents"
)]
fn builds_tree(html: &str, expected: &[&str]) {
    assert_eq!(tree(html), expected.join("\n"));
}

#[test]
fn noahs_ark_limits_reconstructed_elements() {
    let expected = [
        "| <html>",
        "|   <head>",
        "|   <body>",
        "|     <p>",
        "|       <b>",
        "|         <b>",
        "|           <b>",
        "|             <b>",
        "|     <p>",
        "|       <b>",
        "|         <b>",
        "|           <b>",
        "|             \"x\"",
    ];

    assert_eq!(tree("<p><b><b><b><b><p>x"), expected.join("\n"));
}

#[test_case("<!DOCTYPE html SYSTEM \"about:legacy-compat\"><p>x", QuirksMode::NoQuirks; "legacy compat")]
#[test_case("<!DOCTYPE html><p>x", QuirksMode::NoQuirks; "html doctype")]
#[test_case("<p>x", QuirksMode::Quirks; "missing doctype")]
#[test_case(
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\" \"http://www.w3.org/TR/html4/loose.dtd\">",
    QuirksMode::LimitedQuirks;
    "transitional with system id"
)]
#[test_case(
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\">",
    QuirksMode::Quirks;
    "transitional without system id"
)]
fn document_mode(html: &str, mode: QuirksMode) {
    let parsed = tessera_html5::parse(html, None);
    assert_eq!(parsed.adapter.quirks_mode(), mode);
}

#[test_case("<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\"><p>x", true; "html401 strict")]
#[test_case(
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\"><p>x",
    true;
    "xhtml strict"
)]
#[test_case("<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\"><p>x", false; "transitional")]
fn legacy_doctype_conformance(html: &str, conforming: bool) {
    let parsed = tessera_html5::parse(html, None);
    let reported = parsed.errors.iter().any(|e| e.message == "non-conforming-doctype");
    assert_eq!(reported, !conforming);
}

#[test]
fn errors_do_not_stop_the_parse() {
    let parsed = tessera_html5::parse("<b>1<i>2</b>3</i></div><p>after", None);

    assert!(!parsed.errors.is_empty());
    assert!(tree("<b>1<i>2</b>3</i></div><p>after").ends_with("|     <p>\n|       \"after\""));
}

#[test]
fn parse_error_callback_sees_every_error() {
    use std::cell::RefCell;
    use std::rc::Rc;
    use tessera_shared::types::ParseError;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let options = Html5ParserOptions::default().with_parse_error_callback(Box::new(move |e: &ParseError| {
        sink.borrow_mut().push(e.message.clone());
    }));

    let parsed = tessera_html5::parse("<p>x</div>", Some(options));

    let seen = seen.borrow();
    assert!(!seen.is_empty());
    assert_eq!(seen.len(), parsed.errors.len());
    assert!(seen.iter().any(|m| m == "missing-doctype"));
}

#[test_case("<!DOCTYPE html><p>One<b>two</b> &amp; three</p><!--c--><table><tr><td>x</td></tr></table>"; "mixed")]
#[test_case("<b>1<i>2</b>3</i>"; "misnested")]
#[test_case("<pre>\n\nline</pre><textarea>\nx</textarea>"; "leading newlines")]
#[test_case("<svg><g><rect width=\"1\"/></g></svg><script>a < b</script>"; "foreign and raw text")]
fn serialize_is_a_fixed_point(html: &str) {
    let first = tessera_html5::parse(html, None);
    let serialized = DocumentWriter::write_from_node(&first.adapter, &first.root);

    let second = tessera_html5::parse(&serialized, None);
    assert_eq!(
        dump_tree(&first.adapter, &first.root),
        dump_tree(&second.adapter, &second.root)
    );
    assert_eq!(serialized, DocumentWriter::write_from_node(&second.adapter, &second.root));
}
