use tessera_html5::parser::Html5ParserOptions;
use tessera_html5::tree_adapter::TreeAdapter;

fn with_locations() -> Option<Html5ParserOptions> {
    Some(Html5ParserOptions::default().with_source_locations(true))
}

#[test]
fn element_has_start_and_end_tag_locations() {
    let parsed = tessera_html5::parse("<div>ab</div>", with_locations());
    let div = parsed.adapter.find_element("div").unwrap();

    let location = parsed.adapter.get_node_source_location(&div).unwrap();
    let start_tag = location.start_tag.unwrap();
    let end_tag = location.end_tag.unwrap();

    assert_eq!((start_tag.start.offset, start_tag.end.offset), (0, 5));
    assert_eq!((end_tag.start.offset, end_tag.end.offset), (7, 13));
    assert_eq!((location.span.start.offset, location.span.end.offset), (0, 13));
    assert_eq!((start_tag.start.line, start_tag.start.column), (1, 1));
}

#[test]
fn unclosed_element_ends_at_start_tag() {
    let parsed = tessera_html5::parse("<div>\n<span>x", with_locations());
    let span = parsed.adapter.find_element("span").unwrap();

    let location = parsed.adapter.get_node_source_location(&span).unwrap();
    assert!(location.end_tag.is_none());
    assert_eq!(location.span.start.line, 2);
    assert_eq!(location.span.start.column, 1);
    assert_eq!(location.span.end.offset, 12);
}

#[test]
fn implied_elements_have_no_location() {
    let parsed = tessera_html5::parse("<p>x", with_locations());

    for name in ["html", "head", "body"] {
        let element = parsed.adapter.find_element(name).unwrap();
        assert!(parsed.adapter.get_node_source_location(&element).is_none(), "{name}");
    }
    let p = parsed.adapter.find_element("p").unwrap();
    assert!(parsed.adapter.get_node_source_location(&p).is_some());
}

#[test]
fn locations_are_off_by_default() {
    let parsed = tessera_html5::parse("<div>ab</div>", None);
    let div = parsed.adapter.find_element("div").unwrap();

    assert!(parsed.adapter.get_node_source_location(&div).is_none());
}

#[test]
fn errors_carry_their_position() {
    let parsed = tessera_html5::parse("<!DOCTYPE html>\n<p>x</div>", None);

    assert_eq!(parsed.errors.len(), 1);
    let error = &parsed.errors[0];
    assert_eq!(error.message, "end-tag-without-matching-open-element");
    assert_eq!((error.location.line, error.location.column), (2, 5));
}
