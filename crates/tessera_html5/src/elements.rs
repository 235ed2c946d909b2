//! Element categories used by the tree builder

use crate::tree_adapter::Namespace;

pub static FORMATTING_HTML_ELEMENTS: [&str; 14] = [
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt", "u",
];

pub static SPECIAL_HTML_ELEMENTS: [&str; 83] = [
    "address",
    "applet",
    "area",
    "article",
    "aside",
    "base",
    "basefont",
    "bgsound",
    "blockquote",
    "body",
    "br",
    "button",
    "caption",
    "center",
    "col",
    "colgroup",
    "dd",
    "details",
    "dir",
    "div",
    "dl",
    "dt",
    "embed",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "frame",
    "frameset",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "head",
    "header",
    "hgroup",
    "hr",
    "html",
    "iframe",
    "img",
    "input",
    "keygen",
    "li",
    "link",
    "listing",
    "main",
    "marquee",
    "menu",
    "meta",
    "nav",
    "noembed",
    "noframes",
    "noscript",
    "object",
    "ol",
    "p",
    "param",
    "plaintext",
    "pre",
    "script",
    "search",
    "section",
    "select",
    "source",
    "style",
    "summary",
    "table",
    "tbody",
    "td",
    "template",
    "textarea",
    "tfoot",
    "th",
    "thead",
    "title",
    "tr",
    "track",
    "ul",
    "wbr",
    "xmp",
];

pub static SPECIAL_MATHML_ELEMENTS: [&str; 6] = ["mi", "mo", "mn", "ms", "mtext", "annotation-xml"];

pub static SPECIAL_SVG_ELEMENTS: [&str; 3] = ["foreignObject", "desc", "title"];

/// Elements that never have an end tag
pub static VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
    "keygen",
];

/// Returns true when the element belongs to the "special" category
pub fn is_special(name: &str, namespace: Namespace) -> bool {
    match namespace {
        Namespace::Html => SPECIAL_HTML_ELEMENTS.contains(&name),
        Namespace::MathMl => SPECIAL_MATHML_ELEMENTS.contains(&name),
        Namespace::Svg => SPECIAL_SVG_ELEMENTS.contains(&name),
        _ => false,
    }
}

pub fn is_formatting(name: &str, namespace: Namespace) -> bool {
    namespace == Namespace::Html && FORMATTING_HTML_ELEMENTS.contains(&name)
}

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_elements() {
        for element in SPECIAL_HTML_ELEMENTS.iter() {
            assert!(is_special(element, Namespace::Html));
        }
        for element in SPECIAL_MATHML_ELEMENTS.iter() {
            assert!(is_special(element, Namespace::MathMl));
        }
        for element in SPECIAL_SVG_ELEMENTS.iter() {
            assert!(is_special(element, Namespace::Svg));
        }

        assert!(!is_special("span", Namespace::Html));
        assert!(!is_special("title", Namespace::MathMl));
        assert!(!is_special("div", Namespace::Svg));
    }

    #[test]
    fn formatting_elements() {
        for element in FORMATTING_HTML_ELEMENTS.iter() {
            assert!(is_formatting(element, Namespace::Html));
            assert!(!is_formatting(element, Namespace::Svg));
        }
        assert!(!is_formatting("div", Namespace::Html));
    }
}
