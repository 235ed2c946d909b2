//! Foreign content (SVG and MathML) handling: the tree construction dispatcher, the rules for
//! parsing tokens in foreign content and the tag and attribute name adjustments.
use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::errors::ParserError;
use crate::parser::open_elements::StackEntry;
use crate::parser::{Html5Parser, CHAR_REPLACEMENT_STR};
use crate::tokenizer::token::{Attribute, Token};
use crate::tree_adapter::{Namespace, TreeAdapter};

static SVG_ADJUSTMENTS_TAGS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "altglyph" => "altGlyph",
    "altglyphdef" => "altGlyphDef",
    "altglyphitem" => "altGlyphItem",
    "animatecolor" => "animateColor",
    "animatemotion" => "animateMotion",
    "animatetransform" => "animateTransform",
    "clippath" => "clipPath",
    "feblend" => "feBlend",
    "fecolormatrix" => "feColorMatrix",
    "fecomponenttransfer" => "feComponentTransfer",
    "fecomposite" => "feComposite",
    "feconvolvematrix" => "feConvolveMatrix",
    "fediffuselighting" => "feDiffuseLighting",
    "fedisplacementmap" => "feDisplacementMap",
    "fedistantlight" => "feDistantLight",
    "fedropshadow" => "feDropShadow",
    "feflood" => "feFlood",
    "fefunca" => "feFuncA",
    "fefuncb" => "feFuncB",
    "fefuncg" => "feFuncG",
    "fefuncr" => "feFuncR",
    "fegaussianblur" => "feGaussianBlur",
    "feimage" => "feImage",
    "femerge" => "feMerge",
    "femergenode" => "feMergeNode",
    "femorphology" => "feMorphology",
    "feoffset" => "feOffset",
    "fepointlight" => "fePointLight",
    "fespecularlighting" => "feSpecularLighting",
    "fespotlight" => "feSpotLight",
    "fetile" => "feTile",
    "feturbulence" => "feTurbulence",
    "foreignobject" => "foreignObject",
    "glyphref" => "glyphRef",
    "lineargradient" => "linearGradient",
    "radialgradient" => "radialGradient",
    "textpath" => "textPath",
};

static SVG_ADJUSTMENTS_ATTRIBUTES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "attributename" => "attributeName",
    "attributetype" => "attributeType",
    "basefrequency" => "baseFrequency",
    "baseprofile" => "baseProfile",
    "calcmode" => "calcMode",
    "clippathunits" => "clipPathUnits",
    "diffuseconstant" => "diffuseConstant",
    "edgemode" => "edgeMode",
    "filterunits" => "filterUnits",
    "glyphref" => "glyphRef",
    "gradienttransform" => "gradientTransform",
    "gradientunits" => "gradientUnits",
    "kernelmatrix" => "kernelMatrix",
    "kernelunitlength" => "kernelUnitLength",
    "keypoints" => "keyPoints",
    "keysplines" => "keySplines",
    "keytimes" => "keyTimes",
    "lengthadjust" => "lengthAdjust",
    "limitingconeangle" => "limitingConeAngle",
    "markerheight" => "markerHeight",
    "markerunits" => "markerUnits",
    "markerwidth" => "markerWidth",
    "maskcontentunits" => "maskContentUnits",
    "maskunits" => "maskUnits",
    "numoctaves" => "numOctaves",
    "pathlength" => "pathLength",
    "patterncontentunits" => "patternContentUnits",
    "patterntransform" => "patternTransform",
    "patternunits" => "patternUnits",
    "pointsatx" => "pointsAtX",
    "pointsaty" => "pointsAtY",
    "pointsatz" => "pointsAtZ",
    "preservealpha" => "preserveAlpha",
    "preserveaspectratio" => "preserveAspectRatio",
    "primitiveunits" => "primitiveUnits",
    "refx" => "refX",
    "refy" => "refY",
    "repeatcount" => "repeatCount",
    "repeatdur" => "repeatDur",
    "requiredextensions" => "requiredExtensions",
    "requiredfeatures" => "requiredFeatures",
    "specularconstant" => "specularConstant",
    "specularexponent" => "specularExponent",
    "spreadmethod" => "spreadMethod",
    "startoffset" => "startOffset",
    "stddeviation" => "stdDeviation",
    "stitchtiles" => "stitchTiles",
    "surfacescale" => "surfaceScale",
    "systemlanguage" => "systemLanguage",
    "tablevalues" => "tableValues",
    "targetx" => "targetX",
    "targety" => "targetY",
    "textlength" => "textLength",
    "viewbox" => "viewBox",
    "viewtarget" => "viewTarget",
    "xchannelselector" => "xChannelSelector",
    "ychannelselector" => "yChannelSelector",
    "zoomandpan" => "zoomAndPan",
};

lazy_static! {
    /// Attributes that get a namespace on foreign elements: name => (prefix, local name, namespace)
    static ref XML_ADJUSTMENTS: HashMap<&'static str, (Option<&'static str>, &'static str, Namespace)> = {
        let mut map = HashMap::new();
        for local in ["actuate", "arcrole", "href", "role", "show", "title", "type"] {
            map.insert(xlink_name(local), (Some("xlink"), local, Namespace::XLink));
        }
        map.insert("xml:lang", (Some("xml"), "lang", Namespace::Xml));
        map.insert("xml:space", (Some("xml"), "space", Namespace::Xml));
        map.insert("xmlns", (None, "xmlns", Namespace::Xmlns));
        map.insert("xmlns:xlink", (Some("xmlns"), "xlink", Namespace::Xmlns));
        map
    };
}

fn xlink_name(local: &str) -> &'static str {
    match local {
        "actuate" => "xlink:actuate",
        "arcrole" => "xlink:arcrole",
        "href" => "xlink:href",
        "role" => "xlink:role",
        "show" => "xlink:show",
        "title" => "xlink:title",
        _ => "xlink:type",
    }
}

/// HTML start tags that break out of foreign content
const BREAKOUT_TAGS: [&str; 44] = [
    "b", "big", "blockquote", "body", "br", "center", "code", "dd", "div", "dl", "dt", "em", "embed", "h1", "h2",
    "h3", "h4", "h5", "h6", "head", "hr", "i", "img", "li", "listing", "menu", "meta", "nobr", "ol", "p", "pre",
    "ruby", "s", "small", "span", "strong", "strike", "sub", "sup", "table", "tt", "u", "ul", "var",
];

pub(crate) fn adjust_svg_tag_name(token: &mut Token) {
    if let Token::StartTag { name, .. } = token {
        if let Some(adjusted) = SVG_ADJUSTMENTS_TAGS.get(name.as_str()) {
            *name = adjusted.to_string();
        }
    }
}

pub(crate) fn adjust_svg_attributes(token: &mut Token) {
    if let Token::StartTag { attributes, .. } = token {
        for attr in attributes.iter_mut() {
            if let Some(adjusted) = SVG_ADJUSTMENTS_ATTRIBUTES.get(attr.name.as_str()) {
                attr.name = adjusted.to_string();
            }
        }
    }
}

pub(crate) fn adjust_mathml_attributes(token: &mut Token) {
    if let Token::StartTag { attributes, .. } = token {
        for attr in attributes.iter_mut().filter(|attr| attr.name == "definitionurl") {
            attr.name = "definitionURL".to_string();
        }
    }
}

pub(crate) fn adjust_foreign_attributes(token: &mut Token) {
    if let Token::StartTag { attributes, .. } = token {
        for attr in attributes.iter_mut() {
            if let Some((prefix, local, namespace)) = XML_ADJUSTMENTS.get(attr.name.as_str()) {
                attr.prefix = *prefix;
                attr.name = local.to_string();
                attr.namespace = Some(*namespace);
            }
        }
    }
}

/// Returns true when a MathML annotation-xml element with these attributes is an HTML
/// integration point
pub(crate) fn is_html_annotation_xml(attributes: &[Attribute]) -> bool {
    attributes.iter().any(|attr| {
        attr.name == "encoding"
            && (attr.value.eq_ignore_ascii_case("text/html") || attr.value.eq_ignore_ascii_case("application/xhtml+xml"))
    })
}

fn is_breakout_token(token: &Token) -> bool {
    match token {
        Token::StartTag { name, attributes, .. } => {
            BREAKOUT_TAGS.contains(&name.as_str())
                || (name == "font"
                    && attributes
                        .iter()
                        .any(|attr| matches!(attr.name.as_str(), "color" | "face" | "size")))
        }
        Token::EndTag { name, .. } => name == "br" || name == "p",
        _ => false,
    }
}

impl<A: TreeAdapter> Html5Parser<A> {
    /// Returns the adjusted current node: the context element when parsing a fragment and only
    /// the html element is on the stack, the current node otherwise
    pub(crate) fn adjusted_current_node(&self) -> Option<&StackEntry<A::Handle>> {
        match &self.context {
            Some(context) if self.open_elements.len() == 1 => Some(context),
            _ => self.open_elements.current(),
        }
    }

    /// The tree construction dispatcher (13.2.6). Returns true when the token must be processed
    /// with the rules for foreign content.
    pub(crate) fn should_process_in_foreign_content(&self, token: &Token) -> bool {
        let Some(node) = self.adjusted_current_node() else {
            return false;
        };

        if node.namespace == Namespace::Html || token.is_eof() {
            return false;
        }

        let is_start_tag = matches!(token, Token::StartTag { .. });

        if node.is_mathml_text_integration_point() {
            if token.is_character() {
                return false;
            }
            if let Token::StartTag { name, .. } = token {
                if name != "mglyph" && name != "malignmark" {
                    return false;
                }
            }
        }

        if node.namespace == Namespace::MathMl && node.name == "annotation-xml" && token.is_start_tag("svg") {
            return false;
        }

        if node.html_integration_point && (is_start_tag || token.is_character()) {
            return false;
        }

        true
    }

    /// 13.2.6.5 The rules for parsing tokens in foreign content
    pub(crate) fn process_foreign_content(&mut self, token: &Token) {
        match token {
            Token::NullCharacter { text, location } => {
                self.parse_error(ParserError::UnexpectedNullCharacter);
                let replaced = CHAR_REPLACEMENT_STR.repeat(text.chars().count());
                self.insert_text(&replaced, *location);
            }
            Token::Whitespace { .. } => self.insert_character_token(token),
            Token::Text { .. } => {
                self.insert_character_token(token);
                self.frameset_ok = false;
            }
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            _ if is_breakout_token(token) => {
                self.parse_error(ParserError::UnexpectedStartTag);

                while let Some(current) = self.open_elements.current() {
                    if current.namespace == Namespace::Html
                        || current.is_mathml_text_integration_point()
                        || current.html_integration_point
                    {
                        break;
                    }
                    self.open_elements.pop();
                }

                self.reprocess_token = true;
            }
            Token::StartTag { is_self_closing, .. } => {
                let Some(namespace) = self.adjusted_current_node().map(|node| node.namespace) else {
                    return;
                };

                let mut adjusted = token.clone();
                match namespace {
                    Namespace::MathMl => adjust_mathml_attributes(&mut adjusted),
                    Namespace::Svg => {
                        adjust_svg_tag_name(&mut adjusted);
                        adjust_svg_attributes(&mut adjusted);
                    }
                    _ => {}
                }
                adjust_foreign_attributes(&mut adjusted);

                let handle = self.insert_foreign_element(&adjusted, namespace);

                if *is_self_closing {
                    self.ack_self_closing = true;
                    self.open_elements.pop();
                    if token.is_start_tag("script") && namespace == Namespace::Svg {
                        self.handle_script_end(handle);
                    }
                }
            }
            Token::EndTag { name, .. }
                if name == "script" && self.open_elements.current().is_some_and(|node| {
                    node.namespace == Namespace::Svg && node.name == "script"
                }) =>
            {
                if let Some(entry) = self.open_elements.pop() {
                    self.close_element_location(&entry.handle, token);
                    self.handle_script_end(entry.handle);
                }
            }
            Token::EndTag { name, .. } => {
                let Some(mut idx) = self.open_elements.len().checked_sub(1) else {
                    return;
                };

                if self
                    .open_elements
                    .get(idx)
                    .is_some_and(|node| !node.name.eq_ignore_ascii_case(name))
                {
                    self.parse_error(ParserError::UnexpectedEndTag);
                }

                loop {
                    if idx == 0 {
                        return;
                    }

                    let Some(node) = self.open_elements.get(idx).cloned() else {
                        return;
                    };

                    if node.name.eq_ignore_ascii_case(name) {
                        if let Some(entry) = self.open_elements.pop_until_element_popped(&node.handle) {
                            self.close_element_location(&entry.handle, token);
                        }
                        return;
                    }

                    idx -= 1;
                    if self
                        .open_elements
                        .get(idx)
                        .is_some_and(|node| node.namespace == Namespace::Html)
                    {
                        self.process_html_content(token);
                        return;
                    }
                }
            }
            Token::Eof { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_shared::byte_stream::Span;

    use super::*;

    fn start_tag(name: &str, attributes: &[(&str, &str)]) -> Token {
        Token::StartTag {
            name: name.to_string(),
            is_self_closing: false,
            attributes: attributes.iter().map(|(n, v)| Attribute::new(n, v)).collect(),
            location: Span::default(),
        }
    }

    #[test]
    fn svg_adjustments() {
        let mut token = start_tag("foreignobject", &[("viewbox", "0 0 1 1"), ("class", "x")]);
        adjust_svg_tag_name(&mut token);
        adjust_svg_attributes(&mut token);

        assert_eq!(token.tag_name(), Some("foreignObject"));
        assert_eq!(token.attribute("viewBox"), Some("0 0 1 1"));
        assert_eq!(token.attribute("class"), Some("x"));
    }

    #[test]
    fn mathml_adjustments() {
        let mut token = start_tag("math", &[("definitionurl", "u")]);
        adjust_mathml_attributes(&mut token);
        assert_eq!(token.attribute("definitionURL"), Some("u"));
    }

    #[test]
    fn foreign_attribute_adjustments() {
        let mut token = start_tag(
            "svg",
            &[("xlink:href", "#a"), ("xml:lang", "en"), ("xmlns", "x"), ("xmlns:xlink", "y"), ("xlink:bogus", "z")],
        );
        adjust_foreign_attributes(&mut token);

        let Token::StartTag { attributes, .. } = token else {
            panic!("not a start tag");
        };
        assert_eq!(attributes[0].qualified_name(), "xlink:href");
        assert_eq!(attributes[0].namespace, Some(Namespace::XLink));
        assert_eq!(attributes[1].qualified_name(), "xml:lang");
        assert_eq!(attributes[1].namespace, Some(Namespace::Xml));
        assert_eq!(attributes[2].qualified_name(), "xmlns");
        assert_eq!(attributes[2].namespace, Some(Namespace::Xmlns));
        assert_eq!(attributes[3].qualified_name(), "xmlns:xlink");
        assert_eq!(attributes[4].namespace, None);
    }

    #[test]
    fn breakout_tokens() {
        assert!(is_breakout_token(&start_tag("div", &[])));
        assert!(is_breakout_token(&start_tag("font", &[("color", "red")])));
        assert!(!is_breakout_token(&start_tag("font", &[("id", "x")])));
        assert!(!is_breakout_token(&start_tag("circle", &[])));
    }

    #[test]
    fn annotation_xml_integration_point() {
        assert!(is_html_annotation_xml(&[Attribute::new("encoding", "TEXT/HTML")]));
        assert!(!is_html_annotation_xml(&[Attribute::new("encoding", "text/plain")]));
    }
}
