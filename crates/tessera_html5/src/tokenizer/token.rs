use tessera_shared::byte_stream::Span;

use crate::tree_adapter::Namespace;

/// A single attribute of a tag. Namespace and prefix are only set on attributes of foreign
/// elements after they have been adjusted by the tree builder (eg: `xlink:href`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub prefix: Option<&'static str>,
    pub namespace: Option<Namespace>,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            prefix: None,
            namespace: None,
        }
    }

    /// Returns the qualified name as it would appear in markup
    pub fn qualified_name(&self) -> String {
        match self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The different token structures that can be emitted by the tokenizer
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    DocType {
        name: Option<String>,
        force_quirks: bool,
        pub_identifier: Option<String>,
        sys_identifier: Option<String>,
        location: Span,
    },
    StartTag {
        name: String,
        is_self_closing: bool,
        attributes: Vec<Attribute>,
        location: Span,
    },
    EndTag {
        name: String,
        is_self_closing: bool,
        location: Span,
    },
    Comment {
        comment: String,
        location: Span,
    },
    /// A run of characters that are neither whitespace nor NUL
    Text {
        text: String,
        location: Span,
    },
    /// A run of U+0000 characters found in the data state
    NullCharacter {
        text: String,
        location: Span,
    },
    /// A run of HTML whitespace (tab, LF, FF, CR and space)
    Whitespace {
        text: String,
        location: Span,
    },
    Eof {
        location: Span,
    },
}

impl Token {
    pub fn location(&self) -> Span {
        match self {
            Token::DocType { location, .. }
            | Token::StartTag { location, .. }
            | Token::EndTag { location, .. }
            | Token::Comment { location, .. }
            | Token::Text { location, .. }
            | Token::NullCharacter { location, .. }
            | Token::Whitespace { location, .. }
            | Token::Eof { location } => *location,
        }
    }

    /// Returns true when the token is an EOF token
    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Eof { .. })
    }

    /// Returns true for any of the character token variants
    pub fn is_character(&self) -> bool {
        matches!(
            self,
            Token::Text { .. } | Token::NullCharacter { .. } | Token::Whitespace { .. }
        )
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace { .. })
    }

    /// Returns the characters of a character token
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Text { text, .. } | Token::NullCharacter { text, .. } | Token::Whitespace { text, .. } => {
                Some(text)
            }
            _ => None,
        }
    }

    pub(crate) fn is_start_tag(&self, wanted_name: &str) -> bool {
        matches!(self, Token::StartTag { name, .. } if name == wanted_name)
    }

    pub(crate) fn is_end_tag(&self, wanted_name: &str) -> bool {
        matches!(self, Token::EndTag { name, .. } if name == wanted_name)
    }

    /// Returns the tag name of a start or end tag
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Token::StartTag { name, .. } | Token::EndTag { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the value of the given attribute of a start tag
    pub fn attribute(&self, wanted: &str) -> Option<&str> {
        match self {
            Token::StartTag { attributes, .. } => attributes
                .iter()
                .find(|attr| attr.name == wanted)
                .map(|attr| attr.value.as_str()),
            _ => None,
        }
    }
}

// Each token can be displayed as a string
impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::DocType {
                name,
                pub_identifier,
                sys_identifier,
                ..
            } => {
                write!(f, "<!DOCTYPE {}", name.as_deref().unwrap_or_default())?;
                if let Some(pub_id) = pub_identifier {
                    write!(f, r#" PUBLIC "{pub_id}""#)?;
                }
                if let Some(sys_id) = sys_identifier {
                    write!(f, r#" SYSTEM "{sys_id}""#)?;
                }
                write!(f, ">")
            }
            Token::Comment { comment, .. } => write!(f, "<!--{comment}-->"),
            Token::Text { text, .. } | Token::NullCharacter { text, .. } | Token::Whitespace { text, .. } => {
                write!(f, "{text}")
            }
            Token::StartTag {
                name,
                is_self_closing,
                attributes,
                ..
            } => {
                write!(f, "<{name}")?;
                for attr in attributes {
                    write!(f, r#" {}="{}""#, attr.qualified_name(), attr.value)?;
                }
                if *is_self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Token::EndTag { name, .. } => write!(f, "</{name}>"),
            Token::Eof { .. } => write!(f, "EOF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_display_doctype() {
        let token = Token::DocType {
            name: Some("html".to_string()),
            force_quirks: false,
            pub_identifier: None,
            sys_identifier: Some("about:legacy-compat".to_string()),
            location: Span::default(),
        };
        assert_eq!(format!("{token}"), r#"<!DOCTYPE html SYSTEM "about:legacy-compat">"#);
    }

    #[test]
    fn test_token_display_start_tag() {
        let mut href = Attribute::new("href", "#x");
        href.prefix = Some("xlink");
        let token = Token::StartTag {
            name: "a".to_string(),
            is_self_closing: true,
            attributes: vec![Attribute::new("id", "1"), href],
            location: Span::default(),
        };
        assert_eq!(format!("{token}"), r##"<a id="1" xlink:href="#x" />"##);
        assert_eq!(token.attribute("id"), Some("1"));
        assert_eq!(token.attribute("href"), Some("#x"));
        assert!(token.is_start_tag("a"));
        assert!(!token.is_end_tag("a"));
    }

    #[test]
    fn test_character_tokens() {
        let token = Token::Whitespace {
            text: " \n".to_string(),
            location: Span::default(),
        };
        assert!(token.is_character());
        assert!(token.is_whitespace());
        assert_eq!(token.text(), Some(" \n"));
        assert_eq!(format!("{}", Token::Eof { location: Span::default() }), "EOF");
    }
}
