//! Parse errors and the logger that collects them
use std::collections::HashSet;
use std::fmt;

use tessera_shared::byte_stream::Location;
use tessera_shared::types::ParseError;

/// Callback that receives every recoverable parse error as soon as it is detected
pub type ParseErrorCallback = Box<dyn FnMut(&ParseError)>;

/// Possible parser errors. The string representation matches the error codes from the WHATWG HTML
/// standard, with tree construction errors named after the condition that caused them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParserError {
    // Tokenizer errors
    AbruptClosingOfEmptyComment,
    AbruptDoctypePublicIdentifier,
    AbruptDoctypeSystemIdentifier,
    AbsenceOfDigitsInNumericCharacterReference,
    CdataInHtmlContent,
    CharacterReferenceOutsideUnicodeRange,
    ControlCharacterInInputStream,
    ControlCharacterReference,
    DuplicateAttribute,
    EndTagWithAttributes,
    EndTagWithTrailingSolidus,
    EofBeforeTagName,
    EofInCdata,
    EofInComment,
    EofInDoctype,
    EofInScriptHtmlCommentLikeText,
    EofInTag,
    IncorrectlyClosedComment,
    IncorrectlyOpenedComment,
    InvalidCharacterSequenceAfterDoctypeName,
    InvalidFirstCharacterOfTagName,
    MissingAttributeValue,
    MissingDoctypeName,
    MissingDoctypePublicIdentifier,
    MissingDoctypeSystemIdentifier,
    MissingEndTagName,
    MissingQuoteBeforeDoctypePublicIdentifier,
    MissingQuoteBeforeDoctypeSystemIdentifier,
    MissingSemicolonAfterCharacterReference,
    MissingWhitespaceAfterDoctypePublicKeyword,
    MissingWhitespaceAfterDoctypeSystemKeyword,
    MissingWhitespaceBeforeDoctypeName,
    MissingWhitespaceBetweenAttributes,
    MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
    NestedComment,
    NoncharacterCharacterReference,
    NoncharacterInInputStream,
    NonVoidHtmlElementStartTagWithTrailingSolidus,
    NullCharacterReference,
    SurrogateCharacterReference,
    SurrogateInInputStream,
    UnexpectedCharacterAfterDoctypeSystemIdentifier,
    UnexpectedCharacterInAttributeName,
    UnexpectedCharacterInUnquotedAttributeValue,
    UnexpectedEqualsSignBeforeAttributeName,
    UnexpectedNullCharacter,
    UnexpectedQuestionMarkInsteadOfTagName,
    UnexpectedSolidusInTag,
    UnknownNamedCharacterReference,

    // Tree construction errors
    AbandonedHeadElementChild,
    ClosingOfElementWithOpenChildElements,
    DisallowedContentInNoscriptInHead,
    EndTagWithoutMatchingOpenElement,
    EofInElementThatCanContainOnlyText,
    MisplacedDoctype,
    MisplacedStartTagForHeadElement,
    MissingDoctype,
    NestedNoscriptInHead,
    NonConformingDoctype,
    OpenElementsLeftAfterEof,
    UnexpectedCharacter,
    UnexpectedEndTag,
    UnexpectedStartTag,
    UnexpectedToken,
}

impl ParserError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserError::AbruptClosingOfEmptyComment => "abrupt-closing-of-empty-comment",
            ParserError::AbruptDoctypePublicIdentifier => "abrupt-doctype-public-identifier",
            ParserError::AbruptDoctypeSystemIdentifier => "abrupt-doctype-system-identifier",
            ParserError::AbsenceOfDigitsInNumericCharacterReference => {
                "absence-of-digits-in-numeric-character-reference"
            }
            ParserError::CdataInHtmlContent => "cdata-in-html-content",
            ParserError::CharacterReferenceOutsideUnicodeRange => "character-reference-outside-unicode-range",
            ParserError::ControlCharacterInInputStream => "control-character-in-input-stream",
            ParserError::ControlCharacterReference => "control-character-reference",
            ParserError::DuplicateAttribute => "duplicate-attribute",
            ParserError::EndTagWithAttributes => "end-tag-with-attributes",
            ParserError::EndTagWithTrailingSolidus => "end-tag-with-trailing-solidus",
            ParserError::EofBeforeTagName => "eof-before-tag-name",
            ParserError::EofInCdata => "eof-in-cdata",
            ParserError::EofInComment => "eof-in-comment",
            ParserError::EofInDoctype => "eof-in-doctype",
            ParserError::EofInScriptHtmlCommentLikeText => "eof-in-script-html-comment-like-text",
            ParserError::EofInTag => "eof-in-tag",
            ParserError::IncorrectlyClosedComment => "incorrectly-closed-comment",
            ParserError::IncorrectlyOpenedComment => "incorrectly-opened-comment",
            ParserError::InvalidCharacterSequenceAfterDoctypeName => {
                "invalid-character-sequence-after-doctype-name"
            }
            ParserError::InvalidFirstCharacterOfTagName => "invalid-first-character-of-tag-name",
            ParserError::MissingAttributeValue => "missing-attribute-value",
            ParserError::MissingDoctypeName => "missing-doctype-name",
            ParserError::MissingDoctypePublicIdentifier => "missing-doctype-public-identifier",
            ParserError::MissingDoctypeSystemIdentifier => "missing-doctype-system-identifier",
            ParserError::MissingEndTagName => "missing-end-tag-name",
            ParserError::MissingQuoteBeforeDoctypePublicIdentifier => {
                "missing-quote-before-doctype-public-identifier"
            }
            ParserError::MissingQuoteBeforeDoctypeSystemIdentifier => {
                "missing-quote-before-doctype-system-identifier"
            }
            ParserError::MissingSemicolonAfterCharacterReference => "missing-semicolon-after-character-reference",
            ParserError::MissingWhitespaceAfterDoctypePublicKeyword => {
                "missing-whitespace-after-doctype-public-keyword"
            }
            ParserError::MissingWhitespaceAfterDoctypeSystemKeyword => {
                "missing-whitespace-after-doctype-system-keyword"
            }
            ParserError::MissingWhitespaceBeforeDoctypeName => "missing-whitespace-before-doctype-name",
            ParserError::MissingWhitespaceBetweenAttributes => "missing-whitespace-between-attributes",
            ParserError::MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers => {
                "missing-whitespace-between-doctype-public-and-system-identifiers"
            }
            ParserError::NestedComment => "nested-comment",
            ParserError::NoncharacterCharacterReference => "noncharacter-character-reference",
            ParserError::NoncharacterInInputStream => "noncharacter-in-input-stream",
            ParserError::NonVoidHtmlElementStartTagWithTrailingSolidus => {
                "non-void-html-element-start-tag-with-trailing-solidus"
            }
            ParserError::NullCharacterReference => "null-character-reference",
            ParserError::SurrogateCharacterReference => "surrogate-character-reference",
            ParserError::SurrogateInInputStream => "surrogate-in-input-stream",
            ParserError::UnexpectedCharacterAfterDoctypeSystemIdentifier => {
                "unexpected-character-after-doctype-system-identifier"
            }
            ParserError::UnexpectedCharacterInAttributeName => "unexpected-character-in-attribute-name",
            ParserError::UnexpectedCharacterInUnquotedAttributeValue => {
                "unexpected-character-in-unquoted-attribute-value"
            }
            ParserError::UnexpectedEqualsSignBeforeAttributeName => "unexpected-equals-sign-before-attribute-name",
            ParserError::UnexpectedNullCharacter => "unexpected-null-character",
            ParserError::UnexpectedQuestionMarkInsteadOfTagName => "unexpected-question-mark-instead-of-tag-name",
            ParserError::UnexpectedSolidusInTag => "unexpected-solidus-in-tag",
            ParserError::UnknownNamedCharacterReference => "unknown-named-character-reference",

            ParserError::AbandonedHeadElementChild => "abandoned-head-element-child",
            ParserError::ClosingOfElementWithOpenChildElements => "closing-of-element-with-open-child-elements",
            ParserError::DisallowedContentInNoscriptInHead => "disallowed-content-in-noscript-in-head",
            ParserError::EndTagWithoutMatchingOpenElement => "end-tag-without-matching-open-element",
            ParserError::EofInElementThatCanContainOnlyText => "eof-in-element-that-can-contain-only-text",
            ParserError::MisplacedDoctype => "misplaced-doctype",
            ParserError::MisplacedStartTagForHeadElement => "misplaced-start-tag-for-head-element",
            ParserError::MissingDoctype => "missing-doctype",
            ParserError::NestedNoscriptInHead => "nested-noscript-in-head",
            ParserError::NonConformingDoctype => "non-conforming-doctype",
            ParserError::OpenElementsLeftAfterEof => "open-elements-left-after-eof",
            ParserError::UnexpectedCharacter => "unexpected-character",
            ParserError::UnexpectedEndTag => "unexpected-end-tag",
            ParserError::UnexpectedStartTag => "unexpected-start-tag",
            ParserError::UnexpectedToken => "unexpected-token",
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collects the parse errors of a single parse. The logger is shared between the tokenizer and
/// the tree builder so both report into the same ordered list.
#[derive(Default)]
pub struct ErrorLogger {
    /// List of errors that occurred during parsing
    errors: Vec<ParseError>,
    /// Optional callback that gets every new error
    callback: Option<ParseErrorCallback>,
    /// Positions and codes already reported by the tokenizer
    tokenizer_reports: HashSet<(Location, String)>,
}

impl ErrorLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ParseErrorCallback) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    /// Returns a cloned instance of the errors
    pub fn get_errors(&self) -> Vec<ParseError> {
        self.errors.clone()
    }

    /// Takes the collected errors out of the logger
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Adds an error reported by the tokenizer. The tokenizer can see the same character twice
    /// when it steps back or resumes at a chunk boundary, so a repeated code on the same
    /// position is only recorded once.
    pub fn add_tokenizer_error(&mut self, location: Location, end_location: Location, message: &str) {
        if !self.tokenizer_reports.insert((location, message.to_string())) {
            return;
        }

        self.add_error(location, end_location, message);
    }

    /// Adds a new error to the error logger. Every call is recorded and passed to the callback.
    pub fn add_error(&mut self, location: Location, end_location: Location, message: &str) {
        let error = ParseError {
            message: message.to_string(),
            location,
            end_location,
        };

        #[cfg(feature = "debug_parser")]
        log::trace!("parse error {error}");

        if let Some(callback) = self.callback.as_mut() {
            callback(&error);
        }
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn loc(line: usize, column: usize) -> Location {
        Location::new(line, column, column - 1)
    }

    #[test]
    fn repeated_tokenizer_errors_are_suppressed() {
        let mut logger = ErrorLogger::new();
        for _ in 0..5 {
            logger.add_tokenizer_error(loc(1, 1), loc(1, 1), "test");
        }
        assert_eq!(logger.get_errors().len(), 1);
    }

    #[test]
    fn different_positions_are_kept() {
        let mut logger = ErrorLogger::new();
        for col in 1..=5 {
            logger.add_tokenizer_error(loc(1, col), loc(1, col), "test");
            logger.add_tokenizer_error(loc(1, col), loc(1, col), "test");
        }
        logger.add_tokenizer_error(loc(1, 5), loc(1, 5), "other");
        assert_eq!(logger.get_errors().len(), 6);
    }

    #[test]
    fn tree_builder_errors_are_all_kept() {
        let seen = Rc::new(RefCell::new(0));
        let sink = seen.clone();
        let mut logger = ErrorLogger::with_callback(Box::new(move |_: &ParseError| {
            *sink.borrow_mut() += 1;
        }));

        let code = ParserError::UnexpectedEndTag.as_str();
        logger.add_error(loc(1, 4), loc(1, 10), code);
        logger.add_error(loc(1, 4), loc(1, 10), code);
        logger.add_tokenizer_error(loc(1, 4), loc(1, 10), code);

        assert_eq!(*seen.borrow(), 3);
        assert_eq!(logger.get_errors().len(), 3);
    }

    #[test]
    fn callback_receives_errors() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut logger = ErrorLogger::with_callback(Box::new(move |err: &ParseError| {
            sink.borrow_mut().push(err.message.clone());
        }));

        logger.add_tokenizer_error(loc(1, 3), loc(1, 4), ParserError::EofInTag.as_str());
        logger.add_tokenizer_error(loc(1, 3), loc(1, 4), ParserError::EofInTag.as_str());

        assert_eq!(*seen.borrow(), vec!["eof-in-tag".to_string()]);
        assert_eq!(logger.take_errors().len(), 1);
        assert!(logger.get_errors().is_empty());
    }

    #[test]
    fn error_codes() {
        assert_eq!(ParserError::MissingDoctype.to_string(), "missing-doctype");
        assert_eq!(
            ParserError::UnexpectedCharacterInUnquotedAttributeValue.as_str(),
            "unexpected-character-in-unquoted-attribute-value"
        );
    }
}
