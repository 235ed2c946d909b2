pub mod state;
pub mod token;

mod character_reference;
mod replacement_tables;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tessera_shared::byte_stream::Character::{self, Ch, StreamEmpty, StreamEnd};
use tessera_shared::byte_stream::{ByteStream, Location, Lookahead, Span, Stream};

use crate::errors::{ErrorLogger, ParserError};
use crate::tokenizer::state::State;
use crate::tokenizer::token::{Attribute, Token};

/// Constants that are not directly captured as visible chars
pub const CHAR_NUL: char = '\u{0000}';
pub const CHAR_TAB: char = '\u{0009}';
pub const CHAR_LF: char = '\u{000A}';
pub const CHAR_CR: char = '\u{000D}';
pub const CHAR_FF: char = '\u{000C}';
pub const CHAR_SPACE: char = '\u{0020}';
pub const CHAR_REPLACEMENT: char = '\u{FFFD}';

/// Streaming state of the tokenizer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    /// Tokens are produced as long as there is input
    Active,
    /// Suspended by the tree builder (pending script). No tokens are produced until resumed.
    Paused,
    /// Ran out of buffered input and waits for the next chunk
    Hibernating,
}

/// Class of the characters in the current text run. Runs are split whenever the class changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextKind {
    Regular,
    Null,
    Whitespace,
}

/// Options that can be passed to the tokenizer. Mostly needed when parsing fragments and when
/// dealing with tests.
pub struct Options {
    /// Sets the initial state of the tokenizer
    pub initial_state: State,
    /// Sets the last starting tag in the tokenizer
    pub last_start_tag: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            initial_state: State::Data,
            last_start_tag: String::new(),
        }
    }
}

/// The tokenizer will read the input stream and emit tokens that can be used by the parser.
///
/// Tokens are pulled one at a time with [`Tokenizer::next_token`]. When the buffered input runs
/// out before the stream is closed, the tokenizer hibernates: `next_token` returns `None` and
/// tokenization continues exactly where it stopped once more input is written.
pub struct Tokenizer {
    /// HTML character input stream
    pub stream: ByteStream,
    /// Current state of the tokenizer
    pub state: State,
    /// State to return to after a character reference has been consumed
    return_state: State,
    /// Current text run that has not been emitted yet
    consumed: String,
    consumed_kind: TextKind,
    consumed_span: Span,
    /// Token that is currently in the making (if any)
    current_token: Option<Token>,
    /// Location of the '<' that started the current token
    token_start: Location,
    /// Current attribute name that we need to store temporary in case we are parsing attributes
    current_attr_name: String,
    /// Current attribute value that we need to store temporary in case we are parsing attributes
    current_attr_value: String,
    /// True when an attribute has been started and not stored yet
    has_current_attr: bool,
    /// True when the current attribute turned out to be a duplicate and must be dropped
    current_attr_duplicate: bool,
    /// Attributes of the current tag, in source order
    current_attrs: Vec<Attribute>,
    /// Temporary buffer
    temporary_buffer: String,
    /// Code point of the numeric character reference being decoded
    char_ref_code: u32,
    /// Location of the '&' that started the current character reference
    char_ref_start: Location,
    /// Queue of emitted tokens. Needed because we can generate multiple tokens during iteration
    token_queue: VecDeque<Token>,
    /// The last emitted start token (or empty if none)
    last_start_token: String,
    /// Set by the tree builder when the adjusted current node is not an HTML element. Allows
    /// CDATA sections.
    pub in_foreign_node: bool,
    activity: Activity,
    /// Input positions below this index have been checked for preprocessing errors
    checked_until: usize,
    /// Location of the character read last
    char_location: Location,
    /// Error logger to log errors to
    error_logger: Rc<RefCell<ErrorLogger>>,
}

impl Tokenizer {
    /// Creates a new tokenizer with the given input stream and additional options if any
    pub fn new(stream: ByteStream, opts: Option<Options>, error_logger: Rc<RefCell<ErrorLogger>>) -> Self {
        let opts = opts.unwrap_or_default();
        let location = stream.location();

        Self {
            stream,
            state: opts.initial_state,
            return_state: State::Data,
            consumed: String::new(),
            consumed_kind: TextKind::Regular,
            consumed_span: Span::at(location),
            current_token: None,
            token_start: location,
            current_attr_name: String::new(),
            current_attr_value: String::new(),
            has_current_attr: false,
            current_attr_duplicate: false,
            current_attrs: Vec::new(),
            temporary_buffer: String::new(),
            char_ref_code: 0,
            char_ref_start: location,
            token_queue: VecDeque::new(),
            last_start_token: opts.last_start_tag,
            in_foreign_node: false,
            activity: Activity::Active,
            checked_until: 0,
            char_location: location,
            error_logger,
        }
    }

    /// Returns the current location in the stream
    pub fn location(&self) -> Location {
        self.stream.location()
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Sets the tokenizer state to a new state. Used by the tree builder when entering elements
    /// with a special content model.
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// Sets the name of the last emitted start tag. Needed when parsing fragments in a RCDATA,
    /// RAWTEXT or script data context.
    pub fn set_last_start_tag(&mut self, name: &str) {
        self.last_start_token = name.to_string();
    }

    /// Appends a chunk of input
    pub fn write(&mut self, chunk: &str) {
        self.stream.append_str(chunk);
        if self.activity == Activity::Hibernating {
            self.activity = Activity::Active;
        }
    }

    /// Marks the end of the input
    pub fn end(&mut self) {
        self.stream.close();
        if self.activity == Activity::Hibernating {
            self.activity = Activity::Active;
        }
    }

    /// Inserts markup at the current position, so it is the next thing to be tokenized
    pub fn insert_at_current(&mut self, markup: &str) {
        self.stream.insert_at_current(markup);
    }

    /// Suspends tokenization until `resume` is called
    pub fn pause(&mut self) {
        self.activity = Activity::Paused;
    }

    pub fn resume(&mut self) {
        self.activity = Activity::Active;
    }

    /// Retrieves the next token from the input stream. Returns `None` when the tokenizer is paused
    /// or needs more input before it can produce the next token.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.activity == Activity::Paused {
            return None;
        }

        loop {
            if let Some(token) = self.token_queue.pop_front() {
                return Some(token);
            }

            if !self.step() {
                self.activity = Activity::Hibernating;
                return None;
            }
            self.activity = Activity::Active;
        }
    }

    /// Runs a single step of the state machine. Returns false when the step cannot be taken
    /// because more input is needed.
    fn step(&mut self) -> bool {
        if self.state != State::NumericCharacterReferenceEnd && self.stream.read() == StreamEmpty {
            return false;
        }

        match self.state {
            State::Data => {
                let c = self.read_char();
                match c {
                    Ch('&') => {
                        self.char_ref_start = self.char_location;
                        self.return_state = State::Data;
                        self.state = State::CharacterReference;
                    }
                    Ch('<') => {
                        self.token_start = self.char_location;
                        self.state = State::TagOpen;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_NUL);
                    }
                    StreamEnd => self.emit_eof(),
                    _ => self.consume(c.into()),
                }
            }
            State::RCDATA => {
                let c = self.read_char();
                match c {
                    Ch('&') => {
                        self.char_ref_start = self.char_location;
                        self.return_state = State::RCDATA;
                        self.state = State::CharacterReference;
                    }
                    Ch('<') => {
                        self.token_start = self.char_location;
                        self.state = State::RCDATALessThanSign;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                    }
                    StreamEnd => self.emit_eof(),
                    _ => self.consume(c.into()),
                }
            }
            State::RAWTEXT => {
                let c = self.read_char();
                match c {
                    Ch('<') => {
                        self.token_start = self.char_location;
                        self.state = State::RAWTEXTLessThanSign;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                    }
                    StreamEnd => self.emit_eof(),
                    _ => self.consume(c.into()),
                }
            }
            State::ScriptData => {
                let c = self.read_char();
                match c {
                    Ch('<') => {
                        self.token_start = self.char_location;
                        self.state = State::ScriptDataLessThanSign;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                    }
                    StreamEnd => self.emit_eof(),
                    _ => self.consume(c.into()),
                }
            }
            State::PLAINTEXT => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                    }
                    StreamEnd => self.emit_eof(),
                    _ => self.consume(c.into()),
                }
            }
            State::TagOpen => {
                let c = self.read_char();
                match c {
                    Ch('!') => self.state = State::MarkupDeclarationOpen,
                    Ch('/') => self.state = State::EndTagOpen,
                    Ch(ch) if ch.is_ascii_alphabetic() => {
                        self.create_start_tag();
                        self.reconsume_in(c, State::TagName);
                    }
                    Ch('?') => {
                        self.parse_error(ParserError::UnexpectedQuestionMarkInsteadOfTagName);
                        self.create_comment("");
                        self.reconsume_in(c, State::BogusComment);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofBeforeTagName);
                        self.consume_str_at("<", self.token_start);
                        self.reconsume_in(c, State::Data);
                    }
                    _ => {
                        self.parse_error(ParserError::InvalidFirstCharacterOfTagName);
                        self.consume_str_at("<", self.token_start);
                        self.reconsume_in(c, State::Data);
                    }
                }
            }
            State::EndTagOpen => {
                let c = self.read_char();
                match c {
                    Ch(ch) if ch.is_ascii_alphabetic() => {
                        self.create_end_tag();
                        self.reconsume_in(c, State::TagName);
                    }
                    Ch('>') => {
                        self.parse_error(ParserError::MissingEndTagName);
                        self.state = State::Data;
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofBeforeTagName);
                        self.consume_str_at("</", self.token_start);
                        self.reconsume_in(c, State::Data);
                    }
                    _ => {
                        self.parse_error(ParserError::InvalidFirstCharacterOfTagName);
                        self.create_comment("");
                        self.reconsume_in(c, State::BogusComment);
                    }
                }
            }
            State::TagName => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeAttributeName,
                    Ch('/') => self.state = State::SelfClosingStartTag,
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.add_to_token_name(CHAR_REPLACEMENT);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInTag);
                        self.emit_eof();
                    }
                    Ch(ch) => self.add_to_token_name(ch.to_ascii_lowercase()),
                    StreamEmpty => {}
                }
            }
            State::RCDATALessThanSign => self.step_less_than_sign(State::RCDATAEndTagOpen, State::RCDATA),
            State::RCDATAEndTagOpen => self.step_end_tag_open(State::RCDATAEndTagName, State::RCDATA),
            State::RCDATAEndTagName => self.step_end_tag_name(State::RCDATA),
            State::RAWTEXTLessThanSign => self.step_less_than_sign(State::RAWTEXTEndTagOpen, State::RAWTEXT),
            State::RAWTEXTEndTagOpen => self.step_end_tag_open(State::RAWTEXTEndTagName, State::RAWTEXT),
            State::RAWTEXTEndTagName => self.step_end_tag_name(State::RAWTEXT),
            State::ScriptDataLessThanSign => {
                let c = self.read_char();
                match c {
                    Ch('/') => {
                        self.temporary_buffer.clear();
                        self.state = State::ScriptDataEndTagOpen;
                    }
                    Ch('!') => {
                        self.consume_str_at("<", self.token_start);
                        self.consume('!');
                        self.state = State::ScriptDataEscapeStart;
                    }
                    _ => {
                        self.consume_str_at("<", self.token_start);
                        self.reconsume_in(c, State::ScriptData);
                    }
                }
            }
            State::ScriptDataEndTagOpen => self.step_end_tag_open(State::ScriptDataEndTagName, State::ScriptData),
            State::ScriptDataEndTagName => self.step_end_tag_name(State::ScriptData),
            State::ScriptDataEscapeStart => {
                let c = self.read_char();
                match c {
                    Ch('-') => {
                        self.consume('-');
                        self.state = State::ScriptDataEscapeStartDash;
                    }
                    _ => self.reconsume_in(c, State::ScriptData),
                }
            }
            State::ScriptDataEscapeStartDash => {
                let c = self.read_char();
                match c {
                    Ch('-') => {
                        self.consume('-');
                        self.state = State::ScriptDataEscapedDashDash;
                    }
                    _ => self.reconsume_in(c, State::ScriptData),
                }
            }
            State::ScriptDataEscaped => {
                let c = self.read_char();
                match c {
                    Ch('-') => {
                        self.consume('-');
                        self.state = State::ScriptDataEscapedDash;
                    }
                    Ch('<') => {
                        self.token_start = self.char_location;
                        self.state = State::ScriptDataEscapedLessThanSign;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInScriptHtmlCommentLikeText);
                        self.emit_eof();
                    }
                    _ => self.consume(c.into()),
                }
            }
            State::ScriptDataEscapedDash | State::ScriptDataEscapedDashDash => {
                let dash_dash = self.state == State::ScriptDataEscapedDashDash;
                let c = self.read_char();
                match c {
                    Ch('-') => {
                        self.consume('-');
                        self.state = State::ScriptDataEscapedDashDash;
                    }
                    Ch('<') => {
                        self.token_start = self.char_location;
                        self.state = State::ScriptDataEscapedLessThanSign;
                    }
                    Ch('>') if dash_dash => {
                        self.consume('>');
                        self.state = State::ScriptData;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                        self.state = State::ScriptDataEscaped;
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInScriptHtmlCommentLikeText);
                        self.emit_eof();
                    }
                    _ => {
                        self.consume(c.into());
                        self.state = State::ScriptDataEscaped;
                    }
                }
            }
            State::ScriptDataEscapedLessThanSign => {
                let c = self.read_char();
                match c {
                    Ch('/') => {
                        self.temporary_buffer.clear();
                        self.state = State::ScriptDataEscapedEndTagOpen;
                    }
                    Ch(ch) if ch.is_ascii_alphabetic() => {
                        self.temporary_buffer.clear();
                        self.consume_str_at("<", self.token_start);
                        self.reconsume_in(c, State::ScriptDataDoubleEscapeStart);
                    }
                    _ => {
                        self.consume_str_at("<", self.token_start);
                        self.reconsume_in(c, State::ScriptDataEscaped);
                    }
                }
            }
            State::ScriptDataEscapedEndTagOpen => {
                self.step_end_tag_open(State::ScriptDataEscapedEndTagName, State::ScriptDataEscaped)
            }
            State::ScriptDataEscapedEndTagName => self.step_end_tag_name(State::ScriptDataEscaped),
            State::ScriptDataDoubleEscapeStart => {
                self.step_double_escape_boundary(State::ScriptDataDoubleEscaped, State::ScriptDataEscaped)
            }
            State::ScriptDataDoubleEscaped => {
                let c = self.read_char();
                match c {
                    Ch('-') => {
                        self.consume('-');
                        self.state = State::ScriptDataDoubleEscapedDash;
                    }
                    Ch('<') => {
                        self.consume('<');
                        self.state = State::ScriptDataDoubleEscapedLessThanSign;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInScriptHtmlCommentLikeText);
                        self.emit_eof();
                    }
                    _ => self.consume(c.into()),
                }
            }
            State::ScriptDataDoubleEscapedDash | State::ScriptDataDoubleEscapedDashDash => {
                let dash_dash = self.state == State::ScriptDataDoubleEscapedDashDash;
                let c = self.read_char();
                match c {
                    Ch('-') => {
                        self.consume('-');
                        self.state = State::ScriptDataDoubleEscapedDashDash;
                    }
                    Ch('<') => {
                        self.consume('<');
                        self.state = State::ScriptDataDoubleEscapedLessThanSign;
                    }
                    Ch('>') if dash_dash => {
                        self.consume('>');
                        self.state = State::ScriptData;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.consume(CHAR_REPLACEMENT);
                        self.state = State::ScriptDataDoubleEscaped;
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInScriptHtmlCommentLikeText);
                        self.emit_eof();
                    }
                    _ => {
                        self.consume(c.into());
                        self.state = State::ScriptDataDoubleEscaped;
                    }
                }
            }
            State::ScriptDataDoubleEscapedLessThanSign => {
                let c = self.read_char();
                match c {
                    Ch('/') => {
                        self.temporary_buffer.clear();
                        self.consume('/');
                        self.state = State::ScriptDataDoubleEscapeEnd;
                    }
                    _ => self.reconsume_in(c, State::ScriptDataDoubleEscaped),
                }
            }
            State::ScriptDataDoubleEscapeEnd => {
                self.step_double_escape_boundary(State::ScriptDataEscaped, State::ScriptDataDoubleEscaped)
            }
            State::BeforeAttributeName => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                    Ch('/' | '>') | StreamEnd => self.reconsume_in(c, State::AfterAttributeName),
                    Ch('=') => {
                        self.parse_error(ParserError::UnexpectedEqualsSignBeforeAttributeName);
                        self.start_attribute();
                        self.current_attr_name.push('=');
                        self.state = State::AttributeName;
                    }
                    _ => {
                        self.start_attribute();
                        self.reconsume_in(c, State::AttributeName);
                    }
                }
            }
            State::AttributeName => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE | '/' | '>') | StreamEnd => {
                        self.check_duplicate_attribute();
                        self.reconsume_in(c, State::AfterAttributeName);
                    }
                    Ch('=') => {
                        self.check_duplicate_attribute();
                        self.state = State::BeforeAttributeValue;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.current_attr_name.push(CHAR_REPLACEMENT);
                    }
                    Ch(ch @ ('"' | '\'' | '<')) => {
                        self.parse_error(ParserError::UnexpectedCharacterInAttributeName);
                        self.current_attr_name.push(ch);
                    }
                    Ch(ch) => self.current_attr_name.push(ch.to_ascii_lowercase()),
                    StreamEmpty => {}
                }
            }
            State::AfterAttributeName => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                    Ch('/') => self.state = State::SelfClosingStartTag,
                    Ch('=') => self.state = State::BeforeAttributeValue,
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInTag);
                        self.emit_eof();
                    }
                    _ => {
                        self.start_attribute();
                        self.reconsume_in(c, State::AttributeName);
                    }
                }
            }
            State::BeforeAttributeValue => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                    Ch('"') => self.state = State::AttributeValueDoubleQuoted,
                    Ch('\'') => self.state = State::AttributeValueSingleQuoted,
                    Ch('>') => {
                        self.parse_error(ParserError::MissingAttributeValue);
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    _ => self.reconsume_in(c, State::AttributeValueUnquoted),
                }
            }
            State::AttributeValueDoubleQuoted | State::AttributeValueSingleQuoted => {
                let quote = if self.state == State::AttributeValueDoubleQuoted { '"' } else { '\'' };
                let c = self.read_char();
                match c {
                    Ch(ch) if ch == quote => self.state = State::AfterAttributeValueQuoted,
                    Ch('&') => {
                        self.char_ref_start = self.char_location;
                        self.return_state = self.state;
                        self.state = State::CharacterReference;
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.current_attr_value.push(CHAR_REPLACEMENT);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInTag);
                        self.emit_eof();
                    }
                    _ => self.current_attr_value.push(c.into()),
                }
            }
            State::AttributeValueUnquoted => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeAttributeName,
                    Ch('&') => {
                        self.char_ref_start = self.char_location;
                        self.return_state = State::AttributeValueUnquoted;
                        self.state = State::CharacterReference;
                    }
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.current_attr_value.push(CHAR_REPLACEMENT);
                    }
                    Ch(ch @ ('"' | '\'' | '<' | '=' | '`')) => {
                        self.parse_error(ParserError::UnexpectedCharacterInUnquotedAttributeValue);
                        self.current_attr_value.push(ch);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInTag);
                        self.emit_eof();
                    }
                    _ => self.current_attr_value.push(c.into()),
                }
            }
            State::AfterAttributeValueQuoted => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeAttributeName,
                    Ch('/') => self.state = State::SelfClosingStartTag,
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInTag);
                        self.emit_eof();
                    }
                    _ => {
                        self.parse_error(ParserError::MissingWhitespaceBetweenAttributes);
                        self.reconsume_in(c, State::BeforeAttributeName);
                    }
                }
            }
            State::SelfClosingStartTag => {
                let c = self.read_char();
                match c {
                    Ch('>') => {
                        self.set_self_closing();
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInTag);
                        self.emit_eof();
                    }
                    _ => {
                        self.parse_error(ParserError::UnexpectedSolidusInTag);
                        self.reconsume_in(c, State::BeforeAttributeName);
                    }
                }
            }
            State::BogusComment => {
                let c = self.read_char();
                match c {
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => {
                        self.emit_current_token();
                        self.reconsume_in(c, State::Data);
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.add_to_comment(CHAR_REPLACEMENT);
                    }
                    _ => self.add_to_comment(c.into()),
                }
            }
            State::MarkupDeclarationOpen => return self.step_markup_declaration_open(),
            State::CommentStart => {
                let c = self.read_char();
                match c {
                    Ch('-') => self.state = State::CommentStartDash,
                    Ch('>') => {
                        self.parse_error(ParserError::AbruptClosingOfEmptyComment);
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    _ => self.reconsume_in(c, State::Comment),
                }
            }
            State::CommentStartDash => {
                let c = self.read_char();
                match c {
                    Ch('-') => self.state = State::CommentEnd,
                    Ch('>') => {
                        self.parse_error(ParserError::AbruptClosingOfEmptyComment);
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => self.eof_in_comment(),
                    _ => {
                        self.add_to_comment('-');
                        self.reconsume_in(c, State::Comment);
                    }
                }
            }
            State::Comment => {
                let c = self.read_char();
                match c {
                    Ch('<') => {
                        self.add_to_comment('<');
                        self.state = State::CommentLessThanSign;
                    }
                    Ch('-') => self.state = State::CommentEndDash,
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.add_to_comment(CHAR_REPLACEMENT);
                    }
                    StreamEnd => self.eof_in_comment(),
                    _ => self.add_to_comment(c.into()),
                }
            }
            State::CommentLessThanSign => {
                let c = self.read_char();
                match c {
                    Ch('!') => {
                        self.add_to_comment('!');
                        self.state = State::CommentLessThanSignBang;
                    }
                    Ch('<') => self.add_to_comment('<'),
                    _ => self.reconsume_in(c, State::Comment),
                }
            }
            State::CommentLessThanSignBang => {
                let c = self.read_char();
                match c {
                    Ch('-') => self.state = State::CommentLessThanSignBangDash,
                    _ => self.reconsume_in(c, State::Comment),
                }
            }
            State::CommentLessThanSignBangDash => {
                let c = self.read_char();
                match c {
                    Ch('-') => self.state = State::CommentLessThanSignBangDashDash,
                    _ => self.reconsume_in(c, State::CommentEndDash),
                }
            }
            State::CommentLessThanSignBangDashDash => {
                let c = self.read_char();
                match c {
                    Ch('>') | StreamEnd => self.reconsume_in(c, State::CommentEnd),
                    _ => {
                        self.parse_error(ParserError::NestedComment);
                        self.reconsume_in(c, State::CommentEnd);
                    }
                }
            }
            State::CommentEndDash => {
                let c = self.read_char();
                match c {
                    Ch('-') => self.state = State::CommentEnd,
                    StreamEnd => self.eof_in_comment(),
                    _ => {
                        self.add_to_comment('-');
                        self.reconsume_in(c, State::Comment);
                    }
                }
            }
            State::CommentEnd => {
                let c = self.read_char();
                match c {
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    Ch('!') => self.state = State::CommentEndBang,
                    Ch('-') => self.add_to_comment('-'),
                    StreamEnd => self.eof_in_comment(),
                    _ => {
                        self.add_str_to_comment("--");
                        self.reconsume_in(c, State::Comment);
                    }
                }
            }
            State::CommentEndBang => {
                let c = self.read_char();
                match c {
                    Ch('-') => {
                        self.add_str_to_comment("--!");
                        self.state = State::CommentEndDash;
                    }
                    Ch('>') => {
                        self.parse_error(ParserError::IncorrectlyClosedComment);
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => self.eof_in_comment(),
                    _ => {
                        self.add_str_to_comment("--!");
                        self.reconsume_in(c, State::Comment);
                    }
                }
            }
            State::DOCTYPE => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::BeforeDOCTYPEName,
                    Ch('>') => self.reconsume_in(c, State::BeforeDOCTYPEName),
                    StreamEnd => {
                        self.parse_error(ParserError::EofInDoctype);
                        self.create_doctype(None);
                        self.eof_in_doctype();
                    }
                    _ => {
                        self.parse_error(ParserError::MissingWhitespaceBeforeDoctypeName);
                        self.reconsume_in(c, State::BeforeDOCTYPEName);
                    }
                }
            }
            State::BeforeDOCTYPEName => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.create_doctype(Some(CHAR_REPLACEMENT));
                        self.state = State::DOCTYPEName;
                    }
                    Ch('>') => {
                        self.parse_error(ParserError::MissingDoctypeName);
                        self.create_doctype(None);
                        self.set_force_quirks();
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInDoctype);
                        self.create_doctype(None);
                        self.eof_in_doctype();
                    }
                    Ch(ch) => {
                        self.create_doctype(Some(ch.to_ascii_lowercase()));
                        self.state = State::DOCTYPEName;
                    }
                    StreamEmpty => {}
                }
            }
            State::DOCTYPEName => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => self.state = State::AfterDOCTYPEName,
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.add_to_token_name(CHAR_REPLACEMENT);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInDoctype);
                        self.eof_in_doctype();
                    }
                    Ch(ch) => self.add_to_token_name(ch.to_ascii_lowercase()),
                    StreamEmpty => {}
                }
            }
            State::AfterDOCTYPEName => return self.step_after_doctype_name(),
            State::AfterDOCTYPEPublicKeyword | State::AfterDOCTYPESystemKeyword => {
                let public = self.state == State::AfterDOCTYPEPublicKeyword;
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {
                        self.state = if public {
                            State::BeforeDOCTYPEPublicIdentifier
                        } else {
                            State::BeforeDOCTYPESystemIdentifier
                        };
                    }
                    Ch(quote @ ('"' | '\'')) => {
                        self.parse_error(if public {
                            ParserError::MissingWhitespaceAfterDoctypePublicKeyword
                        } else {
                            ParserError::MissingWhitespaceAfterDoctypeSystemKeyword
                        });
                        self.start_doctype_identifier(public, quote);
                    }
                    _ => self.doctype_identifier_missing(c, public),
                }
            }
            State::BeforeDOCTYPEPublicIdentifier | State::BeforeDOCTYPESystemIdentifier => {
                let public = self.state == State::BeforeDOCTYPEPublicIdentifier;
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                    Ch(quote @ ('"' | '\'')) => self.start_doctype_identifier(public, quote),
                    _ => self.doctype_identifier_missing(c, public),
                }
            }
            State::DOCTYPEPublicIdentifierDoubleQuoted
            | State::DOCTYPEPublicIdentifierSingleQuoted
            | State::DOCTYPESystemIdentifierDoubleQuoted
            | State::DOCTYPESystemIdentifierSingleQuoted => {
                let (public, quote) = match self.state {
                    State::DOCTYPEPublicIdentifierDoubleQuoted => (true, '"'),
                    State::DOCTYPEPublicIdentifierSingleQuoted => (true, '\''),
                    State::DOCTYPESystemIdentifierDoubleQuoted => (false, '"'),
                    _ => (false, '\''),
                };
                let c = self.read_char();
                match c {
                    Ch(ch) if ch == quote => {
                        self.state = if public {
                            State::AfterDOCTYPEPublicIdentifier
                        } else {
                            State::AfterDOCTYPESystemIdentifier
                        };
                    }
                    Ch(CHAR_NUL) => {
                        self.parse_error(ParserError::UnexpectedNullCharacter);
                        self.add_to_doctype_identifier(public, CHAR_REPLACEMENT);
                    }
                    Ch('>') => {
                        self.parse_error(if public {
                            ParserError::AbruptDoctypePublicIdentifier
                        } else {
                            ParserError::AbruptDoctypeSystemIdentifier
                        });
                        self.set_force_quirks();
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInDoctype);
                        self.eof_in_doctype();
                    }
                    _ => self.add_to_doctype_identifier(public, c.into()),
                }
            }
            State::AfterDOCTYPEPublicIdentifier | State::BetweenDOCTYPEPublicAndSystemIdentifiers => {
                let between = self.state == State::BetweenDOCTYPEPublicAndSystemIdentifiers;
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {
                        self.state = State::BetweenDOCTYPEPublicAndSystemIdentifiers;
                    }
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    Ch(quote @ ('"' | '\'')) => {
                        if !between {
                            self.parse_error(ParserError::MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers);
                        }
                        self.start_doctype_identifier(false, quote);
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInDoctype);
                        self.eof_in_doctype();
                    }
                    _ => {
                        self.parse_error(ParserError::MissingQuoteBeforeDoctypeSystemIdentifier);
                        self.set_force_quirks();
                        self.reconsume_in(c, State::BogusDOCTYPE);
                    }
                }
            }
            State::AfterDOCTYPESystemIdentifier => {
                let c = self.read_char();
                match c {
                    Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {}
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    StreamEnd => {
                        self.parse_error(ParserError::EofInDoctype);
                        self.eof_in_doctype();
                    }
                    _ => {
                        // This does not set the force-quirks flag
                        self.parse_error(ParserError::UnexpectedCharacterAfterDoctypeSystemIdentifier);
                        self.reconsume_in(c, State::BogusDOCTYPE);
                    }
                }
            }
            State::BogusDOCTYPE => {
                let c = self.read_char();
                match c {
                    Ch('>') => {
                        self.state = State::Data;
                        self.emit_current_token();
                    }
                    Ch(CHAR_NUL) => self.parse_error(ParserError::UnexpectedNullCharacter),
                    StreamEnd => {
                        self.emit_current_token();
                        self.reconsume_in(c, State::Data);
                    }
                    _ => {}
                }
            }
            State::CDATASection => {
                let c = self.read_char();
                match c {
                    Ch(']') => self.state = State::CDATASectionBracket,
                    StreamEnd => {
                        self.parse_error(ParserError::EofInCdata);
                        self.emit_eof();
                    }
                    _ => self.consume(c.into()),
                }
            }
            State::CDATASectionBracket => {
                let c = self.read_char();
                match c {
                    Ch(']') => self.state = State::CDATASectionEnd,
                    _ => {
                        self.consume(']');
                        self.reconsume_in(c, State::CDATASection);
                    }
                }
            }
            State::CDATASectionEnd => {
                let c = self.read_char();
                match c {
                    Ch(']') => self.consume(']'),
                    Ch('>') => self.state = State::Data,
                    _ => {
                        self.consume(']');
                        self.consume(']');
                        self.reconsume_in(c, State::CDATASection);
                    }
                }
            }
            State::CharacterReference
            | State::NamedCharacterReference
            | State::AmbiguousAmpersand
            | State::NumericCharacterReference
            | State::HexadecimalCharacterReferenceStart
            | State::DecimalCharacterReferenceStart
            | State::HexadecimalCharacterReference
            | State::DecimalCharacterReference
            | State::NumericCharacterReferenceEnd => return self.step_character_reference(),
        }

        true
    }

    /// 13.2.5.9/12: RCDATA and RAWTEXT less-than sign states
    fn step_less_than_sign(&mut self, end_tag_open: State, fallback: State) {
        let c = self.read_char();
        match c {
            Ch('/') => {
                self.temporary_buffer.clear();
                self.state = end_tag_open;
            }
            _ => {
                self.consume_str_at("<", self.token_start);
                self.reconsume_in(c, fallback);
            }
        }
    }

    /// End tag open states of the RCDATA, RAWTEXT and script data (escaped) families
    fn step_end_tag_open(&mut self, end_tag_name: State, fallback: State) {
        let c = self.read_char();
        match c {
            Ch(ch) if ch.is_ascii_alphabetic() => {
                self.create_end_tag();
                self.reconsume_in(c, end_tag_name);
            }
            _ => {
                self.consume_str_at("</", self.token_start);
                self.reconsume_in(c, fallback);
            }
        }
    }

    /// End tag name states of the RCDATA, RAWTEXT and script data (escaped) families. Only an end
    /// tag that matches the last start tag closes the element, anything else is plain text.
    fn step_end_tag_name(&mut self, fallback: State) {
        let c = self.read_char();
        match c {
            Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) if self.is_appropriate_end_token() => {
                self.state = State::BeforeAttributeName;
            }
            Ch('/') if self.is_appropriate_end_token() => self.state = State::SelfClosingStartTag,
            Ch('>') if self.is_appropriate_end_token() => {
                self.state = State::Data;
                self.emit_current_token();
            }
            Ch(ch) if ch.is_ascii_alphabetic() => {
                self.add_to_token_name(ch.to_ascii_lowercase());
                self.temporary_buffer.push(ch);
            }
            _ => {
                self.current_token = None;
                self.transition_to(c, fallback);
            }
        }
    }

    /// Script data double escape start and end states. Both switch between the escaped and the
    /// double escaped states depending on whether the temporary buffer spells `script`.
    fn step_double_escape_boundary(&mut self, on_script: State, otherwise: State) {
        let c = self.read_char();
        match c {
            Ch(ch @ (CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE | '/' | '>')) => {
                self.state = if self.temporary_buffer == "script" {
                    on_script
                } else {
                    otherwise
                };
                self.consume(ch);
            }
            Ch(ch) if ch.is_ascii_alphabetic() => {
                self.temporary_buffer.push(ch.to_ascii_lowercase());
                self.consume(ch);
            }
            _ => {
                let fallback = if on_script == State::ScriptDataDoubleEscaped {
                    State::ScriptDataEscaped
                } else {
                    State::ScriptDataDoubleEscaped
                };
                self.reconsume_in(c, fallback);
            }
        }
    }

    /// 13.2.5.42 Markup declaration open state. Needs to look ahead several characters, so it
    /// may have to wait for more input before it can decide.
    fn step_markup_declaration_open(&mut self) -> bool {
        self.char_location = self.stream.location();

        let dashes = self.stream.match_ahead("--", false);
        let doctype = self.stream.match_ahead("DOCTYPE", true);
        let cdata = self.stream.match_ahead("[CDATA[", false);

        if dashes == Lookahead::Match {
            self.stream.next_n(2);
            self.create_comment("");
            self.state = State::CommentStart;
        } else if doctype == Lookahead::Match {
            self.stream.next_n(7);
            self.state = State::DOCTYPE;
        } else if cdata == Lookahead::Match {
            self.stream.next_n(7);
            if self.in_foreign_node {
                self.state = State::CDATASection;
            } else {
                self.parse_error(ParserError::CdataInHtmlContent);
                self.create_comment("[CDATA[");
                self.state = State::BogusComment;
            }
        } else if [dashes, doctype, cdata].contains(&Lookahead::NeedMore) {
            return false;
        } else {
            self.parse_error(ParserError::IncorrectlyOpenedComment);
            self.create_comment("");
            self.state = State::BogusComment;
        }

        true
    }

    /// 13.2.5.56 After DOCTYPE name state
    fn step_after_doctype_name(&mut self) -> bool {
        match self.stream.read() {
            Ch(CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_SPACE) => {
                self.read_char();
            }
            Ch('>') => {
                self.read_char();
                self.state = State::Data;
                self.emit_current_token();
            }
            StreamEnd => {
                self.read_char();
                self.parse_error(ParserError::EofInDoctype);
                self.eof_in_doctype();
            }
            _ => {
                let public = self.stream.match_ahead("PUBLIC", true);
                let system = self.stream.match_ahead("SYSTEM", true);
                if public == Lookahead::Match {
                    self.stream.next_n(6);
                    self.state = State::AfterDOCTYPEPublicKeyword;
                } else if system == Lookahead::Match {
                    self.stream.next_n(6);
                    self.state = State::AfterDOCTYPESystemKeyword;
                } else if public == Lookahead::NeedMore || system == Lookahead::NeedMore {
                    return false;
                } else {
                    let c = self.read_char();
                    self.parse_error(ParserError::InvalidCharacterSequenceAfterDoctypeName);
                    self.set_force_quirks();
                    self.reconsume_in(c, State::BogusDOCTYPE);
                }
            }
        }

        true
    }

    /// Reads a character from the input stream and generates preprocessing errors for control
    /// characters and noncharacters. Every input position is checked only once, even when the
    /// character is reconsumed.
    fn read_char(&mut self) -> Character {
        self.char_location = self.stream.location();
        let pos = self.stream.position();
        let c = self.stream.read_and_next();

        if let Ch(ch) = c {
            if pos >= self.checked_until {
                self.checked_until = pos + 1;
                if is_control_char(ch as u32) {
                    self.parse_error(ParserError::ControlCharacterInInputStream);
                } else if is_noncharacter(ch as u32) {
                    self.parse_error(ParserError::NoncharacterInInputStream);
                }
            }
        }

        c
    }

    /// Switches to the given state and makes sure the character is read again
    fn reconsume_in(&mut self, c: Character, state: State) {
        if let Ch(_) = c {
            self.stream.prev();
        }
        self.state = state;
    }

    /// Pushes the '</' and the temporary buffer as text and reconsumes in the given state
    fn transition_to(&mut self, c: Character, state: State) {
        let text = format!("</{}", self.temporary_buffer);
        self.consume_str_at(&text, self.token_start);
        self.temporary_buffer.clear();
        self.reconsume_in(c, state);
    }

    /// Return true when the current end tag matches the last emitted start tag
    fn is_appropriate_end_token(&self) -> bool {
        match &self.current_token {
            Some(Token::EndTag { name, .. }) => !self.last_start_token.is_empty() && *name == self.last_start_token,
            _ => false,
        }
    }

    // Consumes the given character as part of a text run
    fn consume(&mut self, c: char) {
        self.consume_at(c, self.char_location);
    }

    fn consume_at(&mut self, c: char, start: Location) {
        let kind = match c {
            CHAR_TAB | CHAR_LF | CHAR_FF | CHAR_CR | CHAR_SPACE => TextKind::Whitespace,
            CHAR_NUL => TextKind::Null,
            _ => TextKind::Regular,
        };

        if !self.consumed.is_empty() && kind != self.consumed_kind {
            self.flush_text();
        }
        if self.consumed.is_empty() {
            self.consumed_kind = kind;
            self.consumed_span.start = start;
        }

        self.consumed.push(c);
        self.consumed_span.end = self.stream.location();
    }

    fn consume_str_at(&mut self, s: &str, start: Location) {
        for c in s.chars() {
            self.consume_at(c, start);
        }
    }

    /// Emits the pending text run (if any) as a character token
    fn flush_text(&mut self) {
        if self.consumed.is_empty() {
            return;
        }

        let text = std::mem::take(&mut self.consumed);
        let location = self.consumed_span;
        let token = match self.consumed_kind {
            TextKind::Regular => Token::Text { text, location },
            TextKind::Null => Token::NullCharacter { text, location },
            TextKind::Whitespace => Token::Whitespace { text, location },
        };
        self.token_queue.push_back(token);
    }

    /// Emits the given token. Any pending text is emitted first.
    fn emit_token(&mut self, token: Token) {
        self.flush_text();

        // Save the start token name if we are pushing it. This helps us in detecting matching tags.
        if let Token::StartTag { name, .. } = &token {
            self.last_start_token.clone_from(name);
        }

        #[cfg(feature = "debug_parser")]
        log::trace!("emit token {token:?}");

        self.token_queue.push_back(token);
    }

    /// Emits the current stored token with its attributes and source location
    fn emit_current_token(&mut self) {
        self.store_current_attribute();
        let attrs = std::mem::take(&mut self.current_attrs);
        let span = Span::new(self.token_start, self.stream.location());

        let Some(mut token) = self.current_token.take() else {
            return;
        };

        match &mut token {
            Token::StartTag {
                attributes, location, ..
            } => {
                *attributes = attrs;
                *location = span;
            }
            Token::EndTag {
                is_self_closing,
                location,
                ..
            } => {
                if !attrs.is_empty() {
                    self.parse_error(ParserError::EndTagWithAttributes);
                }
                if *is_self_closing {
                    self.parse_error(ParserError::EndTagWithTrailingSolidus);
                }
                *location = span;
            }
            Token::Comment { location, .. } | Token::DocType { location, .. } => *location = span,
            _ => {}
        }

        self.emit_token(token);
    }

    fn emit_eof(&mut self) {
        let location = Span::at(self.stream.location());
        self.emit_token(Token::Eof { location });
    }

    fn eof_in_comment(&mut self) {
        self.parse_error(ParserError::EofInComment);
        self.emit_current_token();
        self.state = State::Data;
    }

    fn eof_in_doctype(&mut self) {
        self.set_force_quirks();
        self.emit_current_token();
        self.state = State::Data;
    }

    fn create_start_tag(&mut self) {
        self.current_attrs.clear();
        self.has_current_attr = false;
        self.current_token = Some(Token::StartTag {
            name: String::new(),
            is_self_closing: false,
            attributes: Vec::new(),
            location: Span::at(self.token_start),
        });
    }

    fn create_end_tag(&mut self) {
        self.current_attrs.clear();
        self.has_current_attr = false;
        self.current_token = Some(Token::EndTag {
            name: String::new(),
            is_self_closing: false,
            location: Span::at(self.token_start),
        });
    }

    fn create_comment(&mut self, comment: &str) {
        self.current_token = Some(Token::Comment {
            comment: comment.to_string(),
            location: Span::at(self.token_start),
        });
    }

    fn create_doctype(&mut self, first_char: Option<char>) {
        self.current_token = Some(Token::DocType {
            name: first_char.map(String::from),
            force_quirks: false,
            pub_identifier: None,
            sys_identifier: None,
            location: Span::at(self.token_start),
        });
    }

    /// Adds the given character to the current token's name (if applicable)
    fn add_to_token_name(&mut self, c: char) {
        match &mut self.current_token {
            Some(Token::StartTag { name, .. } | Token::EndTag { name, .. }) => name.push(c),
            Some(Token::DocType { name, .. }) => name.get_or_insert_with(String::new).push(c),
            _ => {}
        }
    }

    fn add_to_comment(&mut self, c: char) {
        if let Some(Token::Comment { comment, .. }) = &mut self.current_token {
            comment.push(c);
        }
    }

    fn add_str_to_comment(&mut self, s: &str) {
        if let Some(Token::Comment { comment, .. }) = &mut self.current_token {
            comment.push_str(s);
        }
    }

    fn set_self_closing(&mut self) {
        if let Some(Token::StartTag { is_self_closing, .. } | Token::EndTag { is_self_closing, .. }) =
            &mut self.current_token
        {
            *is_self_closing = true;
        }
    }

    /// Set force_quirk mode in current token
    fn set_force_quirks(&mut self) {
        if let Some(Token::DocType { force_quirks, .. }) = &mut self.current_token {
            *force_quirks = true;
        }
    }

    /// Sets an empty public or system identifier and switches to the matching quoted state
    fn start_doctype_identifier(&mut self, public: bool, quote: char) {
        if let Some(Token::DocType {
            pub_identifier,
            sys_identifier,
            ..
        }) = &mut self.current_token
        {
            if public {
                *pub_identifier = Some(String::new());
            } else {
                *sys_identifier = Some(String::new());
            }
        }

        self.state = match (public, quote) {
            (true, '"') => State::DOCTYPEPublicIdentifierDoubleQuoted,
            (true, _) => State::DOCTYPEPublicIdentifierSingleQuoted,
            (false, '"') => State::DOCTYPESystemIdentifierDoubleQuoted,
            (false, _) => State::DOCTYPESystemIdentifierSingleQuoted,
        };
    }

    fn add_to_doctype_identifier(&mut self, public: bool, c: char) {
        if let Some(Token::DocType {
            pub_identifier,
            sys_identifier,
            ..
        }) = &mut self.current_token
        {
            let identifier = if public { pub_identifier } else { sys_identifier };
            if let Some(identifier) = identifier {
                identifier.push(c);
            }
        }
    }

    /// Shared handling of a '>', EOF or unquoted character where a DOCTYPE identifier should start
    fn doctype_identifier_missing(&mut self, c: Character, public: bool) {
        match c {
            Ch('>') => {
                self.parse_error(if public {
                    ParserError::MissingDoctypePublicIdentifier
                } else {
                    ParserError::MissingDoctypeSystemIdentifier
                });
                self.set_force_quirks();
                self.state = State::Data;
                self.emit_current_token();
            }
            StreamEnd => {
                self.parse_error(ParserError::EofInDoctype);
                self.eof_in_doctype();
            }
            _ => {
                self.parse_error(if public {
                    ParserError::MissingQuoteBeforeDoctypePublicIdentifier
                } else {
                    ParserError::MissingQuoteBeforeDoctypeSystemIdentifier
                });
                self.set_force_quirks();
                self.reconsume_in(c, State::BogusDOCTYPE);
            }
        }
    }

    /// Starts a new attribute. The previous one (if any) is stored on the current tag.
    fn start_attribute(&mut self) {
        self.store_current_attribute();
        self.has_current_attr = true;
    }

    /// Called when leaving the attribute name state. A name that already exists on the tag makes
    /// this attribute a duplicate that is dropped.
    fn check_duplicate_attribute(&mut self) {
        if self.current_attrs.iter().any(|attr| attr.name == self.current_attr_name) {
            self.parse_error(ParserError::DuplicateAttribute);
            self.current_attr_duplicate = true;
        }
    }

    /// Saves the current attribute name and value onto the current_attrs list, if there is anything to store
    fn store_current_attribute(&mut self) {
        if self.has_current_attr && !self.current_attr_duplicate {
            let attr = Attribute::new(&self.current_attr_name, &self.current_attr_value);
            self.current_attrs.push(attr);
        }

        self.has_current_attr = false;
        self.current_attr_duplicate = false;
        self.current_attr_name.clear();
        self.current_attr_value.clear();
    }

    /// Creates a parser log error message
    pub(crate) fn parse_error(&mut self, error: ParserError) {
        self.error_logger
            .borrow_mut()
            .add_tokenizer_error(self.char_location, self.stream.location(), error.as_str());
    }
}

/// Returns true for control characters other than NUL and ASCII whitespace
fn is_control_char(c: u32) -> bool {
    matches!(c, 0x0001..=0x0008 | 0x000B | 0x000E..=0x001F | 0x007F..=0x009F)
}

/// Returns true for the unicode noncharacters
fn is_noncharacter(c: u32) -> bool {
    (0xFDD0..=0xFDEF).contains(&c) || (c & 0xFFFE) == 0xFFFE
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_shared::types::ParseError;

    fn tokenizer_for(input: &str) -> (Tokenizer, Rc<RefCell<ErrorLogger>>) {
        let mut stream = ByteStream::new(None);
        stream.read_from_str(input);
        let logger = Rc::new(RefCell::new(ErrorLogger::new()));
        (Tokenizer::new(stream, None, logger.clone()), logger)
    }

    fn tokenize(input: &str) -> Vec<Token> {
        tokenize_with_errors(input).0
    }

    fn tokenize_with_errors(input: &str) -> (Vec<Token>, Vec<ParseError>) {
        let (mut tokenizer, logger) = tokenizer_for(input);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token() {
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                break;
            }
        }
        let errors = logger.borrow().get_errors();
        (tokens, errors)
    }

    fn render(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn simple_tags_and_text() {
        let tokens = tokenize("<p class=x>Hi there</P>");
        assert_eq!(
            render(&tokens),
            vec!["<p class=\"x\">", "Hi", " ", "there", "</p>", "EOF"]
        );
    }

    #[test]
    fn text_runs_are_split_by_class() {
        let tokens = tokenize("a\0b  c");
        assert!(matches!(&tokens[0], Token::Text { text, .. } if text == "a"));
        assert!(matches!(&tokens[1], Token::NullCharacter { text, .. } if text == "\0"));
        assert!(matches!(&tokens[2], Token::Text { text, .. } if text == "b"));
        assert!(matches!(&tokens[3], Token::Whitespace { text, .. } if text == "  "));
        assert!(matches!(&tokens[4], Token::Text { text, .. } if text == "c"));
    }

    #[test]
    fn duplicate_attributes_keep_the_first() {
        let (tokens, errors) = tokenize_with_errors(r#"<a href="one" HREF="two" id=3>"#);
        match &tokens[0] {
            Token::StartTag { attributes, .. } => {
                assert_eq!(attributes.len(), 2);
                assert_eq!(attributes[0], Attribute::new("href", "one"));
                assert_eq!(attributes[1], Attribute::new("id", "3"));
            }
            t => panic!("unexpected token {t:?}"),
        }
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "duplicate-attribute");
    }

    #[test]
    fn self_closing_and_end_tag_errors() {
        let (tokens, errors) = tokenize_with_errors("<br/></div/><p a=1 / >");
        assert!(matches!(&tokens[0], Token::StartTag { is_self_closing: true, .. }));
        assert!(tokens[1].is_end_tag("div"));
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["end-tag-with-trailing-solidus", "unexpected-solidus-in-tag"]);
    }

    #[test]
    fn comments() {
        assert_eq!(render(&tokenize("<!-- x -->")), vec!["<!-- x -->", "EOF"]);
        assert_eq!(render(&tokenize("<!-->")), vec!["<!---->", "EOF"]);
        assert_eq!(render(&tokenize("<?php x ?>")), vec!["<!--?php x ?-->", "EOF"]);
        assert_eq!(render(&tokenize("<!--a--!>")), vec!["<!--a-->", "EOF"]);
        assert_eq!(render(&tokenize("<![CDATA[x]]>")), vec!["<!--[CDATA[x]]-->", "EOF"]);
    }

    #[test]
    fn nested_comment_error() {
        let (_, errors) = tokenize_with_errors("<!-- <!-- -->");
        assert_eq!(errors[0].message, "nested-comment");
    }

    #[test]
    fn doctypes() {
        let tokens = tokenize(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" 'x'>"#);
        match &tokens[0] {
            Token::DocType {
                name,
                force_quirks,
                pub_identifier,
                sys_identifier,
                ..
            } => {
                assert_eq!(name.as_deref(), Some("html"));
                assert!(!force_quirks);
                assert_eq!(pub_identifier.as_deref(), Some("-//W3C//DTD HTML 4.01//EN"));
                assert_eq!(sys_identifier.as_deref(), Some("x"));
            }
            t => panic!("unexpected token {t:?}"),
        }

        let tokens = tokenize("<!doctype html bogus>");
        assert!(matches!(&tokens[0], Token::DocType { force_quirks: true, .. }));

        let tokens = tokenize("<!DOCTYPE>");
        assert!(matches!(&tokens[0], Token::DocType { name: None, force_quirks: true, .. }));
    }

    #[test]
    fn rcdata_end_tag_must_match_last_start_tag() {
        let (mut tokenizer, _) = tokenizer_for("a</b></title>c");
        tokenizer.set_state(State::RCDATA);
        tokenizer.set_last_start_tag("title");

        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token() {
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                break;
            }
        }
        assert_eq!(render(&tokens), vec!["a</b>", "</title>", "c", "EOF"]);
    }

    #[test]
    fn script_double_escape() {
        let (mut tokenizer, _) = tokenizer_for("<!--<script></script>--></script>");
        tokenizer.set_state(State::ScriptData);
        tokenizer.set_last_start_tag("script");

        let first = tokenizer.next_token();
        assert_eq!(
            first.map(|t| t.to_string()),
            Some("<!--<script></script>-->".to_string())
        );
        assert!(matches!(tokenizer.next_token(), Some(ref t) if t.is_end_tag("script")));
    }

    #[test]
    fn hibernates_until_more_input() {
        let logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(ByteStream::new(None), None, logger);

        tokenizer.write("<di");
        assert!(tokenizer.next_token().is_none());
        assert_eq!(tokenizer.activity(), Activity::Hibernating);

        tokenizer.write("v>te");
        assert!(matches!(tokenizer.next_token(), Some(ref t) if t.is_start_tag("div")));
        assert!(tokenizer.next_token().is_none());

        tokenizer.write("xt");
        tokenizer.end();
        assert_eq!(tokenizer.next_token().map(|t| t.to_string()), Some("text".to_string()));
        assert!(matches!(tokenizer.next_token(), Some(Token::Eof { .. })));
    }

    #[test]
    fn paused_tokenizer_produces_nothing() {
        let (mut tokenizer, _) = tokenizer_for("<p>");
        tokenizer.pause();
        assert!(tokenizer.next_token().is_none());
        tokenizer.resume();
        assert!(matches!(tokenizer.next_token(), Some(ref t) if t.is_start_tag("p")));
    }

    #[test]
    fn token_locations() {
        let tokens = tokenize("ab\n<p id=1>");
        let start = tokens[2].location();
        assert!(tokens[2].is_start_tag("p"));
        assert_eq!(start.start, Location::new(2, 1, 3));
        assert_eq!(start.end, Location::new(2, 9, 11));
    }

    #[test]
    fn preprocessing_errors() {
        let (_, errors) = tokenize_with_errors("a\u{1}b\u{FDD0}");
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["control-character-in-input-stream", "noncharacter-in-input-stream"]
        );
        assert_eq!(errors[0].location, Location::new(1, 2, 1));
    }

    #[test]
    fn eof_in_tag_drops_the_tag() {
        let (tokens, errors) = tokenize_with_errors("x<div class=");
        assert_eq!(render(&tokens), vec!["x", "EOF"]);
        assert_eq!(errors[0].message, "eof-in-tag");
    }

    #[test]
    fn lone_less_than_is_text() {
        assert_eq!(render(&tokenize("a < b")), vec!["a", " ", "<", " ", "b", "EOF"]);
        assert_eq!(render(&tokenize("</>x")), vec!["x", "EOF"]);
    }
}
