use tessera_shared::byte_stream::Character::{Ch, StreamEmpty, StreamEnd};
use tessera_shared::byte_stream::Stream;

use crate::errors::ParserError;
use crate::tokenizer::replacement_tables::{LONGEST_ENTITY_LENGTH, TOKEN_NAMED_CHARS, TOKEN_REPLACEMENTS};
use crate::tokenizer::state::State;
use crate::tokenizer::{Tokenizer, CHAR_REPLACEMENT};

impl Tokenizer {
    /// Runs one step of the character reference states (13.2.5.72 - 13.2.5.80). The decoded
    /// characters end up in the current attribute value or in the current text run, depending
    /// on the state we return to.
    pub(crate) fn step_character_reference(&mut self) -> bool {
        match self.state {
            State::CharacterReference => {
                self.temporary_buffer.clear();
                self.temporary_buffer.push('&');

                let c = self.read_char();
                match c {
                    Ch(ch) if ch.is_ascii_alphanumeric() => self.reconsume_in(c, State::NamedCharacterReference),
                    Ch('#') => {
                        self.temporary_buffer.push('#');
                        self.state = State::NumericCharacterReference;
                    }
                    _ => {
                        self.flush_code_points_consumed_as_character_reference();
                        self.reconsume_in(c, self.return_state);
                    }
                }
            }
            State::NamedCharacterReference => {
                let Some(candidate) = self.scan_entity_name() else {
                    return false;
                };

                let Some((name, value)) = find_entity(&candidate) else {
                    self.flush_code_points_consumed_as_character_reference();
                    self.state = State::AmbiguousAmpersand;
                    return true;
                };

                self.char_location = self.stream.location();
                self.stream.next_n(name.len());
                self.temporary_buffer.push_str(name);

                let next = self.stream.read();
                let historical = self.return_state.is_attribute_value()
                    && !name.ends_with(';')
                    && matches!(next, Ch(c) if c == '=' || c.is_ascii_alphanumeric());

                if !historical {
                    if !name.ends_with(';') {
                        self.parse_error(ParserError::MissingSemicolonAfterCharacterReference);
                    }
                    self.temporary_buffer.clear();
                    self.temporary_buffer.push_str(value);
                }

                self.flush_code_points_consumed_as_character_reference();
                self.state = self.return_state;
            }
            State::AmbiguousAmpersand => {
                let c = self.read_char();
                match c {
                    Ch(ch) if ch.is_ascii_alphanumeric() => {
                        if self.return_state.is_attribute_value() {
                            self.current_attr_value.push(ch);
                        } else {
                            self.consume(ch);
                        }
                    }
                    Ch(';') => {
                        self.parse_error(ParserError::UnknownNamedCharacterReference);
                        self.reconsume_in(c, self.return_state);
                    }
                    _ => self.reconsume_in(c, self.return_state),
                }
            }
            State::NumericCharacterReference => {
                self.char_ref_code = 0;

                let c = self.read_char();
                match c {
                    Ch(ch @ ('x' | 'X')) => {
                        self.temporary_buffer.push(ch);
                        self.state = State::HexadecimalCharacterReferenceStart;
                    }
                    _ => self.reconsume_in(c, State::DecimalCharacterReferenceStart),
                }
            }
            State::HexadecimalCharacterReferenceStart | State::DecimalCharacterReferenceStart => {
                let hex = self.state == State::HexadecimalCharacterReferenceStart;
                let c = self.read_char();
                match c {
                    Ch(ch) if (hex && ch.is_ascii_hexdigit()) || (!hex && ch.is_ascii_digit()) => {
                        let next = if hex {
                            State::HexadecimalCharacterReference
                        } else {
                            State::DecimalCharacterReference
                        };
                        self.reconsume_in(c, next);
                    }
                    _ => {
                        self.parse_error(ParserError::AbsenceOfDigitsInNumericCharacterReference);
                        self.flush_code_points_consumed_as_character_reference();
                        self.reconsume_in(c, self.return_state);
                    }
                }
            }
            State::HexadecimalCharacterReference | State::DecimalCharacterReference => {
                let radix = if self.state == State::HexadecimalCharacterReference { 16 } else { 10 };
                let c = self.read_char();
                match c {
                    Ch(ch) if ch.is_digit(radix) => {
                        let digit = ch.to_digit(radix).unwrap_or_default();
                        // Anything above the unicode range is an error anyway, so stop growing
                        self.char_ref_code = self
                            .char_ref_code
                            .saturating_mul(radix)
                            .saturating_add(digit)
                            .min(0x110000);
                    }
                    Ch(';') => self.state = State::NumericCharacterReferenceEnd,
                    _ => {
                        self.parse_error(ParserError::MissingSemicolonAfterCharacterReference);
                        self.reconsume_in(c, State::NumericCharacterReferenceEnd);
                    }
                }
            }
            State::NumericCharacterReferenceEnd => {
                let code = self.check_character_reference_code(self.char_ref_code);

                self.temporary_buffer.clear();
                self.temporary_buffer.push(code);
                self.flush_code_points_consumed_as_character_reference();
                self.state = self.return_state;
            }
            _ => {}
        }

        true
    }

    /// Validates a numeric character reference and returns the character it stands for
    fn check_character_reference_code(&mut self, code: u32) -> char {
        match code {
            0x00 => {
                self.parse_error(ParserError::NullCharacterReference);
                CHAR_REPLACEMENT
            }
            0x110000..=u32::MAX => {
                self.parse_error(ParserError::CharacterReferenceOutsideUnicodeRange);
                CHAR_REPLACEMENT
            }
            0xD800..=0xDFFF => {
                self.parse_error(ParserError::SurrogateCharacterReference);
                CHAR_REPLACEMENT
            }
            _ => {
                if super::is_noncharacter(code) {
                    self.parse_error(ParserError::NoncharacterCharacterReference);
                } else if code == 0x0D || (super::is_control_char(code) && !is_ascii_whitespace(code)) {
                    self.parse_error(ParserError::ControlCharacterReference);
                    if let Some(replacement) = TOKEN_REPLACEMENTS.get(&code) {
                        return *replacement;
                    }
                }

                char::from_u32(code).unwrap_or(CHAR_REPLACEMENT)
            }
        }
    }

    /// Collects the alphanumeric run (and an optional trailing ';') that follows the ampersand.
    /// Returns `None` when the run touches the end of the buffered input and the stream is still
    /// open, as the name could continue in the next chunk.
    fn scan_entity_name(&self) -> Option<String> {
        let mut name = String::new();

        for i in 0..LONGEST_ENTITY_LENGTH {
            match self.stream.look_ahead(i) {
                Ch(c) if c.is_ascii_alphanumeric() => name.push(c),
                Ch(';') => {
                    name.push(';');
                    break;
                }
                Ch(_) | StreamEnd => break,
                StreamEmpty => return None,
            }
        }

        Some(name)
    }

    /// Appends the temporary buffer to the current attribute value, or emits it as characters
    /// when the reference was found in text
    fn flush_code_points_consumed_as_character_reference(&mut self) {
        let buffer = std::mem::take(&mut self.temporary_buffer);

        if self.return_state.is_attribute_value() {
            self.current_attr_value.push_str(&buffer);
        } else {
            for c in buffer.chars() {
                self.consume_at(c, self.char_ref_start);
            }
        }
    }
}

/// Finds the longest named character reference that is a prefix of the given name
fn find_entity(name: &str) -> Option<(&'static str, &'static str)> {
    (1..=name.len())
        .rev()
        .find_map(|len| TOKEN_NAMED_CHARS.get_entry(&name[..len]))
        .map(|(name, value)| (*name, *value))
}

fn is_ascii_whitespace(code: u32) -> bool {
    matches!(code, 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tessera_shared::byte_stream::ByteStream;
    use test_case::test_case;

    use crate::errors::ErrorLogger;
    use crate::tokenizer::token::Token;
    use crate::tokenizer::Tokenizer;

    fn text_and_errors(input: &str) -> (String, Vec<String>) {
        let mut stream = ByteStream::new(None);
        stream.read_from_str(input);
        let logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(stream, None, logger.clone());

        let mut text = String::new();
        while let Some(token) = tokenizer.next_token() {
            match token {
                Token::Eof { .. } => break,
                t => text.push_str(&t.to_string()),
            }
        }
        let errors = logger.borrow().get_errors().into_iter().map(|e| e.message).collect();
        (text, errors)
    }

    #[test_case("&amp;", "&" ; "named with semicolon")]
    #[test_case("&amp", "&" ; "legacy without semicolon")]
    #[test_case("&notit;", "\u{AC}it;" ; "longest legacy prefix")]
    #[test_case("&notin;", "\u{2209}" ; "longer entity wins")]
    #[test_case("&NotEqualTilde;", "\u{2242}\u{338}" ; "two code points")]
    #[test_case("&Backslash;", "\u{2216}" ; "backslash")]
    #[test_case("&NotNestedGreaterGreater;", "\u{2AA2}\u{338}" ; "nested greater than")]
    #[test_case("&CounterClockwiseContourIntegral;", "\u{2233}" ; "longest name")]
    #[test_case("&#65;&#x42;&#X43", "ABC" ; "numeric")]
    #[test_case("&#x80;", "\u{20AC}" ; "c1 replacement")]
    #[test_case("&#0;", "\u{FFFD}" ; "null reference")]
    #[test_case("&#xD800;", "\u{FFFD}" ; "surrogate")]
    #[test_case("&#x110000;", "\u{FFFD}" ; "outside unicode range")]
    #[test_case("&#99999999999;", "\u{FFFD}" ; "overflowing number")]
    #[test_case("&#;", "&#;" ; "absence of digits")]
    #[test_case("&xyz;", "&xyz;" ; "unknown name")]
    #[test_case("& x", "& x" ; "lone ampersand")]
    fn decodes_references_in_text(input: &str, expected: &str) {
        assert_eq!(text_and_errors(input).0, expected);
    }

    #[test_case("&amp", &["missing-semicolon-after-character-reference"] ; "missing semicolon")]
    #[test_case("&xyz;", &["unknown-named-character-reference"] ; "unknown")]
    #[test_case("&Backslash;&hearts;", &[] ; "known names")]
    #[test_case("&#x80;", &["control-character-reference"] ; "control")]
    #[test_case("&#xFFFF;", &["noncharacter-character-reference"] ; "noncharacter")]
    #[test_case("&#;", &["absence-of-digits-in-numeric-character-reference"] ; "no digits")]
    #[test_case("&#65", &["missing-semicolon-after-character-reference"] ; "numeric missing semicolon")]
    fn reports_errors(input: &str, expected: &[&str]) {
        assert_eq!(text_and_errors(input).1, expected);
    }

    #[test_case(r#"<a href="?x=1&amp=2">"#, "?x=1&amp=2" ; "historical equals")]
    #[test_case(r#"<a href="?x=1&ampy">"#, "?x=1&ampy" ; "historical alnum")]
    #[test_case(r#"<a href="?x=1&amp;y">"#, "?x=1&y" ; "terminated reference")]
    #[test_case(r#"<a href=&lt>"#, "<" ; "unquoted")]
    #[test_case(r#"<a href="&bogus;">"#, "&bogus;" ; "unknown in attribute")]
    fn decodes_references_in_attributes(input: &str, expected: &str) {
        let mut stream = ByteStream::new(None);
        stream.read_from_str(input);
        let logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(stream, None, logger);

        let token = tokenizer.next_token();
        assert_eq!(token.as_ref().and_then(|t| t.attribute("href")), Some(expected));
    }

    #[test]
    fn reference_split_over_chunks() {
        let logger = Rc::new(RefCell::new(ErrorLogger::new()));
        let mut tokenizer = Tokenizer::new(ByteStream::new(None), None, logger);

        tokenizer.write("a&no");
        assert!(tokenizer.next_token().is_none());
        tokenizer.write("tin; b");
        tokenizer.end();

        let mut text = String::new();
        while let Some(token) = tokenizer.next_token() {
            if token.is_eof() {
                break;
            }
            text.push_str(&token.to_string());
        }
        assert_eq!(text, "a\u{2209} b");
    }
}
