use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::{fmt, str};

use crate::types::{Error, Result};

pub const CHAR_LF: char = '\u{000A}';
pub const CHAR_CR: char = '\u{000D}';

/// Defines a single character/element in the stream.
///
/// The end of the input is denoted as a separate element. `StreamEmpty` indicates that the
/// buffer has been read completely but the stream is not yet closed: more chunks may follow, so
/// the reader has to stop and wait instead of treating this as the end of the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Character {
    /// Standard UTF character
    Ch(char),
    /// Stream buffer empty and closed
    StreamEnd,
    /// Stream buffer empty (but not closed)
    StreamEmpty,
}

use Character::*;

/// Converts the given character to a char. End-of-stream markers are converted to 0x0000
impl From<Character> for char {
    fn from(c: Character) -> Self {
        match c {
            Ch(c) => c,
            StreamEmpty | StreamEnd => 0x0000 as char,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Ch(ch) => write!(f, "{ch}"),
            StreamEnd => write!(f, "StreamEnd"),
            StreamEmpty => write!(f, "StreamEmpty"),
        }
    }
}

impl Character {
    /// Returns true when the character is HTML whitespace (tab, LF, FF, CR or space)
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Ch('\t' | '\n' | '\x0C' | '\r' | ' '))
    }

    /// Returns true when the character is an ASCII alphabetic character
    pub fn is_ascii_alpha(&self) -> bool {
        matches!(self, Ch(c) if c.is_ascii_alphabetic())
    }

    /// Returns true when the character is an ASCII alphanumeric character
    pub fn is_ascii_alphanumeric(&self) -> bool {
        matches!(self, Ch(c) if c.is_ascii_alphanumeric())
    }

    /// Converts a slice of characters into a string
    pub fn slice_to_string(v: &[Character]) -> String {
        v.iter()
            .filter_map(|c| match c {
                Ch(ch) => Some(*ch),
                _ => None,
            })
            .collect()
    }
}

/// Configuration structure for a bytestream.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Treat any CRLF pairs as a single LF
    pub cr_lf_as_one: bool,
    /// Replace any CR (without a pairing LF) with LF
    pub replace_cr_as_lf: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cr_lf_as_one: true,
            replace_cr_as_lf: true,
        }
    }
}

/// Result of matching a literal against the upcoming characters of the stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookahead {
    /// All characters matched
    Match,
    /// At least one character did not match (or the stream ended)
    NoMatch,
    /// The stream ran out of buffered characters before a decision could be made
    NeedMore,
}

/// Input preprocessor. Holds the characters written so far, normalizes newlines and keeps
/// track of the location of the current character.
///
/// Input may be delivered in chunks through [`ByteStream::append_str`]. As long as the stream
/// is not closed, reading past the buffered input yields [`Character::StreamEmpty`] so callers
/// can suspend and resume once more input is available.
pub struct ByteStream {
    /// Normalized characters written so far
    buffer: Vec<char>,
    /// Current position in the buffer
    buffer_pos: usize,
    /// True when no more input will be appended
    closed: bool,
    /// A CR was seen at the end of the last chunk and still needs to be resolved
    pending_cr: bool,
    /// Configuration for the stream
    config: Config,
    /// Location of the character at `buffer_pos`
    location: LocationHandler,
}

/// Generic stream trait
pub trait Stream {
    /// Read current character
    fn read(&self) -> Character;
    /// Read current character and advance to next
    fn read_and_next(&mut self) -> Character;
    /// Look ahead in the stream
    fn look_ahead(&self, offset: usize) -> Character;
    /// Advance with 1 character
    fn next(&mut self);
    /// Advance with offset characters
    fn next_n(&mut self, offset: usize);
    /// Unread the current character
    fn prev(&mut self);
    /// Unread n characters
    fn prev_n(&mut self, n: usize);
    /// Closes the stream (no more data can be added)
    fn close(&mut self);
    /// Returns true when the stream is closed
    fn closed(&self) -> bool;
    /// Returns true when the stream is empty (but still open)
    fn exhausted(&self) -> bool;
    /// Returns true when the stream is closed and empty
    fn eof(&self) -> bool;
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Stream for ByteStream {
    fn read(&self) -> Character {
        self.look_ahead(0)
    }

    fn read_and_next(&mut self) -> Character {
        let ch = self.read();
        if let Ch(_) = ch {
            self.next();
        }
        ch
    }

    /// Looks ahead in the stream without moving the current position
    fn look_ahead(&self, offset: usize) -> Character {
        match self.buffer.get(self.buffer_pos + offset) {
            Some(c) => Ch(*c),
            None if self.closed => StreamEnd,
            None => StreamEmpty,
        }
    }

    fn next(&mut self) {
        self.next_n(1);
    }

    fn next_n(&mut self, offset: usize) {
        for _ in 0..offset {
            let Some(&c) = self.buffer.get(self.buffer_pos) else {
                return;
            };
            self.location.inc(c);
            self.buffer_pos += 1;
        }
    }

    fn prev(&mut self) {
        self.prev_n(1);
    }

    fn prev_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.buffer_pos == 0 {
                return;
            }
            self.buffer_pos -= 1;
            self.location.dec(self.buffer[self.buffer_pos]);
        }
    }

    /// Closes the stream so no more data can be added
    fn close(&mut self) {
        if self.pending_cr {
            self.pending_cr = false;
            self.buffer.push(if self.config.replace_cr_as_lf { CHAR_LF } else { CHAR_CR });
        }
        self.closed = true;
    }

    fn closed(&self) -> bool {
        self.closed
    }

    /// Returns true when all buffered characters have been read. Note that it does not check
    /// if the stream is closed. Use `closed` for that.
    fn exhausted(&self) -> bool {
        self.buffer_pos >= self.buffer.len()
    }

    fn eof(&self) -> bool {
        self.closed() && self.exhausted()
    }
}

impl ByteStream {
    /// Create a new default empty input stream
    #[must_use]
    pub fn new(config: Option<Config>) -> Self {
        Self::with_location(config, Location::default())
    }

    /// Create a new empty input stream whose first character lives at `start_location`. Used
    /// when the input is part of a larger document (inline fragments).
    #[must_use]
    pub fn with_location(config: Option<Config>, start_location: Location) -> Self {
        Self {
            buffer: Vec::new(),
            buffer_pos: 0,
            closed: false,
            pending_cr: false,
            config: config.unwrap_or_default(),
            location: LocationHandler::new(start_location),
        }
    }

    /// Populates the buffer with the given string and closes the stream
    pub fn read_from_str(&mut self, s: &str) {
        self.append_str(s);
        self.close();
    }

    /// Populates the buffer from raw UTF-8 bytes and closes the stream
    pub fn read_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let s = str::from_utf8(bytes).map_err(|e| Error::Encoding(e.to_string()))?;
        self.read_from_str(s);
        Ok(())
    }

    /// Appends a chunk of input to the end of the stream
    pub fn append_str(&mut self, s: &str) {
        if self.closed {
            log::warn!("ignoring {} bytes appended to a closed stream", s.len());
            return;
        }

        self.buffer.reserve(s.len());
        for c in s.chars() {
            self.push_char(c);
        }
    }

    /// Inserts the given string at the current read position. The inserted characters are the
    /// next ones to be read. This is what `document.write()` does while a script is executing.
    pub fn insert_at_current(&mut self, s: &str) {
        let mut normalized = Vec::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == CHAR_CR {
                if self.config.cr_lf_as_one && chars.peek() == Some(&CHAR_LF) {
                    continue;
                }
                if self.config.replace_cr_as_lf {
                    normalized.push(CHAR_LF);
                    continue;
                }
            }
            normalized.push(c);
        }

        let pos = self.buffer_pos;
        self.buffer.splice(pos..pos, normalized);
    }

    /// Returns the location of the current character
    pub fn location(&self) -> Location {
        self.location.cur_location
    }

    /// Returns the number of buffered characters that have not been read yet
    pub fn chars_left(&self) -> usize {
        self.buffer.len().saturating_sub(self.buffer_pos)
    }

    /// Returns the index of the current character in the normalized input
    pub fn position(&self) -> usize {
        self.buffer_pos
    }

    /// Matches `expected` against the upcoming characters without consuming anything
    pub fn match_ahead(&self, expected: &str, case_insensitive: bool) -> Lookahead {
        for (i, want) in expected.chars().enumerate() {
            match self.look_ahead(i) {
                Ch(c) if c == want || (case_insensitive && c.eq_ignore_ascii_case(&want)) => {}
                Ch(_) | StreamEnd => return Lookahead::NoMatch,
                StreamEmpty => return Lookahead::NeedMore,
            }
        }

        Lookahead::Match
    }

    fn push_char(&mut self, c: char) {
        if self.pending_cr {
            self.pending_cr = false;
            if c == CHAR_LF && self.config.cr_lf_as_one {
                self.buffer.push(CHAR_LF);
                return;
            }
            self.buffer.push(if self.config.replace_cr_as_lf { CHAR_LF } else { CHAR_CR });
        }

        // A CR cannot be resolved until we know the next character, which might live in the
        // next chunk.
        if c == CHAR_CR && (self.config.cr_lf_as_one || self.config.replace_cr_as_lf) {
            self.pending_cr = true;
            return;
        }

        self.buffer.push(c);
    }
}

/// Location holds the start position of the given element in the data source
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Line number, starting with 1
    pub line: usize,
    /// Column number, starting with 1
    pub column: usize,
    /// Byte offset in the normalized input, starting with 0
    pub offset: usize,
}

impl Default for Location {
    /// Default to line 1, column 1
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Location {
    /// Create a new Location
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl Debug for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.line, self.column)
    }
}

/// A start and end location in the source. The end location points just past the last
/// character of the span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Zero-width span at the given location
    pub fn at(location: Location) -> Self {
        Self::new(location, location)
    }
}

/// LocationHandler is a wrapper that will deal with line/column locations in the stream
pub struct LocationHandler {
    /// The start offset of the location. Normally this is 1:1, but can be different in case of inline streams
    pub start_location: Location,
    /// The current location of the stream
    pub cur_location: Location,
    /// List of all line number -> col size mappings
    line_endings: HashMap<usize, usize>,
}

impl LocationHandler {
    /// Create a new LocationHandler. Start_location can be set in case the stream is
    /// not starting at 1:1
    pub fn new(start_location: Location) -> Self {
        Self {
            start_location,
            cur_location: start_location,
            line_endings: HashMap::new(),
        }
    }

    /// Will decrease the current location based on the character that was stepped back over
    pub fn dec(&mut self, ch: char) {
        self.cur_location.offset = self.cur_location.offset.saturating_sub(ch.len_utf8());

        if ch == CHAR_LF && self.cur_location.line > self.start_location.line {
            self.cur_location.line -= 1;
            self.cur_location.column = self.line_endings.get(&self.cur_location.line).copied().unwrap_or(1);
            return;
        }

        if self.cur_location.column > 1 {
            self.cur_location.column -= 1;
        }
    }

    /// Will increase the current location based on the given character
    pub fn inc(&mut self, ch: char) {
        self.cur_location.offset += ch.len_utf8();

        if ch == CHAR_LF {
            self.line_endings.insert(self.cur_location.line, self.cur_location.column);
            self.cur_location.line += 1;
            self.cur_location.column = 1;
        } else {
            self.cur_location.column += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_stream(s: &str) -> ByteStream {
        let mut stream = ByteStream::new(None);
        stream.read_from_str(s);
        stream
    }

    #[test]
    fn test_stream() {
        let mut stream = closed_stream("foo");
        assert_eq!(stream.read_and_next(), Ch('f'));
        assert_eq!(stream.read_and_next(), Ch('o'));
        assert_eq!(stream.read_and_next(), Ch('o'));
        assert_eq!(stream.read_and_next(), StreamEnd);
        assert!(stream.eof());
    }

    #[test]
    fn stream_empty_until_closed() {
        let mut stream = ByteStream::new(None);
        stream.append_str("a");
        assert_eq!(stream.read_and_next(), Ch('a'));
        assert_eq!(stream.read(), StreamEmpty);
        assert!(stream.exhausted());
        assert!(!stream.eof());

        stream.append_str("b");
        assert_eq!(stream.read_and_next(), Ch('b'));
        stream.close();
        assert_eq!(stream.read(), StreamEnd);
    }

    #[test]
    fn test_crlf() {
        let mut stream = closed_stream("a\r\nb\rc");
        let chars: Vec<Character> = (0..6).map(|_| stream.read_and_next()).collect();
        assert_eq!(chars, vec![Ch('a'), Ch('\n'), Ch('b'), Ch('\n'), Ch('c'), StreamEnd]);
    }

    #[test]
    fn crlf_split_over_chunks() {
        let mut stream = ByteStream::new(None);
        stream.append_str("a\r");
        assert_eq!(stream.read_and_next(), Ch('a'));
        // The CR cannot be resolved yet
        assert_eq!(stream.read(), StreamEmpty);
        stream.append_str("\nb");
        assert_eq!(stream.read_and_next(), Ch('\n'));
        assert_eq!(stream.read_and_next(), Ch('b'));
    }

    #[test]
    fn trailing_cr_is_flushed_on_close() {
        let mut stream = ByteStream::new(None);
        stream.append_str("a\r");
        stream.close();
        stream.next();
        assert_eq!(stream.read_and_next(), Ch('\n'));
        assert_eq!(stream.read(), StreamEnd);
    }

    #[test]
    fn test_prev_and_location() {
        let mut stream = closed_stream("ab\ncd");
        stream.next_n(4);
        assert_eq!(stream.location(), Location::new(2, 2, 4));
        stream.prev_n(2);
        assert_eq!(stream.location(), Location::new(1, 3, 2));
        assert_eq!(stream.read(), Ch('\n'));
        stream.prev();
        assert_eq!(stream.read(), Ch('b'));
    }

    #[test]
    fn test_utf8_offsets() {
        let mut stream = closed_stream("é€x");
        stream.next_n(2);
        assert_eq!(stream.location(), Location::new(1, 3, 5));
        assert_eq!(stream.read(), Ch('x'));
    }

    #[test]
    fn test_match_ahead() {
        let mut stream = ByteStream::new(None);
        stream.append_str("DocT");
        assert_eq!(stream.match_ahead("doctype", true), Lookahead::NeedMore);
        assert_eq!(stream.match_ahead("doctype", false), Lookahead::NoMatch);
        assert_eq!(stream.match_ahead("--", false), Lookahead::NoMatch);
        stream.append_str("ype");
        assert_eq!(stream.match_ahead("DOCTYPE", true), Lookahead::Match);
    }

    #[test]
    fn insert_at_current_position() {
        let mut stream = closed_stream("ad");
        stream.next();
        stream.insert_at_current("b\r\nc");
        let rest: Vec<Character> = (0..4).map(|_| stream.read_and_next()).collect();
        assert_eq!(Character::slice_to_string(&rest), "b\ncd");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut stream = ByteStream::new(None);
        assert!(stream.read_from_bytes(&[0x61, 0xFF]).is_err());
    }
}
