//! Tree construction
//!
//! The [`Html5Parser`] is a parser session: it owns the tokenizer, the tree adapter and every
//! piece of tree construction state (insertion modes, the stack of open elements, the list of
//! active formatting elements and the flags from 13.2.4). Tokens are pulled from the tokenizer
//! one at a time and dispatched to the handler of the current insertion mode. Handlers that want
//! a token reprocessed set `reprocess_token`, and the dispatch loop runs again.
//!
//! The session can be driven incrementally: input is fed with [`Html5Parser::write`] and the
//! parser runs with [`Html5Parser::run`] until it needs more input, hits a script end tag (when
//! `pause_on_script` is set) or has finished.
pub mod quirks;

mod active_formatting;
mod foreign;
mod helper;
mod in_body;
mod open_elements;
mod tables;

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use tessera_shared::byte_stream::{ByteStream, Config, Span, Stream};
use tessera_shared::types::{Error, ParseError, Result};

use crate::errors::{ErrorLogger, ParseErrorCallback, ParserError};
use crate::parser::active_formatting::ActiveFormattingElements;
use crate::parser::open_elements::{OpenElements, StackEntry};
use crate::parser::quirks::{identify_quirks_mode, is_conforming_doctype, QuirksMode};
use crate::tokenizer::state::State;
use crate::tokenizer::token::Token;
use crate::tokenizer::{Options, Tokenizer};
use crate::tree_adapter::{Namespace, TreeAdapter};

pub(crate) const CHAR_REPLACEMENT_STR: &str = "\u{FFFD}";

/// Insertion modes as defined in 13.2.4.1
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    InTemplate,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
}

/// Options for a parser session
pub struct Html5ParserOptions {
    /// When false, `<noscript>` content is parsed as markup instead of raw text
    pub scripting_enabled: bool,
    /// Record source locations on the nodes that are created
    pub source_location_info: bool,
    /// Suspend the parser after each script end tag so the embedder can run the script
    pub pause_on_script: bool,
    /// Receives every parse error as it is found
    pub on_parse_error: Option<ParseErrorCallback>,
    /// Newline handling of the input stream
    pub stream_config: Option<Config>,
}

impl Default for Html5ParserOptions {
    fn default() -> Self {
        Self {
            scripting_enabled: true,
            source_location_info: false,
            pause_on_script: false,
            on_parse_error: None,
            stream_config: None,
        }
    }
}

impl Html5ParserOptions {
    pub fn with_scripting(mut self, enabled: bool) -> Self {
        self.scripting_enabled = enabled;
        self
    }

    pub fn with_source_locations(mut self, enabled: bool) -> Self {
        self.source_location_info = enabled;
        self
    }

    pub fn with_pause_on_script(mut self, enabled: bool) -> Self {
        self.pause_on_script = enabled;
        self
    }

    /// Sets the parse error callback. Errors carry locations, so this turns on source location
    /// tracking as well.
    pub fn with_parse_error_callback(mut self, callback: ParseErrorCallback) -> Self {
        self.on_parse_error = Some(callback);
        self.source_location_info = true;
        self
    }

    pub fn with_stream_config(mut self, config: Config) -> Self {
        self.stream_config = Some(config);
        self
    }
}

/// Result of driving the parser with [`Html5Parser::run`]
#[derive(Debug, PartialEq)]
pub enum ParserStatus<H> {
    /// All buffered input has been consumed. Write more input or call `end()`.
    NeedMoreInput,
    /// A script element has been closed. Call `resume()` after running it.
    ScriptPending(H),
    /// The end of the input has been processed
    Finished,
}

/// Outcome of a parse
pub struct Parsed<A: TreeAdapter> {
    pub adapter: A,
    /// The document, or the document fragment when parsing a fragment
    pub root: A::Handle,
    pub errors: Vec<ParseError>,
}

/// The main parser object
pub struct Html5Parser<A: TreeAdapter> {
    /// tokenizer object
    tokenizer: Tokenizer,
    /// tree the parser builds into
    adapter: A,
    /// the document node of the tree
    document: A::Handle,
    /// current insertion mode
    insertion_mode: InsertionMode,
    /// original insertion mode (used for text mode)
    original_insertion_mode: InsertionMode,
    /// template insertion mode stack
    template_insertion_mode: Vec<InsertionMode>,
    /// Stack of open elements
    open_elements: OpenElements<A::Handle>,
    /// List of active formatting elements or markers
    active_formatting_elements: ActiveFormattingElements<A::Handle>,
    /// Current head element
    head_element: Option<A::Handle>,
    /// Current form element
    form_element: Option<A::Handle>,
    /// if true, we can insert a frameset
    frameset_ok: bool,
    /// Foster parenting flag
    foster_parenting: bool,
    /// Character tokens collected in the "in table text" insertion mode
    pending_table_character_tokens: Vec<Token>,
    /// If true, the current token should be processed again
    reprocess_token: bool,
    /// Acknowledge self-closing tags
    ack_self_closing: bool,
    /// Ignore when next token starts with a LF
    ignore_lf: bool,
    /// If true, scripting is enabled
    scripting_enabled: bool,
    source_location_info: bool,
    pause_on_script: bool,
    /// Context element when parsing a fragment
    context: Option<StackEntry<A::Handle>>,
    /// The html element that holds the parsed fragment
    fragment_root: Option<A::Handle>,
    /// Script element the embedder has to run before the parser continues
    pending_script: Option<A::Handle>,
    /// Markup written with `document_write` while the script is pending
    pending_writes: Vec<String>,
    /// When true, the parser is finished and should not consume more tokens
    parser_finished: bool,
    /// Span of the token currently processed, used for parse errors
    token_span: Span,
    /// Error logger, which is shared with the tokenizer
    error_logger: Rc<RefCell<ErrorLogger>>,
}

impl<A: TreeAdapter> Html5Parser<A> {
    fn init(adapter: A, tokenizer_options: Option<Options>, options: Option<Html5ParserOptions>) -> Self {
        let options = options.unwrap_or_default();

        let source_location_info = options.source_location_info || options.on_parse_error.is_some();
        let error_logger = Rc::new(RefCell::new(match options.on_parse_error {
            Some(callback) => ErrorLogger::with_callback(callback),
            None => ErrorLogger::new(),
        }));

        let stream = ByteStream::new(options.stream_config);
        let tokenizer = Tokenizer::new(stream, tokenizer_options, error_logger.clone());
        let document = adapter.document();

        Self {
            tokenizer,
            adapter,
            document,
            insertion_mode: InsertionMode::Initial,
            original_insertion_mode: InsertionMode::Initial,
            template_insertion_mode: Vec::new(),
            open_elements: OpenElements::default(),
            active_formatting_elements: ActiveFormattingElements::default(),
            head_element: None,
            form_element: None,
            frameset_ok: true,
            foster_parenting: false,
            pending_table_character_tokens: Vec::new(),
            reprocess_token: false,
            ack_self_closing: false,
            ignore_lf: false,
            scripting_enabled: options.scripting_enabled,
            source_location_info,
            pause_on_script: options.pause_on_script,
            context: None,
            fragment_root: None,
            pending_script: None,
            pending_writes: Vec::new(),
            parser_finished: false,
            token_span: Span::default(),
            error_logger,
        }
    }

    /// Creates a parser session that builds a whole document into the adapter
    pub fn new_document(adapter: A, options: Option<Html5ParserOptions>) -> Self {
        debug!("starting document parser");
        Self::init(adapter, None, options)
    }

    /// Creates a parser session for the HTML fragment parsing algorithm (13.4). The context
    /// element lives in the adapter's tree. Without a context a `<template>` element is used,
    /// which accepts nearly any content.
    pub fn new_fragment(mut adapter: A, context: Option<A::Handle>, options: Option<Html5ParserOptions>) -> Self {
        let context = match context {
            Some(context) => context,
            None => adapter.create_element("template", Namespace::Html, Vec::new()),
        };

        let name = adapter.tag_name(&context).to_string();
        let namespace = adapter.namespace(&context);
        let scripting_enabled = options.as_ref().map_or(true, |options| options.scripting_enabled);

        let initial_state = if namespace == Namespace::Html {
            match name.as_str() {
                "title" | "textarea" => State::RCDATA,
                "style" | "xmp" | "iframe" | "noembed" | "noframes" => State::RAWTEXT,
                "script" => State::ScriptData,
                "noscript" if scripting_enabled => State::RAWTEXT,
                "plaintext" => State::PLAINTEXT,
                _ => State::Data,
            }
        } else {
            State::Data
        };

        let tokenizer_options = Options {
            initial_state,
            last_start_tag: name.clone(),
        };

        debug!("starting fragment parser with context <{name}>");

        let mut context_entry = StackEntry::new(context.clone(), &name, namespace);
        context_entry.html_integration_point = match namespace {
            Namespace::Svg => matches!(name.as_str(), "foreignObject" | "desc" | "title"),
            Namespace::MathMl => {
                name == "annotation-xml" && foreign::is_html_annotation_xml(&adapter.attr_list(&context))
            }
            _ => false,
        };

        let mut parser = Self::init(adapter, Some(tokenizer_options), options);

        // The root is never attached to the document. Its children become the fragment.
        let root = parser.adapter.create_element("html", Namespace::Html, Vec::new());
        parser.open_elements.push(StackEntry::new(root.clone(), "html", Namespace::Html));
        parser.fragment_root = Some(root);

        if context_entry.is_html("template") {
            parser.template_insertion_mode.push(InsertionMode::InTemplate);
        }
        parser.context = Some(context_entry);
        parser.reset_insertion_mode();

        let mut node = Some(context);
        while let Some(current) = node {
            if parser.adapter.is_element_node(&current)
                && parser.adapter.namespace(&current) == Namespace::Html
                && parser.adapter.tag_name(&current) == "form"
            {
                parser.form_element = Some(current);
                break;
            }
            node = parser.adapter.parent_node(&current);
        }

        parser
    }

    /// Parses a complete document
    pub fn parse_document(adapter: A, html: &str, options: Option<Html5ParserOptions>) -> Parsed<A> {
        let mut parser = Self::new_document(adapter, options);
        parser.tokenizer.write(html);
        parser.finish()
    }

    /// Parses `html` as if it was assigned to the `innerHTML` of the context element
    pub fn parse_fragment(
        adapter: A,
        context: Option<A::Handle>,
        html: &str,
        options: Option<Html5ParserOptions>,
    ) -> Parsed<A> {
        let mut parser = Self::new_fragment(adapter, context, options);
        parser.tokenizer.write(html);
        parser.finish()
    }

    /// Appends a chunk of input
    pub fn write(&mut self, chunk: &str) -> Result<()> {
        if self.tokenizer.stream.closed() {
            return Err(Error::State("cannot write to a parser after end()".to_string()).into());
        }

        self.tokenizer.write(chunk);
        Ok(())
    }

    /// Marks the end of the input
    pub fn end(&mut self) {
        self.tokenizer.end();
    }

    /// Runs the parser on the input written so far
    pub fn run(&mut self) -> ParserStatus<A::Handle> {
        loop {
            if self.parser_finished {
                return ParserStatus::Finished;
            }

            if let Some(script) = &self.pending_script {
                return ParserStatus::ScriptPending(script.clone());
            }

            let Some(token) = self.tokenizer.next_token() else {
                return ParserStatus::NeedMoreInput;
            };

            self.process_token(token);
        }
    }

    /// Writes markup at the current input position, like `document.write()` from a running
    /// script. While a script is pending the markup is queued until `resume()`.
    pub fn document_write(&mut self, markup: &str) {
        if self.parser_finished {
            warn!("document_write called on a finished parser, ignoring");
            return;
        }

        if self.pending_script.is_some() {
            self.pending_writes.push(markup.to_string());
            return;
        }

        warn!("document_write called without a pending script");
        self.tokenizer.insert_at_current(markup);
    }

    /// Continues parsing after a pending script has been run
    pub fn resume(&mut self) {
        if self.pending_script.take().is_none() {
            warn!("resume called without a pending script");
            return;
        }

        // Each write is inserted at the same position, so the last one goes in first
        let writes = std::mem::take(&mut self.pending_writes);
        for markup in writes.iter().rev() {
            self.tokenizer.insert_at_current(markup);
        }

        debug!("resuming parser after script");
        self.tokenizer.resume();
    }

    /// Returns the script element the parser is waiting on
    pub fn pending_script(&self) -> Option<&A::Handle> {
        self.pending_script.as_ref()
    }

    /// Returns the tree built so far
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Returns the errors found so far
    pub fn errors(&self) -> Vec<ParseError> {
        self.error_logger.borrow().get_errors()
    }

    /// Ends the input, parses whatever is left and returns the result. Pending scripts are
    /// resumed without running them.
    pub fn finish(mut self) -> Parsed<A> {
        self.end();

        loop {
            match self.run() {
                ParserStatus::Finished => break,
                ParserStatus::ScriptPending(_) => self.resume(),
                ParserStatus::NeedMoreInput => {
                    warn!("parser needs more input after the end of the stream");
                    break;
                }
            }
        }

        let root = match self.fragment_root.take() {
            Some(html) => {
                let fragment = self.adapter.create_document_fragment();
                for child in self.adapter.child_nodes(&html) {
                    self.adapter.append_child(&fragment, &child);
                }
                fragment
            }
            None => self.document.clone(),
        };

        debug!("parser finished");

        let errors = self.error_logger.borrow_mut().take_errors();
        Parsed {
            adapter: self.adapter,
            root,
            errors,
        }
    }

    fn process_token(&mut self, mut token: Token) {
        if self.ignore_lf {
            self.ignore_lf = false;
            if let Token::Whitespace { text, location } = &token {
                if let Some(rest) = text.strip_prefix('\n') {
                    if rest.is_empty() {
                        return;
                    }
                    token = Token::Whitespace {
                        text: rest.to_string(),
                        location: *location,
                    };
                }
            }
        }

        self.token_span = token.location();
        self.ack_self_closing = false;

        let mut foreign = self.should_process_in_foreign_content(&token);
        loop {
            self.reprocess_token = false;

            #[cfg(feature = "debug_parser")]
            log::trace!("{:?} (foreign: {foreign}): {token}", self.insertion_mode);

            if foreign {
                self.process_foreign_content(&token);
            } else {
                self.process_html_content(&token);
            }

            if !self.reprocess_token {
                break;
            }
            foreign = false;
        }

        if let Token::StartTag {
            is_self_closing: true, ..
        } = token
        {
            if !self.ack_self_closing {
                self.parse_error(ParserError::NonVoidHtmlElementStartTagWithTrailingSolidus);
            }
        }

        self.tokenizer.in_foreign_node = self
            .adjusted_current_node()
            .is_some_and(|node| node.namespace != Namespace::Html);

        if token.is_eof() {
            self.parser_finished = true;
        }
    }

    /// Processes a token with the rules of the current insertion mode
    pub(crate) fn process_html_content(&mut self, token: &Token) {
        match self.insertion_mode {
            InsertionMode::Initial => self.handle_initial(token),
            InsertionMode::BeforeHtml => self.handle_before_html(token),
            InsertionMode::BeforeHead => self.handle_before_head(token),
            InsertionMode::InHead => self.handle_in_head(token),
            InsertionMode::InHeadNoscript => self.handle_in_head_noscript(token),
            InsertionMode::AfterHead => self.handle_after_head(token),
            InsertionMode::InBody => self.handle_in_body(token),
            InsertionMode::Text => self.handle_text(token),
            InsertionMode::InTable => self.handle_in_table(token),
            InsertionMode::InTableText => self.handle_in_table_text(token),
            InsertionMode::InCaption => self.handle_in_caption(token),
            InsertionMode::InColumnGroup => self.handle_in_column_group(token),
            InsertionMode::InTableBody => self.handle_in_table_body(token),
            InsertionMode::InRow => self.handle_in_row(token),
            InsertionMode::InCell => self.handle_in_cell(token),
            InsertionMode::InSelect => self.handle_in_select(token),
            InsertionMode::InSelectInTable => self.handle_in_select_in_table(token),
            InsertionMode::InTemplate => self.handle_in_template(token),
            InsertionMode::AfterBody => self.handle_after_body(token),
            InsertionMode::InFrameset => self.handle_in_frameset(token),
            InsertionMode::AfterFrameset => self.handle_after_frameset(token),
            InsertionMode::AfterAfterBody => self.handle_after_after_body(token),
            InsertionMode::AfterAfterFrameset => self.handle_after_after_frameset(token),
        }
    }

    /// Reports a parse error at the location of the current token
    pub(crate) fn parse_error(&self, error: ParserError) {
        self.error_logger
            .borrow_mut()
            .add_error(self.token_span.start, self.token_span.end, error.as_str());
    }

    /// Called when a script element has been closed
    pub(crate) fn handle_script_end(&mut self, script: A::Handle) {
        if self.pause_on_script {
            debug!("suspending parser for script");
            self.pending_script = Some(script);
            self.tokenizer.pause();
        }
    }

    pub(crate) fn is_fragment_case(&self) -> bool {
        self.context.is_some()
    }

    pub(crate) fn stop_parsing(&mut self) {
        self.open_elements.truncate(0);
        self.parser_finished = true;
    }

    fn switch_mode(&mut self, mode: InsertionMode) {
        #[cfg(feature = "debug_parser")]
        log::trace!("switching insertion mode {:?} -> {mode:?}", self.insertion_mode);

        self.insertion_mode = mode;
    }

    fn reprocess_in(&mut self, mode: InsertionMode) {
        self.switch_mode(mode);
        self.reprocess_token = true;
    }

    fn handle_initial(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => {}
            Token::Comment { .. } => {
                let document = self.document.clone();
                self.insert_comment(token, Some(document));
            }
            Token::DocType {
                name,
                force_quirks,
                pub_identifier,
                sys_identifier,
                ..
            } => {
                let name = name.as_deref();
                let public_id = pub_identifier.as_deref();
                let system_id = sys_identifier.as_deref();

                if !is_conforming_doctype(name, public_id, system_id) {
                    self.parse_error(ParserError::NonConformingDoctype);
                }

                self.adapter.set_document_type(
                    &self.document,
                    name.unwrap_or_default(),
                    public_id.unwrap_or_default(),
                    system_id.unwrap_or_default(),
                );

                let mode = identify_quirks_mode(name, public_id, system_id, *force_quirks);
                self.adapter.set_document_mode(&self.document, mode);

                self.switch_mode(InsertionMode::BeforeHtml);
            }
            _ => {
                self.parse_error(ParserError::MissingDoctype);
                self.adapter.set_document_mode(&self.document, QuirksMode::Quirks);
                self.reprocess_in(InsertionMode::BeforeHtml);
            }
        }
    }

    fn handle_before_html(&mut self, token: &Token) {
        match token {
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::Comment { .. } => {
                let document = self.document.clone();
                self.insert_comment(token, Some(document));
            }
            Token::Whitespace { .. } => {}
            Token::StartTag { name, .. } if name == "html" => {
                self.insert_html_element(token);
                self.switch_mode(InsertionMode::BeforeHead);
            }
            Token::EndTag { name, .. } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_error(ParserError::UnexpectedEndTag);
            }
            _ => {
                self.insert_implied_element("html");
                self.reprocess_in(InsertionMode::BeforeHead);
            }
        }
    }

    fn handle_before_head(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => {}
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body(token),
            Token::StartTag { name, .. } if name == "head" => {
                let head = self.insert_html_element(token);
                self.head_element = Some(head);
                self.switch_mode(InsertionMode::InHead);
            }
            Token::EndTag { name, .. } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_error(ParserError::UnexpectedEndTag);
            }
            _ => {
                let head = self.insert_implied_element("head");
                self.head_element = Some(head);
                self.reprocess_in(InsertionMode::InHead);
            }
        }
    }

    pub(crate) fn handle_in_head(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => self.insert_character_token(token),
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } => match name.as_str() {
                "html" => self.handle_in_body(token),
                "base" | "basefont" | "bgsound" | "link" | "meta" => {
                    self.insert_html_element(token);
                    self.open_elements.pop();
                    self.ack_self_closing = true;
                }
                "title" => self.parse_generic_text_element(token, State::RCDATA),
                "noscript" if self.scripting_enabled => self.parse_generic_text_element(token, State::RAWTEXT),
                "noframes" | "style" => self.parse_generic_text_element(token, State::RAWTEXT),
                "noscript" => {
                    self.insert_html_element(token);
                    self.switch_mode(InsertionMode::InHeadNoscript);
                }
                "script" => self.parse_generic_text_element(token, State::ScriptData),
                "template" => {
                    self.insert_html_element(token);
                    self.active_formatting_elements.insert_marker();
                    self.frameset_ok = false;
                    self.switch_mode(InsertionMode::InTemplate);
                    self.template_insertion_mode.push(InsertionMode::InTemplate);
                }
                "head" => self.parse_error(ParserError::MisplacedStartTagForHeadElement),
                _ => self.anything_else_in_head(),
            },
            Token::EndTag { name, .. } => match name.as_str() {
                "head" => {
                    if let Some(entry) = self.open_elements.pop() {
                        self.close_element_location(&entry.handle, token);
                    }
                    self.switch_mode(InsertionMode::AfterHead);
                }
                "body" | "html" | "br" => self.anything_else_in_head(),
                "template" => self.close_template_element(token),
                _ => self.parse_error(ParserError::UnexpectedEndTag),
            },
            _ => self.anything_else_in_head(),
        }
    }

    fn anything_else_in_head(&mut self) {
        self.open_elements.pop();
        self.reprocess_in(InsertionMode::AfterHead);
    }

    /// Handles a `</template>` end tag in the "in head" insertion mode
    fn close_template_element(&mut self, token: &Token) {
        if !self.has_template_on_stack() {
            self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
            return;
        }

        self.open_elements.generate_implied_end_tags_thoroughly();
        if !self.open_elements.current_is_html("template") {
            self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
        }
        self.pop_until_named("template", token);
        self.active_formatting_elements.clear_to_last_marker();
        self.template_insertion_mode.pop();
        self.reset_insertion_mode();
    }

    fn handle_in_head_noscript(&mut self, token: &Token) {
        match token {
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body(token),
            Token::EndTag { name, .. } if name == "noscript" => {
                if let Some(entry) = self.open_elements.pop() {
                    self.close_element_location(&entry.handle, token);
                }
                self.switch_mode(InsertionMode::InHead);
            }
            Token::Whitespace { .. } | Token::Comment { .. } => self.handle_in_head(token),
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style"
                ) =>
            {
                self.handle_in_head(token)
            }
            Token::StartTag { name, .. } if name == "head" || name == "noscript" => {
                self.parse_error(ParserError::NestedNoscriptInHead);
            }
            Token::EndTag { name, .. } if name != "br" => self.parse_error(ParserError::UnexpectedEndTag),
            _ => {
                self.parse_error(ParserError::DisallowedContentInNoscriptInHead);
                self.open_elements.pop();
                self.reprocess_in(InsertionMode::InHead);
            }
        }
    }

    fn handle_after_head(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => self.insert_character_token(token),
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } => match name.as_str() {
                "html" => self.handle_in_body(token),
                "body" => {
                    self.insert_html_element(token);
                    self.frameset_ok = false;
                    self.switch_mode(InsertionMode::InBody);
                }
                "frameset" => {
                    self.insert_html_element(token);
                    self.switch_mode(InsertionMode::InFrameset);
                }
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template"
                | "title" => {
                    self.parse_error(ParserError::AbandonedHeadElementChild);

                    let Some(head) = self.head_element.clone() else {
                        self.handle_in_head(token);
                        return;
                    };
                    self.open_elements
                        .push(StackEntry::new(head.clone(), "head", Namespace::Html));
                    self.handle_in_head(token);
                    self.open_elements.remove(&head);
                }
                "head" => self.parse_error(ParserError::MisplacedStartTagForHeadElement),
                _ => self.anything_else_after_head(),
            },
            Token::EndTag { name, .. } => match name.as_str() {
                "template" => self.handle_in_head(token),
                "body" | "html" | "br" => self.anything_else_after_head(),
                _ => self.parse_error(ParserError::UnexpectedEndTag),
            },
            _ => self.anything_else_after_head(),
        }
    }

    fn anything_else_after_head(&mut self) {
        self.insert_implied_element("body");
        self.reprocess_in(InsertionMode::InBody);
    }

    fn handle_text(&mut self, token: &Token) {
        match token {
            Token::Text { .. } | Token::Whitespace { .. } | Token::NullCharacter { .. } => {
                self.insert_character_token(token);
            }
            Token::Eof { .. } => {
                self.parse_error(ParserError::EofInElementThatCanContainOnlyText);
                self.open_elements.pop();
                self.reprocess_in(self.original_insertion_mode);
            }
            Token::EndTag { name, .. } => {
                let Some(entry) = self.open_elements.pop() else {
                    return;
                };
                self.close_element_location(&entry.handle, token);
                self.switch_mode(self.original_insertion_mode);

                if name == "script" {
                    self.handle_script_end(entry.handle);
                }
            }
            _ => {}
        }
    }

    fn handle_after_body(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => self.handle_in_body(token),
            Token::Comment { .. } => {
                let html = self.open_elements.first().map(|entry| entry.handle.clone());
                self.insert_comment(token, html);
            }
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body(token),
            Token::EndTag { name, .. } if name == "html" => {
                if self.is_fragment_case() {
                    self.parse_error(ParserError::UnexpectedEndTag);
                    return;
                }

                if let Some(html) = self.open_elements.first().map(|entry| entry.handle.clone()) {
                    self.close_element_location(&html, token);
                }
                self.switch_mode(InsertionMode::AfterAfterBody);
            }
            Token::Eof { .. } => self.stop_parsing(),
            _ => {
                self.parse_error(ParserError::UnexpectedToken);
                self.reprocess_in(InsertionMode::InBody);
            }
        }
    }

    fn handle_in_frameset(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => self.insert_character_token(token),
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } => match name.as_str() {
                "html" => self.handle_in_body(token),
                "frameset" => {
                    self.insert_html_element(token);
                }
                "frame" => {
                    self.insert_html_element(token);
                    self.open_elements.pop();
                    self.ack_self_closing = true;
                }
                "noframes" => self.handle_in_head(token),
                _ => self.parse_error(ParserError::UnexpectedStartTag),
            },
            Token::EndTag { name, .. } if name == "frameset" => {
                if self.open_elements.len() <= 1 {
                    self.parse_error(ParserError::UnexpectedEndTag);
                    return;
                }

                if let Some(entry) = self.open_elements.pop() {
                    self.close_element_location(&entry.handle, token);
                }

                if !self.is_fragment_case() && !self.open_elements.current_is_html("frameset") {
                    self.switch_mode(InsertionMode::AfterFrameset);
                }
            }
            Token::Eof { .. } => {
                if self.open_elements.len() > 1 {
                    self.parse_error(ParserError::OpenElementsLeftAfterEof);
                }
                self.stop_parsing();
            }
            Token::EndTag { .. } => self.parse_error(ParserError::UnexpectedEndTag),
            _ => self.parse_error(ParserError::UnexpectedCharacter),
        }
    }

    fn handle_after_frameset(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => self.insert_character_token(token),
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body(token),
            Token::EndTag { name, .. } if name == "html" => {
                if let Some(html) = self.open_elements.first().map(|entry| entry.handle.clone()) {
                    self.close_element_location(&html, token);
                }
                self.switch_mode(InsertionMode::AfterAfterFrameset);
            }
            Token::StartTag { name, .. } if name == "noframes" => self.handle_in_head(token),
            Token::Eof { .. } => self.stop_parsing(),
            Token::StartTag { .. } => self.parse_error(ParserError::UnexpectedStartTag),
            Token::EndTag { .. } => self.parse_error(ParserError::UnexpectedEndTag),
            _ => self.parse_error(ParserError::UnexpectedCharacter),
        }
    }

    fn handle_after_after_body(&mut self, token: &Token) {
        match token {
            Token::Comment { .. } => {
                let document = self.document.clone();
                self.insert_comment(token, Some(document));
            }
            Token::DocType { .. } | Token::Whitespace { .. } => self.handle_in_body(token),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body(token),
            Token::Eof { .. } => self.stop_parsing(),
            _ => {
                self.parse_error(ParserError::UnexpectedToken);
                self.reprocess_in(InsertionMode::InBody);
            }
        }
    }

    fn handle_after_after_frameset(&mut self, token: &Token) {
        match token {
            Token::Comment { .. } => {
                let document = self.document.clone();
                self.insert_comment(token, Some(document));
            }
            Token::DocType { .. } | Token::Whitespace { .. } => self.handle_in_body(token),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body(token),
            Token::StartTag { name, .. } if name == "noframes" => self.handle_in_head(token),
            Token::Eof { .. } => self.stop_parsing(),
            Token::StartTag { .. } => self.parse_error(ParserError::UnexpectedStartTag),
            Token::EndTag { .. } => self.parse_error(ParserError::UnexpectedEndTag),
            _ => self.parse_error(ParserError::UnexpectedCharacter),
        }
    }
}
