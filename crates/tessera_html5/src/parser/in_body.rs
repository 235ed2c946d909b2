use crate::elements::is_special;
use crate::errors::ParserError;
use crate::parser::foreign::{adjust_foreign_attributes, adjust_mathml_attributes, adjust_svg_attributes};
use crate::parser::quirks::QuirksMode;
use crate::parser::{Html5Parser, InsertionMode};
use crate::tokenizer::state::State;
use crate::tokenizer::token::{Attribute, Token};
use crate::tree_adapter::{Namespace, TreeAdapter};

/// Elements that may still be open at the end of the body without a parse error
const ALLOWED_OPEN_AT_EOF: [&str; 18] = [
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc", "tbody", "td", "tfoot", "th", "thead",
    "tr", "body", "html",
];

const BLOCK_START_TAGS: [&str; 25] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "center",
    "details",
    "dialog",
    "dir",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "header",
    "hgroup",
    "main",
    "menu",
    "nav",
    "ol",
    "p",
    "search",
    "section",
    "summary",
    "ul",
];

const BLOCK_END_TAGS: [&str; 27] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "button",
    "center",
    "details",
    "dialog",
    "dir",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "header",
    "hgroup",
    "listing",
    "main",
    "menu",
    "nav",
    "ol",
    "pre",
    "search",
    "section",
    "summary",
    "ul",
];

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

const FORMATTING_END_TAGS: [&str; 14] = [
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt", "u",
];

impl<A: TreeAdapter> Html5Parser<A> {
    /// 13.2.6.4.7 The "in body" insertion mode
    pub(crate) fn handle_in_body(&mut self, token: &Token) {
        match token {
            Token::NullCharacter { .. } => self.parse_error(ParserError::UnexpectedNullCharacter),
            Token::Whitespace { .. } => {
                self.reconstruct_active_formatting_elements();
                self.insert_character_token(token);
            }
            Token::Text { .. } => {
                self.reconstruct_active_formatting_elements();
                self.insert_character_token(token);
                self.frameset_ok = false;
            }
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } => self.handle_in_body_start_tag(name, token),
            Token::EndTag { name, .. } => self.handle_in_body_end_tag(name, token),
            Token::Eof { .. } => {
                if !self.template_insertion_mode.is_empty() {
                    self.handle_in_template(token);
                    return;
                }

                self.check_open_elements_at_end();
                self.stop_parsing();
            }
        }
    }

    fn check_open_elements_at_end(&mut self) {
        if self
            .open_elements
            .iter()
            .any(|entry| !entry.is_html_one_of(&ALLOWED_OPEN_AT_EOF))
        {
            self.parse_error(ParserError::OpenElementsLeftAfterEof);
        }
    }

    fn handle_in_body_start_tag(&mut self, name: &str, token: &Token) {
        match name {
            "html" => {
                self.parse_error(ParserError::UnexpectedStartTag);
                if self.has_template_on_stack() {
                    return;
                }
                if let (Some(html), Token::StartTag { attributes, .. }) = (self.open_elements.first(), token) {
                    let html = html.handle.clone();
                    self.adapter.adopt_attributes(&html, attributes);
                }
            }
            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template"
            | "title" => self.handle_in_head(token),
            "body" => {
                self.parse_error(ParserError::UnexpectedStartTag);

                let body = match self.open_elements.get(1) {
                    Some(body) if body.is_html("body") => body.handle.clone(),
                    _ => return,
                };
                if self.has_template_on_stack() {
                    return;
                }

                self.frameset_ok = false;
                if let Token::StartTag { attributes, .. } = token {
                    self.adapter.adopt_attributes(&body, attributes);
                }
            }
            "frameset" => {
                self.parse_error(ParserError::UnexpectedStartTag);

                let body = match self.open_elements.get(1) {
                    Some(body) if body.is_html("body") => body.handle.clone(),
                    _ => return,
                };
                if !self.frameset_ok {
                    return;
                }

                self.adapter.detach_node(&body);
                self.open_elements.pop_all_up_to_html_element();
                self.insert_html_element(token);
                self.switch_mode(InsertionMode::InFrameset);
            }
            _ if BLOCK_START_TAGS.contains(&name) => {
                self.close_p_element_in_button_scope(token);
                self.insert_html_element(token);
            }
            _ if HEADINGS.contains(&name) => {
                self.close_p_element_in_button_scope(token);
                if self.open_elements.current_is_html_one_of(&HEADINGS) {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    self.open_elements.pop();
                }
                self.insert_html_element(token);
            }
            "pre" | "listing" => {
                self.close_p_element_in_button_scope(token);
                self.insert_html_element(token);
                self.ignore_lf = true;
                self.frameset_ok = false;
            }
            "form" => {
                if self.form_element.is_some() && !self.has_template_on_stack() {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    return;
                }

                self.close_p_element_in_button_scope(token);
                let form = self.insert_html_element(token);
                if !self.has_template_on_stack() {
                    self.form_element = Some(form);
                }
            }
            "li" => {
                self.frameset_ok = false;
                self.close_list_item(&["li"], token);
                self.close_p_element_in_button_scope(token);
                self.insert_html_element(token);
            }
            "dd" | "dt" => {
                self.frameset_ok = false;
                self.close_list_item(&["dd", "dt"], token);
                self.close_p_element_in_button_scope(token);
                self.insert_html_element(token);
            }
            "plaintext" => {
                self.close_p_element_in_button_scope(token);
                self.insert_html_element(token);
                self.tokenizer.set_state(State::PLAINTEXT);
            }
            "button" => {
                if self.open_elements.has_in_scope("button") {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    self.open_elements.generate_implied_end_tags(None);
                    self.open_elements.pop_until_tag_name_popped("button");
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(token);
                self.frameset_ok = false;
            }
            "a" => {
                if let Some(existing) = self
                    .active_formatting_elements
                    .element_in_scope_with_tag_name("a")
                    .map(|(handle, _)| handle.clone())
                {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    self.adoption_agency_algorithm(token);
                    self.active_formatting_elements.remove(&existing);
                    self.open_elements.remove(&existing);
                }

                self.insert_formatting_element(token);
            }
            "b" | "big" | "code" | "em" | "font" | "i" | "s" | "small" | "strike" | "strong" | "tt" | "u" => {
                self.insert_formatting_element(token);
            }
            "nobr" => {
                self.reconstruct_active_formatting_elements();
                if self.open_elements.has_in_scope("nobr") {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    self.adoption_agency_algorithm(token);
                }
                self.insert_formatting_element(token);
            }
            "applet" | "marquee" | "object" => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(token);
                self.active_formatting_elements.insert_marker();
                self.frameset_ok = false;
            }
            "table" => {
                if self.adapter.get_document_mode(&self.document) != QuirksMode::Quirks {
                    self.close_p_element_in_button_scope(token);
                }
                self.insert_html_element(token);
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::InTable);
            }
            "area" | "br" | "embed" | "img" | "keygen" | "wbr" => {
                self.reconstruct_active_formatting_elements();
                self.insert_void_element(token);
                self.frameset_ok = false;
            }
            "input" => {
                self.reconstruct_active_formatting_elements();
                self.insert_void_element(token);
                if !token
                    .attribute("type")
                    .is_some_and(|value| value.eq_ignore_ascii_case("hidden"))
                {
                    self.frameset_ok = false;
                }
            }
            "param" | "source" | "track" => self.insert_void_element(token),
            "hr" => {
                self.close_p_element_in_button_scope(token);
                self.insert_void_element(token);
                self.frameset_ok = false;
            }
            "image" => {
                self.parse_error(ParserError::UnexpectedStartTag);
                let mut img = token.clone();
                if let Token::StartTag { name, .. } = &mut img {
                    *name = "img".to_string();
                }
                self.handle_in_body(&img);
            }
            "textarea" => {
                self.insert_html_element(token);
                self.ignore_lf = true;
                self.tokenizer.set_state(State::RCDATA);
                self.original_insertion_mode = self.insertion_mode;
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::Text);
            }
            "xmp" => {
                self.close_p_element_in_button_scope(token);
                self.reconstruct_active_formatting_elements();
                self.frameset_ok = false;
                self.parse_generic_text_element(token, State::RAWTEXT);
            }
            "iframe" => {
                self.frameset_ok = false;
                self.parse_generic_text_element(token, State::RAWTEXT);
            }
            "noembed" => self.parse_generic_text_element(token, State::RAWTEXT),
            "noscript" if self.scripting_enabled => self.parse_generic_text_element(token, State::RAWTEXT),
            "select" => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(token);
                self.frameset_ok = false;

                let mode = match self.insertion_mode {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                };
                self.switch_mode(mode);
            }
            "optgroup" | "option" => {
                if self.open_elements.current_is_html("option") {
                    self.open_elements.pop();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(token);
            }
            "rb" | "rtc" => {
                if self.open_elements.has_in_scope("ruby") {
                    self.open_elements.generate_implied_end_tags(None);
                    if !self.open_elements.current_is_html("ruby") {
                        self.parse_error(ParserError::UnexpectedStartTag);
                    }
                }
                self.insert_html_element(token);
            }
            "rp" | "rt" => {
                if self.open_elements.has_in_scope("ruby") {
                    self.open_elements.generate_implied_end_tags(Some("rtc"));
                    if !self.open_elements.current_is_html_one_of(&["rtc", "ruby"]) {
                        self.parse_error(ParserError::UnexpectedStartTag);
                    }
                }
                self.insert_html_element(token);
            }
            "math" => {
                self.reconstruct_active_formatting_elements();
                let mut adjusted = token.clone();
                adjust_mathml_attributes(&mut adjusted);
                adjust_foreign_attributes(&mut adjusted);
                self.insert_foreign_element(&adjusted, Namespace::MathMl);
                self.pop_self_closing_foreign(token);
            }
            "svg" => {
                self.reconstruct_active_formatting_elements();
                let mut adjusted = token.clone();
                adjust_svg_attributes(&mut adjusted);
                adjust_foreign_attributes(&mut adjusted);
                self.insert_foreign_element(&adjusted, Namespace::Svg);
                self.pop_self_closing_foreign(token);
            }
            "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr" => {
                self.parse_error(ParserError::UnexpectedStartTag);
            }
            _ => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(token);
            }
        }
    }

    fn handle_in_body_end_tag(&mut self, name: &str, token: &Token) {
        match name {
            "template" => self.handle_in_head(token),
            "body" => {
                if !self.open_elements.has_in_scope("body") {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.check_open_elements_at_end();
                if let Some(body) = self.open_elements.get(1).map(|entry| entry.handle.clone()) {
                    self.close_element_location(&body, token);
                }
                self.switch_mode(InsertionMode::AfterBody);
            }
            "html" => {
                if !self.open_elements.has_in_scope("body") {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.check_open_elements_at_end();
                self.reprocess_in(InsertionMode::AfterBody);
            }
            _ if BLOCK_END_TAGS.contains(&name) => {
                if !self.open_elements.has_in_scope(name) {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.open_elements.generate_implied_end_tags(None);
                if !self.open_elements.current_is_html(name) {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                self.pop_until_named(name, token);
            }
            "form" => {
                if self.has_template_on_stack() {
                    if !self.open_elements.has_in_scope("form") {
                        self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                        return;
                    }

                    self.open_elements.generate_implied_end_tags(None);
                    if !self.open_elements.current_is_html("form") {
                        self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                    }
                    self.pop_until_named("form", token);
                    return;
                }

                let form = self.form_element.take();
                let Some(form) = form.filter(|form| self.open_elements.has_element_in_scope(form)) else {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                };

                self.open_elements.generate_implied_end_tags(None);
                if self.open_elements.current().map(|entry| &entry.handle) != Some(&form) {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                self.open_elements.remove(&form);
                self.close_element_location(&form, token);
            }
            "p" => {
                if !self.open_elements.has_in_button_scope("p") {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    self.insert_implied_element("p");
                }
                self.close_p_element(token);
            }
            "li" => {
                if !self.open_elements.has_in_list_item_scope("li") {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.open_elements.generate_implied_end_tags(Some("li"));
                if !self.open_elements.current_is_html("li") {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                self.pop_until_named("li", token);
            }
            "dd" | "dt" => {
                if !self.open_elements.has_in_scope(name) {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.open_elements.generate_implied_end_tags(Some(name));
                if !self.open_elements.current_is_html(name) {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                self.pop_until_named(name, token);
            }
            _ if HEADINGS.contains(&name) => {
                if !self.open_elements.has_numbered_header_in_scope() {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.open_elements.generate_implied_end_tags(None);
                if !self.open_elements.current_is_html(name) {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                if let Some(entry) = self.open_elements.pop_until_one_of_popped(&HEADINGS) {
                    self.close_element_location(&entry.handle, token);
                }
            }
            _ if FORMATTING_END_TAGS.contains(&name) => {
                if !self.adoption_agency_algorithm(token) {
                    self.any_other_end_tag(name, token);
                }
            }
            "applet" | "marquee" | "object" => {
                if !self.open_elements.has_in_scope(name) {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.open_elements.generate_implied_end_tags(None);
                if !self.open_elements.current_is_html(name) {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                self.pop_until_named(name, token);
                self.active_formatting_elements.clear_to_last_marker();
            }
            "br" => {
                self.parse_error(ParserError::UnexpectedEndTag);
                let br = Token::StartTag {
                    name: "br".to_string(),
                    is_self_closing: false,
                    attributes: Vec::<Attribute>::new(),
                    location: token.location(),
                };
                self.handle_in_body(&br);
            }
            _ => self.any_other_end_tag(name, token),
        }
    }

    /// The "any other end tag" steps of the "in body" insertion mode
    pub(crate) fn any_other_end_tag(&mut self, name: &str, token: &Token) {
        for idx in (0..self.open_elements.len()).rev() {
            let Some(node) = self.open_elements.get(idx).cloned() else {
                return;
            };

            if node.is_html(name) {
                self.open_elements.generate_implied_end_tags(Some(name));
                if self.open_elements.current().map(|entry| &entry.handle) != Some(&node.handle) {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                if let Some(entry) = self.open_elements.pop_until_element_popped(&node.handle) {
                    self.close_element_location(&entry.handle, token);
                }
                return;
            }

            if is_special(&node.name, node.namespace) {
                self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                return;
            }
        }
    }

    /// Closes an open `li` (or `dd`/`dt`) element before a new one is inserted
    fn close_list_item(&mut self, names: &[&str], token: &Token) {
        for idx in (0..self.open_elements.len()).rev() {
            let Some(node) = self.open_elements.get(idx).cloned() else {
                return;
            };

            if node.is_html_one_of(names) {
                self.open_elements.generate_implied_end_tags(Some(&node.name));
                if !self.open_elements.current_is_html(&node.name) {
                    self.parse_error(ParserError::UnexpectedStartTag);
                }
                self.pop_until_named(&node.name, token);
                return;
            }

            if is_special(&node.name, node.namespace) && !node.is_html_one_of(&["address", "div", "p"]) {
                return;
            }
        }
    }

    fn insert_formatting_element(&mut self, token: &Token) {
        self.reconstruct_active_formatting_elements();
        let handle = self.insert_html_element(token);
        self.active_formatting_elements.push_element(handle, token.clone());
    }

    fn insert_void_element(&mut self, token: &Token) {
        self.insert_html_element(token);
        self.open_elements.pop();
        self.ack_self_closing = true;
    }

    fn pop_self_closing_foreign(&mut self, token: &Token) {
        if let Token::StartTag {
            is_self_closing: true, ..
        } = token
        {
            self.open_elements.pop();
            self.ack_self_closing = true;
        }
    }
}
