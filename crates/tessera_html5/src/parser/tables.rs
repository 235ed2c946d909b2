//! Insertion modes for tables, selects and templates (13.2.6.4.9 - 13.2.6.4.18)
use crate::errors::ParserError;
use crate::parser::open_elements::Scope;
use crate::parser::{Html5Parser, InsertionMode};
use crate::tokenizer::token::Token;
use crate::tree_adapter::TreeAdapter;

const TABLE_SECTIONS: [&str; 3] = ["tbody", "tfoot", "thead"];

impl<A: TreeAdapter> Html5Parser<A> {
    /// 13.2.6.4.9 The "in table" insertion mode
    pub(crate) fn handle_in_table(&mut self, token: &Token) {
        match token {
            Token::Text { .. } | Token::Whitespace { .. } | Token::NullCharacter { .. }
                if self
                    .open_elements
                    .current_is_html_one_of(&["table", "tbody", "template", "tfoot", "thead", "tr"]) =>
            {
                self.pending_table_character_tokens.clear();
                self.original_insertion_mode = self.insertion_mode;
                self.reprocess_in(InsertionMode::InTableText);
            }
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } => match name.as_str() {
                "caption" => {
                    self.open_elements.clear_back_to_table_context();
                    self.active_formatting_elements.insert_marker();
                    self.insert_html_element(token);
                    self.switch_mode(InsertionMode::InCaption);
                }
                "colgroup" => {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_html_element(token);
                    self.switch_mode(InsertionMode::InColumnGroup);
                }
                "col" => {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_implied_element("colgroup");
                    self.reprocess_in(InsertionMode::InColumnGroup);
                }
                "tbody" | "tfoot" | "thead" => {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_html_element(token);
                    self.switch_mode(InsertionMode::InTableBody);
                }
                "td" | "th" | "tr" => {
                    self.open_elements.clear_back_to_table_context();
                    self.insert_implied_element("tbody");
                    self.reprocess_in(InsertionMode::InTableBody);
                }
                "table" => {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    if !self.open_elements.has_in_table_scope("table") {
                        return;
                    }
                    self.open_elements.pop_until_tag_name_popped("table");
                    self.reset_insertion_mode();
                    self.reprocess_token = true;
                }
                "style" | "script" | "template" => self.handle_in_head(token),
                "input"
                    if token
                        .attribute("type")
                        .is_some_and(|value| value.eq_ignore_ascii_case("hidden")) =>
                {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    self.insert_html_element(token);
                    self.open_elements.pop();
                    self.ack_self_closing = true;
                }
                "form" => {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    if self.has_template_on_stack() || self.form_element.is_some() {
                        return;
                    }
                    let form = self.insert_html_element(token);
                    self.form_element = Some(form);
                    self.open_elements.pop();
                }
                _ => self.anything_else_in_table(token),
            },
            Token::EndTag { name, .. } => match name.as_str() {
                "table" => {
                    if !self.open_elements.has_in_table_scope("table") {
                        self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                        return;
                    }
                    self.pop_until_named("table", token);
                    self.reset_insertion_mode();
                }
                "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr" => {
                    self.parse_error(ParserError::UnexpectedEndTag);
                }
                "template" => self.handle_in_head(token),
                _ => self.anything_else_in_table(token),
            },
            Token::Eof { .. } => self.handle_in_body(token),
            _ => self.anything_else_in_table(token),
        }
    }

    /// Processes the token with the "in body" rules while foster parenting is enabled
    fn anything_else_in_table(&mut self, token: &Token) {
        self.parse_error(ParserError::UnexpectedToken);
        self.foster_parenting = true;
        self.handle_in_body(token);
        self.foster_parenting = false;
    }

    /// 13.2.6.4.10 The "in table text" insertion mode
    pub(crate) fn handle_in_table_text(&mut self, token: &Token) {
        match token {
            Token::NullCharacter { .. } => self.parse_error(ParserError::UnexpectedNullCharacter),
            Token::Text { .. } | Token::Whitespace { .. } => {
                self.pending_table_character_tokens.push(token.clone());
            }
            _ => {
                let pending = std::mem::take(&mut self.pending_table_character_tokens);

                if pending.iter().any(|pending| !pending.is_whitespace()) {
                    self.parse_error(ParserError::UnexpectedCharacter);
                    self.foster_parenting = true;
                    for pending in &pending {
                        self.handle_in_body(pending);
                    }
                    self.foster_parenting = false;
                } else {
                    for pending in &pending {
                        self.insert_character_token(pending);
                    }
                }

                self.reprocess_in(self.original_insertion_mode);
            }
        }
    }

    /// 13.2.6.4.11 The "in caption" insertion mode
    pub(crate) fn handle_in_caption(&mut self, token: &Token) {
        match token {
            Token::EndTag { name, .. } if name == "caption" => {
                self.close_caption(token);
            }
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                if self.close_caption(token) {
                    self.reprocess_token = true;
                }
            }
            Token::EndTag { name, .. } if name == "table" => {
                if self.close_caption(token) {
                    self.reprocess_token = true;
                }
            }
            Token::EndTag { name, .. }
                if matches!(
                    name.as_str(),
                    "body" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                self.parse_error(ParserError::UnexpectedEndTag);
            }
            _ => self.handle_in_body(token),
        }
    }

    /// Closes the caption element. Returns false when there is no caption in table scope.
    fn close_caption(&mut self, token: &Token) -> bool {
        if !self.open_elements.has_in_table_scope("caption") {
            self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
            return false;
        }

        self.open_elements.generate_implied_end_tags(None);
        if !self.open_elements.current_is_html("caption") {
            self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
        }
        if let Some(entry) = self.open_elements.pop_until_tag_name_popped("caption") {
            if token.is_end_tag("caption") {
                self.close_element_location(&entry.handle, token);
            }
        }
        self.active_formatting_elements.clear_to_last_marker();
        self.switch_mode(InsertionMode::InTable);

        true
    }

    /// 13.2.6.4.12 The "in column group" insertion mode
    pub(crate) fn handle_in_column_group(&mut self, token: &Token) {
        match token {
            Token::Whitespace { .. } => self.insert_character_token(token),
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body(token),
            Token::StartTag { name, .. } if name == "col" => {
                self.insert_html_element(token);
                self.open_elements.pop();
                self.ack_self_closing = true;
            }
            Token::EndTag { name, .. } if name == "colgroup" => {
                if !self.open_elements.current_is_html("colgroup") {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }
                if let Some(entry) = self.open_elements.pop() {
                    self.close_element_location(&entry.handle, token);
                }
                self.switch_mode(InsertionMode::InTable);
            }
            Token::EndTag { name, .. } if name == "col" => self.parse_error(ParserError::UnexpectedEndTag),
            Token::StartTag { name, .. } | Token::EndTag { name, .. } if name == "template" => {
                self.handle_in_head(token);
            }
            Token::Eof { .. } => self.handle_in_body(token),
            _ => {
                if !self.open_elements.current_is_html("colgroup") {
                    self.parse_error(ParserError::UnexpectedToken);
                    return;
                }
                self.open_elements.pop();
                self.reprocess_in(InsertionMode::InTable);
            }
        }
    }

    /// 13.2.6.4.13 The "in table body" insertion mode
    pub(crate) fn handle_in_table_body(&mut self, token: &Token) {
        match token {
            Token::StartTag { name, .. } if name == "tr" => {
                self.open_elements.clear_back_to_table_body_context();
                self.insert_html_element(token);
                self.switch_mode(InsertionMode::InRow);
            }
            Token::StartTag { name, .. } if name == "th" || name == "td" => {
                self.parse_error(ParserError::UnexpectedStartTag);
                self.open_elements.clear_back_to_table_body_context();
                self.insert_implied_element("tr");
                self.reprocess_in(InsertionMode::InRow);
            }
            Token::EndTag { name, .. } if TABLE_SECTIONS.contains(&name.as_str()) => {
                if !self.open_elements.has_in_table_scope(name) {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }
                self.open_elements.clear_back_to_table_body_context();
                if let Some(entry) = self.open_elements.pop() {
                    self.close_element_location(&entry.handle, token);
                }
                self.switch_mode(InsertionMode::InTable);
            }
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead"
                ) =>
            {
                self.close_table_section();
            }
            Token::EndTag { name, .. } if name == "table" => self.close_table_section(),
            Token::EndTag { name, .. }
                if matches!(
                    name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr"
                ) =>
            {
                self.parse_error(ParserError::UnexpectedEndTag);
            }
            _ => self.handle_in_table(token),
        }
    }

    fn close_table_section(&mut self) {
        if !self.open_elements.has_one_of_in_scope_of(&TABLE_SECTIONS, Scope::Table) {
            self.parse_error(ParserError::UnexpectedToken);
            return;
        }

        self.open_elements.clear_back_to_table_body_context();
        self.open_elements.pop();
        self.reprocess_in(InsertionMode::InTable);
    }

    /// 13.2.6.4.14 The "in row" insertion mode
    pub(crate) fn handle_in_row(&mut self, token: &Token) {
        match token {
            Token::StartTag { name, .. } if name == "th" || name == "td" => {
                self.open_elements.clear_back_to_table_row_context();
                self.insert_html_element(token);
                self.switch_mode(InsertionMode::InCell);
                self.active_formatting_elements.insert_marker();
            }
            Token::EndTag { name, .. } if name == "tr" => {
                self.close_row(token);
            }
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr"
                ) =>
            {
                if self.close_row(token) {
                    self.reprocess_token = true;
                }
            }
            Token::EndTag { name, .. } if name == "table" => {
                if self.close_row(token) {
                    self.reprocess_token = true;
                }
            }
            Token::EndTag { name, .. } if TABLE_SECTIONS.contains(&name.as_str()) => {
                if !self.open_elements.has_in_table_scope(name) {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }
                if self.close_row(token) {
                    self.reprocess_token = true;
                }
            }
            Token::EndTag { name, .. }
                if matches!(
                    name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th"
                ) =>
            {
                self.parse_error(ParserError::UnexpectedEndTag);
            }
            _ => self.handle_in_table(token),
        }
    }

    /// Closes the current row. Returns false when there is no tr in table scope.
    fn close_row(&mut self, token: &Token) -> bool {
        if !self.open_elements.has_in_table_scope("tr") {
            self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
            return false;
        }

        self.open_elements.clear_back_to_table_row_context();
        if let Some(entry) = self.open_elements.pop() {
            if token.is_end_tag("tr") {
                self.close_element_location(&entry.handle, token);
            }
        }
        self.switch_mode(InsertionMode::InTableBody);

        true
    }

    /// 13.2.6.4.15 The "in cell" insertion mode
    pub(crate) fn handle_in_cell(&mut self, token: &Token) {
        match token {
            Token::EndTag { name, .. } if name == "td" || name == "th" => {
                if !self.open_elements.has_in_table_scope(name) {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }

                self.open_elements.generate_implied_end_tags(None);
                if !self.open_elements.current_is_html(name) {
                    self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
                }
                self.pop_until_named(name, token);
                self.active_formatting_elements.clear_to_last_marker();
                self.switch_mode(InsertionMode::InRow);
            }
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
                ) =>
            {
                if !self
                    .open_elements
                    .has_one_of_in_scope_of(&["td", "th"], Scope::Table)
                {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    return;
                }
                self.close_cell();
                self.reprocess_token = true;
            }
            Token::EndTag { name, .. } if matches!(name.as_str(), "body" | "caption" | "col" | "colgroup" | "html") => {
                self.parse_error(ParserError::UnexpectedEndTag);
            }
            Token::EndTag { name, .. } if matches!(name.as_str(), "table" | "tbody" | "tfoot" | "thead" | "tr") => {
                if !self.open_elements.has_in_table_scope(name) {
                    self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    return;
                }
                self.close_cell();
                self.reprocess_token = true;
            }
            _ => self.handle_in_body(token),
        }
    }

    fn close_cell(&mut self) {
        self.open_elements.generate_implied_end_tags(None);
        if !self.open_elements.current_is_html_one_of(&["td", "th"]) {
            self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
        }
        self.open_elements.pop_until_one_of_popped(&["td", "th"]);
        self.active_formatting_elements.clear_to_last_marker();
        self.switch_mode(InsertionMode::InRow);
    }

    /// 13.2.6.4.16 The "in select" insertion mode
    pub(crate) fn handle_in_select(&mut self, token: &Token) {
        match token {
            Token::NullCharacter { .. } => self.parse_error(ParserError::UnexpectedNullCharacter),
            Token::Text { .. } | Token::Whitespace { .. } => self.insert_character_token(token),
            Token::Comment { .. } => self.insert_comment(token, None),
            Token::DocType { .. } => self.parse_error(ParserError::MisplacedDoctype),
            Token::StartTag { name, .. } => match name.as_str() {
                "html" => self.handle_in_body(token),
                "option" => {
                    if self.open_elements.current_is_html("option") {
                        self.open_elements.pop();
                    }
                    self.insert_html_element(token);
                }
                "optgroup" => {
                    if self.open_elements.current_is_html("option") {
                        self.open_elements.pop();
                    }
                    if self.open_elements.current_is_html("optgroup") {
                        self.open_elements.pop();
                    }
                    self.insert_html_element(token);
                }
                "hr" => {
                    if self.open_elements.current_is_html("option") {
                        self.open_elements.pop();
                    }
                    if self.open_elements.current_is_html("optgroup") {
                        self.open_elements.pop();
                    }
                    self.insert_html_element(token);
                    self.open_elements.pop();
                    self.ack_self_closing = true;
                }
                "select" => {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    if self.open_elements.has_in_select_scope("select") {
                        self.open_elements.pop_until_tag_name_popped("select");
                        self.reset_insertion_mode();
                    }
                }
                "input" | "keygen" | "textarea" => {
                    self.parse_error(ParserError::UnexpectedStartTag);
                    if !self.open_elements.has_in_select_scope("select") {
                        return;
                    }
                    self.open_elements.pop_until_tag_name_popped("select");
                    self.reset_insertion_mode();
                    self.reprocess_token = true;
                }
                "script" | "template" => self.handle_in_head(token),
                _ => self.parse_error(ParserError::UnexpectedStartTag),
            },
            Token::EndTag { name, .. } => match name.as_str() {
                "optgroup" => {
                    let len = self.open_elements.len();
                    if self.open_elements.current_is_html("option")
                        && len >= 2
                        && self
                            .open_elements
                            .get(len - 2)
                            .is_some_and(|entry| entry.is_html("optgroup"))
                    {
                        if let Some(entry) = self.open_elements.pop() {
                            self.close_element_location(&entry.handle, token);
                        }
                    }

                    if self.open_elements.current_is_html("optgroup") {
                        if let Some(entry) = self.open_elements.pop() {
                            self.close_element_location(&entry.handle, token);
                        }
                    } else {
                        self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    }
                }
                "option" => {
                    if self.open_elements.current_is_html("option") {
                        if let Some(entry) = self.open_elements.pop() {
                            self.close_element_location(&entry.handle, token);
                        }
                    } else {
                        self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                    }
                }
                "select" => {
                    if !self.open_elements.has_in_select_scope("select") {
                        self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                        return;
                    }
                    self.pop_until_named("select", token);
                    self.reset_insertion_mode();
                }
                "template" => self.handle_in_head(token),
                _ => self.parse_error(ParserError::UnexpectedEndTag),
            },
            Token::Eof { .. } => self.handle_in_body(token),
        }
    }

    /// 13.2.6.4.17 The "in select in table" insertion mode
    pub(crate) fn handle_in_select_in_table(&mut self, token: &Token) {
        const TABLE_TAGS: [&str; 8] = ["caption", "table", "tbody", "tfoot", "thead", "tr", "td", "th"];

        match token {
            Token::StartTag { name, .. } if TABLE_TAGS.contains(&name.as_str()) => {
                self.parse_error(ParserError::UnexpectedStartTag);
                self.open_elements.pop_until_tag_name_popped("select");
                self.reset_insertion_mode();
                self.reprocess_token = true;
            }
            Token::EndTag { name, .. } if TABLE_TAGS.contains(&name.as_str()) => {
                self.parse_error(ParserError::UnexpectedEndTag);
                if !self.open_elements.has_in_table_scope(name) {
                    return;
                }
                self.open_elements.pop_until_tag_name_popped("select");
                self.reset_insertion_mode();
                self.reprocess_token = true;
            }
            _ => self.handle_in_select(token),
        }
    }

    /// 13.2.6.4.18 The "in template" insertion mode
    pub(crate) fn handle_in_template(&mut self, token: &Token) {
        match token {
            Token::Text { .. }
            | Token::Whitespace { .. }
            | Token::NullCharacter { .. }
            | Token::Comment { .. }
            | Token::DocType { .. } => self.handle_in_body(token),
            Token::StartTag { name, .. } => match name.as_str() {
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style" | "template"
                | "title" => self.handle_in_head(token),
                "caption" | "colgroup" | "tbody" | "tfoot" | "thead" => {
                    self.switch_template_mode(InsertionMode::InTable);
                }
                "col" => self.switch_template_mode(InsertionMode::InColumnGroup),
                "tr" => self.switch_template_mode(InsertionMode::InTableBody),
                "td" | "th" => self.switch_template_mode(InsertionMode::InRow),
                _ => self.switch_template_mode(InsertionMode::InBody),
            },
            Token::EndTag { name, .. } if name == "template" => self.handle_in_head(token),
            Token::EndTag { .. } => self.parse_error(ParserError::UnexpectedEndTag),
            Token::Eof { .. } => {
                if !self.has_template_on_stack() {
                    self.stop_parsing();
                    return;
                }

                self.parse_error(ParserError::OpenElementsLeftAfterEof);
                self.open_elements.pop_until_tag_name_popped("template");
                self.active_formatting_elements.clear_to_last_marker();
                self.template_insertion_mode.pop();
                self.reset_insertion_mode();
                self.reprocess_token = true;
            }
        }
    }

    fn switch_template_mode(&mut self, mode: InsertionMode) {
        self.template_insertion_mode.pop();
        self.template_insertion_mode.push(mode);
        self.reprocess_in(mode);
    }
}
