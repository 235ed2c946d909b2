use tessera_shared::byte_stream::Span;

use crate::elements::is_special;
use crate::errors::ParserError;
use crate::parser::active_formatting::ActiveElement;
use crate::parser::foreign::is_html_annotation_xml;
use crate::parser::open_elements::StackEntry;
use crate::parser::{Html5Parser, InsertionMode};
use crate::tokenizer::state::State;
use crate::tokenizer::token::Token;
use crate::tree_adapter::{Namespace, NodeLocation, TreeAdapter};

const ADOPTION_AGENCY_OUTER_LOOP_DEPTH: usize = 8;
const ADOPTION_AGENCY_INNER_LOOP_DEPTH: usize = 3;

/// Where a new node goes
#[derive(Debug)]
pub enum InsertionPositionMode<H> {
    LastChild { parent: H },
    Sibling { parent: H, before: H },
}

/// Position in the list of active formatting elements where the adoption agency puts the new
/// formatting element
pub enum BookMark<H> {
    Replace(H),
    InsertAfter(H),
}

impl<A: TreeAdapter> Html5Parser<A> {
    /// Returns the appropriate place for inserting a node (13.2.6.1), optionally with an
    /// override target. Takes foster parenting and template contents into account.
    pub(crate) fn appropriate_place_insert(&self, override_target: Option<&A::Handle>) -> InsertionPositionMode<A::Handle> {
        let target = match override_target {
            Some(target) => target.clone(),
            None => match self.open_elements.current() {
                Some(current) => current.handle.clone(),
                None => {
                    return InsertionPositionMode::LastChild {
                        parent: self.document.clone(),
                    }
                }
            },
        };

        let causes_foster_parenting = self.adapter.namespace(&target) == Namespace::Html
            && matches!(
                self.adapter.tag_name(&target),
                "table" | "tbody" | "tfoot" | "thead" | "tr"
            );

        if !(self.foster_parenting && causes_foster_parenting) {
            return self.inside_template_contents(target);
        }

        let last_template = self.open_elements.last_html_position("template");
        let last_table = self.open_elements.last_html_position("table");

        if let Some(template_idx) = last_template {
            if last_table.map_or(true, |table_idx| template_idx > table_idx) {
                if let Some(template) = self.open_elements.get(template_idx) {
                    return self.inside_template_contents(template.handle.clone());
                }
            }
        }

        let Some(table_idx) = last_table else {
            // Fragment case
            return match self.open_elements.first() {
                Some(html) => InsertionPositionMode::LastChild {
                    parent: html.handle.clone(),
                },
                None => InsertionPositionMode::LastChild {
                    parent: self.document.clone(),
                },
            };
        };

        let Some(table) = self.open_elements.get(table_idx) else {
            return self.inside_template_contents(target);
        };

        if let Some(parent) = self.adapter.parent_node(&table.handle) {
            return InsertionPositionMode::Sibling {
                parent,
                before: table.handle.clone(),
            };
        }

        match table_idx.checked_sub(1).and_then(|idx| self.open_elements.get(idx)) {
            Some(previous) => self.inside_template_contents(previous.handle.clone()),
            None => self.inside_template_contents(target),
        }
    }

    fn inside_template_contents(&self, parent: A::Handle) -> InsertionPositionMode<A::Handle> {
        match self.adapter.get_template_content(&parent) {
            Some(content) => InsertionPositionMode::LastChild { parent: content },
            None => InsertionPositionMode::LastChild { parent },
        }
    }

    pub(crate) fn insert_element_helper(&mut self, node: &A::Handle, position: InsertionPositionMode<A::Handle>) {
        match position {
            InsertionPositionMode::LastChild { parent } => self.adapter.append_child(&parent, node),
            InsertionPositionMode::Sibling { parent, before } => self.adapter.insert_before(&parent, node, &before),
        }
    }

    /// Creates an element for the token (13.2.6.1). Template elements get their contents
    /// fragment here.
    pub(crate) fn create_element_for_token(&mut self, token: &Token, namespace: Namespace) -> StackEntry<A::Handle> {
        let (name, attributes) = match token {
            Token::StartTag { name, attributes, .. } => (name.as_str(), attributes.clone()),
            _ => ("", Vec::new()),
        };

        let html_integration_point = match namespace {
            Namespace::Svg => matches!(name, "foreignObject" | "desc" | "title"),
            Namespace::MathMl => name == "annotation-xml" && is_html_annotation_xml(&attributes),
            _ => false,
        };

        let handle = self.adapter.create_element(name, namespace, attributes);

        if namespace == Namespace::Html && name == "template" {
            let content = self.adapter.create_document_fragment();
            self.adapter.set_template_content(&handle, &content);
        }

        let span = token.location();
        if self.source_location_info && span.start != span.end {
            self.adapter
                .set_node_source_location(&handle, NodeLocation::for_start_tag(span));
        }

        let mut entry = StackEntry::new(handle, name, namespace);
        entry.html_integration_point = html_integration_point;
        entry
    }

    /// Inserts a foreign element for the token at the appropriate place and pushes it onto the
    /// stack of open elements
    pub(crate) fn insert_foreign_element(&mut self, token: &Token, namespace: Namespace) -> A::Handle {
        let position = self.appropriate_place_insert(None);
        let entry = self.create_element_for_token(token, namespace);
        let handle = entry.handle.clone();

        self.insert_element_helper(&handle, position);
        self.open_elements.push(entry);

        handle
    }

    pub(crate) fn insert_html_element(&mut self, token: &Token) -> A::Handle {
        self.insert_foreign_element(token, Namespace::Html)
    }

    /// Inserts an HTML element that has no tag in the source (like an implied `<head>`)
    pub(crate) fn insert_implied_element(&mut self, name: &str) -> A::Handle {
        let token = self.implied_start_tag(name);
        self.insert_html_element(&token)
    }

    pub(crate) fn implied_start_tag(&self, name: &str) -> Token {
        Token::StartTag {
            name: name.to_string(),
            is_self_closing: false,
            attributes: Vec::new(),
            location: Span::at(self.token_span.start),
        }
    }

    /// Inserts the characters of a character token
    pub(crate) fn insert_character_token(&mut self, token: &Token) {
        if let Some(text) = token.text() {
            self.insert_text(text, token.location());
        }
    }

    /// Inserts text at the appropriate place, merging with a directly preceding text node
    pub(crate) fn insert_text(&mut self, text: &str, span: Span) {
        if text.is_empty() {
            return;
        }

        let position = self.appropriate_place_insert(None);
        let text_node = match &position {
            InsertionPositionMode::LastChild { parent } => {
                if *parent == self.document {
                    return;
                }
                self.adapter.insert_text(parent, text);
                self.adapter.child_nodes(parent).last().cloned()
            }
            InsertionPositionMode::Sibling { parent, before } => {
                self.adapter.insert_text_before(parent, text, before);
                let children = self.adapter.child_nodes(parent);
                children
                    .iter()
                    .position(|child| child == before)
                    .and_then(|idx| idx.checked_sub(1))
                    .map(|idx| children[idx].clone())
            }
        };

        if !self.source_location_info {
            return;
        }

        if let Some(node) = text_node.filter(|node| self.adapter.is_text_node(node)) {
            let location = match self.adapter.get_node_source_location(&node) {
                Some(mut location) => {
                    location.span.end = span.end;
                    location
                }
                None => NodeLocation::new(span),
            };
            self.adapter.set_node_source_location(&node, location);
        }
    }

    /// Inserts a comment as the last child of `parent`, or at the appropriate place
    pub(crate) fn insert_comment(&mut self, token: &Token, parent: Option<A::Handle>) {
        let Token::Comment { comment, location } = token else {
            return;
        };

        let node = self.adapter.create_comment(comment);
        if self.source_location_info {
            self.adapter.set_node_source_location(&node, NodeLocation::new(*location));
        }

        match parent {
            Some(parent) => self.adapter.append_child(&parent, &node),
            None => {
                let position = self.appropriate_place_insert(None);
                self.insert_element_helper(&node, position);
            }
        }
    }

    /// Records the end tag that closed the element
    pub(crate) fn close_element_location(&mut self, handle: &A::Handle, token: &Token) {
        if self.source_location_info && matches!(token, Token::EndTag { .. }) {
            self.adapter.update_node_source_location(handle, token.location());
        }
    }

    /// Pops until the HTML element with the given name has been popped, and records the end
    /// tag location on it
    pub(crate) fn pop_until_named(&mut self, name: &str, token: &Token) {
        if let Some(entry) = self.open_elements.pop_until_tag_name_popped(name) {
            self.close_element_location(&entry.handle, token);
        }
    }

    /// Closes a p element (13.2.6.4.7)
    pub(crate) fn close_p_element(&mut self, token: &Token) {
        self.open_elements.generate_implied_end_tags(Some("p"));
        if !self.open_elements.current_is_html("p") {
            self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
        }
        self.pop_until_named("p", token);
    }

    /// Closes a p element when one is in button scope
    pub(crate) fn close_p_element_in_button_scope(&mut self, token: &Token) {
        if self.open_elements.has_in_button_scope("p") {
            self.close_p_element(token);
        }
    }

    /// The generic raw text and generic RCDATA element parsing algorithms
    pub(crate) fn parse_generic_text_element(&mut self, token: &Token, state: State) {
        self.insert_html_element(token);
        self.tokenizer.set_state(state);
        self.original_insertion_mode = self.insertion_mode;
        self.insertion_mode = InsertionMode::Text;
    }

    /// Reconstructs the active formatting elements (13.2.4.3)
    pub(crate) fn reconstruct_active_formatting_elements(&mut self) {
        match self.active_formatting_elements.last() {
            None | Some(ActiveElement::Marker) => return,
            Some(ActiveElement::Element { handle, .. }) if self.open_elements.contains(handle) => return,
            Some(ActiveElement::Element { .. }) => {}
        }

        // Rewind to the entry after the last marker or open element
        let mut idx = self.active_formatting_elements.len() - 1;
        while idx > 0 {
            match self.active_formatting_elements.get(idx - 1) {
                Some(ActiveElement::Element { handle, .. }) if !self.open_elements.contains(handle) => idx -= 1,
                _ => break,
            }
        }

        // Advance and create
        for entry_idx in idx..self.active_formatting_elements.len() {
            let Some(ActiveElement::Element { handle, token }) = self.active_formatting_elements.get(entry_idx).cloned()
            else {
                continue;
            };

            let new_handle = self.insert_html_element(&token);
            self.active_formatting_elements.replace(&handle, new_handle);
        }
    }

    /// Runs the adoption agency algorithm (13.2.6.4.7) for the end tag. Returns false when the
    /// end tag must be handled with the "any other end tag" steps instead.
    pub(crate) fn adoption_agency_algorithm(&mut self, token: &Token) -> bool {
        let Some(subject) = token.tag_name() else {
            return true;
        };

        if let Some(current) = self.open_elements.current() {
            if current.is_html(subject) && !self.active_formatting_elements.contains(&current.handle) {
                if let Some(entry) = self.open_elements.pop() {
                    self.close_element_location(&entry.handle, token);
                }
                return true;
            }
        }

        for _ in 0..ADOPTION_AGENCY_OUTER_LOOP_DEPTH {
            let Some((format_handle, format_token)) = self
                .active_formatting_elements
                .element_in_scope_with_tag_name(subject)
                .map(|(handle, token)| (handle.clone(), token.clone()))
            else {
                return false;
            };

            let Some(format_idx) = self.open_elements.position(&format_handle) else {
                self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                self.active_formatting_elements.remove(&format_handle);
                return true;
            };

            if !self.open_elements.has_element_in_scope(&format_handle) {
                self.parse_error(ParserError::EndTagWithoutMatchingOpenElement);
                return true;
            }

            if self.open_elements.current().map(|current| &current.handle) != Some(&format_handle) {
                self.parse_error(ParserError::ClosingOfElementWithOpenChildElements);
            }

            let furthest_block = self
                .open_elements
                .iter()
                .enumerate()
                .skip(format_idx + 1)
                .find(|(_, entry)| is_special(&entry.name, entry.namespace))
                .map(|(idx, entry)| (idx, entry.handle.clone()));

            let Some((mut node_idx, furthest_block)) = furthest_block else {
                if let Some(entry) = self.open_elements.pop_until_element_popped(&format_handle) {
                    self.close_element_location(&entry.handle, token);
                }
                self.active_formatting_elements.remove(&format_handle);
                return true;
            };

            let Some(common_ancestor) = self
                .open_elements
                .common_ancestor(&format_handle)
                .map(|entry| entry.handle.clone())
            else {
                return true;
            };

            let mut bookmark = BookMark::Replace(format_handle.clone());
            let mut last_node = furthest_block.clone();
            let mut inner_loop_counter = 0;

            loop {
                inner_loop_counter += 1;
                node_idx -= 1;

                let Some(node) = self.open_elements.get(node_idx).map(|entry| entry.handle.clone()) else {
                    break;
                };
                if node == format_handle {
                    break;
                }

                if inner_loop_counter > ADOPTION_AGENCY_INNER_LOOP_DEPTH {
                    self.active_formatting_elements.remove(&node);
                }

                let Some(node_token) = self.active_formatting_elements.token_for(&node).cloned() else {
                    self.open_elements.remove_at(node_idx);
                    continue;
                };

                let new_entry = self.create_element_for_token(&node_token, Namespace::Html);
                let new_node = new_entry.handle.clone();
                self.active_formatting_elements.replace(&node, new_node.clone());
                self.open_elements.replace(&node, new_entry);

                if last_node == furthest_block {
                    bookmark = BookMark::InsertAfter(new_node.clone());
                }

                self.adapter.detach_node(&last_node);
                self.adapter.append_child(&new_node, &last_node);

                last_node = new_node;
            }

            self.adapter.detach_node(&last_node);
            let position = self.appropriate_place_insert(Some(&common_ancestor));
            self.insert_element_helper(&last_node, position);

            let new_entry = self.create_element_for_token(&format_token, Namespace::Html);
            let new_element = new_entry.handle.clone();

            for child in self.adapter.child_nodes(&furthest_block) {
                self.adapter.append_child(&new_element, &child);
            }
            self.adapter.append_child(&furthest_block, &new_element);

            match bookmark {
                BookMark::Replace(previous) => {
                    self.active_formatting_elements.replace(&previous, new_element.clone());
                }
                BookMark::InsertAfter(previous) => {
                    let idx = self
                        .active_formatting_elements
                        .position(&previous)
                        .map_or(self.active_formatting_elements.len(), |idx| idx + 1);
                    self.active_formatting_elements.insert_at(
                        idx,
                        ActiveElement::Element {
                            handle: new_element.clone(),
                            token: format_token,
                        },
                    );
                    self.active_formatting_elements.remove(&format_handle);
                }
            }

            self.open_elements.remove(&format_handle);
            self.open_elements.insert_after(&furthest_block, new_entry);
        }

        true
    }

    /// Resets the insertion mode appropriately (13.2.4.1)
    pub(crate) fn reset_insertion_mode(&mut self) {
        for idx in (0..self.open_elements.len()).rev() {
            let last = idx == 0;
            let node = match (&self.context, last) {
                (Some(context), true) => context.clone(),
                _ => match self.open_elements.get(idx) {
                    Some(entry) => entry.clone(),
                    None => continue,
                },
            };

            if node.namespace != Namespace::Html {
                if last {
                    self.insertion_mode = InsertionMode::InBody;
                    return;
                }
                continue;
            }

            let mode = match node.name.as_str() {
                "select" => {
                    let in_table = (1..idx).rev().find_map(|ancestor_idx| {
                        let ancestor = self.open_elements.get(ancestor_idx)?;
                        if ancestor.is_html("template") {
                            Some(false)
                        } else if ancestor.is_html("table") {
                            Some(true)
                        } else {
                            None
                        }
                    });

                    if !last && in_table == Some(true) {
                        InsertionMode::InSelectInTable
                    } else {
                        InsertionMode::InSelect
                    }
                }
                "td" | "th" if !last => InsertionMode::InCell,
                "tr" => InsertionMode::InRow,
                "tbody" | "thead" | "tfoot" => InsertionMode::InTableBody,
                "caption" => InsertionMode::InCaption,
                "colgroup" => InsertionMode::InColumnGroup,
                "table" => InsertionMode::InTable,
                "template" => match self.template_insertion_mode.last() {
                    Some(mode) => *mode,
                    None => InsertionMode::InTemplate,
                },
                "head" if !last => InsertionMode::InHead,
                "body" => InsertionMode::InBody,
                "frameset" => InsertionMode::InFrameset,
                "html" => {
                    if self.head_element.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    }
                }
                _ if last => InsertionMode::InBody,
                _ => continue,
            };

            self.insertion_mode = mode;
            return;
        }

        self.insertion_mode = InsertionMode::InBody;
    }

    /// Returns true when there is a template element on the stack of open elements
    pub(crate) fn has_template_on_stack(&self) -> bool {
        self.open_elements.contains_html("template")
    }
}
