use crate::tokenizer::token::{Attribute, Token};

/// Maximum number of identical entries after the last marker before the earliest is dropped
const NOAH_ARK_CAPACITY: usize = 3;

/// Entry in the list of active formatting elements: a marker, or an element together with the
/// start tag token that created it (needed to recreate the element)
#[derive(Clone, Debug, PartialEq)]
pub enum ActiveElement<H> {
    Marker,
    Element { handle: H, token: Token },
}

impl<H> ActiveElement<H> {
    pub fn handle(&self) -> Option<&H> {
        match self {
            ActiveElement::Element { handle, .. } => Some(handle),
            ActiveElement::Marker => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, ActiveElement::Marker)
    }
}

/// The list of active formatting elements (13.2.4.3)
#[derive(Debug)]
pub struct ActiveFormattingElements<H> {
    entries: Vec<ActiveElement<H>>,
}

impl<H> Default for ActiveFormattingElements<H> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<H: Clone + PartialEq> ActiveFormattingElements<H> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, idx: usize) -> Option<&ActiveElement<H>> {
        self.entries.get(idx)
    }

    pub fn last(&self) -> Option<&ActiveElement<H>> {
        self.entries.last()
    }

    pub fn insert_marker(&mut self) {
        self.entries.push(ActiveElement::Marker);
    }

    /// Pushes an element onto the list. When there are already three entries after the last
    /// marker with the same tag name and attributes, the earliest of them is removed first.
    pub fn push_element(&mut self, handle: H, token: Token) {
        self.ensure_noah_ark_condition(&token);
        self.entries.push(ActiveElement::Element { handle, token });
    }

    fn ensure_noah_ark_condition(&mut self, token: &Token) {
        let Token::StartTag { name, attributes, .. } = token else {
            return;
        };

        let matches: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .take_while(|(_, entry)| !entry.is_marker())
            .filter_map(|(idx, entry)| match entry {
                ActiveElement::Element {
                    token:
                        Token::StartTag {
                            name: other_name,
                            attributes: other_attributes,
                            ..
                        },
                    ..
                } if other_name == name && same_attributes(attributes, other_attributes) => Some(idx),
                _ => None,
            })
            .collect();

        // `matches` runs from the newest to the oldest entry
        if matches.len() >= NOAH_ARK_CAPACITY {
            for idx in matches.into_iter().skip(NOAH_ARK_CAPACITY - 1) {
                self.entries.remove(idx);
            }
        }
    }

    /// Removes entries up to and including the last marker
    pub fn clear_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if entry.is_marker() {
                break;
            }
        }
    }

    /// Returns the last element with the given tag name between the end of the list and the last
    /// marker
    pub fn element_in_scope_with_tag_name(&self, name: &str) -> Option<(&H, &Token)> {
        for entry in self.entries.iter().rev() {
            match entry {
                ActiveElement::Marker => return None,
                ActiveElement::Element { handle, token } if token.tag_name() == Some(name) => {
                    return Some((handle, token));
                }
                ActiveElement::Element { .. } => {}
            }
        }
        None
    }

    pub fn position(&self, handle: &H) -> Option<usize> {
        self.entries.iter().position(|entry| entry.handle() == Some(handle))
    }

    pub fn contains(&self, handle: &H) -> bool {
        self.position(handle).is_some()
    }

    /// Returns the token that created the element
    pub fn token_for(&self, handle: &H) -> Option<&Token> {
        self.entries.iter().find_map(|entry| match entry {
            ActiveElement::Element { handle: h, token } if h == handle => Some(token),
            _ => None,
        })
    }

    pub fn remove(&mut self, handle: &H) {
        if let Some(idx) = self.position(handle) {
            self.entries.remove(idx);
        }
    }

    /// Replaces the handle of an element entry, keeping its token
    pub fn replace(&mut self, old: &H, new: H) {
        if let Some(ActiveElement::Element { handle, .. }) = self
            .entries
            .iter_mut()
            .find(|entry| entry.handle() == Some(old))
        {
            *handle = new;
        }
    }

    pub fn insert_at(&mut self, idx: usize, entry: ActiveElement<H>) {
        let idx = idx.min(self.entries.len());
        self.entries.insert(idx, entry);
    }
}

/// Compares attribute lists as sets of (name, value) pairs
fn same_attributes(a: &[Attribute], b: &[Attribute]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|attr| b.iter().any(|other| other.name == attr.name && other.value == attr.value))
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

    fn handles(list: &ActiveFormattingElements<usize>) -> Vec<Option<usize>> {
        list.entries.iter().map(|entry| entry.handle().copied()).collect()
    }

    #[test]
    fn noah_ark_keeps_three_newest() {
        let mut list = ActiveFormattingElements::default();
        for handle in 1..=5 {
            list.push_element(handle, start_tag("b", &[("class", "x")]));
        }

        assert_eq!(handles(&list), vec![Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn noah_ark_compares_attribute_sets() {
        let mut list = ActiveFormattingElements::default();
        list.push_element(1, start_tag("b", &[("a", "1"), ("b", "2")]));
        list.push_element(2, start_tag("b", &[("b", "2"), ("a", "1")]));
        list.push_element(3, start_tag("b", &[("a", "1")]));
        list.push_element(4, start_tag("b", &[("a", "1"), ("b", "2")]));
        list.push_element(5, start_tag("b", &[("a", "1"), ("b", "2")]));

        // 1, 2, 4 and 5 are identical: the earliest goes
        assert_eq!(handles(&list), vec![Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn noah_ark_stops_at_marker() {
        let mut list = ActiveFormattingElements::default();
        list.push_element(1, start_tag("i", &[]));
        list.push_element(2, start_tag("i", &[]));
        list.push_element(3, start_tag("i", &[]));
        list.insert_marker();
        list.push_element(4, start_tag("i", &[]));
        list.push_element(5, start_tag("i", &[]));

        assert_eq!(
            handles(&list),
            vec![Some(1), Some(2), Some(3), None, Some(4), Some(5)]
        );
    }

    #[test]
    fn markers_bound_lookups() {
        let mut list = ActiveFormattingElements::default();
        list.push_element(1, start_tag("a", &[]));
        list.insert_marker();
        list.push_element(2, start_tag("b", &[]));

        assert!(list.element_in_scope_with_tag_name("a").is_none());
        assert_eq!(list.element_in_scope_with_tag_name("b").map(|(h, _)| *h), Some(2));

        list.clear_to_last_marker();
        assert_eq!(handles(&list), vec![Some(1)]);
        assert_eq!(list.element_in_scope_with_tag_name("a").map(|(h, _)| *h), Some(1));
    }

    #[test]
    fn replace_and_insert() {
        let mut list = ActiveFormattingElements::default();
        list.push_element(1, start_tag("a", &[]));
        list.push_element(2, start_tag("b", &[]));

        list.replace(&1, 10);
        assert_eq!(list.token_for(&10).and_then(Token::tag_name), Some("a"));

        list.insert_at(1, ActiveElement::Element {
            handle: 11,
            token: start_tag("i", &[]),
        });
        assert_eq!(handles(&list), vec![Some(10), Some(11), Some(2)]);

        list.remove(&11);
        assert_eq!(list.position(&2), Some(1));
    }
}
