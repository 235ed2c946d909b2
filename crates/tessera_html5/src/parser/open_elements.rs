use crate::tree_adapter::Namespace;

/// Element on the stack of open elements. The name and namespace are cached so the stack can
/// be queried without going through the tree adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct StackEntry<H> {
    pub handle: H,
    pub name: String,
    pub namespace: Namespace,
    /// True for SVG foreignObject/desc/title and for MathML annotation-xml elements with an
    /// HTML encoding
    pub html_integration_point: bool,
}

impl<H> StackEntry<H> {
    pub fn new(handle: H, name: &str, namespace: Namespace) -> Self {
        Self {
            handle,
            name: name.to_string(),
            namespace,
            html_integration_point: false,
        }
    }

    /// Returns true when the entry is the HTML element with the given name
    pub fn is_html(&self, name: &str) -> bool {
        self.namespace == Namespace::Html && self.name == name
    }

    pub fn is_html_one_of(&self, names: &[&str]) -> bool {
        self.namespace == Namespace::Html && names.contains(&self.name.as_str())
    }

    pub fn is_mathml_text_integration_point(&self) -> bool {
        self.namespace == Namespace::MathMl && matches!(self.name.as_str(), "mi" | "mo" | "mn" | "ms" | "mtext")
    }
}

/// Scopes as defined in 13.2.4.2
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Regular,
    ListItem,
    Button,
    Table,
    Select,
}

impl Scope {
    /// Returns true when the element terminates a scope lookup
    fn is_boundary(&self, name: &str, namespace: Namespace) -> bool {
        match self {
            Scope::Regular => is_default_boundary(name, namespace),
            Scope::ListItem => {
                is_default_boundary(name, namespace) || (namespace == Namespace::Html && matches!(name, "ol" | "ul"))
            }
            Scope::Button => is_default_boundary(name, namespace) || (namespace == Namespace::Html && name == "button"),
            Scope::Table => namespace == Namespace::Html && matches!(name, "html" | "table" | "template"),
            Scope::Select => !(namespace == Namespace::Html && matches!(name, "optgroup" | "option")),
        }
    }
}

fn is_default_boundary(name: &str, namespace: Namespace) -> bool {
    match namespace {
        Namespace::Html => matches!(
            name,
            "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object" | "template"
        ),
        Namespace::MathMl => matches!(name, "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml"),
        Namespace::Svg => matches!(name, "foreignObject" | "desc" | "title"),
        _ => false,
    }
}

/// Elements popped by "generate implied end tags"
const IMPLIED_END_TAGS: [&str; 10] = ["dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc"];

/// Elements popped by "generate all implied end tags thoroughly"
const IMPLIED_END_TAGS_THOROUGHLY: [&str; 18] = [
    "caption", "colgroup", "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc", "tbody", "td",
    "tfoot", "th", "thead", "tr",
];

/// The stack of open elements (13.2.4.3). Index 0 is the bottom of the stack, which is always
/// the html element once parsing has started.
#[derive(Debug)]
pub struct OpenElements<H> {
    entries: Vec<StackEntry<H>>,
}

impl<H> Default for OpenElements<H> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<H: Clone + PartialEq> OpenElements<H> {
    pub fn push(&mut self, entry: StackEntry<H>) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<StackEntry<H>> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the current node
    pub fn current(&self) -> Option<&StackEntry<H>> {
        self.entries.last()
    }

    pub fn get(&self, idx: usize) -> Option<&StackEntry<H>> {
        self.entries.get(idx)
    }

    pub fn first(&self) -> Option<&StackEntry<H>> {
        self.entries.first()
    }

    /// Iterates from the bottom (html) to the top (current node)
    pub fn iter(&self) -> std::slice::Iter<'_, StackEntry<H>> {
        self.entries.iter()
    }

    pub fn position(&self, handle: &H) -> Option<usize> {
        self.entries.iter().rposition(|entry| entry.handle == *handle)
    }

    pub fn contains(&self, handle: &H) -> bool {
        self.position(handle).is_some()
    }

    /// Returns true when an HTML element with the given name is on the stack
    pub fn contains_html(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.is_html(name))
    }

    pub fn current_is_html(&self, name: &str) -> bool {
        self.current().is_some_and(|entry| entry.is_html(name))
    }

    pub fn current_is_html_one_of(&self, names: &[&str]) -> bool {
        self.current().is_some_and(|entry| entry.is_html_one_of(names))
    }

    /// Pops elements until an HTML element with the given name has been popped. Returns the
    /// popped element with that name.
    pub fn pop_until_tag_name_popped(&mut self, name: &str) -> Option<StackEntry<H>> {
        while let Some(entry) = self.entries.pop() {
            if entry.is_html(name) {
                return Some(entry);
            }
        }
        None
    }

    /// Pops elements until an HTML element with one of the given names has been popped
    pub fn pop_until_one_of_popped(&mut self, names: &[&str]) -> Option<StackEntry<H>> {
        while let Some(entry) = self.entries.pop() {
            if entry.is_html_one_of(names) {
                return Some(entry);
            }
        }
        None
    }

    pub fn pop_until_element_popped(&mut self, handle: &H) -> Option<StackEntry<H>> {
        while let Some(entry) = self.entries.pop() {
            if entry.handle == *handle {
                return Some(entry);
            }
        }
        None
    }

    /// Pops everything except the html element at the bottom of the stack
    pub fn pop_all_up_to_html_element(&mut self) {
        self.entries.truncate(1);
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn remove(&mut self, handle: &H) -> Option<StackEntry<H>> {
        let idx = self.position(handle)?;
        Some(self.entries.remove(idx))
    }

    pub fn remove_at(&mut self, idx: usize) -> Option<StackEntry<H>> {
        (idx < self.entries.len()).then(|| self.entries.remove(idx))
    }

    /// Replaces the entry for `old` in place
    pub fn replace(&mut self, old: &H, new: StackEntry<H>) {
        if let Some(idx) = self.position(old) {
            self.entries[idx] = new;
        }
    }

    /// Inserts the entry directly above (closer to the current node than) `reference`
    pub fn insert_after(&mut self, reference: &H, entry: StackEntry<H>) {
        match self.position(reference) {
            Some(idx) => self.entries.insert(idx + 1, entry),
            None => self.entries.push(entry),
        }
    }

    /// Returns the element directly below `handle` on the stack
    pub fn common_ancestor(&self, handle: &H) -> Option<&StackEntry<H>> {
        let idx = self.position(handle)?;
        idx.checked_sub(1).and_then(|idx| self.entries.get(idx))
    }

    /// Walks the stack top-down looking for the HTML element with the given name. Returns false
    /// when a boundary element for the scope is found first.
    pub fn has_in_scope_of(&self, name: &str, scope: Scope) -> bool {
        self.has_one_of_in_scope_of(&[name], scope)
    }

    pub fn has_one_of_in_scope_of(&self, names: &[&str], scope: Scope) -> bool {
        for entry in self.entries.iter().rev() {
            if entry.is_html_one_of(names) {
                return true;
            }
            if scope.is_boundary(&entry.name, entry.namespace) {
                return false;
            }
        }
        true
    }

    pub fn has_in_scope(&self, name: &str) -> bool {
        self.has_in_scope_of(name, Scope::Regular)
    }

    pub fn has_in_list_item_scope(&self, name: &str) -> bool {
        self.has_in_scope_of(name, Scope::ListItem)
    }

    pub fn has_in_button_scope(&self, name: &str) -> bool {
        self.has_in_scope_of(name, Scope::Button)
    }

    pub fn has_in_table_scope(&self, name: &str) -> bool {
        self.has_in_scope_of(name, Scope::Table)
    }

    pub fn has_in_select_scope(&self, name: &str) -> bool {
        self.has_in_scope_of(name, Scope::Select)
    }

    pub fn has_numbered_header_in_scope(&self) -> bool {
        self.has_one_of_in_scope_of(&["h1", "h2", "h3", "h4", "h5", "h6"], Scope::Regular)
    }

    /// Returns true when the given element is in (regular) scope
    pub fn has_element_in_scope(&self, handle: &H) -> bool {
        for entry in self.entries.iter().rev() {
            if entry.handle == *handle {
                return true;
            }
            if Scope::Regular.is_boundary(&entry.name, entry.namespace) {
                return false;
            }
        }
        true
    }

    /// Pops while the current node has an implied end tag, except for `exclude`
    pub fn generate_implied_end_tags(&mut self, exclude: Option<&str>) {
        while let Some(current) = self.current() {
            if current.namespace != Namespace::Html
                || !IMPLIED_END_TAGS.contains(&current.name.as_str())
                || exclude == Some(current.name.as_str())
            {
                break;
            }
            self.entries.pop();
        }
    }

    pub fn generate_implied_end_tags_thoroughly(&mut self) {
        while self.current_is_html_one_of(&IMPLIED_END_TAGS_THOROUGHLY) {
            self.entries.pop();
        }
    }

    pub fn clear_back_to_table_context(&mut self) {
        while !self.is_empty() && !self.current_is_html_one_of(&["table", "template", "html"]) {
            self.entries.pop();
        }
    }

    pub fn clear_back_to_table_body_context(&mut self) {
        while !self.is_empty() && !self.current_is_html_one_of(&["tbody", "tfoot", "thead", "template", "html"]) {
            self.entries.pop();
        }
    }

    pub fn clear_back_to_table_row_context(&mut self) {
        while !self.is_empty() && !self.current_is_html_one_of(&["tr", "template", "html"]) {
            self.entries.pop();
        }
    }

    /// Returns the index of the topmost HTML element with the given name
    pub fn last_html_position(&self, name: &str) -> Option<usize> {
        self.entries.iter().rposition(|entry| entry.is_html(name))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn build_stack(names: &[&str]) -> OpenElements<usize> {
        let mut stack = OpenElements::default();
        for (idx, name) in names.iter().enumerate() {
            let (namespace, name) = match name.split_once(' ') {
                Some(("svg", name)) => (Namespace::Svg, name),
                Some(("math", name)) => (Namespace::MathMl, name),
                _ => (Namespace::Html, *name),
            };
            stack.push(StackEntry::new(idx, name, namespace));
        }
        stack
    }

    #[test_case(&["html", "body", "p"], "p", Scope::Regular, true ; "current node")]
    #[test_case(&["html", "body", "p", "table"], "p", Scope::Regular, false ; "table boundary")]
    #[test_case(&["html", "body", "p", "button"], "p", Scope::Regular, true ; "button in regular scope")]
    #[test_case(&["html", "body", "p", "button"], "p", Scope::Button, false ; "button boundary")]
    #[test_case(&["html", "body", "li", "ul"], "li", Scope::ListItem, false ; "list boundary")]
    #[test_case(&["html", "body", "li", "ul"], "li", Scope::Regular, true ; "list in regular scope")]
    #[test_case(&["html", "body", "table", "div", "td"], "div", Scope::Table, true ; "table scope ignores td")]
    #[test_case(&["html", "body", "table", "tbody"], "body", Scope::Table, false ; "table scope boundary")]
    #[test_case(&["html", "body", "select", "optgroup", "option"], "select", Scope::Select, true ; "select scope")]
    #[test_case(&["html", "body", "select", "div"], "select", Scope::Select, false ; "select inverted")]
    #[test_case(&["html", "body", "p", "svg foreignObject"], "p", Scope::Regular, false ; "svg boundary")]
    #[test_case(&["html", "body", "p", "math mi"], "p", Scope::Regular, false ; "mathml boundary")]
    #[test_case(&["html", "body", "p", "svg table"], "p", Scope::Regular, true ; "foreign table is no boundary")]
    #[test_case(&["body", "div"], "p", Scope::Regular, true ; "exhausted stack")]
    fn scopes(names: &[&str], target: &str, scope: Scope, expected: bool) {
        assert_eq!(build_stack(names).has_in_scope_of(target, scope), expected);
    }

    #[test]
    fn stricter_scopes_never_see_more() {
        let stacks: [&[&str]; 4] = [
            &["html", "body", "p", "button", "span"],
            &["html", "body", "p", "ul", "li"],
            &["html", "body", "p", "table", "caption"],
            &["html", "body", "div", "p"],
        ];

        for names in stacks {
            let stack = build_stack(names);
            if stack.has_in_list_item_scope("p") || stack.has_in_button_scope("p") {
                assert!(stack.has_in_scope("p"));
            }
        }
    }

    #[test]
    fn implied_end_tags() {
        let mut stack = build_stack(&["html", "body", "ul", "li", "p"]);
        stack.generate_implied_end_tags(Some("p"));
        assert_eq!(stack.len(), 5);

        stack.generate_implied_end_tags(Some("li"));
        assert_eq!(stack.current().map(|e| e.name.as_str()), Some("li"));

        stack.generate_implied_end_tags(None);
        assert!(stack.current_is_html("ul"));

        let mut stack = build_stack(&["html", "body", "table", "tbody", "tr", "td", "p"]);
        stack.generate_implied_end_tags_thoroughly();
        assert!(stack.current_is_html("table"));
    }

    #[test]
    fn clear_back_to_contexts() {
        let mut stack = build_stack(&["html", "body", "table", "tbody", "tr", "td", "b"]);
        stack.clear_back_to_table_row_context();
        assert!(stack.current_is_html("tr"));
        stack.clear_back_to_table_body_context();
        assert!(stack.current_is_html("tbody"));
        stack.clear_back_to_table_context();
        assert!(stack.current_is_html("table"));
    }

    #[test]
    fn pop_remove_replace() {
        let mut stack = build_stack(&["html", "body", "div", "b", "i"]);

        assert_eq!(stack.common_ancestor(&3).map(|e| e.handle), Some(2));
        stack.replace(&3, StackEntry::new(10, "b", Namespace::Html));
        assert!(stack.contains(&10));
        assert!(!stack.contains(&3));

        stack.insert_after(&2, StackEntry::new(11, "em", Namespace::Html));
        assert_eq!(stack.get(3).map(|e| e.handle), Some(11));

        assert_eq!(stack.remove(&11).map(|e| e.handle), Some(11));
        assert_eq!(stack.pop_until_tag_name_popped("b").map(|e| e.handle), Some(10));
        assert!(stack.current_is_html("div"));

        stack.pop_all_up_to_html_element();
        assert_eq!(stack.len(), 1);
        assert!(stack.current_is_html("html"));
    }
}
