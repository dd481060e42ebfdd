//! In-memory form surface
//!
//! [`MemoryPage`] implements [`UiDriver`] over a small element tree. It
//! models the control shapes the engine has to cope with: wrappers carrying
//! a qid, plain and numeric inputs, rich-text regions, searchable choice
//! panels that need a filter keystroke, paired toggle buttons, an
//! unsaved-changes prompt, and obscured controls.

use crate::error::DriverError;
use crate::locator::{Locator, Target};
use crate::port::{ElementHandle, ElementInfo, ElementKind, Key, UiDriver, WaitState};
use parking_lot::Mutex;
use std::time::Duration;

/// Label of the row a choice panel shows when a search matches nothing
pub const NO_RESULTS_LABEL: &str = "No results found";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Default)]
struct ChoiceState {
    multi: bool,
    requires_filter: bool,
    remote_empty: bool,
    open: bool,
    filter: String,
    filter_history: Vec<String>,
    options: Vec<usize>,
    selection: Vec<String>,
}

#[derive(Debug, Clone)]
struct Node {
    kind: ElementKind,
    parent: Option<usize>,
    attached: bool,
    dom_id: Option<String>,
    qid: Option<String>,
    name: Option<String>,
    label: String,
    value: String,
    visible: bool,
    enabled: bool,
    active: bool,
    hidden_marked: bool,
    max_length: Option<usize>,
    numeric: bool,
    frozen: bool,
    obscured_clicks: u32,
    all_selected: bool,
    change_events: u32,
    choice: Option<ChoiceState>,
    option_of: Option<usize>,
    option_disabled: bool,
    is_no_results: bool,
}

impl Node {
    fn new(kind: ElementKind, parent: Option<usize>) -> Self {
        Self {
            kind,
            parent,
            attached: true,
            dom_id: None,
            qid: None,
            name: None,
            label: String::new(),
            value: String::new(),
            visible: true,
            enabled: true,
            active: false,
            hidden_marked: false,
            max_length: None,
            numeric: false,
            frozen: false,
            obscured_clicks: 0,
            all_selected: false,
            change_events: 0,
            choice: None,
            option_of: None,
            option_disabled: false,
            is_no_results: false,
        }
    }
}

#[derive(Debug, Default)]
struct PageState {
    nodes: Vec<Node>,
    dialog: Option<(usize, usize)>,
    dialog_shown: bool,
    dialog_after_clicks: Option<u32>,
    clicks: u32,
    disconnected: bool,
}

impl PageState {
    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn node(&self, handle: ElementHandle) -> Result<&Node, DriverError> {
        usize::try_from(handle.0)
            .ok()
            .and_then(|i| self.nodes.get(i))
            .filter(|n| n.attached)
            .ok_or(DriverError::StaleHandle(handle.0))
    }

    fn node_mut(&mut self, handle: ElementHandle) -> Result<&mut Node, DriverError> {
        usize::try_from(handle.0)
            .ok()
            .and_then(|i| self.nodes.get_mut(i))
            .filter(|n| n.attached)
            .ok_or(DriverError::StaleHandle(handle.0))
    }

    fn ensure_connected(&self) -> Result<(), DriverError> {
        if self.disconnected {
            Err(DriverError::Disconnected("page closed".to_string()))
        } else {
            Ok(())
        }
    }

    fn ancestors(&self, idx: usize) -> impl Iterator<Item = &Node> + '_ {
        std::iter::successors(Some(idx), move |i| self.nodes[*i].parent).map(move |i| &self.nodes[i])
    }

    fn is_descendant(&self, idx: usize, ancestor: usize) -> bool {
        let mut cur = self.nodes[idx].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }

    fn in_dialog(&self, idx: usize) -> bool {
        match self.dialog {
            Some((dialog, _)) => idx == dialog || self.is_descendant(idx, dialog),
            None => false,
        }
    }

    fn option_matches(&self, list: &ChoiceState, label: &str) -> bool {
        if list.remote_empty {
            return false;
        }
        if list.requires_filter && list.filter.is_empty() {
            return false;
        }
        label.to_lowercase().contains(&list.filter.to_lowercase())
    }

    /// Attached, and for option rows, currently rendered
    fn is_present(&self, idx: usize) -> bool {
        let node = &self.nodes[idx];
        if !node.attached {
            return false;
        }
        if self.in_dialog(idx) {
            return self.dialog_shown;
        }
        let Some(list_idx) = node.option_of else {
            return true;
        };
        let Some(list) = self.nodes[list_idx].choice.as_ref() else {
            return false;
        };
        if !list.open || !self.nodes[list_idx].attached {
            return false;
        }
        if node.is_no_results {
            let searched = !list.filter.is_empty() || !list.requires_filter;
            let any = list
                .options
                .iter()
                .any(|o| self.option_matches(list, &self.nodes[*o].label));
            searched && !any
        } else {
            self.option_matches(list, &node.label)
        }
    }

    fn matches_target(&self, idx: usize, target: &Target) -> bool {
        let node = &self.nodes[idx];
        match target {
            Target::Input => matches!(node.kind, ElementKind::Input | ElementKind::TextArea),
            Target::RichText => node.kind == ElementKind::RichText,
            Target::Choice => node.kind == ElementKind::Choice,
            Target::Button(label) => {
                node.kind == ElementKind::Button && node.label.eq_ignore_ascii_case(label)
            }
            Target::Named(name) => node.name.as_deref() == Some(name.as_str()),
        }
    }

    fn resolve(&self, locator: &Locator) -> Vec<usize> {
        let present = (0..self.nodes.len()).filter(|i| self.is_present(*i));
        match locator {
            Locator::Id { id } => present
                .filter(|i| self.nodes[*i].dom_id.as_deref() == Some(id.as_str()))
                .collect(),
            Locator::Wrapper { qid } => present
                .filter(|i| {
                    let n = &self.nodes[*i];
                    n.kind == ElementKind::Container && n.qid.as_deref() == Some(qid.as_str())
                })
                .collect(),
            Locator::Within { container, target } => {
                let containers = self.resolve(container);
                present
                    .filter(|i| {
                        containers.iter().any(|c| self.is_descendant(*i, *c))
                            && self.matches_target(*i, target)
                    })
                    .collect()
            }
            Locator::OpenOptions => present
                .filter(|i| self.nodes[*i].kind == ElementKind::Option)
                .collect(),
            Locator::Interstitial => self
                .dialog
                .filter(|_| self.dialog_shown)
                .map(|(d, _)| vec![d])
                .unwrap_or_default(),
            Locator::InterstitialDismiss => self
                .dialog
                .filter(|_| self.dialog_shown)
                .map(|(_, b)| vec![b])
                .unwrap_or_default(),
        }
    }

    fn info(&self, idx: usize) -> ElementInfo {
        let node = &self.nodes[idx];
        let chain: Vec<&Node> = self.ancestors(idx).collect();
        let mut info = ElementInfo::new(node.kind);
        info.visible = self.is_present(idx) && chain.iter().all(|n| n.visible && !n.hidden_marked);
        info.enabled = chain.iter().all(|n| n.enabled) && !node.option_disabled;
        info.active = node.active;
        info.hidden_marked = chain.iter().any(|n| n.hidden_marked);
        info.label.clone_from(&node.label);
        info.max_length = node.max_length;
        if let Some(list_idx) = node.option_of {
            if let Some(list) = self.nodes[list_idx].choice.as_ref() {
                info.selected = list.selection.iter().any(|s| s == &node.label);
            }
        }
        if let Some(choice) = node.choice.as_ref() {
            info.requires_filter = choice.requires_filter;
            info.multi = choice.multi;
        }
        info
    }

    fn select_option(&mut self, option_idx: usize) {
        let label = self.nodes[option_idx].label.clone();
        let Some(list_idx) = self.nodes[option_idx].option_of else {
            return;
        };
        if self.nodes[option_idx].is_no_results || self.nodes[option_idx].option_disabled {
            return;
        }
        if let Some(list) = self.nodes[list_idx].choice.as_mut() {
            if list.multi {
                if !list.selection.contains(&label) {
                    list.selection.push(label);
                }
            } else {
                list.selection = vec![label];
                list.open = false;
                list.filter.clear();
            }
        }
        self.nodes[list_idx].change_events += 1;
    }

    fn press_toggle(&mut self, idx: usize) {
        let parent = self.nodes[idx].parent;
        for i in 0..self.nodes.len() {
            if i != idx && self.nodes[i].kind == ElementKind::Button && self.nodes[i].parent == parent {
                self.nodes[i].active = false;
            }
        }
        self.nodes[idx].active = true;
    }

    fn close_panels(&mut self) {
        for node in &mut self.nodes {
            if let Some(choice) = node.choice.as_mut() {
                choice.open = false;
                choice.filter.clear();
            }
        }
    }

    fn write_typed(node: &mut Node, text: &str) {
        if node.all_selected {
            node.value.clear();
            node.all_selected = false;
        }
        for c in text.chars() {
            if node.max_length.is_some_and(|max| node.value.chars().count() >= max) {
                break;
            }
            if node.numeric && !(c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E')) {
                continue;
            }
            node.value.push(c);
        }
    }
}

/// In-memory [`UiDriver`] implementation
///
/// Builder methods take `&self` so a page can be shared behind an `Arc`
/// and adjusted while a run is in flight.
#[derive(Debug, Default)]
pub struct MemoryPage {
    state: Mutex<PageState>,
}

impl MemoryPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(idx: usize) -> ElementHandle {
        ElementHandle(u64::try_from(idx).unwrap_or(u64::MAX))
    }

    fn index(handle: ElementHandle) -> usize {
        usize::try_from(handle.0).unwrap_or(usize::MAX)
    }

    fn with_node<R>(&self, handle: ElementHandle, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        let mut state = self.state.lock();
        state.node_mut(handle).ok().map(f)
    }

    /// Add a field wrapper carrying `data-qid`
    pub fn add_wrapper(&self, qid: &str, parent: Option<ElementHandle>) -> ElementHandle {
        let mut state = self.state.lock();
        let mut node = Node::new(ElementKind::Container, parent.map(Self::index));
        node.qid = Some(qid.to_string());
        Self::handle(state.push(node))
    }

    /// Add an input with an explicit identifier
    pub fn add_input(
        &self,
        parent: Option<ElementHandle>,
        id: Option<&str>,
        name: Option<&str>,
        value: &str,
    ) -> ElementHandle {
        let mut state = self.state.lock();
        let mut node = Node::new(ElementKind::Input, parent.map(Self::index));
        node.dom_id = id.map(ToString::to_string);
        node.name = name.map(ToString::to_string);
        node.value = value.to_string();
        Self::handle(state.push(node))
    }

    /// Wrapper plus a single-line input whose id is the qid
    pub fn text_field(&self, qid: &str, value: &str) -> ElementHandle {
        let wrapper = self.add_wrapper(qid, None);
        self.add_input(Some(wrapper), Some(qid), None, value)
    }

    /// Wrapper plus a textarea whose id is the qid
    pub fn long_text_field(&self, qid: &str, value: &str) -> ElementHandle {
        let input = self.text_field(qid, value);
        self.with_node(input, |n| n.kind = ElementKind::TextArea);
        input
    }

    /// Wrapper plus a numeric input whose id is the qid
    pub fn number_field(&self, qid: &str, value: &str) -> ElementHandle {
        let input = self.text_field(qid, value);
        self.with_node(input, |n| n.numeric = true);
        input
    }

    /// Numeric input addressed by `name` inside a parent wrapper
    pub fn named_number(&self, parent: ElementHandle, name: &str, value: &str) -> ElementHandle {
        let input = self.add_input(Some(parent), None, Some(name), value);
        self.with_node(input, |n| n.numeric = true);
        input
    }

    /// Wrapper plus a rich-text content region without an identifier
    pub fn rich_text_field(&self, qid: &str, text: &str) -> ElementHandle {
        let wrapper = self.add_wrapper(qid, None);
        let mut state = self.state.lock();
        let mut node = Node::new(ElementKind::RichText, Some(Self::index(wrapper)));
        node.value = text.to_string();
        Self::handle(state.push(node))
    }

    /// Wrapper plus a searchable choice control whose id is the qid
    pub fn choice_field(&self, qid: &str, options: &[&str], multi: bool) -> ElementHandle {
        let wrapper = self.add_wrapper(qid, None);
        let mut state = self.state.lock();
        let mut list = Node::new(ElementKind::Choice, Some(Self::index(wrapper)));
        list.dom_id = Some(qid.to_string());
        let list_idx = state.push(list);

        let mut choice = ChoiceState {
            multi,
            ..ChoiceState::default()
        };
        for label in options {
            let mut opt = Node::new(ElementKind::Option, Some(list_idx));
            opt.label = (*label).to_string();
            opt.option_of = Some(list_idx);
            choice.options.push(state.push(opt));
        }
        let mut empty_row = Node::new(ElementKind::Option, Some(list_idx));
        empty_row.label = NO_RESULTS_LABEL.to_string();
        empty_row.option_of = Some(list_idx);
        empty_row.is_no_results = true;
        state.push(empty_row);

        state.nodes[list_idx].choice = Some(choice);
        Self::handle(list_idx)
    }

    /// Wrapper plus `Yes`/`No` toggle buttons; returns the wrapper
    pub fn yes_no_field(&self, qid: &str, active: Option<&str>) -> ElementHandle {
        let wrapper = self.add_wrapper(qid, None);
        let mut state = self.state.lock();
        for label in ["Yes", "No"] {
            let mut button = Node::new(ElementKind::Button, Some(Self::index(wrapper)));
            button.label = label.to_string();
            button.active = active.is_some_and(|a| a.eq_ignore_ascii_case(label));
            state.push(button);
        }
        wrapper
    }

    /// Show or hide an element
    pub fn set_visible(&self, handle: ElementHandle, visible: bool) {
        self.with_node(handle, |n| n.visible = visible);
    }

    /// Enable or disable an element
    pub fn set_enabled(&self, handle: ElementHandle, enabled: bool) {
        self.with_node(handle, |n| n.enabled = enabled);
    }

    /// Mark an element as intentionally hidden
    pub fn mark_hidden(&self, handle: ElementHandle) {
        self.with_node(handle, |n| {
            n.hidden_marked = true;
            n.visible = false;
        });
    }

    /// Set the `maxlength` attribute
    pub fn set_max_length(&self, handle: ElementHandle, max: usize) {
        self.with_node(handle, |n| n.max_length = Some(max));
    }

    /// Make an element silently ignore writes
    pub fn freeze(&self, handle: ElementHandle) {
        self.with_node(handle, |n| n.frozen = true);
    }

    /// Make the next `clicks` clicks on an element fail as obscured
    pub fn obscure(&self, handle: ElementHandle, clicks: u32) {
        self.with_node(handle, |n| n.obscured_clicks = clicks);
    }

    /// Remove an element from the document
    pub fn detach(&self, handle: ElementHandle) {
        self.with_node(handle, |n| n.attached = false);
    }

    /// Require a filter keystroke before a choice panel lists options
    pub fn set_requires_filter(&self, choice: ElementHandle, requires: bool) {
        self.with_node(choice, |n| {
            if let Some(c) = n.choice.as_mut() {
                c.requires_filter = requires;
            }
        });
    }

    /// Make every search of a choice panel come back empty
    pub fn set_remote_empty(&self, choice: ElementHandle, empty: bool) {
        self.with_node(choice, |n| {
            if let Some(c) = n.choice.as_mut() {
                c.remote_empty = empty;
            }
        });
    }

    /// Disable an option row by label
    pub fn disable_option(&self, choice: ElementHandle, label: &str) {
        let mut state = self.state.lock();
        let Ok(options) = state
            .node(choice)
            .map(|n| n.choice.as_ref().map(|c| c.options.clone()).unwrap_or_default())
        else {
            return;
        };
        for idx in options {
            if state.nodes[idx].label == label {
                state.nodes[idx].option_disabled = true;
            }
        }
    }

    /// Preselect option labels
    pub fn preselect(&self, choice: ElementHandle, labels: &[&str]) {
        self.with_node(choice, |n| {
            if let Some(c) = n.choice.as_mut() {
                c.selection = labels.iter().map(ToString::to_string).collect();
            }
        });
    }

    /// Install the unsaved-changes prompt, initially shown or not
    pub fn install_interstitial(&self, shown: bool) {
        let mut state = self.state.lock();
        if state.dialog.is_none() {
            let mut dialog = Node::new(ElementKind::Dialog, None);
            dialog.label = "You have unsaved changes".to_string();
            let dialog_idx = state.push(dialog);
            let mut dismiss = Node::new(ElementKind::Button, Some(dialog_idx));
            dismiss.label = "Discard".to_string();
            let dismiss_idx = state.push(dismiss);
            state.dialog = Some((dialog_idx, dismiss_idx));
        }
        state.dialog_shown = shown;
    }

    /// Show the unsaved-changes prompt after `clicks` further clicks
    pub fn interstitial_after_clicks(&self, clicks: u32) {
        self.install_interstitial(false);
        let mut state = self.state.lock();
        let at = state.clicks + clicks;
        state.dialog_after_clicks = Some(at);
    }

    /// Drop the connection; every later call fails
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    /// Current value of an input or content region
    #[must_use]
    pub fn value(&self, handle: ElementHandle) -> Option<String> {
        let state = self.state.lock();
        state.node(handle).ok().map(|n| n.value.clone())
    }

    /// Selected labels of a choice control
    #[must_use]
    pub fn selection(&self, choice: ElementHandle) -> Vec<String> {
        let state = self.state.lock();
        state
            .node(choice)
            .ok()
            .and_then(|n| n.choice.as_ref())
            .map(|c| c.selection.clone())
            .unwrap_or_default()
    }

    /// Filters typed into a choice control, in order
    #[must_use]
    pub fn filter_history(&self, choice: ElementHandle) -> Vec<String> {
        let state = self.state.lock();
        state
            .node(choice)
            .ok()
            .and_then(|n| n.choice.as_ref())
            .map(|c| c.filter_history.clone())
            .unwrap_or_default()
    }

    /// Label of the active toggle button under a wrapper
    #[must_use]
    pub fn active_toggle(&self, wrapper: ElementHandle) -> Option<String> {
        let state = self.state.lock();
        let parent = Self::index(wrapper);
        state
            .nodes
            .iter()
            .find(|n| n.kind == ElementKind::Button && n.parent == Some(parent) && n.active)
            .map(|n| n.label.clone())
    }

    /// Number of change notifications an element received
    #[must_use]
    pub fn change_events(&self, handle: ElementHandle) -> u32 {
        let state = self.state.lock();
        state.node(handle).map_or(0, |n| n.change_events)
    }

    /// Whether the unsaved-changes prompt is showing
    #[must_use]
    pub fn interstitial_shown(&self) -> bool {
        self.state.lock().dialog_shown
    }
}

#[async_trait::async_trait]
impl UiDriver for MemoryPage {
    async fn query(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        let state = self.state.lock();
        state.ensure_connected()?;
        Ok(state.resolve(locator).first().copied().map(Self::handle))
    }

    async fn query_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let state = self.state.lock();
        state.ensure_connected()?;
        Ok(state.resolve(locator).into_iter().map(Self::handle).collect())
    }

    async fn inspect(&self, element: ElementHandle) -> Result<ElementInfo, DriverError> {
        let state = self.state.lock();
        state.ensure_connected()?;
        state.node(element)?;
        Ok(state.info(Self::index(element)))
    }

    async fn read_value(&self, element: ElementHandle) -> Result<String, DriverError> {
        let state = self.state.lock();
        state.ensure_connected()?;
        let node = state.node(element)?;
        Ok(match (&node.choice, node.kind) {
            (Some(choice), _) => choice.selection.join(", "),
            (None, ElementKind::Button | ElementKind::Option | ElementKind::Dialog) => {
                node.label.clone()
            }
            (None, _) => node.value.clone(),
        })
    }

    async fn read_selection(&self, element: ElementHandle) -> Result<Vec<String>, DriverError> {
        let state = self.state.lock();
        state.ensure_connected()?;
        let node = state.node(element)?;
        node.choice
            .as_ref()
            .map(|c| c.selection.clone())
            .ok_or_else(|| DriverError::NotInteractable("not a choice control".to_string()))
    }

    async fn clear(&self, element: ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        let node = state.node_mut(element)?;
        if let Some(choice) = node.choice.as_mut() {
            choice.filter.clear();
        } else if !node.frozen {
            node.value.clear();
            node.all_selected = false;
        }
        Ok(())
    }

    async fn set_value(&self, element: ElementHandle, value: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        let node = state.node_mut(element)?;
        if !matches!(node.kind, ElementKind::Input | ElementKind::TextArea) {
            return Err(DriverError::NotInteractable(format!(
                "cannot set value on {:?}",
                node.kind
            )));
        }
        if node.frozen {
            return Ok(());
        }
        node.value = if node.numeric && value.trim().parse::<f64>().is_err() {
            String::new()
        } else {
            value.to_string()
        };
        node.all_selected = false;
        Ok(())
    }

    async fn replace_content(
        &self,
        element: ElementHandle,
        text: &str,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        let node = state.node_mut(element)?;
        if node.kind != ElementKind::RichText {
            return Err(DriverError::NotInteractable("not a content region".to_string()));
        }
        if !node.frozen {
            node.value = text.to_string();
        }
        Ok(())
    }

    async fn dispatch_change(&self, element: ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        state.node_mut(element)?.change_events += 1;
        Ok(())
    }

    async fn select_all(&self, element: ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        state.node_mut(element)?.all_selected = true;
        Ok(())
    }

    async fn type_text(&self, element: ElementHandle, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        let node = state.node_mut(element)?;
        if let Some(choice) = node.choice.as_mut() {
            choice.open = true;
            choice.filter.push_str(text);
            choice.filter_history.push(choice.filter.clone());
            return Ok(());
        }
        if !node.frozen {
            PageState::write_typed(node, text);
        }
        Ok(())
    }

    async fn click(&self, element: ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        let idx = Self::index(element);
        state.node(element)?;

        if state.dialog_shown && !state.in_dialog(idx) {
            return Err(DriverError::Obscured("unsaved changes prompt".to_string()));
        }
        let info = state.info(idx);
        if !info.visible {
            return Err(DriverError::NotInteractable("element not visible".to_string()));
        }

        let node = state.node_mut(element)?;
        if node.obscured_clicks > 0 {
            node.obscured_clicks -= 1;
            return Err(DriverError::Obscured("loading overlay".to_string()));
        }
        if !info.enabled {
            return Err(DriverError::NotInteractable("element disabled".to_string()));
        }

        state.clicks += 1;
        match state.nodes[idx].kind {
            ElementKind::Choice => {
                if let Some(choice) = state.nodes[idx].choice.as_mut() {
                    choice.open = true;
                    choice.filter.clear();
                }
            }
            ElementKind::Option => state.select_option(idx),
            ElementKind::Button => {
                if state.dialog.is_some_and(|(_, dismiss)| dismiss == idx) {
                    state.dialog_shown = false;
                } else {
                    state.press_toggle(idx);
                }
            }
            _ => {}
        }

        if state.dialog_after_clicks.is_some_and(|at| state.clicks >= at) {
            state.dialog_after_clicks = None;
            state.dialog_shown = true;
        }
        Ok(())
    }

    async fn press_key(&self, element: ElementHandle, key: Key) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.ensure_connected()?;
        state.node(element)?;
        match key {
            Key::Escape => state.close_panels(),
            Key::Backspace => {
                let node = state.node_mut(element)?;
                if node.frozen {
                    return Ok(());
                }
                if node.all_selected {
                    node.value.clear();
                    node.all_selected = false;
                } else {
                    node.value.pop();
                }
            }
            Key::Enter | Key::Tab => {}
        }
        Ok(())
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> Result<bool, DriverError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let reached = {
                let page = self.state.lock();
                page.ensure_connected()?;
                let found = page.resolve(locator);
                match state {
                    WaitState::Attached => !found.is_empty(),
                    WaitState::Visible => found.iter().any(|i| page.info(*i).visible),
                    WaitState::Hidden => found.iter().all(|i| !page.info(*i).visible),
                }
            };
            if reached {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!(%locator, ?state, "wait_for timed out");
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn query_by_id_and_wrapper() {
        let page = MemoryPage::new();
        let input = page.text_field("title", "Intro");
        assert_eq!(page.query(&Locator::id("title")).await.unwrap(), Some(input));
        let nested = Locator::wrapper("title").within(Target::Input);
        assert_eq!(page.query(&nested).await.unwrap(), Some(input));
        assert_eq!(page.query(&Locator::id("missing")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn hidden_ancestor_hides_descendants() {
        let page = MemoryPage::new();
        let input = page.text_field("notes", "x");
        let wrapper = page.query(&Locator::wrapper("notes")).await.unwrap().unwrap();
        page.mark_hidden(wrapper);
        let info = page.inspect(input).await.unwrap();
        assert!(!info.visible);
        assert!(info.hidden_marked);
    }

    #[tokio::test]
    async fn numeric_input_rejects_text() {
        let page = MemoryPage::new();
        let input = page.number_field("seats", "");
        page.set_value(input, "12abc").await.unwrap();
        assert_eq!(page.value(input).unwrap(), "");
        page.set_value(input, "12").await.unwrap();
        assert_eq!(page.value(input).unwrap(), "12");
    }

    #[tokio::test]
    async fn typing_respects_maxlength() {
        let page = MemoryPage::new();
        let input = page.text_field("code", "old");
        page.set_max_length(input, 4);
        page.select_all(input).await.unwrap();
        page.type_text(input, "ABCDEFG").await.unwrap();
        assert_eq!(page.value(input).unwrap(), "ABCD");
    }

    #[tokio::test]
    async fn choice_panel_requires_filter() {
        let page = MemoryPage::new();
        let list = page.choice_field("dept", &["Biology", "Chemistry"], false);
        page.set_requires_filter(list, true);

        page.click(list).await.unwrap();
        assert!(page.query_all(&Locator::OpenOptions).await.unwrap().is_empty());

        page.type_text(list, "b").await.unwrap();
        let rows = page.query_all(&Locator::OpenOptions).await.unwrap();
        assert_eq!(rows.len(), 1);
        page.click(rows[0]).await.unwrap();
        assert_eq!(page.selection(list), vec!["Biology".to_string()]);
    }

    #[tokio::test]
    async fn empty_search_shows_no_results_row() {
        let page = MemoryPage::new();
        let list = page.choice_field("tags", &["Lab"], true);
        page.set_remote_empty(list, true);
        page.click(list).await.unwrap();
        page.type_text(list, "a").await.unwrap();
        let rows = page.query_all(&Locator::OpenOptions).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(page.inspect(rows[0]).await.unwrap().label, NO_RESULTS_LABEL);
    }

    #[tokio::test]
    async fn toggle_buttons_are_exclusive() {
        let page = MemoryPage::new();
        let wrapper = page.yes_no_field("isActive", Some("No"));
        let yes = page
            .query(&Locator::wrapper("isActive").within(Target::Button("Yes".into())))
            .await
            .unwrap()
            .unwrap();
        page.click(yes).await.unwrap();
        assert_eq!(page.active_toggle(wrapper).as_deref(), Some("Yes"));
    }

    #[tokio::test]
    async fn interstitial_blocks_clicks_until_dismissed() {
        let page = MemoryPage::new();
        let input = page.text_field("title", "");
        page.install_interstitial(true);
        assert!(page.click(input).await.unwrap_err().is_blocking());

        let dismiss = page.query(&Locator::InterstitialDismiss).await.unwrap().unwrap();
        page.click(dismiss).await.unwrap();
        assert!(!page.interstitial_shown());
        page.click(input).await.unwrap();
    }

    #[tokio::test]
    async fn obscured_clicks_run_out() {
        let page = MemoryPage::new();
        let input = page.text_field("title", "");
        page.obscure(input, 1);
        assert!(page.click(input).await.is_err());
        assert!(page.click(input).await.is_ok());
    }

    #[tokio::test]
    async fn disconnect_fails_everything() {
        let page = MemoryPage::new();
        page.text_field("title", "");
        page.disconnect();
        let err = page.query(&Locator::id("title")).await.unwrap_err();
        assert!(err.is_infrastructure());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_times_out() {
        let page = MemoryPage::new();
        let reached = page
            .wait_for(&Locator::Interstitial, WaitState::Visible, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(!reached);
        let hidden = page
            .wait_for(&Locator::Interstitial, WaitState::Hidden, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(hidden);
    }
}
