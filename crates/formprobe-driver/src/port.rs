//! UI surface port
//!
//! The engine reaches the live form only through [`UiDriver`]. Every method
//! is a suspension point; callers wrap each one in their own timeout.

use crate::error::DriverError;
use crate::locator::Locator;
use std::time::Duration;

/// Opaque reference to an element on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u64);

/// Coarse element classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Single-line input
    Input,
    /// Multi-line plain text
    TextArea,
    /// Rich-text content region
    RichText,
    /// Searchable choice control
    Choice,
    /// Option row inside an open choice panel
    Option,
    /// Button
    Button,
    /// Field wrapper or other container
    Container,
    /// Modal prompt
    Dialog,
}

/// State of an element at inspection time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    /// Element kind
    pub kind: ElementKind,
    /// Rendered and not hidden by an ancestor
    pub visible: bool,
    /// Accepts interaction
    pub enabled: bool,
    /// Visually active (toggle button pressed)
    pub active: bool,
    /// Option already selected
    pub selected: bool,
    /// Visible text or accessible label
    pub label: String,
    /// Element or an ancestor is marked as intentionally hidden
    pub hidden_marked: bool,
    /// Choice control shows no options until a filter keystroke
    pub requires_filter: bool,
    /// Choice control accepts multiple selections
    pub multi: bool,
    /// `maxlength` attribute
    pub max_length: Option<usize>,
}

impl ElementInfo {
    /// Info for a visible, enabled element of the given kind
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            visible: true,
            enabled: true,
            active: false,
            selected: false,
            label: String::new(),
            hidden_marked: false,
            requires_filter: false,
            multi: false,
            max_length: None,
        }
    }

    /// Visible and enabled
    #[inline]
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Keyboard keys the engine sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Confirm
    Enter,
    /// Close panels
    Escape,
    /// Delete backwards
    Backspace,
    /// Move focus
    Tab,
}

/// Element state awaited by [`UiDriver::wait_for`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitState {
    /// Present in the document
    Attached,
    /// Present and visible
    Visible,
    /// Absent or not visible
    Hidden,
}

/// Port to the live form surface
#[async_trait::async_trait]
pub trait UiDriver: Send + Sync {
    /// First element matching the locator
    async fn query(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError>;

    /// All elements matching the locator, in document order
    async fn query_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError>;

    /// Visibility, enablement, and related state
    async fn inspect(&self, element: ElementHandle) -> Result<ElementInfo, DriverError>;

    /// Current value of an input or text of a content region
    async fn read_value(&self, element: ElementHandle) -> Result<String, DriverError>;

    /// Selected labels of a choice control
    async fn read_selection(&self, element: ElementHandle) -> Result<Vec<String>, DriverError>;

    /// Clear an input
    async fn clear(&self, element: ElementHandle) -> Result<(), DriverError>;

    /// Set an input's value programmatically
    async fn set_value(&self, element: ElementHandle, value: &str) -> Result<(), DriverError>;

    /// Replace the content node of a rich-text region
    async fn replace_content(&self, element: ElementHandle, text: &str)
        -> Result<(), DriverError>;

    /// Emit input/change notifications for an element
    async fn dispatch_change(&self, element: ElementHandle) -> Result<(), DriverError>;

    /// Select all text in an element
    async fn select_all(&self, element: ElementHandle) -> Result<(), DriverError>;

    /// Type text as keystrokes
    async fn type_text(&self, element: ElementHandle, text: &str) -> Result<(), DriverError>;

    /// Click an element
    async fn click(&self, element: ElementHandle) -> Result<(), DriverError>;

    /// Press a key with focus on an element
    async fn press_key(&self, element: ElementHandle, key: Key) -> Result<(), DriverError>;

    /// Wait until the locator reaches a state; `false` on timeout
    async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Duration,
    ) -> Result<bool, DriverError>;
}
