//! Timeout-bounded view of the UI driver
//!
//! Every surface call made by the engine goes through [`Surface`], which
//! wraps it in its own `tokio::time::timeout`.

use formprobe_driver::{
    DriverError, ElementHandle, ElementInfo, Key, Locator, UiDriver, WaitState,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Driver plus per-call timeout
#[derive(Clone)]
pub struct Surface {
    driver: Arc<dyn UiDriver>,
    timeout: Duration,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Wrap a driver
    #[must_use]
    pub fn new(driver: Arc<dyn UiDriver>, timeout: Duration) -> Self {
        Self { driver, timeout }
    }

    /// Underlying driver
    #[inline]
    #[must_use]
    pub fn driver(&self) -> &dyn UiDriver {
        self.driver.as_ref()
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, DriverError>
    where
        F: Future<Output = Result<T, DriverError>>,
    {
        if let Ok(result) = tokio::time::timeout(self.timeout, fut).await {
            result
        } else {
            let ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(op, ms, "surface call timed out");
            Err(DriverError::timeout(op, ms))
        }
    }

    /// First element matching a locator
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn query(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        self.bounded("query", self.driver.query(locator)).await
    }

    /// All elements matching a locator
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn query_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        self.bounded("query_all", self.driver.query_all(locator)).await
    }

    /// Inspect an element
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn inspect(&self, element: ElementHandle) -> Result<ElementInfo, DriverError> {
        self.bounded("inspect", self.driver.inspect(element)).await
    }

    /// Read an element's value
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn read_value(&self, element: ElementHandle) -> Result<String, DriverError> {
        self.bounded("read_value", self.driver.read_value(element)).await
    }

    /// Read a choice control's selection
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn read_selection(&self, element: ElementHandle) -> Result<Vec<String>, DriverError> {
        self.bounded("read_selection", self.driver.read_selection(element))
            .await
    }

    /// Clear an element
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn clear(&self, element: ElementHandle) -> Result<(), DriverError> {
        self.bounded("clear", self.driver.clear(element)).await
    }

    /// Set an element's value
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn set_value(&self, element: ElementHandle, value: &str) -> Result<(), DriverError> {
        self.bounded("set_value", self.driver.set_value(element, value))
            .await
    }

    /// Replace rich-text content
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn replace_content(
        &self,
        element: ElementHandle,
        text: &str,
    ) -> Result<(), DriverError> {
        self.bounded("replace_content", self.driver.replace_content(element, text))
            .await
    }

    /// Emit change notifications
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn dispatch_change(&self, element: ElementHandle) -> Result<(), DriverError> {
        self.bounded("dispatch_change", self.driver.dispatch_change(element))
            .await
    }

    /// Select all text
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn select_all(&self, element: ElementHandle) -> Result<(), DriverError> {
        self.bounded("select_all", self.driver.select_all(element)).await
    }

    /// Type text
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn type_text(&self, element: ElementHandle, text: &str) -> Result<(), DriverError> {
        self.bounded("type_text", self.driver.type_text(element, text))
            .await
    }

    /// Click an element
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn click(&self, element: ElementHandle) -> Result<(), DriverError> {
        self.bounded("click", self.driver.click(element)).await
    }

    /// Press a key
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn press_key(&self, element: ElementHandle, key: Key) -> Result<(), DriverError> {
        self.bounded("press_key", self.driver.press_key(element, key))
            .await
    }

    /// Wait for a locator to reach a state within `wait`
    ///
    /// The per-call timeout is extended by `wait` so the driver's own
    /// deadline fires first.
    ///
    /// # Errors
    /// Driver failure or timeout
    pub async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        wait: Duration,
    ) -> Result<bool, DriverError> {
        let budget = self.timeout + wait;
        match tokio::time::timeout(budget, self.driver.wait_for(locator, state, wait)).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }

    /// Pause for the UI to settle
    pub async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
