//! Plain and long text, and rich-text regions

use crate::error::{DriverResultExt, FieldError};
use crate::surface::Surface;
use formprobe_driver::ElementHandle;

/// Clear then set; fall back to select-all and typing if the value did
/// not stick
pub(crate) async fn fill_text(
    surface: &Surface,
    element: ElementHandle,
    value: &str,
    qid: &str,
) -> Result<(), FieldError> {
    surface.click(element).await.for_field(qid)?;
    surface.clear(element).await.for_field(qid)?;
    surface.set_value(element, value).await.for_field(qid)?;
    surface.dispatch_change(element).await.for_field(qid)?;

    let current = surface.read_value(element).await.for_field(qid)?;
    if current != value {
        tracing::debug!(qid, "programmatic set did not stick, typing instead");
        surface.select_all(element).await.for_field(qid)?;
        surface.type_text(element, value).await.for_field(qid)?;
        surface.dispatch_change(element).await.for_field(qid)?;
    }
    Ok(())
}

/// Replace the content node and notify listeners
pub(crate) async fn fill_rich_text(
    surface: &Surface,
    element: ElementHandle,
    value: &str,
    qid: &str,
) -> Result<(), FieldError> {
    surface.click(element).await.for_field(qid)?;
    surface.replace_content(element, value).await.for_field(qid)?;
    surface.dispatch_change(element).await.for_field(qid)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formprobe_driver::MemoryPage;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn sets_value_and_notifies() {
        let page = Arc::new(MemoryPage::new());
        let input = page.text_field("title", "Intro");
        let surface = Surface::new(page.clone(), Duration::from_millis(200));

        fill_text(&surface, input, "Intro-CDtest", "title").await.unwrap();
        assert_eq!(page.value(input).as_deref(), Some("Intro-CDtest"));
        assert_eq!(page.change_events(input), 1);
    }

    #[tokio::test]
    async fn rich_text_replaces_content() {
        let page = Arc::new(MemoryPage::new());
        let region = page.rich_text_field("bio", "old");
        let surface = Surface::new(page.clone(), Duration::from_millis(200));

        fill_rich_text(&surface, region, "new-CDtest", "bio").await.unwrap();
        assert_eq!(page.value(region).as_deref(), Some("new-CDtest"));
        assert_eq!(page.change_events(region), 1);
    }
}
