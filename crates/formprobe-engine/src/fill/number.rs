//! Numeric inputs

use crate::error::{DriverResultExt, FieldError};
use crate::surface::Surface;
use formprobe_driver::ElementHandle;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("numeric token regex is valid"));

/// First numeric token in a string
#[must_use]
pub fn sanitize_numeric(raw: &str) -> Option<&str> {
    NUMERIC_TOKEN.find(raw).map(|m| m.as_str())
}

fn has_alphabetic(s: &str) -> bool {
    s.chars().any(char::is_alphabetic)
}

/// Write the sanitised number; retry once by typing if letters leak through
pub(crate) async fn fill_number(
    surface: &Surface,
    element: ElementHandle,
    value: &str,
    qid: &str,
) -> Result<(), FieldError> {
    let token = sanitize_numeric(value).unwrap_or(value);

    surface.click(element).await.for_field(qid)?;
    surface.clear(element).await.for_field(qid)?;
    surface.set_value(element, token).await.for_field(qid)?;
    surface.dispatch_change(element).await.for_field(qid)?;

    let current = surface.read_value(element).await.for_field(qid)?;
    if !has_alphabetic(&current) {
        return Ok(());
    }

    tracing::debug!(qid, current = %current, "alphabetic leakage in numeric field, retrying");
    surface.select_all(element).await.for_field(qid)?;
    surface.type_text(element, token).await.for_field(qid)?;
    surface.dispatch_change(element).await.for_field(qid)?;

    let current = surface.read_value(element).await.for_field(qid)?;
    if has_alphabetic(&current) {
        return Err(FieldError::NumericLeak {
            qid: qid.to_string(),
            actual: current,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formprobe_driver::MemoryPage;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn first_token_wins() {
        assert_eq!(sanitize_numeric("15 minutes"), Some("15"));
        assert_eq!(sanitize_numeric("abc -2.5 and 3"), Some("-2.5"));
        assert_eq!(sanitize_numeric("none"), None);
    }

    #[tokio::test]
    async fn writes_token() {
        let page = Arc::new(MemoryPage::new());
        let input = page.number_field("seats", "4");
        let surface = Surface::new(page.clone(), Duration::from_millis(200));
        fill_number(&surface, input, "10", "seats").await.unwrap();
        assert_eq!(page.value(input).as_deref(), Some("10"));
    }
}
