//! Date inputs

use crate::error::{DriverResultExt, FieldError};
use crate::surface::Surface;
use formprobe_driver::{ElementHandle, Key};

/// Write a pre-formatted date and move focus away to close any picker
pub(crate) async fn fill_date(
    surface: &Surface,
    element: ElementHandle,
    formatted: &str,
    qid: &str,
) -> Result<(), FieldError> {
    surface.click(element).await.for_field(qid)?;
    surface.clear(element).await.for_field(qid)?;
    surface.set_value(element, formatted).await.for_field(qid)?;
    surface.dispatch_change(element).await.for_field(qid)?;
    surface.press_key(element, Key::Tab).await.for_field(qid)?;
    Ok(())
}
