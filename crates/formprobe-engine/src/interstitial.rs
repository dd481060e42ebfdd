//! Unsaved-changes prompt handling

use crate::surface::Surface;
use formprobe_driver::{DriverError, Locator, WaitState};
use std::time::Duration;

/// Dismiss the unsaved-changes prompt if it is showing
///
/// Returns whether a prompt was dismissed.
///
/// # Errors
/// Driver failures while clicking the dismiss control
pub async fn dismiss_interstitial(surface: &Surface, wait: Duration) -> Result<bool, DriverError> {
    let Some(dismiss) = surface.query(&Locator::InterstitialDismiss).await? else {
        return Ok(false);
    };
    tracing::info!("dismissing unsaved-changes prompt");
    surface.click(dismiss).await?;
    let gone = surface
        .wait_for(&Locator::Interstitial, WaitState::Hidden, wait)
        .await?;
    if !gone {
        tracing::warn!("unsaved-changes prompt still showing after dismissal");
    }
    Ok(true)
}
