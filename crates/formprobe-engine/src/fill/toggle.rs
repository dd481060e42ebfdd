//! Paired Yes/No toggle buttons

use crate::error::{DriverResultExt, FieldError};
use crate::surface::Surface;
use formprobe_driver::{DriverError, Locator, Target};
use formprobe_policy::ToggleSide;

fn button(container: &Locator, side: ToggleSide) -> Locator {
    container.clone().within(Target::Button(side.label().to_string()))
}

/// Side whose button is visually active, if any
///
/// # Errors
/// Driver failures
pub async fn read_active(
    surface: &Surface,
    container: &Locator,
) -> Result<Option<ToggleSide>, DriverError> {
    for side in [ToggleSide::Yes, ToggleSide::No] {
        if let Some(handle) = surface.query(&button(container, side)).await? {
            if surface.inspect(handle).await?.active {
                return Ok(Some(side));
            }
        }
    }
    Ok(None)
}

/// Select the opposite of the active side, or `Yes` if neither is active;
/// returns the side clicked
pub(crate) async fn flip(
    surface: &Surface,
    container: &Locator,
    qid: &str,
) -> Result<ToggleSide, FieldError> {
    let current = read_active(surface, container).await.for_field(qid)?;
    let target = current.map_or(ToggleSide::Yes, ToggleSide::opposite);
    press(surface, container, target, qid).await?;
    Ok(target)
}

/// Click one side
pub(crate) async fn press(
    surface: &Surface,
    container: &Locator,
    side: ToggleSide,
    qid: &str,
) -> Result<(), FieldError> {
    let Some(handle) = surface
        .query(&button(container, side))
        .await
        .for_field(qid)?
    else {
        return Err(FieldError::NotFound {
            qid: qid.to_string(),
        });
    };
    surface.click(handle).await.for_field(qid)
}
