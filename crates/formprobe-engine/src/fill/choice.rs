//! Searchable single and multi choice controls
//!
//! Some choice panels list nothing until a filter keystroke is typed and
//! query a remote source per keystroke. When the panel is empty the filler
//! probes a bounded, shuffled letter sequence and stops at the first letter
//! that yields a selectable option.

use crate::config::EngineConfig;
use crate::error::{DriverResultExt, FieldError};
use crate::surface::Surface;
use formprobe_driver::{ElementHandle, Key, Locator};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

const EMPTY_ROW_PREFIXES: [&str; 4] = ["no results", "no options", "no matches", "nothing found"];

/// Placeholder rows a panel shows instead of options
#[must_use]
pub fn is_empty_row(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    label.is_empty() || EMPTY_ROW_PREFIXES.iter().any(|p| label.starts_with(p))
}

/// Shuffled preferred letters, then the rest of the alphabet, capped
#[must_use]
pub fn letter_sequence<R: Rng + ?Sized>(rng: &mut R, preferred: &str, max: usize) -> Vec<char> {
    let mut first: Vec<char> = Vec::new();
    for c in preferred.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() && !first.contains(&c) {
            first.push(c);
        }
    }
    first.shuffle(rng);
    let rest: Vec<char> = ('a'..='z').filter(|c| !first.contains(c)).collect();
    first.into_iter().chain(rest).take(max).collect()
}

struct PanelRows {
    selectable: Vec<(ElementHandle, String)>,
    real_rows: usize,
}

async fn panel_rows(surface: &Surface, qid: &str) -> Result<PanelRows, FieldError> {
    let rows = surface
        .query_all(&Locator::OpenOptions)
        .await
        .for_field(qid)?;
    let mut out = PanelRows {
        selectable: Vec::new(),
        real_rows: 0,
    };
    for row in rows {
        let info = surface.inspect(row).await.for_field(qid)?;
        if is_empty_row(&info.label) {
            continue;
        }
        out.real_rows += 1;
        if info.visible && info.enabled && !info.selected {
            out.selectable.push((row, info.label));
        }
    }
    Ok(out)
}

/// Open the control and select one option; returns its label
///
/// `deterministic` picks the first selectable option instead of a random
/// one.
pub(crate) async fn pick_option<R: Rng + ?Sized + Send>(
    surface: &Surface,
    element: ElementHandle,
    qid: &str,
    multi: bool,
    deterministic: bool,
    rng: &mut R,
    config: &EngineConfig,
) -> Result<String, FieldError> {
    surface.click(element).await.for_field(qid)?;
    let requires_filter = surface.inspect(element).await.for_field(qid)?.requires_filter;

    let mut rows = panel_rows(surface, qid).await?;
    let mut attempts = 0;
    if rows.selectable.is_empty() && (requires_filter || rows.real_rows == 0) {
        let letters = letter_sequence(rng, &config.preferred_letters, config.max_filter_attempts);
        for letter in letters {
            attempts += 1;
            surface.clear(element).await.for_field(qid)?;
            surface
                .type_text(element, letter.encode_utf8(&mut [0; 4]))
                .await
                .for_field(qid)?;
            rows = panel_rows(surface, qid).await?;
            if !rows.selectable.is_empty() {
                tracing::debug!(qid, %letter, attempts, "filter produced options");
                break;
            }
        }
    }

    let pick = if deterministic {
        rows.selectable.first()
    } else {
        rows.selectable.choose(rng)
    };
    let Some((row, label)) = pick.cloned() else {
        surface.press_key(element, Key::Escape).await.for_field(qid)?;
        return Err(FieldError::EmptyMapping {
            qid: qid.to_string(),
            attempts,
        });
    };

    surface.click(row).await.for_field(qid)?;
    if multi {
        surface.press_key(element, Key::Escape).await.for_field(qid)?;
    }
    Ok(label)
}
