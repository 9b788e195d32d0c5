//! Tracking timeline extraction

use super::markers::{element_text, Markers};
use super::normalize::normalize_non_empty;
use crate::domain::HistoryEvent;
use scraper::{ElementRef, Html};
use tracing::debug;

/// Read every timeline step that carries a status, in source order.
/// Never fails: a missing container gives an empty list, a malformed step is skipped.
pub fn extract_history(doc: &Html, markers: &Markers) -> Vec<HistoryEvent> {
    let Some(container) = markers.history_container(doc) else {
        return Vec::new();
    };

    markers
        .steps(container)
        .into_iter()
        .enumerate()
        .filter_map(|(index, step)| {
            if markers.is_toggle(step) {
                return None;
            }
            let event = parse_step(step, markers);
            if event.is_none() {
                debug!(step = %index, "history_step_without_status");
            }
            event
        })
        .collect()
}

fn parse_step(step: ElementRef<'_>, markers: &Markers) -> Option<HistoryEvent> {
    let text = |el: Option<ElementRef<'_>>| {
        let raw = el.map(element_text);
        normalize_non_empty(raw.as_deref())
    };

    // Detailed line first; a blank one falls back to the plain line
    let status = text(markers.step_status_detail(step))
        .or_else(|| text(markers.step_status(step)))?;
    Some(
        HistoryEvent::new(status)
            .with_location(text(markers.step_location(step)))
            .with_datetime(text(markers.step_date(step))),
    )
}
