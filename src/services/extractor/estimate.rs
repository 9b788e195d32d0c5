//! Delivery-estimate banner extraction

use super::markers::Markers;
use super::normalize::{normalize_non_empty, strip_trailing_colon};
use crate::domain::DeliveryEstimate;
use scraper::{ElementRef, Html};

/// Read the delivery banner. `None` only when the banner element is missing;
/// a banner with nothing readable yields an estimate with every field absent.
pub fn extract_estimate(doc: &Html, markers: &Markers) -> Option<DeliveryEstimate> {
    let banner = markers.banner(doc)?;
    let text = |el: Option<ElementRef<'_>>| {
        let raw = el.map(|el| markers.banner_text(el));
        normalize_non_empty(raw.as_deref())
    };

    let status_title = text(markers.banner_header(banner))
        .map(|title| strip_trailing_colon(&title))
        .filter(|title| !title.is_empty());

    let mut estimate = DeliveryEstimate {
        status_title,
        detailed_status: text(markers.banner_content(banner)),
        ..Default::default()
    };

    if let Some(eta) = markers.eta_block(banner) {
        estimate.day = text(markers.eta_day(eta));
        estimate.date = text(markers.eta_date(eta));
        estimate.month_year = text(markers.eta_month_year(eta));
        estimate.time = text(markers.eta_time(eta));
    }

    Some(estimate)
}
