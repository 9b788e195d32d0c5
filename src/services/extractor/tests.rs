//! Tests for the TrackingExtractor

use super::*;
use crate::domain::{HistoryEvent, TrackingNumber};

fn raw(body: &str) -> RawDocument {
    RawDocument::new(TrackingNumber::parse("9400150105501041088569").unwrap(), body)
}

fn extractor() -> TrackingExtractor {
    TrackingExtractor::default()
}

/// Builder for a minimal tracking page
struct PageBuilder {
    banner: Option<String>,
    steps: Vec<String>,
    extra: String,
}

impl PageBuilder {
    fn new() -> Self {
        Self { banner: None, steps: Vec::new(), extra: String::new() }
    }

    fn with_banner(mut self, inner: &str) -> Self {
        self.banner = Some(inner.to_string());
        self
    }

    fn with_step(mut self, classes: &str, inner: &str) -> Self {
        self.steps.push(format!(r#"<div class="tb-step {classes}">{inner}</div>"#));
        self
    }

    fn with_extra(mut self, html: &str) -> Self {
        self.extra.push_str(html);
        self
    }

    fn build(&self) -> String {
        let banner = self
            .banner
            .as_ref()
            .map(|b| format!(r#"<div class="latest-update-banner-wrapper">{b}</div>"#))
            .unwrap_or_default();
        let history = if self.steps.is_empty() {
            String::new()
        } else {
            format!(
                r#"<div class="tracking-progress-bar-status-container">{}</div>"#,
                self.steps.join("\n")
            )
        };
        format!(
            "<html><body><div class=\"product_summary\">{banner}</div>{history}{}</body></html>",
            self.extra
        )
    }
}

#[test]
fn test_not_found_text_wins_over_other_markup() {
    let page = PageBuilder::new()
        .with_banner("<h3>Delivered</h3>")
        .with_step("", r#"<p class="tb-status">Delivered</p>"#)
        .with_extra(
            "<p>The Postal Service could not locate the tracking information for your request.</p>",
        )
        .build();

    assert_eq!(extractor().extract(&raw(&page)), Err(ExtractionError::NotFound));
    assert_eq!(extractor().classify(Ok(&raw(&page))), PageClass::NotFound);
}

#[test]
fn test_error_page_element_is_not_found() {
    let page = PageBuilder::new()
        .with_step("", r#"<p class="tb-status">Accepted</p>"#)
        .with_extra(r#"<div id="error-page"><h2>Status Not Available</h2></div>"#)
        .build();

    assert_eq!(extractor().extract(&raw(&page)), Err(ExtractionError::NotFound));
}

#[test]
fn test_fetch_failure_is_blocked() {
    let err = FetchError::Status(403);
    assert_eq!(extractor().classify(Err(&err)), PageClass::Blocked);
    assert_eq!(PageClass::Blocked.as_str(), "blocked");
}

#[test]
fn test_ok_page_classified_ok() {
    let page = PageBuilder::new().with_banner("<h3>In Transit</h3>").build();
    assert_eq!(extractor().classify(Ok(&raw(&page))), PageClass::Ok);
}

#[test]
fn test_no_banner_no_history_is_empty() {
    let page = "<html><body><h1>Track Another Package</h1></body></html>";
    assert_eq!(extractor().extract(&raw(page)), Err(ExtractionError::Empty));
}

#[test]
fn test_challenge_page_is_empty() {
    let page = r#"<html><head><title>Access Denied</title></head>
        <body><h1>Access Denied</h1><p>You don't have permission to access this server.</p></body></html>"#;
    assert_eq!(extractor().extract(&raw(page)), Err(ExtractionError::Empty));
}

#[test]
fn test_banner_only_is_success_with_empty_history() {
    let page = PageBuilder::new().with_banner("<h3>  Delivered :  </h3>").build();
    let record = extractor().extract(&raw(&page)).unwrap();

    let estimate = record.estimate.unwrap();
    assert_eq!(estimate.status_title.as_deref(), Some("Delivered"));
    assert_eq!(estimate.day, None);
    assert_eq!(estimate.date, None);
    assert_eq!(estimate.month_year, None);
    assert_eq!(estimate.time, None);
    assert_eq!(estimate.detailed_status, None);
    assert!(record.history.is_empty());
}

#[test]
fn test_history_only_has_absent_estimate() {
    let page = PageBuilder::new().with_step("", r#"<p class="tb-status">Label Created</p>"#).build();
    let record = extractor().extract(&raw(&page)).unwrap();
    assert_eq!(record.estimate, None);
    assert_eq!(record.history, vec![HistoryEvent::new("Label Created")]);
}

#[test]
fn test_toggle_between_steps() {
    let page = PageBuilder::new()
        .with_step("", r#"<p class="tb-status">Delivered</p>"#)
        .with_step("toggle-history-container", r#"<p class="tb-status">See All Tracking History</p>"#)
        .with_step("", r#"<p class="tb-status">Out for Delivery</p>"#)
        .build();

    let record = extractor().extract(&raw(&page)).unwrap();
    let statuses: Vec<&str> = record.history.iter().map(|e| e.status.as_str()).collect();
    assert_eq!(statuses, vec!["Delivered", "Out for Delivery"]);
}

#[test]
fn test_history_count_matches_resolvable_steps() {
    let page = PageBuilder::new()
        .with_step("", r#"<p class="tb-status">A</p>"#)
        .with_step("", r#"<p class="tb-date">March 1</p>"#)
        .with_step("toggle-history-container", "")
        .with_step("", r#"<p class="tb-status-detail">B</p>"#)
        .with_step("", "")
        .build();

    let record = extractor().extract(&raw(&page)).unwrap();
    assert_eq!(record.history.len(), 2);
}

#[test]
fn test_step_with_status_only() {
    let page = PageBuilder::new()
        .with_step("", r#"<p class="tb-status">  In Transit to Next Facility </p>"#)
        .build();

    let record = extractor().extract(&raw(&page)).unwrap();
    assert_eq!(
        record.history[0],
        HistoryEvent { status: "In Transit to Next Facility".to_string(), location: None, datetime: None }
    );
}

#[test]
fn test_tracking_number_from_page() {
    let page = PageBuilder::new()
        .with_banner("<h3>Delivered</h3>")
        .with_extra(r#"<span class="tracking-number"> 9400 1501 0550 1041 0885 69 </span>"#)
        .build();

    let record = extractor().extract(&raw(&page)).unwrap();
    assert_eq!(record.tracking_number, "9400 1501 0550 1041 0885 69");
}

#[test]
fn test_tracking_number_falls_back_to_requested() {
    let page = PageBuilder::new()
        .with_banner("<h3>Delivered</h3>")
        .with_extra(r#"<span class="tracking-number">   </span>"#)
        .build();

    let record = extractor().extract(&raw(&page)).unwrap();
    assert_eq!(record.tracking_number, "9400150105501041088569");
}

#[test]
fn test_custom_markers() {
    let set = MarkerSet {
        history_container: "ol.timeline".to_string(),
        history_step: "li.event".to_string(),
        step_status: "span.what".to_string(),
        ..Default::default()
    };
    let extractor = TrackingExtractor::from_marker_set(&set).unwrap();
    let page = r#"<ol class="timeline">
        <li class="event"><span class="what">Picked up</span></li>
        <li class="event toggle-history-container"><span class="what">More</span></li>
    </ol>"#;

    let record = extractor.extract(&raw(page)).unwrap();
    assert_eq!(record.history, vec![HistoryEvent::new("Picked up")]);
}

#[test]
fn test_extractor_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TrackingExtractor>();

    let extractor = std::sync::Arc::new(extractor());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let extractor = extractor.clone();
            std::thread::spawn(move || {
                let status = format!("Step {i}");
                let page = PageBuilder::new()
                    .with_step("", &format!(r#"<p class="tb-status">{status}</p>"#))
                    .build();
                let record = extractor.extract(&raw(&page)).unwrap();
                assert_eq!(record.history[0].status, status);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
