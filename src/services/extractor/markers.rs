//! Structural markers for the tracking page
//!
//! The page's classes and ids are an external, versioned contract. Every lookup
//! the extractor performs goes through `Markers`, so a markup change means
//! editing the selector strings in `MarkerSet` (or the `[markers]` config table),
//! never the traversal code.

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use thiserror::Error;

pub const NOT_FOUND_TEXT: &str = "The Postal Service could not locate the tracking information";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("invalid selector for marker `{name}` ({selector:?}): {reason}")]
    InvalidSelector { name: &'static str, selector: String, reason: String },
    #[error("not-found marker text must not be empty")]
    EmptyNotFoundText,
}

/// Selector strings for every element the extractor reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    pub not_found_text: String,
    pub error_page: String,
    pub tracking_number: String,
    pub banner: String,
    pub banner_hint: String,
    pub banner_header: String,
    pub banner_content: String,
    pub eta_block: String,
    pub eta_day: String,
    pub eta_date: String,
    pub eta_month_year: String,
    pub eta_time: String,
    pub history_container: String,
    pub history_step: String,
    pub history_toggle: String,
    pub step_status_detail: String,
    pub step_status: String,
    pub step_location: String,
    pub step_date: String,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            not_found_text: NOT_FOUND_TEXT.to_string(),
            error_page: "div#error-page".to_string(),
            tracking_number: "span.tracking-number".to_string(),
            banner: "div.latest-update-banner-wrapper".to_string(),
            banner_hint: "span.hint".to_string(),
            banner_header: "h3".to_string(),
            banner_content: "p.banner-content".to_string(),
            eta_block: "span.eta_wrap".to_string(),
            eta_day: "em.day".to_string(),
            eta_date: "strong.date".to_string(),
            eta_month_year: "span.month_year".to_string(),
            eta_time: "strong.time".to_string(),
            history_container: "div.tracking-progress-bar-status-container".to_string(),
            history_step: "div.tb-step".to_string(),
            history_toggle: ".toggle-history-container".to_string(),
            step_status_detail: "p.tb-status-detail".to_string(),
            step_status: "p.tb-status".to_string(),
            step_location: "p.tb-location".to_string(),
            step_date: "p.tb-date".to_string(),
        }
    }
}

fn compile(name: &'static str, selector: &str) -> Result<Selector, MarkerError> {
    Selector::parse(selector).map_err(|e| MarkerError::InvalidSelector {
        name,
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Compiled markers plus the lookups built on them
#[derive(Debug, Clone)]
pub struct Markers {
    not_found_text: String,
    error_page: Selector,
    tracking_number: Selector,
    banner: Selector,
    banner_hint: Selector,
    banner_header: Selector,
    banner_content: Selector,
    eta_block: Selector,
    eta_day: Selector,
    eta_date: Selector,
    eta_month_year: Selector,
    eta_time: Selector,
    history_container: Selector,
    history_step: Selector,
    history_toggle: Selector,
    step_status_detail: Selector,
    step_status: Selector,
    step_location: Selector,
    step_date: Selector,
}

impl Default for Markers {
    fn default() -> Self {
        Self::compile(&MarkerSet::default()).expect("built-in markers are valid selectors")
    }
}

impl Markers {
    pub fn compile(set: &MarkerSet) -> Result<Self, MarkerError> {
        if set.not_found_text.is_empty() {
            return Err(MarkerError::EmptyNotFoundText);
        }
        Ok(Self {
            not_found_text: set.not_found_text.clone(),
            error_page: compile("error_page", &set.error_page)?,
            tracking_number: compile("tracking_number", &set.tracking_number)?,
            banner: compile("banner", &set.banner)?,
            banner_hint: compile("banner_hint", &set.banner_hint)?,
            banner_header: compile("banner_header", &set.banner_header)?,
            banner_content: compile("banner_content", &set.banner_content)?,
            eta_block: compile("eta_block", &set.eta_block)?,
            eta_day: compile("eta_day", &set.eta_day)?,
            eta_date: compile("eta_date", &set.eta_date)?,
            eta_month_year: compile("eta_month_year", &set.eta_month_year)?,
            eta_time: compile("eta_time", &set.eta_time)?,
            history_container: compile("history_container", &set.history_container)?,
            history_step: compile("history_step", &set.history_step)?,
            history_toggle: compile("history_toggle", &set.history_toggle)?,
            step_status_detail: compile("step_status_detail", &set.step_status_detail)?,
            step_status: compile("step_status", &set.step_status)?,
            step_location: compile("step_location", &set.step_location)?,
            step_date: compile("step_date", &set.step_date)?,
        })
    }

    // Page-level markers

    /// Case-sensitive substring check on the raw markup
    pub fn has_not_found_text(&self, raw: &str) -> bool {
        raw.contains(&self.not_found_text)
    }

    pub fn has_error_page(&self, doc: &Html) -> bool {
        doc.select(&self.error_page).next().is_some()
    }

    pub fn tracking_number<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&self.tracking_number).next()
    }

    // Delivery banner

    pub fn banner<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&self.banner).next()
    }

    pub fn banner_header<'a>(&self, banner: ElementRef<'a>) -> Option<ElementRef<'a>> {
        banner.select(&self.banner_header).next()
    }

    pub fn banner_content<'a>(&self, banner: ElementRef<'a>) -> Option<ElementRef<'a>> {
        banner.select(&self.banner_content).next()
    }

    pub fn eta_block<'a>(&self, banner: ElementRef<'a>) -> Option<ElementRef<'a>> {
        banner.select(&self.eta_block).next()
    }

    pub fn eta_day<'a>(&self, eta: ElementRef<'a>) -> Option<ElementRef<'a>> {
        eta.select(&self.eta_day).next()
    }

    pub fn eta_date<'a>(&self, eta: ElementRef<'a>) -> Option<ElementRef<'a>> {
        eta.select(&self.eta_date).next()
    }

    pub fn eta_month_year<'a>(&self, eta: ElementRef<'a>) -> Option<ElementRef<'a>> {
        eta.select(&self.eta_month_year).next()
    }

    pub fn eta_time<'a>(&self, eta: ElementRef<'a>) -> Option<ElementRef<'a>> {
        eta.select(&self.eta_time).next()
    }

    /// Banner text with hint annotations left out
    pub fn banner_text(&self, el: ElementRef<'_>) -> String {
        let mut out = String::new();
        collect_text_skipping(el, &self.banner_hint, &mut out);
        out
    }

    // History timeline

    pub fn history_container<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&self.history_container).next()
    }

    /// Steps of the container in document order. A step nested inside another
    /// step belongs to its parent and is not listed on its own.
    pub fn steps<'a>(&self, container: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        container
            .select(&self.history_step)
            .filter(|step| !self.inside_step(*step, container))
            .collect()
    }

    /// True when a step element sits between `el` and `scope`
    fn inside_step(&self, el: ElementRef<'_>, scope: ElementRef<'_>) -> bool {
        el.ancestors()
            .take_while(|node| node.id() != scope.id())
            .filter_map(ElementRef::wrap)
            .any(|outer| self.history_step.matches(&outer))
    }

    /// First match owned by `step` itself; fields of a nested step are not borrowed
    fn step_field<'a>(&self, step: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
        step.select(selector).find(|el| !self.inside_step(*el, step))
    }

    pub fn is_toggle(&self, step: ElementRef<'_>) -> bool {
        self.history_toggle.matches(&step)
    }

    pub fn step_status_detail<'a>(&self, step: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.step_field(step, &self.step_status_detail)
    }

    pub fn step_status<'a>(&self, step: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.step_field(step, &self.step_status)
    }

    pub fn step_location<'a>(&self, step: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.step_field(step, &self.step_location)
    }

    pub fn step_date<'a>(&self, step: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.step_field(step, &self.step_date)
    }
}

/// Concatenated text of `el`, ignoring any subtree matching `skip`
fn collect_text_skipping(el: ElementRef<'_>, skip: &Selector, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !skip.matches(&child_el) {
                collect_text_skipping(child_el, skip, out);
            }
        }
    }
}

/// Plain concatenated text of an element
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}
