//! Tracking record data model
//!
//! Value objects produced once per extraction call. Optional fields serialize
//! as explicit `null` so consumers can tell "absent" from "empty".

use serde::{Deserialize, Serialize};

/// Normalized tracking data for one shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    pub tracking_number: String,
    /// `None` when the page has no delivery banner at all
    #[serde(rename = "expectedDelivery")]
    pub estimate: Option<DeliveryEstimate>,
    /// Events in source order; empty means "parsed, nothing listed"
    #[serde(rename = "trackingHistory")]
    pub history: Vec<HistoryEvent>,
}

impl TrackingRecord {
    /// True when neither a banner nor any history event was found
    pub fn is_uninformative(&self) -> bool {
        self.estimate.is_none() && self.history.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The carrier's current best guess at delivery, read from the status banner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEstimate {
    pub status_title: Option<String>,
    pub detailed_status: Option<String>,
    pub day: Option<String>,
    pub date: Option<String>,
    pub month_year: Option<String>,
    pub time: Option<String>,
}

impl DeliveryEstimate {
    /// Banner present but nothing readable inside it
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

/// One status change in the shipment timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub status: String,
    pub location: Option<String>,
    pub datetime: Option<String>,
}

impl HistoryEvent {
    pub fn new(status: impl Into<String>) -> Self {
        Self { status: status.into(), location: None, datetime: None }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_datetime(mut self, datetime: Option<String>) -> Self {
        self.datetime = datetime;
        self
    }
}
