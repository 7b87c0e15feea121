// src/status.rs
use crate::models::GuesthouseStatusReport;
use chrono::Local;
use log;
use std::collections::BTreeMap;

pub const OCCUPIED: &str = "occupied";

/// Caretaker form input; `last_updated` is stamped on submission.
#[derive(Debug, Clone, Default)]
pub struct StatusFields {
    pub occupancy_status: String,
    pub lights_status: String,
    pub water_status: String,
    pub cleaning_status: String,
    pub facilities_status: String,
}

/// Latest facility report per guesthouse. No history is kept.
#[derive(Debug, Default)]
pub struct StatusBoard {
    reports: BTreeMap<String, GuesthouseStatusReport>,
}

impl StatusBoard {
    pub fn new(reports: BTreeMap<String, GuesthouseStatusReport>) -> Self {
        StatusBoard { reports }
    }

    pub fn report(&mut self, guesthouse: &str, fields: StatusFields) -> &GuesthouseStatusReport {
        let report = GuesthouseStatusReport {
            occupancy_status: fields.occupancy_status,
            lights_status: fields.lights_status,
            water_status: fields.water_status,
            cleaning_status: fields.cleaning_status,
            facilities_status: fields.facilities_status,
            last_updated: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        log::info!("Status report for '{}' recorded (occupancy: {})", guesthouse, report.occupancy_status);
        self.reports.insert(guesthouse.to_string(), report);
        &self.reports[guesthouse]
    }

    pub fn status_of(&self, guesthouse: &str) -> Option<&GuesthouseStatusReport> {
        self.reports.get(guesthouse)
    }

    /// A guesthouse without a report counts as vacant.
    pub fn is_occupied(&self, guesthouse: &str) -> bool {
        self.status_of(guesthouse).map_or(false, |r| r.occupancy_status == OCCUPIED)
    }

    pub fn all(&self) -> &BTreeMap<String, GuesthouseStatusReport> {
        &self.reports
    }
}
