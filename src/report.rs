// src/report.rs
use crate::calendar::parse_date;
use crate::error::{StoreError, StoreResult};
use crate::models::Reservation;
use log;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

pub const CSV_HEADER: &str = "نام مهمان,مهمانسرا,تاریخ ورود,تاریخ خروج,وضعیت";

#[derive(Debug, Clone, Default)]
pub struct ReportCriteria {
    pub guest_name: Option<String>,
    pub guesthouse: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ReportCriteria {
    fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn matches(&self, r: &Reservation) -> bool {
        let name_ok = Self::field(&self.guest_name)
            .map_or(true, |needle| r.guest_name.to_lowercase().contains(&needle.to_lowercase()));
        // Blank means absent; otherwise compared as typed.
        let guesthouse_ok = self
            .guesthouse
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .map_or(true, |g| r.guesthouse == g);
        let from_ok = Self::field(&self.date_from)
            .map_or(true, |from| compare_dates(&r.checkin_date, from) != Ordering::Less);
        let to_ok = Self::field(&self.date_to)
            .map_or(true, |to| compare_dates(&r.checkin_date, to) != Ordering::Greater);
        name_ok && guesthouse_ok && from_ok && to_ok
    }
}

// Calendar order when both sides parse, plain string order otherwise.
fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

pub fn filter<'a>(reservations: &'a [Reservation], criteria: &ReportCriteria) -> Vec<&'a Reservation> {
    reservations.iter().filter(|r| criteria.matches(r)).collect()
}

/// CSV of the given rows with the fixed header. Built from the data, not
/// from whatever a view last displayed.
pub fn to_csv(rows: &[&Reservation]) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];
    for r in rows {
        let cells = [
            r.guest_name.as_str(),
            r.guesthouse.as_str(),
            r.checkin_date.as_str(),
            r.checkout_date.as_str(),
            r.status.label(),
        ];
        lines.push(cells.iter().map(|c| csv_escape(c)).collect::<Vec<_>>().join(","));
    }
    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

pub fn csv_data_uri(csv: &str) -> String {
    format!("data:text/csv;charset=utf-8,{}", urlencoding::encode(csv))
}

pub fn export_csv(rows: &[&Reservation], path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_csv(rows)).map_err(|e| {
        log::error!("Failed to write report to {:?}: {:?}", path, e);
        StoreError::Io(e)
    })?;
    log::info!("Exported {} report rows to {:?}", rows.len(), path);
    Ok(())
}

fn should_neutralize_csv(value: &str) -> bool {
    let trimmed = value.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('\'') {
        return false;
    }
    matches!(trimmed.chars().next(), Some('=') | Some('+') | Some('-') | Some('@'))
}

fn csv_escape(value: &str) -> String {
    let safe = if should_neutralize_csv(value) { format!("'{}", value) } else { value.to_string() };
    if safe.contains(',') || safe.contains('"') || safe.contains('\n') || safe.contains('\r') {
        format!("\"{}\"", safe.replace('"', "\"\""))
    } else {
        safe
    }
}
