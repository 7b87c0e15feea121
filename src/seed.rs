// src/seed.rs
use crate::error::{StoreError, StoreResult};
use crate::models::{Reservation, ReservationStatus, Role, SeedData, User};
use log;
use std::fs;
use std::path::Path;

/// Reads the seed document (`{users, reservations}`).
pub fn load_seed(path: &Path) -> StoreResult<SeedData> {
    log::info!("Loading seed data from {:?}", path);
    let content = fs::read_to_string(path).map_err(|e| {
        log::error!("Failed to read seed file {:?}: {:?}", path, e);
        StoreError::Io(e)
    })?;
    let seed: SeedData = serde_json::from_str(&content).map_err(|e| {
        let msg = format!("Seed file {:?} is not valid: {}", path, e);
        log::error!("load_seed: {}", msg);
        StoreError::Deserialization(msg)
    })?;
    log::info!("Seed loaded: {} users, {} reservations", seed.users.len(), seed.reservations.len());
    Ok(seed)
}

/// Startup variant: a seed that cannot be read is logged and treated as empty.
pub fn load_seed_or_empty(path: &Path) -> SeedData {
    match load_seed(path) {
        Ok(seed) => seed,
        Err(e) => {
            log::error!("Failed to fetch initial data: {}", e);
            SeedData::default()
        }
    }
}

/// A small seed document for first-time setup.
pub fn sample_seed() -> SeedData {
    let user = |username: &str, password: &str, role: Role, guesthouse: Option<&str>| User {
        username: username.to_string(),
        password: password.to_string(),
        role,
        guesthouse: guesthouse.map(str::to_string),
    };
    let reservation = |id: u64, guest: &str, count: &str, suite: &str, guesthouse: &str, checkin: &str, checkout: &str| Reservation {
        id,
        guest_name: guest.to_string(),
        guest_count: count.to_string(),
        suite_number: suite.to_string(),
        guesthouse: guesthouse.to_string(),
        checkin_date: checkin.to_string(),
        checkout_date: checkout.to_string(),
        checkin_time: "14:00".to_string(),
        checkout_time: "12:00".to_string(),
        status: ReservationStatus::Pending,
        ..Reservation::default()
    };
    SeedData {
        users: vec![
            user("manager1", "admin123", Role::Manager, None),
            user("caretaker1", "care123", Role::Caretaker, Some("مهمانسرای رامسر")),
            user("caretaker2", "care456", Role::Caretaker, Some("مهمانسرای مشهد")),
        ],
        reservations: vec![
            reservation(1, "علی رضایی", "3", "101", "مهمانسرای رامسر", "2024/05/05", "2024/05/08"),
            reservation(2, "مریم احمدی", "2", "204", "مهمانسرای مشهد", "2024/05/12", "2024/05/14"),
        ],
    }
}

pub fn write_seed(path: &Path, seed: &SeedData) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(seed).map_err(|e| {
        let msg = format!("Failed to serialize seed: {}", e);
        log::error!("write_seed: {}", msg);
        StoreError::Serialization(msg)
    })?;
    fs::write(path, json)?;
    log::info!("Seed written to {:?}", path);
    Ok(())
}
