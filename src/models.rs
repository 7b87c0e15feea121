// src/models.rs
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Caretaker,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    pub password: String, // plaintext, compared as-is
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guesthouse: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
}

impl ReservationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "در انتظار",
            ReservationStatus::Confirmed => "تایید شده",
        }
    }
}

/// Where a reservation came from. Never serialized; the persisted
/// `reservations` key only ever holds `Local` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    Seed,
    #[default]
    Local,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: u64,
    pub guest_name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub guest_count: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub suite_number: String,
    pub guesthouse: String,
    #[serde(default)]
    pub checkin_date: String,
    #[serde(default)]
    pub checkout_date: String,
    #[serde(default)]
    pub checkin_time: String,
    #[serde(default)]
    pub checkout_time: String,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(skip)]
    pub origin: Origin,
}

/// Form input for a new reservation. Only guest name and guesthouse are checked.
#[derive(Debug, Clone, Default)]
pub struct NewReservation {
    pub guest_name: String,
    pub guest_count: String,
    pub suite_number: String,
    pub guesthouse: String,
    pub checkin_date: String,
    pub checkout_date: String,
    pub checkin_time: String,
    pub checkout_time: String,
}

impl Reservation {
    pub fn from_form(id: u64, form: NewReservation) -> Self {
        Self {
            id,
            guest_name: form.guest_name,
            guest_count: form.guest_count,
            suite_number: form.suite_number,
            guesthouse: form.guesthouse,
            checkin_date: form.checkin_date,
            checkout_date: form.checkout_date,
            checkin_time: form.checkin_time,
            checkout_time: form.checkout_time,
            status: ReservationStatus::Pending,
            origin: Origin::Local,
        }
    }

    /// Guest count as a number; blank or unparseable counts as one guest.
    pub fn guests(&self) -> u64 {
        self.guest_count.trim().parse().unwrap_or(1)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GuesthouseStatusReport {
    pub occupancy_status: String,
    pub lights_status: String,
    pub water_status: String,
    pub cleaning_status: String,
    pub facilities_status: String,
    pub last_updated: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub manager_name: String,
    pub manager_contact: String,
    pub location_url: String,
    pub signature: String,
    pub stamp: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            manager_name: String::new(),
            manager_contact: String::new(),
            location_url: String::new(),
            signature: "assets/signature.png".to_string(),
            stamp: "assets/stamp.png".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

// Seed files written by hand use numbers for counts and suites as often as strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_json_uses_camel_case() {
        let json = r#"{"id": 7, "guestName": "Ali Rezaei", "guestCount": 3, "suiteNumber": "12",
            "guesthouse": "Ramsar", "checkinDate": "2024-05-05", "checkoutDate": "2024-05-08",
            "checkinTime": "14:00", "checkoutTime": "12:00", "status": "confirmed"}"#;
        let res: Reservation = serde_json::from_str(json).unwrap();
        assert_eq!(res.guest_name, "Ali Rezaei");
        assert_eq!(res.guest_count, "3");
        assert_eq!(res.status, ReservationStatus::Confirmed);
        assert_eq!(res.origin, Origin::Local);

        let out = serde_json::to_string(&res).unwrap();
        assert!(out.contains("\"checkinDate\":\"2024-05-05\""));
        assert!(!out.contains("origin"));
    }

    #[test]
    fn test_guest_count_defaults_to_one() {
        let mut res = Reservation::default();
        assert_eq!(res.guests(), 1);
        res.guest_count = "4".to_string();
        assert_eq!(res.guests(), 4);
        res.guest_count = "many".to_string();
        assert_eq!(res.guests(), 1);
        res.guest_count = "4000000000".to_string();
        assert_eq!(res.guests(), 4_000_000_000);
    }

    #[test]
    fn test_user_role_parsing() {
        let json = r#"{"username": "caretaker1", "password": "1234", "role": "caretaker", "guesthouse": "Ramsar"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Caretaker);
        assert_eq!(user.guesthouse.as_deref(), Some("Ramsar"));
    }

    #[test]
    fn test_settings_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"managerName": "Karimi"}"#).unwrap();
        assert_eq!(settings.manager_name, "Karimi");
        assert_eq!(settings.signature, "assets/signature.png");
    }
}
