// src/reservations.rs
use crate::calendar::parse_date;
use crate::error::ReservationError;
use crate::models::{NewReservation, Origin, Reservation, ReservationStatus};
use chrono::Utc;
use log;

/// Seed and locally added reservations, in insertion order. Every record
/// carries its origin, so persisting never depends on list position.
#[derive(Debug, Default)]
pub struct ReservationBook {
    reservations: Vec<Reservation>,
}

impl ReservationBook {
    pub fn new() -> Self {
        ReservationBook::default()
    }

    /// Seed records first, then locally persisted ones. `confirmed_seed_ids`
    /// restores confirmations made on seed records in earlier runs.
    pub fn from_parts(seed: Vec<Reservation>, local: Vec<Reservation>, confirmed_seed_ids: &[u64]) -> Self {
        let mut reservations = Vec::with_capacity(seed.len() + local.len());
        for mut res in seed {
            res.origin = Origin::Seed;
            if confirmed_seed_ids.contains(&res.id) {
                res.status = ReservationStatus::Confirmed;
            }
            reservations.push(res);
        }
        for mut res in local {
            if reservations.iter().any(|r: &Reservation| r.id == res.id) {
                log::warn!("Dropping persisted reservation {} whose id collides with an existing record", res.id);
                continue;
            }
            res.origin = Origin::Local;
            reservations.push(res);
        }
        log::info!("Reservation book holds {} records", reservations.len());
        ReservationBook { reservations }
    }

    pub fn submit(&mut self, form: NewReservation) -> Result<Reservation, ReservationError> {
        if form.guest_name.trim().is_empty() || form.guesthouse.trim().is_empty() {
            log::warn!("Reservation rejected: guest name and guesthouse are required");
            return Err(ReservationError::Validation(
                "Guest name and guesthouse are required.".to_string(),
            ));
        }
        let id = self.next_id(Utc::now().timestamp_millis().max(0) as u64);
        let reservation = Reservation::from_form(id, form);

        let clashes = self.overlapping(&reservation);
        if !clashes.is_empty() {
            log::warn!(
                "Reservation {} for suite '{}' at '{}' overlaps {} existing booking(s)",
                id,
                reservation.suite_number,
                reservation.guesthouse,
                clashes.len()
            );
        }

        self.reservations.push(reservation.clone());
        log::info!("Added reservation {} for guest '{}'", id, reservation.guest_name);
        Ok(reservation)
    }

    // Millisecond clock value, bumped past any id already taken.
    fn next_id(&self, now_millis: u64) -> u64 {
        let mut id = now_millis;
        while self.reservations.iter().any(|r| r.id == id) {
            id += 1;
        }
        id
    }

    pub fn confirm(&mut self, id: u64) -> Result<Reservation, ReservationError> {
        let reservation = self
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReservationError::NotFound(id))?;
        if reservation.status != ReservationStatus::Confirmed {
            reservation.status = ReservationStatus::Confirmed;
            log::info!("Reservation {} confirmed", id);
        }
        Ok(reservation.clone())
    }

    /// Removes a record again. Only used to undo a submit whose write failed.
    pub fn discard(&mut self, id: u64) -> Option<Reservation> {
        let idx = self.reservations.iter().position(|r| r.id == id)?;
        Some(self.reservations.remove(idx))
    }

    pub fn set_status(&mut self, id: u64, status: ReservationStatus) {
        if let Some(r) = self.reservations.iter_mut().find(|r| r.id == id) {
            r.status = status;
        }
    }

    pub fn get(&self, id: u64) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn list_all(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn list_for<'a>(&'a self, guesthouse: &'a str) -> impl Iterator<Item = &'a Reservation> + 'a {
        self.reservations.iter().filter(move |r| r.guesthouse == guesthouse)
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Records that belong under the persisted `reservations` key.
    pub fn local_records(&self) -> Vec<Reservation> {
        self.reservations.iter().filter(|r| r.origin == Origin::Local).cloned().collect()
    }

    pub fn confirmed_seed_ids(&self) -> Vec<u64> {
        self.reservations
            .iter()
            .filter(|r| r.origin == Origin::Seed && r.status == ReservationStatus::Confirmed)
            .map(|r| r.id)
            .collect()
    }

    /// Other bookings of the same suite in the same guesthouse whose stay
    /// overlaps `candidate`. Records with unparseable dates never overlap.
    pub fn overlapping(&self, candidate: &Reservation) -> Vec<&Reservation> {
        let Some((start, end)) = stay_range(candidate) else {
            return Vec::new();
        };
        self.reservations
            .iter()
            .filter(|r| r.id != candidate.id)
            .filter(|r| r.guesthouse == candidate.guesthouse && r.suite_number == candidate.suite_number)
            .filter(|r| match stay_range(r) {
                Some((s, e)) => s < end && start < e,
                None => false,
            })
            .collect()
    }
}

// Check-in inclusive, check-out exclusive. A missing check-out means a single night.
fn stay_range(r: &Reservation) -> Option<(chrono::NaiveDate, chrono::NaiveDate)> {
    let start = parse_date(&r.checkin_date)?;
    let end = parse_date(&r.checkout_date).unwrap_or(start + chrono::Duration::days(1));
    Some((start, end.max(start + chrono::Duration::days(1))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_seed;

    fn form(guest: &str, guesthouse: &str) -> NewReservation {
        NewReservation {
            guest_name: guest.to_string(),
            guest_count: "2".to_string(),
            suite_number: "101".to_string(),
            guesthouse: guesthouse.to_string(),
            checkin_date: "2024-06-01".to_string(),
            checkout_date: "2024-06-03".to_string(),
            checkin_time: "14:00".to_string(),
            checkout_time: "12:00".to_string(),
        }
    }

    fn seeded_book() -> ReservationBook {
        ReservationBook::from_parts(sample_seed().reservations, Vec::new(), &[])
    }

    #[test]
    fn test_submit_appends_pending_record() {
        let mut book = seeded_book();
        let before = book.len();
        let res = book.submit(form("Ali Rezaei", "مهمانسرای رامسر")).unwrap();
        assert_eq!(book.len(), before + 1);
        assert_eq!(res.status, ReservationStatus::Pending);
        assert_eq!(res.origin, Origin::Local);
        assert_eq!(book.list_all().last().map(|r| r.id), Some(res.id));
    }

    #[test]
    fn test_submit_requires_guest_name_and_guesthouse() {
        let mut book = seeded_book();
        assert!(matches!(book.submit(form("", "G")), Err(ReservationError::Validation(_))));
        assert!(matches!(book.submit(form("Ali", "  ")), Err(ReservationError::Validation(_))));
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_ids_stay_unique_within_same_millisecond() {
        let mut book = seeded_book();
        let a = book.submit(form("A", "G")).unwrap();
        let b = book.submit(form("B", "G")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(book.next_id(1), 3);
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let mut book = seeded_book();
        let original = book.get(2).cloned().unwrap();
        let first = book.confirm(2).unwrap();
        let second = book.confirm(2).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.status, ReservationStatus::Confirmed);
        assert_eq!(Reservation { status: ReservationStatus::Pending, ..second }, original);
    }

    #[test]
    fn test_discard_and_set_status_undo_changes() {
        let mut book = seeded_book();
        let res = book.submit(form("Ali", "G")).unwrap();
        assert_eq!(book.discard(res.id).map(|r| r.id), Some(res.id));
        assert!(book.discard(res.id).is_none());
        assert_eq!(book.len(), 2);

        book.confirm(1).unwrap();
        book.set_status(1, ReservationStatus::Pending);
        assert_eq!(book.get(1).map(|r| r.status), Some(ReservationStatus::Pending));
    }

    #[test]
    fn test_confirm_unknown_id() {
        let mut book = seeded_book();
        assert!(matches!(book.confirm(999), Err(ReservationError::NotFound(999))));
    }

    #[test]
    fn test_local_records_and_seed_confirmations() {
        let mut book = seeded_book();
        book.submit(form("Ali", "G")).unwrap();
        book.confirm(1).unwrap();
        let local = book.local_records();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].guest_name, "Ali");
        assert_eq!(book.confirmed_seed_ids(), vec![1]);
    }

    #[test]
    fn test_from_parts_restores_state() {
        let mut book = seeded_book();
        let added = book.submit(form("Ali", "G")).unwrap();
        book.confirm(2).unwrap();

        let reloaded = ReservationBook::from_parts(sample_seed().reservations, book.local_records(), &book.confirmed_seed_ids());
        assert_eq!(reloaded.list_all(), book.list_all());
        assert_eq!(reloaded.get(added.id).map(|r| r.origin), Some(Origin::Local));
        assert_eq!(reloaded.get(2).map(|r| r.status), Some(ReservationStatus::Confirmed));
    }

    #[test]
    fn test_list_for_guesthouse() {
        let book = seeded_book();
        let names: Vec<_> = book.list_for("مهمانسرای مشهد").map(|r| r.id).collect();
        assert_eq!(names, vec![2]);
    }

    #[test]
    fn test_overlap_detection_same_suite() {
        let mut book = ReservationBook::new();
        let first = book.submit(form("A", "G")).unwrap();
        let mut later = form("B", "G");
        later.checkin_date = "2024/06/02".to_string();
        later.checkout_date = "2024/06/05".to_string();
        let second = book.submit(later).unwrap();
        assert_eq!(book.overlapping(&second).len(), 1);
        assert_eq!(book.overlapping(&first)[0].id, second.id);

        let mut back_to_back = form("C", "G");
        back_to_back.checkin_date = "2024-06-05".to_string();
        back_to_back.checkout_date = "2024-06-06".to_string();
        let third = book.submit(back_to_back).unwrap();
        assert!(book.overlapping(&third).is_empty());
    }
}
