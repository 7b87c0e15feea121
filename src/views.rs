// src/views.rs
//! Read-only projections of the stores into rows for the screens.
//! Nothing here mutates state; callers re-run these after every change.
use crate::auth::SessionManager;
use crate::models::{Reservation, ReservationStatus, Role, User};
use crate::reservations::ReservationBook;
use crate::status::StatusBoard;

pub const NO_LETTERS: &str = "هیچ نامه‌ای یافت نشد.";
pub const NO_CARETAKER_RESERVATIONS: &str = "هیچ رزروی برای شما ثبت نشده است.";
pub const NO_REPORT_ROWS: &str = "گزارشی یافت نشد.";

#[derive(Debug, Clone, PartialEq)]
pub struct CaretakerStatusRow {
    pub username: String,
    pub guesthouse: String,
    pub occupied: bool,
}

impl CaretakerStatusRow {
    pub fn label(&self) -> &'static str {
        if self.occupied { "● سکونت" } else { "● غیرسکونت" }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerDashboard {
    pub active_reservations: usize,
    pub total_guests: u64,
    pub active_guesthouses: usize,
    pub caretakers: Vec<CaretakerStatusRow>,
}

pub fn manager_dashboard(book: &ReservationBook, auth: &SessionManager, status: &StatusBoard) -> ManagerDashboard {
    let caretakers = auth
        .caretakers()
        .map(|c| {
            let guesthouse = c.guesthouse.clone().unwrap_or_default();
            CaretakerStatusRow {
                username: c.username.clone(),
                occupied: status.is_occupied(&guesthouse),
                guesthouse,
            }
        })
        .collect();
    ManagerDashboard {
        active_reservations: book.len(),
        total_guests: book.list_all().iter().map(Reservation::guests).fold(0, u64::saturating_add),
        active_guesthouses: auth.guesthouses().len(),
        caretakers,
    }
}

/// Guest, check-in, suite, guesthouse.
pub fn letter_rows(book: &ReservationBook) -> Vec<[String; 4]> {
    book.list_all()
        .iter()
        .map(|r| [r.guest_name.clone(), r.checkin_date.clone(), r.suite_number.clone(), r.guesthouse.clone()])
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaretakerRow {
    pub id: u64,
    pub cells: [String; 4], // guest, suite, check-in, check-out
    pub action: &'static str,
}

pub fn caretaker_rows(book: &ReservationBook, guesthouse: &str) -> Vec<CaretakerRow> {
    book.list_for(guesthouse)
        .map(|r| CaretakerRow {
            id: r.id,
            cells: [r.guest_name.clone(), r.suite_number.clone(), r.checkin_date.clone(), r.checkout_date.clone()],
            action: match r.status {
                ReservationStatus::Confirmed => "تایید شده",
                ReservationStatus::Pending => "تایید",
            },
        })
        .collect()
}

/// Guest, guesthouse, check-in, check-out, status.
pub fn report_rows(rows: &[&Reservation]) -> Vec<[String; 5]> {
    rows.iter()
        .map(|r| {
            [
                r.guest_name.clone(),
                r.guesthouse.clone(),
                r.checkin_date.clone(),
                r.checkout_date.clone(),
                r.status.label().to_string(),
            ]
        })
        .collect()
}

pub fn role_banner(user: &User) -> String {
    match user.role {
        Role::Manager => format!("مدیر: {}", user.username),
        Role::Caretaker => format!("سرایدار: {}", user.username),
    }
}
