// src/calendar.rs
use crate::models::Reservation;
use chrono::{Datelike, Local, NaiveDate};

/// Weekday header, Saturday first.
pub const WEEKDAY_HEADER: [&str; 7] = ["ش", "ی", "د", "س", "چ", "پ", "ج"];

const MONTH_NAMES: [&str; 12] = [
    "ژانویه", "فوریه", "مارس", "آوریل", "مه", "ژوئن",
    "ژوئیه", "اوت", "سپتامبر", "اکتبر", "نوامبر", "دسامبر",
];

/// Parses `YYYY-MM-DD`, accepting `/` as the separator too.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let normalized = raw.trim().replace('/', "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32, // 1..=12
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Self {
        MonthCursor { year, month: month.clamp(1, 12) }
    }

    pub fn current() -> Self {
        let today = Local::now().date_naive();
        MonthCursor::new(today.year(), today.month())
    }

    /// Moves by `offset` months, rolling the year over. Unbounded.
    pub fn change_month(&mut self, offset: i32) {
        let index = self.year * 12 + (self.month as i32 - 1) + offset;
        self.year = index.div_euclid(12);
        self.month = index.rem_euclid(12) as u32 + 1;
    }

    pub fn title(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let Some(first) = self.first_day() else { return 0 };
        let mut next = *self;
        next.change_month(1);
        match next.first_day() {
            Some(next_first) => (next_first - first).num_days() as u32,
            None => 31,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub reservations: usize,
}

impl DayCell {
    pub fn has_reservation(&self) -> bool {
        self.reservations > 0
    }
}

#[derive(Debug, Clone)]
pub struct MonthView {
    pub cursor: MonthCursor,
    /// Empty cells before day 1 in a Saturday-first week.
    pub leading_blanks: usize,
    pub days: Vec<DayCell>,
}

impl MonthView {
    /// Rows of seven cells; `None` is a blank.
    pub fn weeks(&self) -> Vec<Vec<Option<&DayCell>>> {
        let mut cells: Vec<Option<&DayCell>> = vec![None; self.leading_blanks];
        cells.extend(self.days.iter().map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells.chunks(7).map(|w| w.to_vec()).collect()
    }
}

/// Marks each day on which at least one reservation checks in. Only the
/// check-in day is marked, however long the stay.
pub fn render<'a>(cursor: MonthCursor, reservations: impl IntoIterator<Item = &'a Reservation>) -> MonthView {
    let leading_blanks = cursor
        .first_day()
        .map(|d| ((d.weekday().num_days_from_sunday() + 1) % 7) as usize)
        .unwrap_or(0);
    let mut days: Vec<DayCell> = (1..=cursor.days_in_month())
        .map(|day| DayCell { day, reservations: 0 })
        .collect();

    for res in reservations {
        let Some(checkin) = parse_date(&res.checkin_date) else { continue };
        if checkin.year() == cursor.year && checkin.month() == cursor.month {
            if let Some(cell) = days.get_mut(checkin.day() as usize - 1) {
                cell.reservations += 1;
            }
        }
    }

    MonthView { cursor, leading_blanks, days }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stay(checkin: &str, checkout: &str) -> Reservation {
        Reservation {
            checkin_date: checkin.to_string(),
            checkout_date: checkout.to_string(),
            ..Reservation::default()
        }
    }

    #[test]
    fn test_parse_date_separators() {
        assert_eq!(parse_date("2024/05/05"), NaiveDate::from_ymd_opt(2024, 5, 5));
        assert_eq!(parse_date("2024-05-05"), NaiveDate::from_ymd_opt(2024, 5, 5));
        assert_eq!(parse_date("5 May"), None);
    }

    #[test]
    fn test_only_checkin_day_marked() {
        let reservations = vec![stay("2024/05/05", "2024/05/09"), stay("2024-06-05", "2024-06-06")];
        let view = render(MonthCursor::new(2024, 5), &reservations);
        let marked: Vec<u32> = view.days.iter().filter(|d| d.has_reservation()).map(|d| d.day).collect();
        assert_eq!(marked, vec![5]);
    }

    #[test]
    fn test_counts_multiple_checkins_and_skips_bad_dates() {
        let reservations = vec![stay("2024-05-05", ""), stay("2024-05-05", ""), stay("soon", "")];
        let view = render(MonthCursor::new(2024, 5), &reservations);
        assert_eq!(view.days[4].reservations, 2);
        assert_eq!(view.days.iter().map(|d| d.reservations).sum::<usize>(), 2);
    }

    #[test]
    fn test_month_layout_saturday_first() {
        // 1 June 2024 is a Saturday, 1 May 2024 a Wednesday.
        let none: Vec<Reservation> = Vec::new();
        assert_eq!(render(MonthCursor::new(2024, 6), &none).leading_blanks, 0);
        let may = render(MonthCursor::new(2024, 5), &none);
        assert_eq!(may.leading_blanks, 4);
        assert_eq!(may.days.len(), 31);
        assert_eq!(may.weeks().len(), 5);
        assert_eq!(MonthCursor::new(2024, 2).days_in_month(), 29);
        assert_eq!(MonthCursor::new(2023, 2).days_in_month(), 28);
    }

    #[test]
    fn test_change_month_rolls_over_years() {
        let mut cursor = MonthCursor::new(2024, 12);
        cursor.change_month(1);
        assert_eq!(cursor, MonthCursor::new(2025, 1));
        cursor.change_month(-1);
        cursor.change_month(-12);
        assert_eq!(cursor, MonthCursor::new(2023, 12));
        cursor.change_month(-24);
        assert_eq!(cursor.year, 2021);
    }
}
