// src/tui.rs
use crate::calendar::{self, MonthCursor, WEEKDAY_HEADER};
use crate::error::{AppError, AppResult, ReservationError, TuiError};
use crate::letter::{self, LetterView};
use crate::models::{NewReservation, Role};
use crate::portal::Portal;
use crate::report::{self, ReportCriteria};
use crate::settings::ImageKind;
use crate::status::StatusFields;
use crate::views;

use arboard; // For clipboard
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};
use std::io::{stdout, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;
use log;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Screen {
    Login,
    Main,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Section {
    Dashboard,
    NewReservation,
    Letters,
    LetterPreview,
    Calendar,
    Reports,
    Settings,
    CaretakerReservations,
    FacilityStatus,
}

const MANAGER_MENU: [Section; 7] = [
    Section::Dashboard,
    Section::NewReservation,
    Section::Letters,
    Section::LetterPreview,
    Section::Calendar,
    Section::Reports,
    Section::Settings,
];
const CARETAKER_MENU: [Section; 2] = [Section::CaretakerReservations, Section::FacilityStatus];

impl Section {
    fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::NewReservation => "New Reservation",
            Section::Letters => "Letters",
            Section::LetterPreview => "Letter Preview",
            Section::Calendar => "Calendar",
            Section::Reports => "Reports",
            Section::Settings => "Settings",
            Section::CaretakerReservations => "Reservations",
            Section::FacilityStatus => "Facility Status",
        }
    }
}

/// A column of labelled text fields. Fields with choices cycle with Left/Right.
#[derive(Clone, Debug)]
struct Form {
    labels: Vec<&'static str>,
    values: Vec<String>,
    choices: Vec<Vec<String>>,
    masked: Vec<bool>,
    focus: usize,
}

impl Form {
    fn new(labels: &[&'static str]) -> Self {
        Form {
            labels: labels.to_vec(),
            values: vec![String::new(); labels.len()],
            choices: vec![Vec::new(); labels.len()],
            masked: vec![false; labels.len()],
            focus: 0,
        }
    }

    fn masked(mut self, idx: usize) -> Self {
        self.masked[idx] = true;
        self
    }

    fn set_choices(&mut self, idx: usize, choices: Vec<String>) {
        self.choices[idx] = choices;
    }

    fn value(&self, idx: usize) -> String {
        self.values[idx].clone()
    }

    fn set(&mut self, idx: usize, value: &str) {
        self.values[idx] = value.to_string();
    }

    fn push(&mut self, c: char) {
        self.values[self.focus].push(c);
    }

    fn pop(&mut self) {
        self.values[self.focus].pop();
    }

    fn move_focus(&mut self, delta: isize) {
        let len = self.labels.len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn cycle_choice(&mut self, delta: isize) {
        let choices = &self.choices[self.focus];
        if choices.is_empty() {
            return;
        }
        let current = choices.iter().position(|c| *c == self.values[self.focus]);
        let next = match current {
            Some(i) => (i as isize + delta).rem_euclid(choices.len() as isize) as usize,
            None => 0,
        };
        self.values[self.focus] = choices[next].clone();
    }

    fn clear(&mut self) {
        self.values.iter_mut().for_each(String::clear);
        self.focus = 0;
    }

    fn display(&self, idx: usize) -> String {
        if self.masked[idx] {
            "*".repeat(self.values[idx].chars().count())
        } else {
            self.values[idx].clone()
        }
    }
}

// Field positions.
const LOGIN_USER: usize = 0;
const LOGIN_PASS: usize = 1;

const RES_GUEST: usize = 0;
const RES_COUNT: usize = 1;
const RES_SUITE: usize = 2;
const RES_GUESTHOUSE: usize = 3;
const RES_CHECKIN: usize = 4;
const RES_CHECKOUT: usize = 5;
const RES_CHECKIN_TIME: usize = 6;
const RES_CHECKOUT_TIME: usize = 7;

const REP_GUEST: usize = 0;
const REP_GUESTHOUSE: usize = 1;
const REP_FROM: usize = 2;
const REP_TO: usize = 3;

const SET_NAME: usize = 0;
const SET_CONTACT: usize = 1;
const SET_LOCATION: usize = 2;
const SET_SIGNATURE: usize = 3;
const SET_STAMP: usize = 4;
const SET_USER: usize = 5;
const SET_PASSWORD: usize = 6;

const ST_OCCUPANCY: usize = 0;
const ST_LIGHTS: usize = 1;
const ST_WATER: usize = 2;
const ST_CLEANING: usize = 3;
const ST_FACILITIES: usize = 4;

pub struct App {
    should_quit: bool,
    portal: Portal,
    export_dir: PathBuf,
    screen: Screen,
    section: Section,
    input_mode: InputMode,
    login_form: Form,
    login_error: bool,
    reservation_form: Form,
    report_form: Form,
    report_criteria: ReportCriteria,
    settings_form: Form,
    status_form: Form,
    table_state: TableState,
    menu_state: ListState,
    calendar: MonthCursor,
    letter: Option<LetterView>,
    app_status: String,
}

impl App {
    pub fn new(portal: Portal, export_dir: PathBuf) -> Self {
        App {
            should_quit: false,
            portal,
            export_dir,
            screen: Screen::Login,
            section: Section::Dashboard,
            input_mode: InputMode::Normal,
            login_form: Form::new(&["Username", "Password"]).masked(LOGIN_PASS),
            login_error: false,
            reservation_form: Form::new(&[
                "Guest name", "Guest count", "Suite number", "Guesthouse (←/→)",
                "Check-in date", "Check-out date", "Check-in time", "Check-out time",
            ]),
            report_form: Form::new(&["Guest name", "Guesthouse", "Check-in from", "Check-in to"]),
            report_criteria: ReportCriteria::default(),
            settings_form: Form::new(&[
                "Manager name", "Manager contact", "Location URL", "Signature image file",
                "Stamp image file", "User to change password (←/→)", "New password",
            ])
            .masked(SET_PASSWORD),
            status_form: Form::new(&["Occupancy (←/→)", "Lights", "Water", "Cleaning", "Facilities"]),
            table_state: TableState::default(),
            menu_state: ListState::default(),
            calendar: MonthCursor::current(),
            letter: None,
            app_status: "Enter username and password. (Tab) Switch field | (Enter) Login | (Esc) Quit".to_string(),
        }
    }

    fn menu(&self) -> &'static [Section] {
        match self.portal.current_user().map(|u| u.role) {
            Some(Role::Manager) => &MANAGER_MENU,
            Some(Role::Caretaker) => &CARETAKER_MENU,
            None => &[],
        }
    }

    fn copy_to_clipboard(&mut self, content: String, field_name: &str) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(content) {
                Ok(_) => {
                    self.app_status = format!("{} copied to clipboard!", field_name);
                    log::info!("Copied {} to clipboard.", field_name);
                }
                Err(err) => {
                    self.app_status = format!("Error copying {}: {}", field_name, err);
                    log::error!("Error setting clipboard text for {}: {}", field_name, err);
                }
            },
            Err(err) => {
                self.app_status = format!("Error initializing clipboard: {}", err);
                log::error!("Error initializing clipboard: {}", err);
            }
        }
    }

    pub fn on_key(&mut self, key_event: KeyEvent) {
        log::debug!("Key event received: {:?}", key_event);
        match (self.screen, self.input_mode) {
            (Screen::Login, _) => self.on_login_key(key_event.code),
            (Screen::Main, InputMode::Normal) => self.on_normal_key(key_event.code),
            (Screen::Main, InputMode::Editing) => self.on_editing_key(key_event.code),
        }
    }

    fn on_login_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(c) => self.login_form.push(c),
            KeyCode::Backspace => self.login_form.pop(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.login_form.move_focus(1),
            KeyCode::Enter => self.handle_login(),
            _ => {}
        }
    }

    fn handle_login(&mut self) {
        let username = self.login_form.value(LOGIN_USER);
        let password = self.login_form.value(LOGIN_PASS);
        let result = self.portal.login(&username, &password).map(|_| ());
        match result {
            Ok(()) => {
                self.login_error = false;
                self.login_form.set(LOGIN_PASS, "");
                self.login_form.focus = LOGIN_USER;
                self.screen = Screen::Main;
                self.input_mode = InputMode::Normal;
                self.populate_forms();
                self.switch_section(self.menu()[0]);
                self.app_status = "Logged in. ([/]) Sections | (l) Logout | (q) Quit".to_string();
            }
            Err(e) => {
                self.login_error = true;
                self.app_status = e.to_string();
            }
        }
    }

    fn handle_logout(&mut self) {
        self.portal.logout();
        self.screen = Screen::Login;
        self.input_mode = InputMode::Normal;
        self.login_form.clear();
        self.letter = None;
        self.app_status = "Logged out.".to_string();
    }

    // Refreshes form defaults and choices from the stores after login.
    fn populate_forms(&mut self) {
        let guesthouses = self.portal.auth.guesthouses();
        self.reservation_form.set_choices(RES_GUESTHOUSE, guesthouses);

        let settings = self.portal.settings.get().clone();
        self.settings_form.clear();
        self.settings_form.set(SET_NAME, &settings.manager_name);
        self.settings_form.set(SET_CONTACT, &settings.manager_contact);
        self.settings_form.set(SET_LOCATION, &settings.location_url);
        let usernames = self.portal.auth.users().iter().map(|u| u.username.clone()).collect();
        self.settings_form.set_choices(SET_USER, usernames);

        self.status_form.set_choices(ST_OCCUPANCY, vec!["occupied".to_string(), "vacant".to_string()]);
        self.report_form.clear();
        self.report_criteria = ReportCriteria::default();
    }

    fn switch_section(&mut self, section: Section) {
        self.section = section;
        let idx = self.menu().iter().position(|s| *s == section);
        self.menu_state.select(idx);
        self.table_state.select(if self.row_count() > 0 { Some(0) } else { None });
        log::debug!("Switched to section {:?}", section);
    }

    fn cycle_section(&mut self, delta: isize) {
        let menu = self.menu();
        if menu.is_empty() {
            return;
        }
        let current = menu.iter().position(|s| *s == self.section).unwrap_or(0) as isize;
        let next = menu[(current + delta).rem_euclid(menu.len() as isize) as usize];
        self.switch_section(next);
    }

    fn caretaker_guesthouse(&self) -> String {
        self.portal.current_user().and_then(|u| u.guesthouse.clone()).unwrap_or_default()
    }

    fn row_count(&self) -> usize {
        match self.section {
            Section::Letters => self.portal.book.len(),
            Section::Reports => self.portal.reports(&self.report_criteria).len(),
            Section::CaretakerReservations => views::caretaker_rows(&self.portal.book, &self.caretaker_guesthouse()).len(),
            _ => 0,
        }
    }

    fn move_selection(&mut self, delta: i32) {
        let count = self.row_count();
        if count == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i32;
        let next = (current + delta).clamp(0, count as i32 - 1);
        self.table_state.select(Some(next as usize));
    }

    fn active_form(&mut self) -> Option<&mut Form> {
        match self.section {
            Section::NewReservation => Some(&mut self.reservation_form),
            Section::Reports => Some(&mut self.report_form),
            Section::Settings => Some(&mut self.settings_form),
            Section::FacilityStatus => Some(&mut self.status_form),
            _ => None,
        }
    }

    fn on_normal_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') => self.handle_logout(),
            KeyCode::Char(']') | KeyCode::Right | KeyCode::Tab => self.cycle_section(1),
            KeyCode::Char('[') | KeyCode::Left | KeyCode::BackTab => self.cycle_section(-1),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('i') => self.start_editing(),
            KeyCode::Enter => {
                if self.section == Section::Letters {
                    self.open_selected_letter();
                } else {
                    self.start_editing();
                }
            }
            KeyCode::Char('c') if self.section == Section::CaretakerReservations => self.confirm_selected(),
            KeyCode::Char('e') if self.section == Section::Reports => self.export_report(),
            KeyCode::Char('e') if self.section == Section::LetterPreview => self.export_letter(),
            KeyCode::Char('y') if self.section == Section::LetterPreview => {
                if let Some(url) = self.letter.as_ref().map(|l| l.qr_url.clone()) {
                    self.copy_to_clipboard(url, "QR link");
                }
            }
            KeyCode::Char('p') if self.section == Section::Calendar => self.calendar.change_month(-1),
            KeyCode::Char('n') if self.section == Section::Calendar => self.calendar.change_month(1),
            _ => {}
        }
    }

    fn start_editing(&mut self) {
        if self.active_form().is_some() {
            self.input_mode = InputMode::Editing;
            self.app_status = "Editing... (Tab) Next | (←/→) Choose | (Enter) Submit | (Esc) Cancel".to_string();
        }
    }

    fn on_editing_key(&mut self, key_code: KeyCode) {
        if key_code == KeyCode::Enter {
            self.submit_form();
            return;
        }
        if key_code == KeyCode::Esc {
            self.input_mode = InputMode::Normal;
            self.app_status = "Editing cancelled.".to_string();
            return;
        }
        if self.active_form().is_none() {
            self.input_mode = InputMode::Normal;
            return;
        }
        let Some(form) = self.active_form() else { return };
        match key_code {
            KeyCode::Char(c) => form.push(c),
            KeyCode::Backspace => form.pop(),
            KeyCode::Tab | KeyCode::Down => form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
            KeyCode::Left => form.cycle_choice(-1),
            KeyCode::Right => form.cycle_choice(1),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        match self.section {
            Section::NewReservation => self.submit_reservation(),
            Section::Reports => self.apply_report_filter(),
            Section::Settings => self.save_settings(),
            Section::FacilityStatus => self.save_status(),
            _ => self.input_mode = InputMode::Normal,
        }
    }

    fn submit_reservation(&mut self) {
        let f = &self.reservation_form;
        let form = NewReservation {
            guest_name: f.value(RES_GUEST),
            guest_count: f.value(RES_COUNT),
            suite_number: f.value(RES_SUITE),
            guesthouse: f.value(RES_GUESTHOUSE),
            checkin_date: f.value(RES_CHECKIN),
            checkout_date: f.value(RES_CHECKOUT),
            checkin_time: f.value(RES_CHECKIN_TIME),
            checkout_time: f.value(RES_CHECKOUT_TIME),
        };
        match self.portal.submit_reservation(form) {
            Ok((reservation, letter)) => {
                self.reservation_form.clear();
                self.letter = Some(letter);
                self.input_mode = InputMode::Normal;
                self.switch_section(Section::LetterPreview);
                self.app_status = format!("رزرو با موفقیت ثبت شد. (id {})", reservation.id);
            }
            Err(AppError::Reservation(ReservationError::Validation(_))) => {
                self.app_status = "لطفا تمامی فیلدهای اجباری را پر کنید.".to_string();
            }
            Err(e) => {
                log::error!("Failed to submit reservation: {}", e);
                self.app_status = format!("Failed to save reservation: {}", e);
            }
        }
    }

    fn apply_report_filter(&mut self) {
        let f = &self.report_form;
        let some = |v: String| if v.trim().is_empty() { None } else { Some(v) };
        self.report_criteria = ReportCriteria {
            guest_name: some(f.value(REP_GUEST)),
            guesthouse: some(f.value(REP_GUESTHOUSE)),
            date_from: some(f.value(REP_FROM)),
            date_to: some(f.value(REP_TO)),
        };
        self.input_mode = InputMode::Normal;
        self.switch_section(Section::Reports);
        self.app_status = format!("{} report rows. (e) Export CSV", self.row_count());
    }

    fn save_settings(&mut self) {
        let f = self.settings_form.clone();
        let mut done: Vec<String> = Vec::new();
        let result = self.apply_settings(&f, &mut done);

        self.settings_form.set(SET_SIGNATURE, "");
        self.settings_form.set(SET_STAMP, "");
        self.settings_form.set(SET_PASSWORD, "");
        self.input_mode = InputMode::Normal;
        self.app_status = match result {
            Ok(()) => done.join(" "),
            Err(e) => {
                log::error!("Failed to save settings: {}", e);
                format!("{} Error: {}", done.join(" "), e)
            }
        };
    }

    // General fields always; images and password only when filled in.
    fn apply_settings(&mut self, f: &Form, done: &mut Vec<String>) -> AppResult<()> {
        self.portal.save_general_settings(&f.value(SET_NAME), &f.value(SET_CONTACT), &f.value(SET_LOCATION))?;
        done.push("تنظیمات عمومی ذخیره شد.".to_string());
        for (idx, kind) in [(SET_SIGNATURE, ImageKind::Signature), (SET_STAMP, ImageKind::Stamp)] {
            let path = f.value(idx);
            if !path.trim().is_empty() {
                self.portal.upload_image(kind, Path::new(path.trim()))?;
                done.push(format!("{} با موفقیت آپلود شد.", kind.label()));
            }
        }
        let new_password = f.value(SET_PASSWORD);
        if !new_password.is_empty() {
            let user = f.value(SET_USER);
            self.portal.change_password(&user, &new_password)?;
            done.push(format!("رمز عبور کاربر {} با موفقیت تغییر کرد.", user));
        }
        Ok(())
    }

    fn save_status(&mut self) {
        let f = &self.status_form;
        let fields = StatusFields {
            occupancy_status: f.value(ST_OCCUPANCY),
            lights_status: f.value(ST_LIGHTS),
            water_status: f.value(ST_WATER),
            cleaning_status: f.value(ST_CLEANING),
            facilities_status: f.value(ST_FACILITIES),
        };
        self.input_mode = InputMode::Normal;
        self.app_status = match self.portal.report_status(fields) {
            Ok(_) => "وضعیت مهمانسرا با موفقیت ثبت شد.".to_string(),
            Err(e) => {
                log::error!("Failed to save status report: {}", e);
                format!("Failed to save status: {}", e)
            }
        };
    }

    fn open_selected_letter(&mut self) {
        let Some(idx) = self.table_state.selected() else {
            self.app_status = "No reservation selected.".to_string();
            return;
        };
        let Some(id) = self.portal.book.list_all().get(idx).map(|r| r.id) else { return };
        match self.portal.letter_for(id) {
            Ok(Some(letter)) => {
                self.letter = Some(letter);
                self.switch_section(Section::LetterPreview);
                self.app_status = "(e) Save letter | (y) Copy QR link".to_string();
            }
            Ok(None) => self.app_status = format!("Reservation {} not found.", id),
            Err(e) => self.app_status = e.to_string(),
        }
    }

    fn confirm_selected(&mut self) {
        let rows = views::caretaker_rows(&self.portal.book, &self.caretaker_guesthouse());
        let Some(row) = self.table_state.selected().and_then(|idx| rows.get(idx)) else {
            self.app_status = "No reservation selected.".to_string();
            return;
        };
        let id = row.id;
        self.app_status = match self.portal.confirm_reservation(id) {
            Ok(Some(r)) => format!("Reservation for '{}' confirmed.", r.guest_name),
            Ok(None) => String::new(),
            Err(e) => {
                log::error!("Failed to confirm reservation {}: {}", id, e);
                format!("Failed to confirm: {}", e)
            }
        };
    }

    fn export_report(&mut self) {
        let path = self.export_dir.join("report.csv");
        let rows = self.portal.reports(&self.report_criteria);
        self.app_status = match report::export_csv(&rows, &path) {
            Ok(()) => format!("Report saved to {:?}", path),
            Err(e) => format!("Failed to export report: {}", e),
        };
    }

    fn export_letter(&mut self) {
        let Some(view) = &self.letter else {
            self.app_status = "No letter to save. Submit a reservation or open one from Letters.".to_string();
            return;
        };
        self.app_status = match letter::export(view, &self.export_dir) {
            Ok(path) => format!("Letter saved to {:?}", path),
            Err(e) => format!("Failed to save letter: {}", e),
        };
    }
}

pub fn run_tui(portal: Portal, export_dir: PathBuf) -> AppResult<()> {
    log::info!("Initializing TUI...");
    enable_raw_mode().map_err(|e| { log::error!("Failed to enable raw mode: {}", e); TuiError::Io(e) })?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| { log::error!("Failed to setup terminal screen: {}", e); TuiError::Io(e) })?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| { log::error!("Failed to create terminal: {}", e); TuiError::Io(e) })?;

    let mut app = App::new(portal, export_dir);

    log::info!("Starting TUI application loop.");
    let res = run_app_loop(&mut terminal, &mut app);
    log::info!("TUI application loop finished.");

    disable_raw_mode().map_err(|e| { log::error!("Failed to disable raw mode: {}", e); TuiError::Io(e) })?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
        .map_err(|e| { log::error!("Failed to restore terminal screen: {}", e); TuiError::Io(e) })?;

    res?;
    log::info!("TUI shutdown complete.");
    Ok(())
}

fn run_app_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<(), TuiError> {
    while !app.should_quit {
        terminal.draw(|f| ui(f, app)).map_err(|e| { log::error!("Terminal draw error: {}", e); TuiError::Io(e) })?;

        if event::poll(Duration::from_millis(100)).map_err(|e| { log::error!("Event poll error: {}", e); TuiError::Io(e) })? {
            if let Event::Key(key_event) = event::read().map_err(|e| { log::error!("Event read error: {}", e); TuiError::Io(e) })? {
                if key_event.kind == KeyEventKind::Press {
                    app.on_key(key_event);
                }
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    match app.screen {
        Screen::Login => draw_login(f, app),
        Screen::Main => draw_main_ui(f, app),
    }
}

fn draw_login(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 40, f.size());
    let block = Block::default().title("Guesthouse Reservations - Login").borders(Borders::ALL);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Length(1), Constraint::Min(1)])
        .split(area);
    draw_form_fields(f, &app.login_form, true, &chunks[..2]);

    if app.login_error {
        let error = Paragraph::new("نام کاربری یا رمز عبور اشتباه است.")
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        f.render_widget(error, chunks[2]);
    }
    let help = Paragraph::new("(Tab) Switch field | (Enter) Login | (Esc) Quit").alignment(Alignment::Center);
    f.render_widget(help, chunks[3]);
}

fn draw_main_ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(3)])
        .split(f.size());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(0)])
        .split(chunks[1]);

    let banner = app.portal.current_user().map(views::role_banner).unwrap_or_default();
    f.render_widget(Paragraph::new(banner).style(Style::default().bold()), chunks[0]);

    let items: Vec<ListItem> = app.menu().iter().map(|s| ListItem::new(s.title())).collect();
    let menu = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Menu"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Gray))
        .highlight_symbol("> ");
    f.render_stateful_widget(menu, body[0], &mut app.menu_state);

    let content = body[1];
    match app.section {
        Section::Dashboard => draw_dashboard(f, app, content),
        Section::NewReservation => draw_form_section(f, &app.reservation_form, app.input_mode == InputMode::Editing, "New Reservation", content),
        Section::Letters => draw_letters(f, app, content),
        Section::LetterPreview => draw_letter_preview(f, app, content),
        Section::Calendar => draw_calendar(f, app, content),
        Section::Reports => draw_reports(f, app, content),
        Section::Settings => draw_form_section(f, &app.settings_form, app.input_mode == InputMode::Editing, "Settings", content),
        Section::CaretakerReservations => draw_caretaker_reservations(f, app, content),
        Section::FacilityStatus => draw_facility_status(f, app, content),
    }

    let status_paragraph = Paragraph::new(app.app_status.clone())
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status_paragraph, chunks[2]);
}

fn draw_form_fields(f: &mut Frame, form: &Form, editing: bool, areas: &[Rect]) {
    for (i, area) in areas.iter().enumerate().take(form.labels.len()) {
        let focused = editing && form.focus == i;
        let text = if focused { format!("{}▋", form.display(i)) } else { form.display(i) };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(form.labels[i]))
            .style(if focused { Style::default().fg(Color::Yellow) } else { Style::default() });
        f.render_widget(paragraph, *area);
    }
}

fn draw_form_section(f: &mut Frame, form: &Form, editing: bool, title: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut constraints: Vec<Constraint> = form.labels.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(1));
    let rows = Layout::default().direction(Direction::Vertical).constraints(constraints).split(inner);
    draw_form_fields(f, form, editing, &rows[..form.labels.len()]);

    let hint = if editing { "(Tab) Next | (←/→) Choose | (Enter) Submit | (Esc) Cancel" } else { "(i/Enter) Edit" };
    f.render_widget(Paragraph::new(hint).alignment(Alignment::Center), rows[form.labels.len()]);
}

fn table_block(title: String) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title)
}

fn draw_table(f: &mut Frame, state: &mut TableState, title: String, header: &[&str], rows: Vec<Vec<String>>, empty: &str, area: Rect) {
    if rows.is_empty() {
        let text = Paragraph::new(empty.to_string()).block(table_block(title)).alignment(Alignment::Center);
        f.render_widget(text, area);
        return;
    }
    let widths: Vec<Constraint> = header.iter().map(|_| Constraint::Ratio(1, header.len() as u32)).collect();
    let rows: Vec<Row> = rows.into_iter().map(|cells| Row::new(cells.into_iter().map(Cell::from))).collect();
    let table = Table::new(rows, widths)
        .header(Row::new(header.iter().map(|h| Cell::from(*h))).style(Style::default().bold()))
        .block(table_block(title))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::Gray))
        .highlight_symbol("> ");
    f.render_stateful_widget(table, area, state);
}

fn draw_dashboard(f: &mut Frame, app: &mut App, area: Rect) {
    let dash = views::manager_dashboard(&app.portal.book, &app.portal.auth, &app.portal.status);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);
    let stats = vec![
        Line::from(vec![Span::styled("Active reservations: ", Style::default().bold()), Span::raw(dash.active_reservations.to_string())]),
        Line::from(vec![Span::styled("Total guests: ", Style::default().bold()), Span::raw(dash.total_guests.to_string())]),
        Line::from(vec![Span::styled("Active guesthouses: ", Style::default().bold()), Span::raw(dash.active_guesthouses.to_string())]),
    ];
    f.render_widget(Paragraph::new(stats).block(Block::default().borders(Borders::ALL).title("Dashboard")), chunks[0]);

    let rows = dash
        .caretakers
        .iter()
        .map(|c| vec![c.username.clone(), c.guesthouse.clone(), c.label().to_string()])
        .collect();
    let mut state = TableState::default();
    draw_table(f, &mut state, "Caretakers".to_string(), &["Caretaker", "Guesthouse", "Status"], rows, "No caretakers.", chunks[1]);
}

fn draw_letters(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = views::letter_rows(&app.portal.book).into_iter().map(|r| r.to_vec()).collect();
    let title = format!("Letters ({}) - (Enter) Open", app.portal.book.len());
    draw_table(f, &mut app.table_state, title, &["Guest", "Check-in", "Suite", "Guesthouse"], rows, views::NO_LETTERS, area);
}

fn draw_letter_preview(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Letter Preview - (e) Save | (y) Copy QR link");
    let Some(letter) = &app.letter else {
        f.render_widget(Paragraph::new("No letter yet.").block(block).alignment(Alignment::Center), area);
        return;
    };
    let mut lines: Vec<Line> = letter.paragraphs.iter().flat_map(|p| [Line::from(p.clone()), Line::from("")]).collect();
    lines.push(Line::from(vec![Span::styled("Manager: ", Style::default().bold()), Span::raw(letter.signer.clone())]));
    lines.push(Line::from(vec![Span::styled("QR: ", Style::default().bold()), Span::raw(letter.qr_url.clone())]));
    lines.push(Line::from(vec![Span::styled("Signature: ", Style::default().bold()), Span::raw(image_summary(&letter.signature))]));
    lines.push(Line::from(vec![Span::styled("Stamp: ", Style::default().bold()), Span::raw(image_summary(&letter.stamp))]));
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

// Embedded data URIs are too long to show in full.
fn image_summary(reference: &str) -> String {
    if reference.starts_with("data:") {
        let mime = reference.trim_start_matches("data:").split(';').next().unwrap_or("");
        format!("embedded {} ({} chars)", mime, reference.len())
    } else {
        reference.to_string()
    }
}

fn draw_calendar(f: &mut Frame, app: &App, area: Rect) {
    let view = calendar::render(app.calendar, app.portal.book.list_all());
    let header: Vec<Span> = WEEKDAY_HEADER.iter().map(|d| Span::styled(format!("{:>5}", d), Style::default().bold())).collect();
    let mut lines = vec![Line::from(header)];
    for week in view.weeks() {
        let spans: Vec<Span> = week
            .iter()
            .map(|cell| match cell {
                Some(c) if c.has_reservation() => Span::styled(
                    format!("{:>5}", c.day),
                    Style::default().add_modifier(Modifier::BOLD).bg(Color::Magenta),
                ),
                Some(c) => Span::raw(format!("{:>5}", c.day)),
                None => Span::raw("     "),
            })
            .collect();
        lines.push(Line::from(spans));
    }
    let title = format!("{} - (p) Previous | (n) Next", app.calendar.title());
    f.render_widget(Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)), area);
}

fn draw_reports(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(15), Constraint::Min(0)])
        .split(area);
    draw_form_section(f, &app.report_form, app.input_mode == InputMode::Editing, "Report filter", chunks[0]);

    let rows: Vec<Vec<String>> = {
        let filtered = app.portal.reports(&app.report_criteria);
        views::report_rows(&filtered).into_iter().map(|r| r.to_vec()).collect()
    };
    let title = format!("Reports ({}) - (e) Export CSV", rows.len());
    draw_table(f, &mut app.table_state, title, &["Guest", "Guesthouse", "Check-in", "Check-out", "Status"], rows, views::NO_REPORT_ROWS, chunks[1]);
}

fn draw_caretaker_reservations(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = views::caretaker_rows(&app.portal.book, &app.caretaker_guesthouse())
        .into_iter()
        .map(|r| {
            let mut cells = r.cells.to_vec();
            cells.push(r.action.to_string());
            cells
        })
        .collect();
    draw_table(
        f,
        &mut app.table_state,
        "Reservations - (c) Confirm".to_string(),
        &["Guest", "Suite", "Check-in", "Check-out", "Action"],
        rows,
        views::NO_CARETAKER_RESERVATIONS,
        area,
    );
}

fn draw_facility_status(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    draw_form_section(f, &app.status_form, app.input_mode == InputMode::Editing, "Facility Status", chunks[0]);

    let block = Block::default().borders(Borders::ALL).title("Last report");
    let text = match app.portal.status.status_of(&app.caretaker_guesthouse()) {
        Some(r) => vec![
            Line::from(format!("Occupancy: {}", r.occupancy_status)),
            Line::from(format!("Lights: {}", r.lights_status)),
            Line::from(format!("Water: {}", r.water_status)),
            Line::from(format!("Cleaning: {}", r.cleaning_status)),
            Line::from(format!("Facilities: {}", r.facilities_status)),
            Line::from(format!("Updated: {}", r.last_updated)),
        ],
        None => vec![Line::from("No report submitted yet.")],
    };
    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), chunks[1]);
}

/// Helper to create a centered rect for popups.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QrParams;
    use crate::models::ReservationStatus;
    use crate::seed::sample_seed;
    use crate::store::MemoryStore;
    use crossterm::event::KeyModifiers;
    use tempfile::tempdir;

    fn app() -> App {
        let portal = Portal::with_store(sample_seed(), Box::new(MemoryStore::new()), QrParams::default());
        App::new(portal, PathBuf::from("."))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        text.chars().for_each(|c| press(app, KeyCode::Char(c)));
    }

    fn login(app: &mut App, user: &str, pass: &str) {
        type_text(app, user);
        press(app, KeyCode::Tab);
        type_text(app, pass);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_failed_login_shows_error_and_stays_on_login() {
        let mut app = app();
        login(&mut app, "manager1", "wrongpass");
        assert!(app.login_error);
        assert_eq!(app.screen, Screen::Login);
        assert!(app.portal.current_user().is_none());
    }

    #[test]
    fn test_manager_login_lands_on_dashboard_and_logout_clears_fields() {
        let mut app = app();
        login(&mut app, "manager1", "admin123");
        assert_eq!(app.screen, Screen::Main);
        assert_eq!(app.section, Section::Dashboard);
        assert!(app.login_form.value(LOGIN_PASS).is_empty());

        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.screen, Screen::Login);
        assert!(app.login_form.value(LOGIN_USER).is_empty());
        assert!(app.portal.current_user().is_none());
    }

    #[test]
    fn test_submit_reservation_opens_letter_preview() {
        let mut app = app();
        login(&mut app, "manager1", "admin123");
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.section, Section::NewReservation);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Editing);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.portal.book.len(), 2, "empty form must not create a reservation");
        assert_eq!(app.input_mode, InputMode::Editing);

        type_text(&mut app, "Ali Rezaei");
        for _ in 0..RES_GUESTHOUSE {
            press(&mut app, KeyCode::Tab);
        }
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.portal.book.len(), 3);
        assert_eq!(app.section, Section::LetterPreview);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.letter.as_ref().unwrap().text().contains("Ali Rezaei"));
    }

    #[test]
    fn test_caretaker_confirms_selected_reservation() {
        let mut app = app();
        login(&mut app, "caretaker1", "care123");
        assert_eq!(app.section, Section::CaretakerReservations);
        assert_eq!(app.table_state.selected(), Some(0));

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.portal.book.get(1).map(|r| r.status), Some(ReservationStatus::Confirmed));
    }

    #[test]
    fn test_report_filter_and_export() {
        let dir = tempdir().unwrap();
        let mut app = app();
        app.export_dir = dir.path().to_path_buf();
        login(&mut app, "manager1", "admin123");
        app.switch_section(Section::Reports);

        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "مریم");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.row_count(), 1);

        press(&mut app, KeyCode::Char('e'));
        let csv = std::fs::read_to_string(dir.path().join("report.csv")).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_calendar_navigation() {
        let mut app = app();
        login(&mut app, "manager1", "admin123");
        app.switch_section(Section::Calendar);
        let start = app.calendar;
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('p'));
        let mut expected = start;
        expected.change_month(1);
        assert_eq!(app.calendar, expected);
    }
}
