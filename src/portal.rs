// src/portal.rs
use crate::auth::SessionManager;
use crate::config::{Config, QrParams};
use crate::error::{AppResult, AuthError, ReservationError, StoreResult};
use crate::letter::{self, LetterView};
use crate::models::{GuesthouseStatusReport, NewReservation, Reservation, Role, SeedData, User};
use crate::report::{self, ReportCriteria};
use crate::reservations::ReservationBook;
use crate::seed;
use crate::settings::{ImageKind, SettingsStore};
use crate::status::{StatusBoard, StatusFields};
use crate::store::{
    get_json, put_json, FileStore, KeyValueStore, KEY_CONFIRMED_SEED_IDS, KEY_GUESTHOUSE_STATUS,
    KEY_RESERVATIONS, KEY_SETTINGS,
};
use log;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// Owns every store and the persistence backend. Each mutation persists
/// the affected key in full before returning.
pub struct Portal {
    pub auth: SessionManager,
    pub book: ReservationBook,
    pub status: StatusBoard,
    pub settings: SettingsStore,
    qr: QrParams,
    kv: Box<dyn KeyValueStore>,
}

impl Portal {
    /// Seed file plus the file-backed store from `config`. An unreadable
    /// seed or stored value leaves that part empty instead of failing.
    pub fn open(config: &Config) -> Self {
        let seed = seed::load_seed_or_empty(&config.seed_path);
        let kv = FileStore::new(config.resolved_data_dir());
        log::info!("Using data directory {:?}", kv.dir());
        Portal::with_store(seed, Box::new(kv), config.qr.clone())
    }

    pub fn with_store(seed: SeedData, kv: Box<dyn KeyValueStore>, qr: QrParams) -> Self {
        let local: Vec<Reservation> = load_or_default(kv.as_ref(), KEY_RESERVATIONS);
        let confirmed: Vec<u64> = load_or_default(kv.as_ref(), KEY_CONFIRMED_SEED_IDS);
        let reports: BTreeMap<String, GuesthouseStatusReport> = load_or_default(kv.as_ref(), KEY_GUESTHOUSE_STATUS);
        let settings = load_or_default(kv.as_ref(), KEY_SETTINGS);

        Portal {
            auth: SessionManager::new(seed.users),
            book: ReservationBook::from_parts(seed.reservations, local, &confirmed),
            status: StatusBoard::new(reports),
            settings: SettingsStore::new(settings),
            qr,
            kv,
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<&User, AuthError> {
        self.auth.login(username, password)
    }

    pub fn logout(&mut self) {
        self.auth.logout();
    }

    pub fn current_user(&self) -> Option<&User> {
        self.auth.current()
    }

    fn persist_reservations(&mut self) -> StoreResult<()> {
        put_json(self.kv.as_mut(), KEY_RESERVATIONS, &self.book.local_records())?;
        put_json(self.kv.as_mut(), KEY_CONFIRMED_SEED_IDS, &self.book.confirmed_seed_ids())
    }

    /// Manager only. Returns the stored reservation and its letter.
    pub fn submit_reservation(&mut self, form: NewReservation) -> AppResult<(Reservation, LetterView)> {
        self.auth.require(Role::Manager)?;
        let reservation = self.book.submit(form)?;
        if let Err(e) = self.persist_reservations() {
            self.book.discard(reservation.id);
            log::warn!("Reservation {} discarded because it could not be saved", reservation.id);
            return Err(e.into());
        }
        let letter = letter::generate(&reservation, self.settings.get(), self.auth.current(), &self.qr);
        Ok((reservation, letter))
    }

    /// Caretaker only, for their own guesthouse. An unknown id is a no-op.
    pub fn confirm_reservation(&mut self, id: u64) -> AppResult<Option<Reservation>> {
        let guesthouse = self.caretaker_guesthouse()?;
        match self.book.get(id) {
            Some(r) if r.guesthouse != guesthouse => {
                return Err(AuthError::Forbidden(format!("reservation {} belongs to '{}'", id, r.guesthouse)).into());
            }
            _ => {}
        }
        let previous = self.book.get(id).map(|r| r.status);
        match self.book.confirm(id) {
            Ok(reservation) => {
                if let Err(e) = self.persist_reservations() {
                    if let Some(status) = previous {
                        self.book.set_status(id, status);
                    }
                    log::warn!("Confirmation of reservation {} reverted because it could not be saved", id);
                    return Err(e.into());
                }
                Ok(Some(reservation))
            }
            Err(ReservationError::NotFound(missing)) => {
                log::debug!("Confirm ignored: reservation {} no longer exists", missing);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn report_status(&mut self, fields: StatusFields) -> AppResult<GuesthouseStatusReport> {
        let guesthouse = self.caretaker_guesthouse()?;
        let report = self.status.report(&guesthouse, fields).clone();
        put_json(self.kv.as_mut(), KEY_GUESTHOUSE_STATUS, self.status.all())?;
        Ok(report)
    }

    fn caretaker_guesthouse(&self) -> Result<String, AuthError> {
        let user = self.auth.require(Role::Caretaker)?;
        user.guesthouse
            .clone()
            .ok_or_else(|| AuthError::Forbidden(format!("caretaker '{}' has no guesthouse", user.username)))
    }

    pub fn save_general_settings(&mut self, manager_name: &str, manager_contact: &str, location_url: &str) -> AppResult<()> {
        self.auth.require(Role::Manager)?;
        self.settings.update_general(manager_name, manager_contact, location_url);
        put_json(self.kv.as_mut(), KEY_SETTINGS, self.settings.get())?;
        Ok(())
    }

    pub fn upload_image(&mut self, kind: ImageKind, path: &Path) -> AppResult<()> {
        self.auth.require(Role::Manager)?;
        self.settings.set_image(kind, path)?;
        put_json(self.kv.as_mut(), KEY_SETTINGS, self.settings.get())?;
        Ok(())
    }

    /// In-memory only; the seed document is never rewritten.
    pub fn change_password(&mut self, username: &str, new_password: &str) -> AppResult<()> {
        self.auth.require(Role::Manager)?;
        self.auth.change_password(username, new_password)?;
        Ok(())
    }

    /// Manager only. `Ok(None)` for an unknown id.
    pub fn letter_for(&self, id: u64) -> Result<Option<LetterView>, AuthError> {
        self.auth.require(Role::Manager)?;
        Ok(self
            .book
            .get(id)
            .map(|reservation| letter::generate(reservation, self.settings.get(), self.auth.current(), &self.qr)))
    }

    pub fn reports(&self, criteria: &ReportCriteria) -> Vec<&Reservation> {
        report::filter(self.book.list_all(), criteria)
    }

    /// Reservations the current user may see: all for a manager, their own
    /// guesthouse for a caretaker.
    pub fn visible_reservations(&self) -> Vec<&Reservation> {
        match self.auth.current() {
            Some(User { role: Role::Manager, .. }) => self.book.list_all().iter().collect(),
            Some(User { role: Role::Caretaker, guesthouse: Some(g), .. }) => self.book.list_for(g).collect(),
            _ => Vec::new(),
        }
    }
}

// A stored value that cannot be read is logged and replaced by its default.
fn load_or_default<T: DeserializeOwned + Default>(kv: &dyn KeyValueStore, key: &str) -> T {
    match get_json(kv, key) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            log::error!("Ignoring stored '{}': {}", key, e);
            T::default()
        }
    }
}
