// src/settings.rs
use crate::error::{StoreError, StoreResult};
use crate::models::Settings;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use log;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Signature,
    Stamp,
}

impl ImageKind {
    pub fn label(&self) -> &'static str {
        match self {
            ImageKind::Signature => "امضا",
            ImageKind::Stamp => "مهر",
        }
    }
}

#[derive(Debug, Default)]
pub struct SettingsStore {
    settings: Settings,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        SettingsStore { settings }
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn update_general(&mut self, manager_name: &str, manager_contact: &str, location_url: &str) {
        self.settings.manager_name = manager_name.to_string();
        self.settings.manager_contact = manager_contact.to_string();
        self.settings.location_url = location_url.to_string();
        log::info!("General settings updated");
    }

    /// Embeds an image file as a `data:` URI in the signature or stamp slot.
    pub fn set_image(&mut self, kind: ImageKind, path: &Path) -> StoreResult<()> {
        let bytes = fs::read(path).map_err(|e| {
            log::error!("Failed to read {:?} image {:?}: {:?}", kind, path, e);
            StoreError::Io(e)
        })?;
        let uri = to_data_uri(&bytes, mime_for(path));
        match kind {
            ImageKind::Signature => self.settings.signature = uri,
            ImageKind::Stamp => self.settings.stamp = uri,
        }
        log::info!("{:?} image loaded from {:?} ({} bytes)", kind, path, bytes.len());
        Ok(())
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, B64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_update_general() {
        let mut store = SettingsStore::default();
        store.update_general("Karimi", "0912", "https://maps.example/ramsar");
        assert_eq!(store.get().manager_name, "Karimi");
        assert_eq!(store.get().location_url, "https://maps.example/ramsar");
        assert_eq!(store.get().stamp, "assets/stamp.png");
    }

    #[test]
    fn test_set_image_embeds_data_uri() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sig.PNG");
        fs::write(&path, b"abc").unwrap();

        let mut store = SettingsStore::default();
        store.set_image(ImageKind::Signature, &path).unwrap();
        assert_eq!(store.get().signature, "data:image/png;base64,YWJj");
        assert_eq!(store.get().stamp, "assets/stamp.png");
    }

    #[test]
    fn test_set_image_unknown_extension_and_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stamp.bin");
        fs::write(&path, [0u8, 1]).unwrap();

        let mut store = SettingsStore::default();
        store.set_image(ImageKind::Stamp, &path).unwrap();
        assert!(store.get().stamp.starts_with("data:application/octet-stream;base64,"));

        let missing = dir.path().join("nope.png");
        assert!(matches!(store.set_image(ImageKind::Stamp, &missing), Err(StoreError::Io(_))));
    }
}
