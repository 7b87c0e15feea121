// src/letter.rs
//! Introduction letters: template text, QR link and an HTML document for printing.
use crate::config::QrParams;
use crate::error::{StoreError, StoreResult};
use crate::models::{Reservation, Settings, User};
use chrono::Utc;
use log;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct LetterView {
    pub guest_name: String,
    pub paragraphs: Vec<String>,
    pub signer: String,
    pub signer_contact: String,
    pub signature: String,
    pub stamp: String,
    pub qr_url: String,
    pub location_url: String,
}

/// QR image reference on the external generator; nothing is fetched here.
pub fn qr_url(qr: &QrParams, location: &str) -> String {
    format!(
        "{}?size={}x{}&data={}",
        qr.endpoint,
        qr.size,
        qr.size,
        urlencoding::encode(location)
    )
}

pub fn generate(reservation: &Reservation, settings: &Settings, current_user: Option<&User>, qr: &QrParams) -> LetterView {
    let location = if settings.location_url.trim().is_empty() {
        qr.default_location.clone()
    } else {
        settings.location_url.clone()
    };
    let signer = if settings.manager_name.trim().is_empty() {
        current_user.map(|u| u.username.clone()).unwrap_or_default()
    } else {
        settings.manager_name.clone()
    };

    let r = reservation;
    let paragraphs = vec![
        format!(
            "جناب آقای/سرکار خانم {} به همراه {} نفر، جهت اقامت در سوئیت شماره {} \
             از تاریخ {} تا تاریخ {} با ساعت ورود {} و ساعت خروج {} به مهمانسرای {} معرفی می‌گردد.",
            r.guest_name, r.guest_count, r.suite_number, r.checkin_date, r.checkout_date,
            r.checkin_time, r.checkout_time, r.guesthouse
        ),
        "همراه داشتن ملحفه و وسایل بهداشتی الزامی است. \
         انجام نظافت ساختمان قبل از تخلیه بر عهده میهمان می‌باشد."
            .to_string(),
    ];

    log::debug!("Letter generated for reservation {}", r.id);
    LetterView {
        guest_name: r.guest_name.clone(),
        paragraphs,
        signer,
        signer_contact: settings.manager_contact.clone(),
        signature: settings.signature.clone(),
        stamp: settings.stamp.clone(),
        qr_url: qr_url(qr, &location),
        location_url: location,
    }
}

impl LetterView {
    pub fn text(&self) -> String {
        let mut out = self.paragraphs.join("\n\n");
        out.push_str("\n\n");
        out.push_str(&self.signer);
        if !self.signer_contact.is_empty() {
            out.push_str(&format!(" ({})", self.signer_contact));
        }
        out.push_str(&format!("\nQR: {}", self.qr_url));
        out
    }

    pub fn to_html(&self) -> String {
        let body: String = self
            .paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>\n", escape_html(p)))
            .collect();
        format!(
            "<!DOCTYPE html>\n<html lang=\"fa\" dir=\"rtl\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n\
             <div id=\"letterContent\">\n{body}\
             <div class=\"qr\"><img src=\"{qr}\" alt=\"QR\"></div>\n\
             <div class=\"signer\"><span>{signer}</span>\n\
             <img src=\"{signature}\" alt=\"signature\">\n<img src=\"{stamp}\" alt=\"stamp\"></div>\n\
             </div>\n</body>\n</html>\n",
            title = escape_html(&self.guest_name),
            body = body,
            qr = escape_html(&self.qr_url),
            signer = escape_html(&self.signer),
            signature = escape_html(&self.signature),
            stamp = escape_html(&self.stamp),
        )
    }
}

/// Writes the letter as `letter-<millis>.html` into `dir`.
pub fn export(letter: &LetterView, dir: &Path) -> StoreResult<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let path = dir.join(format!("letter-{}.html", Utc::now().timestamp_millis()));
    fs::write(&path, letter.to_html()).map_err(|e| {
        log::error!("Failed to write letter to {:?}: {:?}", path, e);
        StoreError::Io(e)
    })?;
    log::info!("Letter for '{}' exported to {:?}", letter.guest_name, path);
    Ok(path)
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use tempfile::tempdir;

    fn reservation() -> Reservation {
        Reservation {
            id: 42,
            guest_name: "Ali Rezaei".to_string(),
            guest_count: "3".to_string(),
            suite_number: "12".to_string(),
            guesthouse: "Ramsar".to_string(),
            checkin_date: "2024-05-05".to_string(),
            checkout_date: "2024-05-08".to_string(),
            checkin_time: "14:00".to_string(),
            checkout_time: "12:00".to_string(),
            ..Reservation::default()
        }
    }

    fn manager() -> User {
        User { username: "manager1".to_string(), password: String::new(), role: Role::Manager, guesthouse: None }
    }

    #[test]
    fn test_letter_uses_default_location_and_username() {
        let letter = generate(&reservation(), &Settings::default(), Some(&manager()), &QrParams::default());
        assert_eq!(letter.signer, "manager1");
        assert_eq!(
            letter.qr_url,
            "https://api.qrserver.com/v1/create-qr-code/?size=120x120&data=https%3A%2F%2Fmaps.google.com"
        );
        let text = letter.text();
        assert!(text.contains("Ali Rezaei"));
        assert!(text.contains("سوئیت شماره 12"));
        assert!(text.contains("Ramsar"));
    }

    #[test]
    fn test_letter_prefers_configured_values() {
        let settings = Settings {
            manager_name: "Karimi".to_string(),
            location_url: "https://maps.example/?q=a b".to_string(),
            signature: "data:image/png;base64,AAAA".to_string(),
            ..Settings::default()
        };
        let letter = generate(&reservation(), &settings, Some(&manager()), &QrParams::default());
        assert_eq!(letter.signer, "Karimi");
        assert!(letter.qr_url.ends_with("data=https%3A%2F%2Fmaps.example%2F%3Fq%3Da%20b"));
        assert_eq!(letter.signature, "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_html_is_escaped() {
        let mut res = reservation();
        res.guest_name = "<b>Ali</b>".to_string();
        let html = generate(&res, &Settings::default(), None, &QrParams::default()).to_html();
        assert!(html.contains("&lt;b&gt;Ali&lt;/b&gt;"));
        assert!(!html.contains("<b>Ali"));
        assert!(html.contains("size=120x120&amp;data="));
    }

    #[test]
    fn test_export_writes_html_file() {
        let dir = tempdir().unwrap();
        let letter = generate(&reservation(), &Settings::default(), None, &QrParams::default());
        let path = export(&letter, &dir.path().join("letters")).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("letter-") && name.ends_with(".html"));
        assert!(fs::read_to_string(&path).unwrap().contains("Ali Rezaei"));
    }
}
