// src/templates.rs
use askama::Template;

/// Printable card with a student's attendance QR code.
#[derive(Template)]
#[template(path = "student_qr.html")]
pub struct StudentQrPage<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub code: &'a str,
    pub svg: &'a str, // rendered server-side, trusted
}
