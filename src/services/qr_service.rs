// src/services/qr_service.rs
use crate::error::{AppError, AppResult};
use qrcode::{render::svg, QrCode};

const MIN_SIZE_PX: u32 = 300;
const DARK: &str = "#181824";
const LIGHT: &str = "#ffffff";

/// Renders `payload` as a standalone SVG document.
pub fn render_svg(payload: &str) -> AppResult<String> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| AppError::QrRenderError(e.to_string()))?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(MIN_SIZE_PX, MIN_SIZE_PX)
        .dark_color(svg::Color(DARK))
        .light_color(svg::Color(LIGHT))
        .build();
    Ok(image)
}
