//! QR rendering of the pairing payload as SVG.
//!
//! `qrcodegen` computes the module matrix; this module turns the dark
//! modules into a single SVG path.  SVG scales cleanly in the host window
//! and needs no image codec.
//!
//! ```text
//! <svg width="400" height="400" viewBox="0 0 33 33">
//!   <rect fill="#FFFFFF" .../>        quiet zone + background
//!   <path fill="#000000" d="M2,2h1v1h-1z M3,2h1v1h-1z ..."/>
//! </svg>
//! ```

use std::fmt::Write as _;

use qrcodegen::{QrCode, QrCodeEcc};

use ermot_core::domain::pairing::{ErrorCorrection, QrOptions};

use crate::application::pairing::{QrEncodeError, QrEncoder};

#[derive(Debug, Default, Clone, Copy)]
pub struct SvgQrEncoder;

impl SvgQrEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl QrEncoder for SvgQrEncoder {
    fn encode(&self, text: &str, options: &QrOptions) -> Result<Vec<u8>, QrEncodeError> {
        if options.size == 0 {
            return Err(QrEncodeError::InvalidOption("size must be positive".into()));
        }
        let dark = checked_color(&options.dark)?;
        let light = checked_color(&options.light)?;

        let qr = QrCode::encode_text(text, ecc(options.error_correction))
            .map_err(|_| QrEncodeError::DataTooLong(text.len()))?;

        let modules = qr.size();
        let margin = i32::try_from(options.margin)
            .map_err(|_| QrEncodeError::InvalidOption("margin too large".into()))?;
        let extent = modules + 2 * margin;

        let mut path = String::new();
        for y in 0..modules {
            for x in 0..modules {
                if qr.get_module(x, y) {
                    let _ = write!(path, "M{},{}h1v1h-1z", x + margin, y + margin);
                }
            }
        }

        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" \
             viewBox=\"0 0 {extent} {extent}\" shape-rendering=\"crispEdges\">\
             <rect width=\"100%\" height=\"100%\" fill=\"{light}\"/>\
             <path fill=\"{dark}\" d=\"{path}\"/></svg>",
            size = options.size,
        );
        Ok(svg.into_bytes())
    }

    fn media_type(&self) -> &'static str {
        "image/svg+xml"
    }
}

fn ecc(level: ErrorCorrection) -> QrCodeEcc {
    match level {
        ErrorCorrection::Low => QrCodeEcc::Low,
        ErrorCorrection::Medium => QrCodeEcc::Medium,
        ErrorCorrection::Quartile => QrCodeEcc::Quartile,
        ErrorCorrection::High => QrCodeEcc::High,
    }
}

/// Accepts `#RGB`, `#RRGGBB` and `#RRGGBBAA`.
fn checked_color(color: &str) -> Result<&str, QrEncodeError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    let valid = matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(color)
    } else {
        Err(QrEncodeError::InvalidOption(format!("color {color:?}")))
    }
}
