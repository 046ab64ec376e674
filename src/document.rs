//! Persisted document snapshot and format versioning.
//!
//! Snapshots written before versioning existed carry no `format_version` field and
//! load as version 0. The LaTeX text itself carries the version too, as a marker
//! comment on its first line.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::registry::ImageRegistry;
use crate::utils::error::{ConversionError, ConversionResult};

/// Version written by this converter.
pub const FORMAT_VERSION: u32 = 1;

pub const FORMAT_MARKER_PREFIX: &str = "% sfudoc-format:";

lazy_static! {
    static ref FORMAT_MARKER: Regex =
        Regex::new(r"(?m)^[ \t]*% sfudoc-format:[ \t]*(\d+)[ \t]*\r?$").unwrap();
    static ref FORMAT_MARKER_LINE: Regex =
        Regex::new(r"(?m)^[ \t]*% sfudoc-format:[^\n]*\n?").unwrap();
}

/// The marker comment for [`FORMAT_VERSION`].
pub fn format_marker() -> String {
    format!("{} {}", FORMAT_MARKER_PREFIX, FORMAT_VERSION)
}

/// Drop any version marker lines, e.g. from a template that was itself generated.
pub fn strip_format_marker(latex: &str) -> String {
    FORMAT_MARKER_LINE.replace_all(latex, "").into_owned()
}

/// Which converter generation produced a LaTeX source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// No marker: written before versioning, or by hand.
    Legacy,
    V1,
}

pub fn detect_dialect(latex: &str) -> Dialect {
    match marker_version(latex) {
        Some(v) if v >= 1 => Dialect::V1,
        _ => Dialect::Legacy,
    }
}

/// Version number from the marker comment, if present.
pub fn marker_version(latex: &str) -> Option<u32> {
    FORMAT_MARKER
        .captures(latex)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub format_version: u32,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub latex: String,
    #[serde(default)]
    pub images: ImageRegistry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    pub fn new(html: impl Into<String>, latex: impl Into<String>, images: ImageRegistry) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            html: html.into(),
            latex: latex.into(),
            images,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn from_json(input: &str) -> ConversionResult<Self> {
        let snapshot: DocumentSnapshot = serde_json::from_str(input)?;
        if snapshot.format_version > FORMAT_VERSION {
            return Err(ConversionError::UnsupportedFormatVersion {
                found: snapshot.format_version,
                supported: FORMAT_VERSION,
            });
        }
        if snapshot.is_legacy() {
            tracing::info!("loaded a legacy snapshot without a format version");
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> ConversionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_legacy(&self) -> bool {
        self.format_version == 0
    }

    pub fn dialect(&self) -> Dialect {
        detect_dialect(&self.latex)
    }

    /// Rebuild the editor HTML from the stored LaTeX and images.
    pub fn restore_html(&self) -> String {
        crate::decode(&self.latex, &self.images)
    }
}
