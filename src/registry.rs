//! Image registry: the filename ↔ data URI map threaded through both directions.
//!
//! The editor keeps images inline as base64 data URIs while the LaTeX source only
//! references short filenames. The registry is a value: registering an image returns
//! a new registry and never touches the one it was called on.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sfudoc_ir::Document;

use crate::utils::error::{ConversionError, ConversionResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRegistry {
    entries: IndexMap<String, String>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// Entries in first-registered order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A copy of this registry with one more entry. An existing key is overwritten.
    pub fn with_entry(&self, filename: impl Into<String>, data_uri: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.entries.insert(filename.into(), data_uri.into());
        next
    }

    /// Filename for `data_uri`, registering it under a fresh name if it is new.
    ///
    /// Payloads are matched by exact string equality. New names follow
    /// `image_{n}.png` starting at the current size plus one, skipping names that
    /// are already taken.
    pub fn lookup_or_register(&self, data_uri: &str) -> (String, ImageRegistry) {
        if let Some((name, _)) = self.entries.iter().find(|(_, uri)| uri.as_str() == data_uri) {
            return (name.clone(), self.clone());
        }
        let mut n = self.entries.len() + 1;
        let mut name = format!("image_{}.png", n);
        while self.entries.contains_key(&name) {
            n += 1;
            name = format!("image_{}.png", n);
        }
        let next = self.with_entry(name.clone(), data_uri);
        (name, next)
    }

    /// Data URI for `filename`, or `""` when it is not registered.
    pub fn resolve(&self, filename: &str) -> &str {
        self.get(filename).unwrap_or("")
    }

    /// Raw image bytes behind a registered data URI.
    pub fn decode_payload(&self, filename: &str) -> ConversionResult<Vec<u8>> {
        let uri = self.get(filename).ok_or_else(|| ConversionError::InvalidImage {
            name: filename.to_string(),
            message: "not in the registry".to_string(),
        })?;
        let (_, payload) = uri
            .split_once(";base64,")
            .ok_or_else(|| ConversionError::InvalidImage {
                name: filename.to_string(),
                message: "not a base64 data URI".to_string(),
            })?;
        STANDARD
            .decode(payload.trim())
            .map_err(|e| ConversionError::InvalidImage {
                name: filename.to_string(),
                message: e.to_string(),
            })
    }
}

impl FromIterator<(String, String)> for ImageRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// File extension matching the MIME type of a data URI.
pub fn extension_for(data_uri: &str) -> &'static str {
    let mime = data_uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split([';', ',']).next())
        .unwrap_or("");
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "png",
    }
}

fn is_data_uri(src: &str) -> bool {
    src.starts_with("data:")
}

/// Encode direction: replace data URI sources with registry filenames.
///
/// Sources that are not data URIs are left alone.
pub fn register_images(doc: &mut Document, registry: &ImageRegistry) -> ImageRegistry {
    let mut current = registry.clone();
    for figure in doc.figures_mut() {
        if !is_data_uri(&figure.image.src) {
            continue;
        }
        let (name, next) = current.lookup_or_register(&figure.image.src);
        figure.image.src = name;
        current = next;
    }
    tracing::debug!(
        before = registry.len(),
        after = current.len(),
        "registered images"
    );
    current
}

/// Decode direction: replace filenames with their data URIs.
///
/// A filename missing from the registry resolves to an empty source and is recorded
/// as a `missing-image` loss.
pub fn resolve_images(doc: &mut Document, registry: &ImageRegistry) {
    let mut missing = Vec::new();
    for figure in doc.figures_mut() {
        if is_data_uri(&figure.image.src) {
            continue;
        }
        let name = std::mem::take(&mut figure.image.src);
        let uri = registry.resolve(&name);
        if uri.is_empty() {
            tracing::warn!(image = %name, "image is not in the registry");
            missing.push(name);
        } else {
            figure.image.src = uri.to_string();
        }
    }
    for name in missing {
        doc.push_loss(
            "missing-image",
            format!("'{}' is not in the image registry; the image is left empty", name),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sfudoc_ir::{Block, Figure, Image};

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn lookup_is_idempotent() {
        let (first, registry) = ImageRegistry::new().lookup_or_register(PNG);
        let (second, again) = registry.lookup_or_register(PNG);
        assert_eq!(first, "image_1.png");
        assert_eq!(second, "image_1.png");
        assert_eq!(again, registry);
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn registration_never_mutates_the_input() {
        let empty = ImageRegistry::new();
        let (_, next) = empty.lookup_or_register(PNG);
        assert!(empty.is_empty());
        assert_eq!(next.resolve("image_1.png"), PNG);
    }

    #[test]
    fn new_names_skip_taken_ones() {
        let registry = ImageRegistry::new().with_entry("image_2.png", "data:image/png;base64,AA==");
        let (name, next) = registry.lookup_or_register(PNG);
        assert_eq!(name, "image_3.png");
        let names: Vec<&str> = next.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["image_2.png", "image_3.png"]);
    }

    #[test]
    fn missing_key_resolves_to_empty() {
        assert_eq!(ImageRegistry::new().resolve("image_9.png"), "");
    }

    #[test]
    fn serializes_as_ordered_object() {
        let registry = ImageRegistry::new()
            .with_entry("image_2.png", "b")
            .with_entry("image_1.png", "a");
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"{"image_2.png":"b","image_1.png":"a"}"#);
        let back: ImageRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
    }

    #[test]
    fn payload_decodes_to_bytes() {
        let registry = ImageRegistry::new().with_entry("image_1.png", PNG);
        let bytes = registry.decode_payload("image_1.png").unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert!(matches!(
            registry.decode_payload("image_2.png"),
            Err(ConversionError::InvalidImage { .. })
        ));
    }

    #[test]
    fn extension_follows_mime() {
        assert_eq!(extension_for("data:image/jpeg;base64,AA=="), "jpg");
        assert_eq!(extension_for(PNG), "png");
        assert_eq!(extension_for("image_1.png"), "png");
    }

    #[test]
    fn passes_rewrite_and_restore_sources() {
        let mut doc = Document::new(vec![Block::Figure(Figure {
            image: Image::new(PNG),
            caption: "Схема".to_string(),
        })]);
        let registry = register_images(&mut doc, &ImageRegistry::new());
        assert_eq!(doc.figures()[0].image.src, "image_1.png");
        resolve_images(&mut doc, &registry);
        assert_eq!(doc.figures()[0].image.src, PNG);
        assert!(doc.losses.is_empty());
    }

    #[test]
    fn unresolved_figure_records_a_loss() {
        let mut doc = Document::new(vec![Block::Figure(Figure {
            image: Image::new("image_7.png"),
            caption: String::new(),
        })]);
        resolve_images(&mut doc, &ImageRegistry::new());
        assert_eq!(doc.figures()[0].image.src, "");
        assert_eq!(doc.losses[0].kind, "missing-image");
    }
}
