//! WASM bindings for sfudoc
//!
//! This module provides JavaScript-accessible functions for HTML ↔ LaTeX conversion.
//! The image registry crosses the boundary as a plain `{ filename: dataUri }` object.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
use crate::{DecodeOptions, EncodeOptions, ImageRegistry, ProfileFields, Template};

/// HTML to LaTeX conversion options (exposed to WASM)
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EncodeConvertOptions {
    /// Template preamble; its head replaces the default one.
    #[serde(default)]
    pub template: Option<String>,
    /// Profile used to fill the template placeholders.
    #[serde(default)]
    pub profile: Option<ProfileFields>,
    /// Without a template: emit a complete document with the default preamble.
    #[serde(default)]
    pub full_document: bool,
}

/// LaTeX to HTML conversion options (exposed to WASM)
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize, Default)]
pub struct DecodeConvertOptions {
    /// Put each top-level block on its own line.
    #[serde(default)]
    pub pretty: bool,
}

/// Safely serialize a value to JsValue, returning an error object on failure.
///
/// This prevents panics from `unwrap()` when serialization fails.
#[cfg(feature = "wasm")]
fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        let error_obj = ConvertResult::failed(format!("Serialization error: {}", e));
        serde_wasm_bindgen::to_value(&error_obj).unwrap_or(JsValue::NULL)
    })
}

/// Conversion result with additional metadata
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct ConvertResult {
    /// The converted output
    pub output: String,
    /// Registry after the conversion; only changes when encoding.
    pub registry: ImageRegistry,
    /// Whether the conversion was successful
    pub success: bool,
    /// Error message if conversion failed
    pub error: Option<String>,
    /// One line per loss
    pub warnings: Vec<String>,
}

#[cfg(feature = "wasm")]
impl ConvertResult {
    fn failed(error: String) -> Self {
        Self {
            output: String::new(),
            registry: ImageRegistry::new(),
            success: false,
            error: Some(error),
            warnings: vec![],
        }
    }
}

#[cfg(feature = "wasm")]
fn panic_message(e: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = e.downcast_ref::<&str>() {
        format!("Conversion failed: {}", s)
    } else if let Some(s) = e.downcast_ref::<String>() {
        format!("Conversion failed: {}", s)
    } else {
        "Conversion failed: unknown error (check browser console for details)".to_string()
    }
}

/// Registry from JS; `undefined`, `null` and malformed values become an empty one.
#[cfg(feature = "wasm")]
fn registry_from_js(value: JsValue) -> ImageRegistry {
    if value.is_undefined() || value.is_null() {
        return ImageRegistry::new();
    }
    serde_wasm_bindgen::from_value(value).unwrap_or_default()
}

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Convert editor HTML to LaTeX
///
/// # Arguments
/// * `html` - Editor HTML
/// * `registry` - Current image registry
/// * `options` - See [`EncodeConvertOptions`]
///
/// # Returns
/// A [`ConvertResult`] carrying the LaTeX and the updated registry
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "htmlToLatex")]
pub fn html_to_latex_wasm(html: &str, registry: JsValue, options: JsValue) -> JsValue {
    let opts: EncodeConvertOptions = serde_wasm_bindgen::from_value(options).unwrap_or_default();
    let registry = registry_from_js(registry);
    let encode_options = EncodeOptions {
        template: opts.template.map(Template::new),
        profile: opts.profile,
        full_document: opts.full_document,
        ..EncodeOptions::default()
    };

    let result = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        crate::encode_with_options(html, &registry, &encode_options)
    })) {
        Ok(encoded) => ConvertResult {
            output: encoded.latex,
            registry: encoded.registry,
            success: true,
            error: None,
            warnings: encoded.report.messages(),
        },
        Err(e) => ConvertResult::failed(panic_message(e)),
    };

    to_js_value(&result)
}

/// Convert LaTeX to editor HTML
///
/// # Arguments
/// * `latex` - LaTeX source, a fragment or a full document
/// * `registry` - Image registry used to resolve `\includegraphics` filenames
/// * `options` - See [`DecodeConvertOptions`]
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "latexToHtml")]
pub fn latex_to_html_wasm(latex: &str, registry: JsValue, options: JsValue) -> JsValue {
    let opts: DecodeConvertOptions = serde_wasm_bindgen::from_value(options).unwrap_or_default();
    let registry = registry_from_js(registry);

    let result = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        crate::decode_with_options(latex, &registry, &DecodeOptions { pretty: opts.pretty })
    })) {
        Ok(decoded) => ConvertResult {
            output: decoded.html,
            registry,
            success: true,
            error: None,
            warnings: decoded.report.messages(),
        },
        Err(e) => ConvertResult::failed(panic_message(e)),
    };

    to_js_value(&result)
}

/// Count the constructs in a LaTeX source and lint it
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "checkLatex")]
pub fn check_latex_wasm(latex: &str) -> JsValue {
    to_js_value(&crate::utils::analysis::metrics_source(latex))
}

/// Format version written by this build
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "getFormatVersion")]
pub fn get_format_version() -> u32 {
    crate::FORMAT_VERSION
}

/// Get version information
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "getVersion")]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
