//! # sfudoc
//!
//! Bidirectional converter between the СФУ.ДОК editor's HTML and LaTeX.
//!
//! Both directions go through a shared block IR:
//!
//! - **Encode** (HTML → LaTeX): the HTML frontend builds the IR, images are moved
//!   into the [`ImageRegistry`], the LaTeX backend renders the body, and an optional
//!   [`Template`] supplies the preamble and title page.
//! - **Decode** (LaTeX → HTML): the LaTeX reader builds the IR, registry filenames
//!   are resolved back to data URIs, and the HTML backend renders editor markup.
//!
//! Neither direction fails. Anything that cannot be mapped is kept verbatim where
//! possible and reported in a [`LossReport`].
//!
//! ## Example
//!
//! ```
//! use sfudoc::{decode, encode, ImageRegistry};
//!
//! let encoded = encode("<h1>Intro</h1><p>Hello <strong>world</strong></p>", &ImageRegistry::new(), None, None);
//! assert!(encoded.latex.contains("\\section{Intro}"));
//! assert!(encoded.latex.contains("Hello \\textbf{world}"));
//!
//! let html = decode(&encoded.latex, &encoded.registry);
//! assert_eq!(html, "<h1>Intro</h1><p>Hello <strong>world</strong></p>");
//! ```

pub mod core;
pub mod document;
pub mod profile;
pub mod registry;
pub mod template;
pub mod utils;
pub mod wasm;

pub use crate::core::latex2html::latex_to_ir;
pub use document::{detect_dialect, Dialect, DocumentSnapshot, FORMAT_VERSION};
pub use profile::ProfileFields;
pub use registry::{register_images, resolve_images, ImageRegistry};
pub use template::{Template, BLANK_FIELD};
pub use utils::error::{ConversionError, ConversionResult};
pub use utils::loss::{LossKind, LossRecord, LossReport};

pub use sfudoc_html_frontend::html_to_ir;
pub use sfudoc_ir as ir;

use sfudoc_html_backend::HtmlRenderOptions;
use sfudoc_latex_backend::LatexRenderOptions;

use crate::document::format_marker;
use crate::template::{assemble, head_has_title_page};

/// Options for the HTML → LaTeX direction.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Preamble and title page to wrap the body in.
    pub template: Option<Template>,
    /// Values for the template's placeholders.
    pub profile: Option<ProfileFields>,
    /// Without a template: wrap the body in the default preamble.
    pub full_document: bool,
    /// Start the output with the `% sfudoc-format:` marker line.
    pub version_marker: bool,
    pub latex: LatexRenderOptions,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            template: None,
            profile: None,
            full_document: false,
            version_marker: true,
            latex: LatexRenderOptions::default(),
        }
    }
}

/// Result of [`encode`].
#[derive(Debug, Clone)]
pub struct Encoded {
    pub latex: String,
    /// The input registry plus any images first seen in this document.
    pub registry: ImageRegistry,
    pub report: LossReport,
}

/// Options for the LaTeX → HTML direction.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Put each top-level block on its own line.
    pub pretty: bool,
}

/// Result of [`decode_with_options`].
#[derive(Debug, Clone)]
pub struct Decoded {
    pub html: String,
    pub dialect: Dialect,
    pub report: LossReport,
}

/// Convert editor HTML to LaTeX.
///
/// `registry` is not modified; the registry to persist is returned in
/// [`Encoded::registry`].
pub fn encode(
    html: &str,
    registry: &ImageRegistry,
    template: Option<&Template>,
    profile: Option<&ProfileFields>,
) -> Encoded {
    let options = EncodeOptions {
        template: template.cloned(),
        profile: profile.cloned(),
        ..EncodeOptions::default()
    };
    encode_with_options(html, registry, &options)
}

pub fn encode_with_options(
    html: &str,
    registry: &ImageRegistry,
    options: &EncodeOptions,
) -> Encoded {
    let _span = tracing::debug_span!("encode", bytes = html.len()).entered();

    let mut doc = html_to_ir(html);
    let registry = register_images(&mut doc, registry);
    let mut render = options.latex.clone();

    let latex = match &options.template {
        Some(template) => {
            let head = template.head(options.profile.as_ref());
            if doc.title_page.is_some() && head_has_title_page(&head) {
                render.include_title_page = false;
                doc.push_loss(
                    "template-title-page",
                    "the template has its own title page; the document's title page is not emitted",
                );
            }
            render.full_document = false;
            let body = sfudoc_latex_backend::render_document(&doc, render);
            assemble(&head, &body)
        }
        None => {
            render.full_document = options.full_document;
            let body = sfudoc_latex_backend::render_document(&doc, render);
            if options.version_marker {
                format!("{}\n{}", format_marker(), body)
            } else {
                body
            }
        }
    };

    let report = LossReport::from_ir_losses("html", "latex", &doc.losses);
    if !report.is_empty() {
        tracing::info!(losses = report.len(), "encode finished with losses");
    }
    Encoded {
        latex,
        registry,
        report,
    }
}

/// Convert LaTeX to editor HTML, resolving image filenames through `registry`.
pub fn decode(latex: &str, registry: &ImageRegistry) -> String {
    decode_with_options(latex, registry, &DecodeOptions::default()).html
}

pub fn decode_with_report(latex: &str, registry: &ImageRegistry) -> (String, LossReport) {
    let decoded = decode_with_options(latex, registry, &DecodeOptions::default());
    (decoded.html, decoded.report)
}

pub fn decode_with_options(
    latex: &str,
    registry: &ImageRegistry,
    options: &DecodeOptions,
) -> Decoded {
    let _span = tracing::debug_span!("decode", bytes = latex.len()).entered();

    let dialect = detect_dialect(latex);
    let mut doc = latex_to_ir(latex);
    resolve_images(&mut doc, registry);
    let html = sfudoc_html_backend::render_document(
        &doc,
        &HtmlRenderOptions {
            pretty: options.pretty,
        },
    );

    let report = LossReport::from_ir_losses("latex", "html", &doc.losses);
    if !report.is_empty() {
        tracing::info!(losses = report.len(), ?dialect, "decode finished with losses");
    }
    Decoded {
        html,
        dialect,
        report,
    }
}
