//! LaTeX analysis utilities: basic metrics, linting and image checks.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::core::latex2html::latex_to_ir;
use crate::registry::ImageRegistry;
use crate::utils::loss::{LossKind, LossReport};

lazy_static! {
    static ref INCLUDEGRAPHICS: Regex =
        Regex::new(r"\\includegraphics\*?\s*(?:\[[^\]]*\])?\s*\{([^}]*)\}").unwrap();
    static ref HEADING: Regex =
        Regex::new(r"\\(?:chapter|section|subsection|subsubsection)\*?\s*[\[{]").unwrap();
    static ref ITEM: Regex = Regex::new(r"\\item\b").unwrap();
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatexMetrics {
    pub headings: usize,
    pub figures: usize,
    pub tables: usize,
    pub list_items: usize,
    pub page_breaks: usize,
    pub title_pages: usize,
    pub images: usize,
    pub parse_errors: usize,
    pub warnings: usize,
}

/// Structural problems count as errors, everything else the reader kept verbatim as
/// warnings.
pub fn lint_source(source: &str) -> (usize, usize) {
    let doc = latex_to_ir(source);
    let report = LossReport::from_ir_losses("latex", "html", &doc.losses);
    let errors = report.count(LossKind::Structure);
    (errors, report.len() - errors)
}

pub fn metrics_source(source: &str) -> LatexMetrics {
    let mut metrics = LatexMetrics {
        headings: HEADING.find_iter(source).count(),
        figures: count_any(source, &["\\begin{figure}", "\\begin{figure*}"]),
        tables: count_any(source, &["\\begin{tabular}", "\\begin{tabularx}"]),
        list_items: ITEM.find_iter(source).count(),
        page_breaks: count_any(source, &["\\newpage", "\\clearpage"]),
        title_pages: count_any(source, &["\\begin{titlepage}"]),
        images: image_references(source).len(),
        ..LatexMetrics::default()
    };

    let (errors, warnings) = lint_source(source);
    metrics.parse_errors = errors;
    metrics.warnings = warnings;

    metrics
}

/// Filenames passed to `\includegraphics`, in order of appearance.
pub fn image_references(source: &str) -> Vec<String> {
    INCLUDEGRAPHICS
        .captures_iter(source)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// Referenced filenames that the registry cannot resolve, without duplicates.
pub fn unresolved_images(source: &str, registry: &ImageRegistry) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for name in image_references(source) {
        if !registry.contains(&name) && !missing.contains(&name) {
            missing.push(name);
        }
    }
    missing
}

fn count_any(haystack: &str, needles: &[&str]) -> usize {
    needles.iter().map(|n| haystack.matches(n).count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "\\section{Введение}\n\\begin{itemize}\n  \\item a\n  \\item b\n\\end{itemize}\n\\begin{figure}[h]\n\\includegraphics[width=\\textwidth]{image_1.png}\n\\end{figure}\n\\newpage\n\\subsection*{Итоги}\n\\includegraphics{image_2.png}";

    #[test]
    fn counts_constructs() {
        let metrics = metrics_source(SOURCE);
        assert_eq!(metrics.headings, 2);
        assert_eq!(metrics.list_items, 2);
        assert_eq!(metrics.figures, 1);
        assert_eq!(metrics.images, 2);
        assert_eq!(metrics.page_breaks, 1);
        assert_eq!(metrics.parse_errors, 0);
    }

    #[test]
    fn finds_unresolved_images() {
        let registry = ImageRegistry::new().with_entry("image_1.png", "data:image/png;base64,AA==");
        assert_eq!(
            unresolved_images(SOURCE, &registry),
            vec!["image_2.png".to_string()]
        );
    }

    #[test]
    fn lint_counts_structure_as_errors() {
        let (errors, warnings) = lint_source("\\end{itemize} \\foo");
        assert_eq!(errors, 1);
        assert_eq!(warnings, 1);
    }
}
