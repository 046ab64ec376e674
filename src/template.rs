//! Template preambles: placeholder substitution and head extraction.
//!
//! A template is a LaTeX fragment prepared by the department. Its "head" is
//! everything up to and including the title page it may define, ending at the
//! `\restoregeometry` that closes the title page margins. The converted body is
//! appended after the head.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use sfudoc_latex_backend::escape_latex;

use crate::document::{format_marker, strip_format_marker};
use crate::profile::ProfileFields;

/// Stand-in for a missing group or student card number.
pub const BLANK_FIELD: &str = "\\_\\_\\_\\_\\_\\_\\_\\_\\_\\_";

const HEAD_END: &str = "\\restoregeometry";
const BEGIN_DOCUMENT: &str = "\\begin{document}";
const END_DOCUMENT: &str = "\\end{document}";

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"VAR_(STUDENT_SIGNATURE|STUDENT_NAME|GROUP|CARD)").unwrap();
    static ref EMPTY_DEPARTMENT: Regex = Regex::new(r"кафедра\s*«\s*»").unwrap();
    static ref TITLEPAGE: Regex = Regex::new(r"\\begin\s*\{titlepage\}").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The template with every placeholder filled from `profile`.
    pub fn substitute(&self, profile: Option<&ProfileFields>) -> String {
        let default_profile = ProfileFields::default();
        let profile = profile.unwrap_or(&default_profile);
        substitute(&self.source, profile)
    }

    /// Substituted head, ready to have a body appended.
    pub fn head(&self, profile: Option<&ProfileFields>) -> String {
        extract_head(&self.substitute(profile))
    }
}

pub fn substitute(source: &str, profile: &ProfileFields) -> String {
    let filled = PLACEHOLDER.replace_all(source, |caps: &Captures| match &caps[1] {
        "GROUP" => profile
            .group()
            .map(escape_latex)
            .unwrap_or_else(|| BLANK_FIELD.to_string()),
        "CARD" => profile
            .student_card()
            .map(escape_latex)
            .unwrap_or_else(|| BLANK_FIELD.to_string()),
        "STUDENT_SIGNATURE" => escape_latex(&profile.initials()),
        _ => escape_latex(&profile.full_name()),
    });
    match profile.department() {
        Some(department) => {
            let replacement = format!("кафедра «{}»", escape_latex(department));
            EMPTY_DEPARTMENT
                .replace_all(&filled, regex::NoExpand(&replacement))
                .into_owned()
        }
        None => filled.into_owned(),
    }
}

/// Cut a preamble down to its head.
///
/// The head ends after `\restoregeometry` if the template has one, otherwise after
/// `\begin{document}`; a bare preamble gets `\begin{document}` appended. Any
/// `\end{document}` inside the head is dropped.
pub fn extract_head(preamble: &str) -> String {
    let preamble = strip_format_marker(preamble);
    let head = if let Some(pos) = preamble.find(HEAD_END) {
        preamble[..pos + HEAD_END.len()].to_string()
    } else if let Some(pos) = preamble.find(BEGIN_DOCUMENT) {
        preamble[..pos + BEGIN_DOCUMENT.len()].to_string()
    } else {
        let mut head = preamble.trim_end().to_string();
        if !head.is_empty() {
            head.push('\n');
        }
        head.push_str(BEGIN_DOCUMENT);
        head
    };
    head.replace(END_DOCUMENT, "")
}

/// True when the head already typesets a title page of its own.
pub fn head_has_title_page(head: &str) -> bool {
    TITLEPAGE.is_match(head)
}

/// Marker, head, body, and the closing `\end{document}`.
pub fn assemble(head: &str, body: &str) -> String {
    let mut out = format_marker();
    out.push('\n');
    out.push_str(head.trim_end());
    out.push_str("\n\n");
    if !body.trim().is_empty() {
        out.push_str(body.trim_end());
        out.push_str("\n\n");
    }
    out.push_str(END_DOCUMENT);
    out.push('\n');
    out
}
