//! LaTeX to IR frontend
//!
//! A small TeX lexer feeds a recursive-descent reader that understands the subset
//! of LaTeX the encoder writes, plus the common hand-written variants of it.
//! Everything else is carried through verbatim as raw LaTeX.

mod lexer;
mod parser;
mod table;
mod title;
mod token;

pub use lexer::{tokenize, Lexer};
pub use parser::Parser;
pub use table::count_columns;
pub use title::flatten_title_page;
pub use token::{detokenize, TexToken};

use sfudoc_ir::Document;

const BEGIN_DOCUMENT: &str = "\\begin{document}";
const END_DOCUMENT: &str = "\\end{document}";

/// The part of a source between `\begin{document}` and the last `\end{document}`.
///
/// Sources without a `document` environment are taken whole.
pub fn document_body(input: &str) -> &str {
    let start = input
        .find(BEGIN_DOCUMENT)
        .map(|pos| pos + BEGIN_DOCUMENT.len())
        .unwrap_or(0);
    let rest = &input[start..];
    let end = rest.rfind(END_DOCUMENT).unwrap_or(rest.len());
    &rest[..end]
}

/// Read a LaTeX source into the IR. Never fails; see [`Document::losses`].
pub fn latex_to_ir(input: &str) -> Document {
    let tokens = tokenize(document_body(input));
    let token_count = tokens.len();
    let doc = Parser::new(tokens).parse_document();
    tracing::debug!(
        tokens = token_count,
        blocks = doc.blocks.len(),
        losses = doc.losses.len(),
        title_page = doc.title_page.is_some(),
        "parsed latex"
    );
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn body_is_cut_out_of_a_full_document() {
        let src = "\\documentclass{article}\n\\begin{document}\nHello\n\\end{document}\n";
        assert_eq!(document_body(src), "\nHello\n");
        assert_eq!(document_body("Hello"), "Hello");
    }

    #[test]
    fn preamble_commands_are_not_content() {
        let doc = latex_to_ir("\\documentclass{article}\n\\usepackage{graphicx}\n\\begin{document}\nA\n\\end{document}");
        assert_eq!(
            doc.blocks,
            vec![sfudoc_ir::Block::Paragraph(vec![sfudoc_ir::Inline::text("A")])]
        );
        assert!(doc.losses.is_empty());
    }
}
