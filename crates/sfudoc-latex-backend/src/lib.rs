//! IR to LaTeX backend.

use sfudoc_ir::{Block, Document, Figure, Inline, ListKind, Table, TitleBlock, TitlePage};

/// Margins used by `\newgeometry` when a title page does not carry its own.
pub const DEFAULT_TITLE_GEOMETRY: &str = "left=30mm,right=15mm,top=20mm,bottom=20mm";

/// LaTeX emitted for a blank signature line.
pub const SIGNATURE_LINE: &str = "\\underline{\\hspace{4cm}}";

/// Preamble used for standalone documents when no template is supplied.
pub const DEFAULT_PREAMBLE: &str = "\\documentclass[14pt,a4paper]{extarticle}\n\
\\usepackage{fontspec}\n\
\\setmainfont{Times New Roman}\n\
\\usepackage{polyglossia}\n\
\\setdefaultlanguage{russian}\n\
\\usepackage[left=30mm,right=15mm,top=20mm,bottom=20mm]{geometry}\n\
\\usepackage{graphicx}\n\
\\usepackage{indentfirst}\n";

#[derive(Debug, Clone)]
pub struct LatexRenderOptions {
    /// Wrap the body in [`DEFAULT_PREAMBLE`] and a `document` environment.
    pub full_document: bool,
    /// Emit the document's title page, if any.
    pub include_title_page: bool,
    /// Vertical rules between table columns (`|l|l|` rather than `ll`).
    pub table_grid: bool,
    /// Float placement for `figure` and `table`.
    pub placement: String,
    /// Width passed to `\includegraphics`.
    pub image_width: String,
}

impl Default for LatexRenderOptions {
    fn default() -> Self {
        Self {
            full_document: false,
            include_title_page: true,
            table_grid: true,
            placement: "h".to_string(),
            image_width: "\\textwidth".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakStyle {
    /// `\\` ends a line in running text.
    Line,
    /// Inside a tabular `\\` would end the row.
    Cell,
}

pub fn render_document(doc: &Document, options: LatexRenderOptions) -> String {
    let mut out = String::new();
    if options.full_document {
        out.push_str(DEFAULT_PREAMBLE);
        out.push_str("\\begin{document}\n\n");
    }

    let mut chunks: Vec<String> = Vec::new();
    if options.include_title_page {
        if let Some(title_page) = &doc.title_page {
            chunks.push(render_title_page(title_page));
        }
    }
    for block in &doc.blocks {
        chunks.push(render_block(block, &options));
    }

    let mut first = true;
    for chunk in chunks {
        if chunk.trim().is_empty() {
            continue;
        }
        if !first {
            out.push_str("\n\n");
        }
        out.push_str(&chunk);
        first = false;
    }

    if options.full_document {
        out.push_str("\n\n\\end{document}\n");
    }
    out
}

pub fn render_block(block: &Block, options: &LatexRenderOptions) -> String {
    match block {
        Block::Paragraph(inlines) => render_inlines(inlines),
        Block::Heading { level, content } => {
            let cmd = match *level {
                1 => "\\section",
                2 => "\\subsection",
                _ => "\\subsubsection",
            };
            format!("{}{{{}}}", cmd, render_inlines(content))
        }
        Block::List { kind, items } => render_list(*kind, items, options),
        Block::Table(table) => render_table_block(table, options),
        Block::Figure(figure) => render_figure(figure, options),
        Block::PageBreak => "\\newpage".to_string(),
        Block::VSpace => "\\vfill".to_string(),
    }
}

fn render_list(kind: ListKind, items: &[Vec<Block>], options: &LatexRenderOptions) -> String {
    let env = match kind {
        ListKind::Unordered => "itemize",
        ListKind::Ordered => "enumerate",
    };
    let mut out = String::new();
    out.push_str(&format!("\\begin{{{}}}\n", env));
    for item in items {
        let body = render_item(item, options);
        out.push_str("  \\item ");
        if needs_guard(&body) {
            out.push_str("{}");
        }
        out.push_str(&indent_continuation(&body, "  "));
        out.push('\n');
    }
    out.push_str(&format!("\\end{{{}}}", env));
    out
}

fn render_item(blocks: &[Block], options: &LatexRenderOptions) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            let both_paragraphs = matches!(block, Block::Paragraph(_))
                && matches!(blocks[i - 1], Block::Paragraph(_));
            out.push_str(if both_paragraphs { "\n\n" } else { "\n" });
        }
        out.push_str(&render_block(block, options));
    }
    out
}

fn indent_continuation(text: &str, prefix: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(prefix);
            }
        }
        out.push_str(line);
    }
    out
}

pub fn render_inlines(inlines: &[Inline]) -> String {
    render_inlines_with(inlines, BreakStyle::Line)
}

fn render_inlines_with(inlines: &[Inline], style: BreakStyle) -> String {
    let mut out = String::new();
    let mut after_break = false;
    for inline in inlines {
        let at_break_end = after_break;
        after_break = matches!(inline, Inline::LineBreak);
        match inline {
            Inline::Text(text) => {
                let runs_on = text.starts_with(|c: char| c.is_ascii_alphabetic());
                let glued = runs_on && ends_with_control_word(&out);
                if glued || (at_break_end && needs_guard(text)) {
                    out.push_str("{}");
                }
                out.push_str(&escape_latex(text));
            }
            Inline::Strong(content) => {
                out.push_str("\\textbf{");
                out.push_str(&render_inlines_with(content, style));
                out.push('}');
            }
            Inline::Emph(content) => {
                out.push_str("\\textit{");
                out.push_str(&render_inlines_with(content, style));
                out.push('}');
            }
            Inline::Underline(content) => {
                out.push_str("\\underline{");
                out.push_str(&render_inlines_with(content, style));
                out.push('}');
            }
            Inline::LineBreak => match style {
                BreakStyle::Line => out.push_str("\\\\\n"),
                BreakStyle::Cell => out.push_str("\\newline "),
            },
            Inline::SignatureLine => out.push_str(SIGNATURE_LINE),
            Inline::RawLatex(raw) => out.push_str(raw),
        }
    }
    out
}

/// True when `rendered` would be read as the `*` or `[...]` argument of a `\\`,
/// `\newline` or `\item` written right before it.
fn needs_guard(rendered: &str) -> bool {
    rendered
        .trim_start()
        .starts_with(|c: char| c == '[' || c == '*')
}

/// True when `out` ends in a control word such as `\\LaTeX` that a following letter
/// would run into.
fn ends_with_control_word(out: &str) -> bool {
    let name_len = out
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();
    if name_len == 0 {
        return false;
    }
    let backslashes = out[..out.len() - name_len]
        .chars()
        .rev()
        .take_while(|&c| c == '\\')
        .count();
    backslashes % 2 == 1
}

pub fn escape_latex(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '$' => out.push_str("\\$"),
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '\u{a0}' => out.push('~'),
            _ => out.push(ch),
        }
    }
    out
}

pub fn build_column_spec(columns: usize, grid_lines: bool) -> String {
    let mut spec = String::new();
    if grid_lines {
        spec.push('|');
    }
    for _ in 0..columns {
        spec.push('l');
        if grid_lines {
            spec.push('|');
        }
    }
    spec
}

fn render_table_block(table: &Table, options: &LatexRenderOptions) -> String {
    if table.rows.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str(&format!("\\begin{{table}}[{}]\n", options.placement));
    out.push_str("\\centering\n");
    out.push_str(&render_tabular(table, options.table_grid));
    out.push_str("\n\\end{table}");
    out
}

pub fn render_tabular(table: &Table, grid_lines: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\\begin{{tabular}}{{{}}}\n",
        build_column_spec(table.columns, grid_lines)
    ));
    if grid_lines {
        out.push_str("\\hline\n");
    }
    for row in &table.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| render_inlines_with(&cell.content, BreakStyle::Cell))
            .collect();
        out.push_str(&cells.join(" & "));
        if grid_lines {
            out.push_str(" \\\\ \\hline\n");
        } else {
            out.push_str(" \\\\\n");
        }
    }
    out.push_str("\\end{tabular}");
    out
}

fn render_figure(figure: &Figure, options: &LatexRenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("\\begin{{figure}}[{}]\n", options.placement));
    out.push_str("\\centering\n");
    // Filenames come from the registry and are not escaped.
    out.push_str(&format!(
        "\\includegraphics[width={}]{{{}}}",
        options.image_width, figure.image.src
    ));
    let caption = figure.caption.trim();
    if !caption.is_empty() {
        out.push_str("\n\\caption{");
        out.push_str(&escape_latex(caption));
        out.push('}');
    }
    out.push_str("\n\\end{figure}");
    out
}

pub fn render_title_page(title_page: &TitlePage) -> String {
    let geometry = title_page
        .geometry
        .as_deref()
        .filter(|g| !g.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE_GEOMETRY);
    let mut out = String::new();
    out.push_str(&format!("\\newgeometry{{{}}}\n", geometry));
    out.push_str("\\begin{titlepage}\n");
    let parts: Vec<String> = title_page
        .blocks
        .iter()
        .map(render_title_block)
        .filter(|part| !part.is_empty())
        .collect();
    out.push_str(&parts.join("\n\n"));
    if !parts.is_empty() {
        out.push('\n');
    }
    out.push_str("\\end{titlepage}\n");
    out.push_str("\\restoregeometry");
    out
}

fn render_title_block(block: &TitleBlock) -> String {
    match block {
        TitleBlock::Center(lines) => {
            let rendered: Vec<String> = lines
                .iter()
                .map(|line| {
                    if line.is_empty() {
                        "\\mbox{}".to_string()
                    } else {
                        render_inlines(line)
                    }
                })
                .collect();
            let guarded: Vec<String> = rendered
                .into_iter()
                .enumerate()
                .map(|(i, line)| {
                    if i > 0 && needs_guard(&line) {
                        format!("{{}}{}", line)
                    } else {
                        line
                    }
                })
                .collect();
            format!(
                "\\begin{{center}}\n{}\n\\end{{center}}",
                guarded.join("\\\\\n")
            )
        }
        TitleBlock::Signatures(rows) => {
            if rows.is_empty() {
                return String::new();
            }
            let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
            let mut out = String::new();
            out.push_str(&format!(
                "\\begin{{tabular}}{{{}}}\n",
                build_column_spec(columns, false)
            ));
            for row in rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| render_inlines_with(cell, BreakStyle::Cell))
                    .collect();
                out.push_str(&cells.join(" & "));
                out.push_str(" \\\\\n");
            }
            out.push_str("\\end{tabular}");
            out
        }
        TitleBlock::VSpace => "\\vfill".to_string(),
        TitleBlock::Paragraph(inlines) => render_inlines(inlines),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sfudoc_ir::{Image, TableCell, TableRow};

    #[test]
    fn raw_control_word_is_separated_from_text() {
        let inlines = vec![Inline::RawLatex("\\LaTeX".to_string()), Inline::text("is")];
        assert_eq!(render_inlines(&inlines), "\\LaTeX{}is");
        let inlines = vec![Inline::RawLatex("\\\\".to_string()), Inline::text("x")];
        assert_eq!(render_inlines(&inlines), "\\\\x");
    }

    #[test]
    fn bracket_after_line_break_is_guarded() {
        let inlines = vec![
            Inline::text("Источники:"),
            Inline::LineBreak,
            Inline::text("[2] Вирт Н."),
        ];
        assert_eq!(render_inlines(&inlines), "Источники:\\\\\n{}[2] Вирт Н.");
        let inlines = vec![Inline::text("a"), Inline::LineBreak, Inline::text("* b")];
        assert_eq!(render_inlines(&inlines), "a\\\\\n{}* b");
        let inlines = vec![Inline::text("a"), Inline::LineBreak, Inline::text("b [c]")];
        assert_eq!(render_inlines(&inlines), "a\\\\\nb [c]");
    }

    #[test]
    fn bracket_in_cell_and_item_is_guarded() {
        let table = Table::from_rows(vec![TableRow {
            cells: vec![TableCell::new(vec![
                Inline::text("Источник"),
                Inline::LineBreak,
                Inline::text("[3] ГОСТ"),
            ])],
        }]);
        assert!(render_tabular(&table, true).contains("Источник\\newline {}[3] ГОСТ \\\\"));

        let list = Block::List {
            kind: ListKind::Ordered,
            items: vec![vec![Block::Paragraph(vec![Inline::text("[1] Кнут Д.")])]],
        };
        assert_eq!(
            render_block(&list, &LatexRenderOptions::default()),
            "\\begin{enumerate}\n  \\item {}[1] Кнут Д.\n\\end{enumerate}"
        );
    }

    #[test]
    fn escape_special_characters() {
        assert_eq!(escape_latex("50% & #1_a"), "50\\% \\& \\#1\\_a");
        assert_eq!(escape_latex("a\u{a0}b"), "a~b");
    }

    #[test]
    fn column_spec_with_and_without_rules() {
        assert_eq!(build_column_spec(3, true), "|l|l|l|");
        assert_eq!(build_column_spec(2, false), "ll");
    }

    #[test]
    fn line_break_inside_cell_uses_newline() {
        let table = Table::from_rows(vec![TableRow {
            cells: vec![TableCell::new(vec![
                Inline::text("a"),
                Inline::LineBreak,
                Inline::text("b"),
            ])],
        }]);
        let out = render_tabular(&table, true);
        assert!(out.contains("a\\newline b \\\\ \\hline"));
    }

    #[test]
    fn figure_without_caption_omits_caption() {
        let figure = Figure {
            image: Image::new("image_1.png"),
            caption: String::new(),
        };
        let out = render_figure(&figure, &LatexRenderOptions::default());
        assert!(out.contains("\\includegraphics[width=\\textwidth]{image_1.png}"));
        assert!(!out.contains("\\caption"));
    }

    #[test]
    fn nested_list_is_indented() {
        let inner = Block::List {
            kind: ListKind::Ordered,
            items: vec![vec![Block::Paragraph(vec![Inline::text("inner")])]],
        };
        let outer = Block::List {
            kind: ListKind::Unordered,
            items: vec![vec![Block::Paragraph(vec![Inline::text("outer")]), inner]],
        };
        let out = render_block(&outer, &LatexRenderOptions::default());
        assert_eq!(
            out,
            "\\begin{itemize}\n  \\item outer\n  \\begin{enumerate}\n    \\item inner\n  \\end{enumerate}\n\\end{itemize}"
        );
    }
}
