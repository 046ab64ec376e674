//! Semantic intermediate representation shared by the HTML and LaTeX sides.
//!
//! Both frontends produce a [`Document`], both backends consume one. Anything the
//! frontends cannot map onto a node is either carried as [`Inline::RawLatex`] or
//! recorded as a [`Loss`].

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// Front matter, kept apart from the body so it can never be interleaved with it.
    pub title_page: Option<TitlePage>,
    pub blocks: Vec<Block>,
    pub losses: Vec<Loss>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            title_page: None,
            blocks,
            losses: Vec::new(),
        }
    }

    pub fn with_losses(blocks: Vec<Block>, losses: Vec<Loss>) -> Self {
        Self {
            title_page: None,
            blocks,
            losses,
        }
    }

    pub fn with_title_page(mut self, title_page: TitlePage) -> Self {
        self.title_page = Some(title_page);
        self
    }

    pub fn push_loss(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.losses.push(Loss::new(kind, message));
    }

    /// Visit every figure in the body, including figures nested in list items.
    pub fn figures_mut(&mut self) -> Vec<&mut Figure> {
        let mut out = Vec::new();
        collect_figures(&mut self.blocks, &mut out);
        out
    }

    pub fn figures(&self) -> Vec<&Figure> {
        let mut out = Vec::new();
        collect_figures_ref(&self.blocks, &mut out);
        out
    }
}

fn collect_figures<'a>(blocks: &'a mut [Block], out: &mut Vec<&'a mut Figure>) {
    for block in blocks {
        match block {
            Block::Figure(figure) => out.push(figure),
            Block::List { items, .. } => {
                for item in items {
                    collect_figures(item, out);
                }
            }
            _ => {}
        }
    }
}

fn collect_figures_ref<'a>(blocks: &'a [Block], out: &mut Vec<&'a Figure>) {
    for block in blocks {
        match block {
            Block::Figure(figure) => out.push(figure),
            Block::List { items, .. } => {
                for item in items {
                    collect_figures_ref(item, out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    List { kind: ListKind, items: Vec<Vec<Block>> },
    Table(Table),
    Figure(Figure),
    PageBreak,
    /// Vertical fill (`\vfill`).
    VSpace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column count, taken from the first row. Later rows are not realigned.
    pub columns: usize,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn from_rows(rows: Vec<TableRow>) -> Self {
        let columns = rows.first().map(|row| row.cells.len()).unwrap_or(0);
        Self { columns, rows }
    }

    /// Rows whose cell count differs from [`Table::columns`].
    pub fn ragged_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.cells.len() != self.columns)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableCell {
    pub content: Vec<Inline>,
    pub is_header: bool,
}

impl TableCell {
    pub fn new(content: Vec<Inline>) -> Self {
        Self {
            content,
            is_header: false,
        }
    }
}

/// An image with its caption. Exactly one of each, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Figure {
    pub image: Image,
    /// Plain text; inline markup is flattened away by the frontends.
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    /// A data URI on the HTML side, a registry filename on the LaTeX side.
    pub src: String,
}

impl Image {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitlePage {
    /// Options for `\newgeometry`; `None` means the backend default.
    pub geometry: Option<String>,
    pub blocks: Vec<TitleBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleBlock {
    /// A centered group; one entry per line.
    Center(Vec<Vec<Inline>>),
    /// Signature table: rows of cells.
    Signatures(Vec<Vec<Vec<Inline>>>),
    VSpace,
    Paragraph(Vec<Inline>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emph(Vec<Inline>),
    Underline(Vec<Inline>),
    LineBreak,
    /// A blank line to sign on.
    SignatureLine,
    /// LaTeX that has no node of its own, carried through verbatim.
    RawLatex(String),
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loss {
    pub kind: String,
    pub message: String,
}

impl Loss {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Normalize whitespace in an inline run.
///
/// Adjacent text nodes are merged, ASCII whitespace runs collapse to a single space
/// (non-breaking spaces are kept), the run is trimmed at both ends and around line
/// breaks, and empty formatting nodes are dropped.
pub fn normalize_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut merged = merge_inlines(inlines);
    trim_run(&mut merged);
    merged
}

fn merge_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::new();
    for inline in inlines {
        let inline = match inline {
            Inline::Text(text) => Inline::Text(collapse_whitespace(&text)),
            Inline::Strong(children) => Inline::Strong(merge_inlines(children)),
            Inline::Emph(children) => Inline::Emph(merge_inlines(children)),
            Inline::Underline(children) => Inline::Underline(merge_inlines(children)),
            other => other,
        };
        match inline {
            Inline::Text(text) if text.is_empty() => {}
            Inline::Strong(ref c) | Inline::Emph(ref c) | Inline::Underline(ref c)
                if c.is_empty() => {}
            Inline::Text(text) => {
                if let Some(Inline::Text(prev)) = out.last_mut() {
                    if prev.ends_with(' ') && text.starts_with(' ') {
                        prev.push_str(&text[1..]);
                    } else {
                        prev.push_str(&text);
                    }
                } else {
                    out.push(Inline::Text(text));
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn trim_run(inlines: &mut Vec<Inline>) {
    let len = inlines.len();
    for idx in 0..len {
        let after_break = idx == 0 || matches!(inlines[idx - 1], Inline::LineBreak);
        let before_break = idx + 1 == len || matches!(inlines[idx + 1], Inline::LineBreak);
        if let Inline::Text(text) = &mut inlines[idx] {
            if after_break {
                *text = text.trim_start_matches(' ').to_string();
            }
            if before_break {
                *text = text.trim_end_matches(' ').to_string();
            }
        }
    }
    inlines.retain(|inline| !matches!(inline, Inline::Text(text) if text.is_empty()));
    while matches!(inlines.last(), Some(Inline::LineBreak)) {
        inlines.pop();
    }
    while matches!(inlines.first(), Some(Inline::LineBreak)) {
        inlines.remove(0);
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_space = false;
    for ch in input.chars() {
        if ch.is_ascii_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            prev_space = false;
            out.push(ch);
        }
    }
    out
}

/// Flatten an inline run to plain text.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_text(inlines, &mut out);
    collapse_whitespace(&out).trim().to_string()
}

fn push_plain_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Strong(children) | Inline::Emph(children) | Inline::Underline(children) => {
                push_plain_text(children, out)
            }
            Inline::LineBreak => out.push(' '),
            Inline::SignatureLine => {}
            Inline::RawLatex(raw) => out.push_str(raw),
        }
    }
}

/// True when the run has no visible content.
pub fn is_blank(inlines: &[Inline]) -> bool {
    inlines.iter().all(|inline| match inline {
        Inline::Text(text) => text.trim().is_empty(),
        Inline::Strong(children) | Inline::Emph(children) | Inline::Underline(children) => {
            is_blank(children)
        }
        Inline::LineBreak => true,
        Inline::SignatureLine => false,
        Inline::RawLatex(raw) => raw.trim().is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_merges_and_collapses_text() {
        let run = vec![
            Inline::text("  Hello"),
            Inline::text("   "),
            Inline::Strong(vec![Inline::text("world")]),
            Inline::text("\n"),
        ];
        assert_eq!(
            normalize_inlines(run),
            vec![
                Inline::text("Hello "),
                Inline::Strong(vec![Inline::text("world")]),
            ]
        );
    }

    #[test]
    fn normalize_trims_around_line_breaks() {
        let run = vec![
            Inline::text("one \n"),
            Inline::LineBreak,
            Inline::text("\n two"),
            Inline::LineBreak,
        ];
        assert_eq!(
            normalize_inlines(run),
            vec![Inline::text("one"), Inline::LineBreak, Inline::text("two")]
        );
    }

    #[test]
    fn normalize_keeps_non_breaking_space() {
        let run = vec![Inline::text("a\u{a0}b")];
        assert_eq!(normalize_inlines(run), vec![Inline::text("a\u{a0}b")]);
    }

    #[test]
    fn normalize_drops_empty_formatting() {
        let run = vec![Inline::text("x"), Inline::Emph(vec![Inline::text("")])];
        assert_eq!(normalize_inlines(run), vec![Inline::text("x")]);
    }

    #[test]
    fn plain_text_flattens_markup() {
        let run = vec![
            Inline::text("Рисунок "),
            Inline::Strong(vec![Inline::text("1")]),
        ];
        assert_eq!(plain_text(&run), "Рисунок 1");
    }

    #[test]
    fn table_columns_follow_first_row() {
        let row = |n: usize| TableRow {
            cells: (0..n).map(|_| TableCell::default()).collect(),
        };
        let table = Table::from_rows(vec![row(3), row(2)]);
        assert_eq!(table.columns, 3);
        assert_eq!(table.ragged_rows(), 1);
    }

    #[test]
    fn figures_are_found_inside_lists() {
        let mut doc = Document::new(vec![Block::List {
            kind: ListKind::Unordered,
            items: vec![vec![Block::Figure(Figure::default())]],
        }]);
        assert_eq!(doc.figures().len(), 1);
        doc.figures_mut()[0].image.src = "image_1.png".to_string();
        assert_eq!(doc.figures()[0].image.src, "image_1.png");
    }
}
