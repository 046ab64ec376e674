//! Recursive-descent reader from TeX tokens to IR blocks.
//!
//! The reader never fails. Constructs it does not model are kept verbatim as
//! [`Inline::RawLatex`] and recorded as losses.

use phf::{phf_map, phf_set};
use sfudoc_ir::{
    is_blank, normalize_inlines, Block, Document, Figure, Image, Inline, ListKind, Loss,
    TitlePage,
};

use super::lexer::tokenize;
use super::token::{detokenize, TexToken};

/// Sectioning commands and the heading level they map to.
static HEADING_LEVELS: phf::Map<&'static str, u8> = phf_map! {
    "chapter" => 1,
    "section" => 1,
    "subsection" => 2,
    "subsubsection" => 3,
    "paragraph" => 3,
    "subparagraph" => 3,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Strong,
    Emph,
    Underline,
}

static INLINE_STYLES: phf::Map<&'static str, Style> = phf_map! {
    "textbf" => Style::Strong,
    "textit" => Style::Emph,
    "emph" => Style::Emph,
    "textsl" => Style::Emph,
    "underline" => Style::Underline,
    "uline" => Style::Underline,
};

/// Escapes and text symbols with a plain-text meaning.
static SYMBOLS: phf::Map<&'static str, &'static str> = phf_map! {
    "%" => "%",
    "&" => "&",
    "#" => "#",
    "_" => "_",
    "{" => "{",
    "}" => "}",
    "$" => "$",
    " " => " ",
    "," => " ",
    "textbackslash" => "\\",
    "textasciitilde" => "~",
    "textasciicircum" => "^",
    "textless" => "<",
    "textgreater" => ">",
    "textbar" => "|",
    "ldots" => "…",
    "dots" => "…",
    "textendash" => "–",
    "textemdash" => "—",
    "textnumero" => "№",
    "guillemotleft" => "«",
    "guillemotright" => "»",
};

/// Commands that only affect layout the editor does not model.
static IGNORED: phf::Set<&'static str> = phf_set! {
    "centering",
    "noindent",
    "indent",
    "restoregeometry",
    "relax",
    "protect",
};

static SPACING: phf::Set<&'static str> = phf_set! {
    "hspace",
    "hfill",
    "hrulefill",
    "quad",
    "qquad",
};

/// Cursor over a token stream plus the state carried between blocks.
pub struct Parser {
    pub(super) tokens: Vec<TexToken>,
    pub(super) pos: usize,
    pub(super) losses: Vec<Loss>,
    /// Environments currently open, innermost last.
    pub(super) env_stack: Vec<String>,
    /// Margins from the last `\newgeometry`, claimed by a following title page.
    pub(super) pending_geometry: Option<String>,
    pub(super) title_page: Option<TitlePage>,
    /// Nesting depth of `table` floats, whose captions are moved after the table.
    pub(super) table_floats: usize,
    pub(super) float_captions: Vec<Vec<Inline>>,
}

impl Parser {
    pub fn new(tokens: Vec<TexToken>) -> Self {
        Self {
            tokens,
            pos: 0,
            losses: Vec::new(),
            env_stack: Vec::new(),
            pending_geometry: None,
            title_page: None,
            table_floats: 0,
            float_captions: Vec::new(),
        }
    }

    /// Read every block and hand over the collected losses and title page.
    pub fn parse_document(mut self) -> Document {
        let blocks = self.parse_blocks(false);
        let mut doc = Document::with_losses(blocks, self.losses);
        if let Some(title_page) = self.title_page {
            doc = doc.with_title_page(title_page);
        }
        doc
    }

    // ---------------------------------------------------------------------
    // Token access
    // ---------------------------------------------------------------------

    /// Token at the cursor.
    pub(super) fn peek(&self) -> Option<&TexToken> {
        self.tokens.get(self.pos)
    }

    /// Take the token at the cursor and advance.
    pub(super) fn next(&mut self) -> Option<TexToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Record a loss of the given kind.
    pub(super) fn loss(&mut self, kind: &str, message: impl Into<String>) {
        self.losses.push(Loss::new(kind, message));
    }

    /// Skip space and comment tokens.
    pub(super) fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(t) if t.is_space()) {
            self.pos += 1;
        }
    }

    /// Skip spaces and paragraph breaks.
    pub(super) fn skip_spaces_and_pars(&mut self) {
        while matches!(self.peek(), Some(t) if t.is_space() || *t == TexToken::ParBreak) {
            self.pos += 1;
        }
    }

    /// Skip the `*` of a starred form such as `\section*`.
    pub(super) fn skip_star(&mut self) {
        if matches!(self.peek(), Some(t) if t.is_char('*')) {
            self.pos += 1;
        }
    }

    /// Index of the `}` matching the `{` at `open`.
    pub(super) fn matching_group_end(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, token) in self.tokens.iter().enumerate().skip(open) {
            match token {
                TexToken::BeginGroup => depth += 1,
                TexToken::EndGroup => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Skip a `[...]` argument if one follows. Returns its text.
    pub(super) fn skip_optional_arg(&mut self) -> Option<String> {
        if !matches!(self.peek(), Some(t) if t.is_char('[')) {
            return None;
        }
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut idx = start;
        while let Some(token) = self.tokens.get(idx) {
            match token {
                TexToken::BeginGroup => depth += 1,
                TexToken::EndGroup => depth = depth.saturating_sub(1),
                TexToken::Char(']') if depth == 0 => {
                    let text = detokenize(&self.tokens[start..idx]);
                    self.pos = idx + 1;
                    return Some(text);
                }
                _ => {}
            }
            idx += 1;
        }
        // No closing bracket: the `[` is ordinary text.
        None
    }

    /// Skip a `{...}` group at the cursor. Returns false if there is none.
    pub(super) fn skip_group(&mut self) -> bool {
        if !matches!(self.peek(), Some(TexToken::BeginGroup)) {
            return false;
        }
        match self.matching_group_end(self.pos) {
            Some(end) => self.pos = end + 1,
            None => {
                self.loss("unclosed-group", "group is never closed");
                self.pos = self.tokens.len();
            }
        }
        true
    }

    /// Source text of the next argument: a `{...}` group or a single token.
    pub(super) fn read_argument_text(&mut self) -> String {
        self.skip_spaces();
        match self.peek() {
            Some(TexToken::BeginGroup) => {
                let open = self.pos;
                let end = self.matching_group_end(open).unwrap_or(self.tokens.len());
                let text = detokenize(&self.tokens[open + 1..end.min(self.tokens.len())]);
                self.pos = (end + 1).min(self.tokens.len());
                text.trim().to_string()
            }
            Some(_) => self.next().map(|t| t.to_string()).unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Name of the environment opened or closed by the `\begin`/`\end` at `idx`.
    pub(super) fn env_name_at(&self, idx: usize) -> Option<String> {
        let mut open = idx + 1;
        while matches!(self.tokens.get(open), Some(t) if t.is_space()) {
            open += 1;
        }
        if !matches!(self.tokens.get(open), Some(TexToken::BeginGroup)) {
            return None;
        }
        let end = self.matching_group_end(open)?;
        Some(detokenize(&self.tokens[open + 1..end]).trim().to_string())
    }

    /// True when the cursor is on an `\end` for an environment that is still open.
    pub(super) fn at_open_env_end(&self) -> bool {
        match self.peek() {
            Some(t) if t.is_cs("end") => self
                .env_name_at(self.pos)
                .map(|name| self.env_stack.iter().any(|open| *open == name))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Close `env`, which the caller pushed on the environment stack.
    pub(super) fn expect_end(&mut self, env: &str) {
        if let Some(idx) = self.env_stack.iter().rposition(|open| open == env) {
            self.env_stack.truncate(idx);
        }
        let closes = matches!(self.peek(), Some(t) if t.is_cs("end"))
            && self.env_name_at(self.pos).as_deref() == Some(env);
        if closes {
            self.pos += 1;
            self.read_argument_text();
        } else {
            self.loss(
                "unclosed-environment",
                format!("environment '{}' is never closed", env),
            );
        }
    }

    /// Tokens up to the matching `\end{env}`, which is consumed.
    pub(super) fn take_env_body(&mut self, env: &str) -> Vec<TexToken> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut idx = start;
        while idx < self.tokens.len() {
            let token = &self.tokens[idx];
            if token.is_cs("begin") && self.env_name_at(idx).as_deref() == Some(env) {
                depth += 1;
            } else if token.is_cs("end") && self.env_name_at(idx).as_deref() == Some(env) {
                if depth == 0 {
                    let body = self.tokens[start..idx].to_vec();
                    self.pos = idx + 1;
                    self.read_argument_text();
                    return body;
                }
                depth -= 1;
            }
            idx += 1;
        }
        self.loss(
            "unclosed-environment",
            format!("environment '{}' is never closed", env),
        );
        self.pos = self.tokens.len();
        self.tokens[start..].to_vec()
    }

    // ---------------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------------

    /// Read blocks until the end of input, the `\end` of an open environment, or,
    /// with `stop_at_item`, the next `\item`.
    pub(super) fn parse_blocks(&mut self, stop_at_item: bool) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut inline: Vec<Inline> = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                TexToken::ParBreak => {
                    self.pos += 1;
                    flush_paragraph(&mut blocks, &mut inline);
                }
                TexToken::ControlSeq(name) => {
                    let name = name.clone();
                    if name == "item" && stop_at_item {
                        break;
                    }
                    if name == "end" && self.at_open_env_end() {
                        break;
                    }
                    if !self.block_command(&name, &mut blocks, &mut inline) {
                        let atoms = self.parse_inline_atom();
                        inline.extend(atoms);
                    }
                }
                _ => {
                    let atoms = self.parse_inline_atom();
                    inline.extend(atoms);
                }
            }
        }
        flush_paragraph(&mut blocks, &mut inline);
        blocks
    }

    /// Handle a block-level command at the cursor. Returns false if `name` is not one.
    fn block_command(
        &mut self,
        name: &str,
        blocks: &mut Vec<Block>,
        inline: &mut Vec<Inline>,
    ) -> bool {
        if let Some(&level) = HEADING_LEVELS.get(name) {
            self.pos += 1;
            self.skip_star();
            self.skip_optional_arg();
            let content = normalize_inlines(self.parse_argument_inlines());
            flush_paragraph(blocks, inline);
            blocks.push(Block::Heading { level, content });
            return true;
        }
        match name {
            "par" => {
                self.pos += 1;
                flush_paragraph(blocks, inline);
            }
            "newpage" | "clearpage" | "cleardoublepage" | "pagebreak" => {
                self.pos += 1;
                self.skip_optional_arg();
                flush_paragraph(blocks, inline);
                blocks.push(Block::PageBreak);
            }
            "vfill" => {
                self.pos += 1;
                flush_paragraph(blocks, inline);
                blocks.push(Block::VSpace);
            }
            "vspace" => {
                self.pos += 1;
                self.skip_star();
                self.skip_group();
                flush_paragraph(blocks, inline);
                blocks.push(Block::VSpace);
            }
            "newgeometry" => {
                self.pos += 1;
                let geometry = self.read_argument_text();
                self.pending_geometry = Some(geometry);
            }
            "begin" => self.parse_environment(blocks, inline),
            "end" => {
                self.pos += 1;
                let env = self.read_argument_text();
                self.loss(
                    "unmatched-end",
                    format!("\\end{{{}}} without a matching \\begin", env),
                );
            }
            "item" => {
                self.pos += 1;
                self.skip_optional_arg();
                flush_paragraph(blocks, inline);
                self.loss("unknown-command", "\\item outside a list");
            }
            "includegraphics" => {
                self.pos += 1;
                let src = self.read_includegraphics();
                flush_paragraph(blocks, inline);
                blocks.push(Block::Figure(Figure {
                    image: Image::new(src),
                    caption: String::new(),
                }));
            }
            "caption" => {
                self.pos += 1;
                self.skip_optional_arg();
                let content = normalize_inlines(self.parse_argument_inlines());
                flush_paragraph(blocks, inline);
                if self.table_floats > 0 {
                    self.float_captions.push(content);
                } else if !is_blank(&content) {
                    blocks.push(Block::Paragraph(content));
                }
            }
            _ => return false,
        }
        true
    }

    /// Dispatch on the environment opened by the `\begin` at the cursor.
    ///
    /// Unknown environments are kept whole as raw LaTeX.
    fn parse_environment(&mut self, blocks: &mut Vec<Block>, inline: &mut Vec<Inline>) {
        let start = self.pos;
        self.pos += 1;
        let env = self.read_argument_text();
        match env.as_str() {
            "itemize" | "enumerate" => {
                flush_paragraph(blocks, inline);
                let kind = if env == "enumerate" {
                    ListKind::Ordered
                } else {
                    ListKind::Unordered
                };
                let list = self.parse_list(kind, &env);
                blocks.push(list);
            }
            "table" | "table*" => {
                flush_paragraph(blocks, inline);
                self.parse_table_float(&env, blocks);
            }
            "tabular" | "tabular*" | "tabularx" | "longtable" => {
                flush_paragraph(blocks, inline);
                if let Some(table) = self.parse_tabular(&env) {
                    blocks.push(Block::Table(table));
                }
            }
            "figure" | "figure*" => self.parse_figure(&env, start, blocks, inline),
            "titlepage" => {
                flush_paragraph(blocks, inline);
                self.parse_title_page(&env, blocks);
            }
            "center" | "document" => {
                flush_paragraph(blocks, inline);
                self.env_stack.push(env.clone());
                let inner = self.parse_blocks(false);
                self.expect_end(&env);
                blocks.extend(inner);
            }
            _ => {
                self.take_env_body(&env);
                inline.push(self.raw_since(start));
                self.loss(
                    "unknown-environment",
                    format!("environment '{}' kept as LaTeX", env),
                );
            }
        }
    }

    /// Items of an `itemize` or `enumerate`; the cursor is after the environment name.
    fn parse_list(&mut self, kind: ListKind, env: &str) -> Block {
        self.env_stack.push(env.to_string());
        let mut items = Vec::new();
        loop {
            self.skip_spaces_and_pars();
            match self.peek() {
                None => break,
                Some(t) if t.is_cs("end") && self.at_open_env_end() => break,
                Some(t) if t.is_cs("item") => {
                    self.pos += 1;
                    let label = self.skip_optional_arg();
                    let mut item = self.parse_blocks(true);
                    if let Some(label) = label {
                        self.prepend_item_label(&label, &mut item);
                    }
                    items.push(item);
                }
                Some(_) => {
                    let stray = self.parse_blocks(true);
                    if !stray.is_empty() {
                        self.loss("unknown-command", "list content before the first \\item");
                        items.push(stray);
                    }
                }
            }
        }
        self.expect_end(env);
        Block::List { kind, items }
    }

    /// Keep the label of `\item[label]` as text at the start of the item.
    fn prepend_item_label(&mut self, label: &str, item: &mut Vec<Block>) {
        self.loss(
            "item-label",
            format!("item label '{}' kept as text", label.trim()),
        );
        let mut inner = Parser::new(tokenize(label));
        let mut content = inner.parse_inline_run();
        self.losses.append(&mut inner.losses);
        content.push(Inline::text(" "));
        match item.first_mut() {
            Some(Block::Paragraph(first)) => {
                content.append(first);
                *first = normalize_inlines(content);
            }
            _ => {
                let content = normalize_inlines(content);
                if !is_blank(&content) {
                    item.insert(0, Block::Paragraph(content));
                }
            }
        }
    }

    /// A `figure` becomes a figure block when it holds an `\includegraphics`.
    fn parse_figure(
        &mut self,
        env: &str,
        start: usize,
        blocks: &mut Vec<Block>,
        inline: &mut Vec<Inline>,
    ) {
        self.skip_optional_arg();
        let body = self.take_env_body(env);
        let mut inner = Parser::new(body);
        let mut src = None;
        let mut caption = String::new();
        while let Some(token) = inner.next() {
            match token.as_control_seq() {
                Some("includegraphics") if src.is_none() => src = Some(inner.read_includegraphics()),
                Some("caption") => {
                    inner.skip_optional_arg();
                    let content = normalize_inlines(inner.parse_argument_inlines());
                    caption = sfudoc_ir::plain_text(&content);
                }
                _ => {}
            }
        }
        self.losses.append(&mut inner.losses);
        match src {
            Some(src) => {
                flush_paragraph(blocks, inline);
                blocks.push(Block::Figure(Figure {
                    image: Image::new(src),
                    caption,
                }));
            }
            None => {
                inline.push(self.raw_since(start));
                self.loss(
                    "figure-without-image",
                    "figure has no \\includegraphics; kept as LaTeX",
                );
            }
        }
    }

    /// Arguments of `\includegraphics` (cursor after the command). Returns the filename.
    pub(super) fn read_includegraphics(&mut self) -> String {
        self.skip_star();
        self.skip_optional_arg();
        self.read_argument_text()
    }

    /// Tokens from `start` to the cursor as raw LaTeX.
    pub(super) fn raw_since(&self, start: usize) -> Inline {
        Inline::RawLatex(self.source_since(start))
    }

    /// Source text of the tokens from `start` to the cursor.
    fn source_since(&self, start: usize) -> String {
        detokenize(&self.tokens[start..self.pos])
    }

    // ---------------------------------------------------------------------
    // Inlines
    // ---------------------------------------------------------------------

    /// Inline content of the next argument: a `{...}` group or a single token.
    pub(super) fn parse_argument_inlines(&mut self) -> Vec<Inline> {
        self.skip_spaces();
        if !matches!(self.peek(), Some(TexToken::BeginGroup)) {
            return self.parse_inline_atom();
        }
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => {
                    self.loss("unclosed-group", "argument is never closed");
                    break;
                }
                Some(TexToken::EndGroup) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => out.extend(self.parse_inline_atom()),
            }
        }
        out
    }

    /// Inline content of every remaining token.
    pub(super) fn parse_inline_run(&mut self) -> Vec<Inline> {
        let mut out = Vec::new();
        while self.peek().is_some() {
            out.extend(self.parse_inline_atom());
        }
        out
    }

    /// Consume one inline construct.
    pub(super) fn parse_inline_atom(&mut self) -> Vec<Inline> {
        let start = self.pos;
        let Some(token) = self.next() else {
            return Vec::new();
        };
        match token {
            TexToken::Char(c) => {
                let mut text = String::from(c);
                while let Some(TexToken::Char(next)) = self.peek() {
                    text.push(*next);
                    self.pos += 1;
                }
                vec![Inline::Text(text)]
            }
            TexToken::Space | TexToken::ParBreak => vec![Inline::text(" ")],
            TexToken::Comment(_) => Vec::new(),
            TexToken::ActiveChar(_) => vec![Inline::text("\u{a0}")],
            TexToken::MathShift => self.parse_math(start),
            TexToken::AlignTab | TexToken::Superscript | TexToken::Subscript => {
                vec![Inline::RawLatex(token.to_string())]
            }
            TexToken::BeginGroup => self.parse_bare_group(start),
            TexToken::EndGroup => {
                self.loss("unmatched-end", "closing brace without an opening one");
                Vec::new()
            }
            TexToken::ControlSeq(name) => self.parse_inline_command(&name, start),
        }
    }

    /// Inline meaning of the control sequence `name`, already consumed at `start`.
    fn parse_inline_command(&mut self, name: &str, start: usize) -> Vec<Inline> {
        if let Some(text) = SYMBOLS.get(name) {
            if name.chars().all(|c| c.is_ascii_alphabetic()) {
                self.skip_empty_group();
            }
            return vec![Inline::text(*text)];
        }
        if let Some(style) = INLINE_STYLES.get(name).copied() {
            if style == Style::Underline && self.argument_is_spacing() {
                self.skip_group();
                return vec![Inline::SignatureLine];
            }
            let content = self.parse_argument_inlines();
            return vec![match style {
                Style::Strong => Inline::Strong(content),
                Style::Emph => Inline::Emph(content),
                Style::Underline => Inline::Underline(content),
            }];
        }
        if IGNORED.contains(name) {
            return Vec::new();
        }
        match name {
            "\\" => {
                self.skip_star();
                self.skip_optional_arg();
                vec![Inline::LineBreak]
            }
            "newline" => vec![Inline::LineBreak],
            "linebreak" => {
                self.skip_optional_arg();
                vec![Inline::LineBreak]
            }
            "mbox" | "text" | "textrm" | "textnormal" | "textup" => self.parse_argument_inlines(),
            "rule" => {
                self.skip_optional_arg();
                self.skip_group();
                self.skip_group();
                vec![Inline::SignatureLine]
            }
            "(" => self.parse_delimited_math(start, ")"),
            "[" => self.parse_delimited_math(start, "]"),
            "begin" => {
                let env = self.read_argument_text();
                self.take_env_body(&env);
                self.loss(
                    "unknown-environment",
                    format!("environment '{}' kept as LaTeX", env),
                );
                vec![self.raw_since(start)]
            }
            "end" => {
                let env = self.read_argument_text();
                self.loss(
                    "unmatched-end",
                    format!("\\end{{{}}} without a matching \\begin", env),
                );
                Vec::new()
            }
            _ => self.parse_unknown_command(name, start),
        }
    }

    /// Keep an unknown command and its arguments verbatim.
    fn parse_unknown_command(&mut self, name: &str, start: usize) -> Vec<Inline> {
        self.skip_star();
        let mut took_args = false;
        loop {
            if self.skip_optional_arg().is_some() || self.skip_group() {
                took_args = true;
            } else {
                break;
            }
        }
        let mut raw = self.source_since(start);
        let is_word = name.chars().all(|c| c.is_ascii_alphabetic());
        let runs_on = matches!(self.peek(), Some(TexToken::Char(c)) if c.is_ascii_alphabetic());
        if is_word && !took_args && runs_on {
            raw.push_str("{}");
        }
        self.loss("unknown-command", format!("\\{} kept as LaTeX", name));
        vec![Inline::RawLatex(raw)]
    }

    /// `$...$` or `$$...$$`, kept as raw LaTeX.
    fn parse_math(&mut self, start: usize) -> Vec<Inline> {
        let display = matches!(self.peek(), Some(TexToken::MathShift));
        if display {
            self.pos += 1;
        }
        loop {
            match self.next() {
                None => break,
                Some(TexToken::MathShift) => {
                    if display && matches!(self.peek(), Some(TexToken::MathShift)) {
                        self.pos += 1;
                    }
                    break;
                }
                Some(_) => {}
            }
        }
        self.loss("math", "math kept as LaTeX");
        vec![self.raw_since(start)]
    }

    /// `\(...\)` or `\[...\]`, kept as raw LaTeX.
    fn parse_delimited_math(&mut self, start: usize, close: &str) -> Vec<Inline> {
        while let Some(token) = self.next() {
            if token.is_cs(close) {
                break;
            }
        }
        self.loss("math", "math kept as LaTeX");
        vec![self.raw_since(start)]
    }

    /// A `{...}` group in running text. `{}` vanishes; anything else is kept raw.
    fn parse_bare_group(&mut self, start: usize) -> Vec<Inline> {
        if matches!(self.peek(), Some(TexToken::EndGroup)) {
            self.pos += 1;
            return Vec::new();
        }
        match self.matching_group_end(start) {
            Some(end) => self.pos = end + 1,
            None => {
                self.loss("unclosed-group", "group is never closed");
                self.pos = self.tokens.len();
            }
        }
        self.loss("unknown-command", "brace group kept as LaTeX");
        vec![self.raw_since(start)]
    }

    /// Skip a `{}` right at the cursor.
    fn skip_empty_group(&mut self) {
        if matches!(self.peek(), Some(TexToken::BeginGroup))
            && matches!(self.tokens.get(self.pos + 1), Some(TexToken::EndGroup))
        {
            self.pos += 2;
        }
    }

    /// True when the `{...}` at the cursor holds only horizontal spacing, as in
    /// `\underline{\hspace{4cm}}`.
    fn argument_is_spacing(&self) -> bool {
        if !matches!(self.peek(), Some(TexToken::BeginGroup)) {
            return false;
        }
        let Some(end) = self.matching_group_end(self.pos) else {
            return false;
        };
        let mut idx = self.pos + 1;
        let mut spacing = false;
        while idx < end {
            match &self.tokens[idx] {
                t if t.is_space() => idx += 1,
                TexToken::ControlSeq(name) if SPACING.contains(name.as_str()) => {
                    spacing = true;
                    idx += 1;
                    if matches!(self.tokens.get(idx), Some(t) if t.is_char('*')) {
                        idx += 1;
                    }
                    if name == "hspace" {
                        match self.matching_group_end(idx) {
                            Some(arg_end)
                                if matches!(self.tokens.get(idx), Some(TexToken::BeginGroup)) =>
                            {
                                idx = arg_end + 1
                            }
                            _ => return false,
                        }
                    }
                }
                _ => return false,
            }
        }
        spacing
    }
}

/// Close the pending inline run as a paragraph unless it is blank.
pub(super) fn flush_paragraph(blocks: &mut Vec<Block>, inline: &mut Vec<Inline>) {
    if inline.is_empty() {
        return;
    }
    let inlines = normalize_inlines(std::mem::take(inline));
    if !is_blank(&inlines) {
        blocks.push(Block::Paragraph(inlines));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Document {
        Parser::new(tokenize(input)).parse_document()
    }

    #[test]
    fn heading_and_paragraph() {
        let doc = parse("\\section*{Intro}\n\nHello \\textbf{world}");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading {
                    level: 1,
                    content: vec![Inline::text("Intro")],
                },
                Block::Paragraph(vec![
                    Inline::text("Hello "),
                    Inline::Strong(vec![Inline::text("world")]),
                ]),
            ]
        );
    }

    #[test]
    fn escapes_and_tilde() {
        let doc = parse("50\\% \\& 1~кг \\textbackslash{} a\\_b \\textasciitilde{}");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![Inline::text(
                "50% & 1\u{a0}кг \\ a_b ~"
            )])]
        );
    }

    #[test]
    fn line_breaks() {
        let doc = parse("a\\\\\nb\\\\[2mm] c");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::text("a"),
                Inline::LineBreak,
                Inline::text("b"),
                Inline::LineBreak,
                Inline::text("c"),
            ])]
        );
    }

    #[test]
    fn unknown_command_is_raw_with_loss() {
        let doc = parse("see \\cite[p.~5]{knuth} here");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::text("see "),
                Inline::RawLatex("\\cite[p.~5]{knuth}".to_string()),
                Inline::text(" here"),
            ])]
        );
        assert_eq!(doc.losses[0].kind, "unknown-command");
    }

    #[test]
    fn argumentless_word_command_keeps_separation() {
        let doc = parse("\\LaTeX is");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::RawLatex("\\LaTeX{}".to_string()),
                Inline::text("is"),
            ])]
        );
    }

    #[test]
    fn math_is_raw() {
        let doc = parse("area $a^2$ done");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::text("area "),
                Inline::RawLatex("$a^2$".to_string()),
                Inline::text(" done"),
            ])]
        );
        assert!(doc.losses.iter().any(|l| l.kind == "math"));
    }

    #[test]
    fn unknown_environment_is_raw() {
        let doc = parse("\\begin{equation}\nx\n\\end{equation}");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![Inline::RawLatex(
                "\\begin{equation} x \\end{equation}".to_string()
            )])]
        );
        assert_eq!(doc.losses[0].kind, "unknown-environment");
    }

    #[test]
    fn nested_lists() {
        let doc = parse(
            "\\begin{itemize}\n  \\item outer\n  \\begin{enumerate}\n    \\item[a)] inner\n  \\end{enumerate}\n  \\item second\n\\end{itemize}",
        );
        assert_eq!(
            doc.blocks,
            vec![Block::List {
                kind: ListKind::Unordered,
                items: vec![
                    vec![
                        Block::Paragraph(vec![Inline::text("outer")]),
                        Block::List {
                            kind: ListKind::Ordered,
                            items: vec![vec![Block::Paragraph(vec![Inline::text("inner")])]],
                        },
                    ],
                    vec![Block::Paragraph(vec![Inline::text("second")])],
                ],
            }]
        );
    }

    #[test]
    fn page_breaks_and_fills() {
        let doc = parse("a\n\\newpage\nb\\vfill\\clearpage");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Paragraph(vec![Inline::text("a")]),
                Block::PageBreak,
                Block::Paragraph(vec![Inline::text("b")]),
                Block::VSpace,
                Block::PageBreak,
            ]
        );
    }

    #[test]
    fn figure_with_caption() {
        let doc = parse(
            "\\begin{figure}[h]\n\\centering\n\\includegraphics[width=\\textwidth]{image_1.png}\n\\caption{Схема \\textbf{сети}}\n\\end{figure}",
        );
        assert_eq!(
            doc.blocks,
            vec![Block::Figure(Figure {
                image: Image::new("image_1.png"),
                caption: "Схема сети".to_string(),
            })]
        );
    }

    #[test]
    fn figure_without_image_is_raw() {
        let doc = parse("\\begin{figure}\\caption{x}\\end{figure}");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![Inline::RawLatex(
                "\\begin{figure}\\caption{x}\\end{figure}".to_string()
            )])]
        );
        assert!(doc.losses.iter().any(|l| l.kind == "figure-without-image"));
    }

    #[test]
    fn unmatched_end_and_runaway_group_do_not_panic() {
        let doc = parse("a \\end{itemize} b {c");
        assert!(doc.losses.iter().any(|l| l.kind == "unmatched-end"));
        assert!(doc.losses.iter().any(|l| l.kind == "unclosed-group"));
        let doc = parse("\\begin{itemize}\\item x");
        assert!(doc.losses.iter().any(|l| l.kind == "unclosed-environment"));
    }

    #[test]
    fn signature_line_forms() {
        let doc = parse("\\underline{\\hspace{4cm}} \\rule{3cm}{0.4pt} \\underline{x}");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::SignatureLine,
                Inline::text(" "),
                Inline::SignatureLine,
                Inline::text(" "),
                Inline::Underline(vec![Inline::text("x")]),
            ])]
        );
    }

    #[test]
    fn item_label_is_kept_as_text() {
        let doc = parse("\\begin{enumerate}\n\\item[a)] первый\n\\item второй\n\\end{enumerate}");
        assert_eq!(
            doc.blocks,
            vec![Block::List {
                kind: ListKind::Ordered,
                items: vec![
                    vec![Block::Paragraph(vec![Inline::text("a) первый")])],
                    vec![Block::Paragraph(vec![Inline::text("второй")])],
                ],
            }]
        );
        assert_eq!(doc.losses.len(), 1);
        assert_eq!(doc.losses[0].kind, "item-label");
    }

    #[test]
    fn guarded_bracket_after_item_is_text() {
        let doc = parse("\\begin{itemize}\n  \\item {}[1] Кнут Д.\n\\end{itemize}");
        assert_eq!(
            doc.blocks,
            vec![Block::List {
                kind: ListKind::Unordered,
                items: vec![vec![Block::Paragraph(vec![Inline::text("[1] Кнут Д.")])]],
            }]
        );
        assert!(doc.losses.is_empty());
    }

    #[test]
    fn newline_takes_no_optional_argument() {
        let doc = parse("Источник\\newline [3] ГОСТ");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                Inline::text("Источник"),
                Inline::LineBreak,
                Inline::text("[3] ГОСТ"),
            ])]
        );
    }

    #[test]
    fn backslash_at_line_end_is_a_space() {
        let doc = parse("a\\\nb");
        assert_eq!(doc.blocks, vec![Block::Paragraph(vec![Inline::text("a b")])]);
        assert!(doc.losses.is_empty());
    }
}
