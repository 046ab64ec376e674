//! `titlepage` environment.

use sfudoc_ir::{is_blank, normalize_inlines, Block, Inline, Table, TableCell, TableRow};
use sfudoc_ir::{TitleBlock, TitlePage};
use sfudoc_latex_backend::DEFAULT_TITLE_GEOMETRY;

use super::parser::Parser;
use super::token::TexToken;

impl Parser {
    /// A `titlepage` environment; the cursor is after its name.
    pub(super) fn parse_title_page(&mut self, env: &str, blocks: &mut Vec<Block>) {
        self.env_stack.push(env.to_string());
        let geometry = self
            .pending_geometry
            .take()
            .filter(|g| g.replace(' ', "") != DEFAULT_TITLE_GEOMETRY);
        let title_blocks = self.parse_title_blocks();
        self.expect_end(env);
        let page = TitlePage {
            geometry,
            blocks: title_blocks,
        };
        if self.title_page.is_none() {
            self.title_page = Some(page);
        } else {
            self.loss(
                "duplicate-title-page",
                "only the first title page is kept; later ones become body content",
            );
            blocks.extend(flatten_title_page(page));
        }
    }

    /// Title page content up to its `\end`.
    fn parse_title_blocks(&mut self) -> Vec<TitleBlock> {
        let mut out = Vec::new();
        let mut loose: Vec<Inline> = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                TexToken::ParBreak => {
                    self.pos += 1;
                    flush_loose(&mut out, &mut loose);
                }
                TexToken::ControlSeq(name) => match name.as_str() {
                    "end" if self.at_open_env_end() => break,
                    "par" | "newpage" | "clearpage" => {
                        self.pos += 1;
                        flush_loose(&mut out, &mut loose);
                    }
                    "vfill" | "vspace" => {
                        self.skip_vertical_space();
                        flush_loose(&mut out, &mut loose);
                        out.push(TitleBlock::VSpace);
                    }
                    "begin" => {
                        let env = self.env_name_at(self.pos).unwrap_or_default();
                        match env.as_str() {
                            "center" => {
                                flush_loose(&mut out, &mut loose);
                                self.pos += 1;
                                self.read_argument_text();
                                self.parse_center(&mut out);
                            }
                            "tabular" | "tabularx" | "tabular*" => {
                                flush_loose(&mut out, &mut loose);
                                self.pos += 1;
                                self.read_argument_text();
                                let (_, rows) = self.parse_tabular_rows(&env);
                                if !rows.is_empty() {
                                    out.push(TitleBlock::Signatures(rows));
                                }
                            }
                            _ => {
                                let atoms = self.parse_inline_atom();
                                loose.extend(atoms);
                            }
                        }
                    }
                    _ => {
                        let atoms = self.parse_inline_atom();
                        loose.extend(atoms);
                    }
                },
                _ => {
                    let atoms = self.parse_inline_atom();
                    loose.extend(atoms);
                }
            }
        }
        flush_loose(&mut out, &mut loose);
        out
    }

    /// `center` body; the cursor is after `\begin{center}`.
    ///
    /// Every `\\` ends a line. A paragraph break or the end of the environment ends
    /// the current line only if it has content, `\mbox{}` included.
    fn parse_center(&mut self, out: &mut Vec<TitleBlock>) {
        self.env_stack.push("center".to_string());
        let mut lines: Vec<Vec<Inline>> = Vec::new();
        let mut line: Vec<Inline> = Vec::new();
        let mut touched = false;
        while let Some(token) = self.peek() {
            match token {
                TexToken::ParBreak => {
                    self.pos += 1;
                    end_line(&mut lines, &mut line, &mut touched, false);
                }
                TexToken::Space | TexToken::Comment(_) => {
                    self.pos += 1;
                    line.push(Inline::text(" "));
                }
                TexToken::ControlSeq(name) => match name.as_str() {
                    "end" if self.at_open_env_end() => break,
                    "\\" => {
                        self.parse_inline_atom();
                        end_line(&mut lines, &mut line, &mut touched, true);
                    }
                    "par" => {
                        self.pos += 1;
                        end_line(&mut lines, &mut line, &mut touched, false);
                    }
                    "vfill" | "vspace" => {
                        self.skip_vertical_space();
                        end_line(&mut lines, &mut line, &mut touched, false);
                        push_center(out, std::mem::take(&mut lines));
                        out.push(TitleBlock::VSpace);
                    }
                    _ => {
                        let atoms = self.parse_inline_atom();
                        line.extend(atoms);
                        touched = true;
                    }
                },
                _ => {
                    let atoms = self.parse_inline_atom();
                    line.extend(atoms);
                    touched = true;
                }
            }
        }
        end_line(&mut lines, &mut line, &mut touched, false);
        push_center(out, lines);
        self.expect_end("center");
    }

    fn skip_vertical_space(&mut self) {
        let is_vspace = matches!(self.next(), Some(t) if t.is_cs("vspace"));
        if is_vspace {
            self.skip_star();
            self.skip_group();
        }
    }
}

/// Finish the current centered line. Untouched lines are dropped unless `force`.
fn end_line(lines: &mut Vec<Vec<Inline>>, line: &mut Vec<Inline>, touched: &mut bool, force: bool) {
    if force || *touched {
        lines.push(normalize_inlines(std::mem::take(line)));
    } else {
        line.clear();
    }
    *touched = false;
}

/// Adjacent centered groups merge into one.
fn push_center(out: &mut Vec<TitleBlock>, lines: Vec<Vec<Inline>>) {
    if lines.is_empty() {
        return;
    }
    if let Some(TitleBlock::Center(existing)) = out.last_mut() {
        existing.extend(lines);
        return;
    }
    out.push(TitleBlock::Center(lines));
}

/// Text outside any `center` becomes a title paragraph.
fn flush_loose(out: &mut Vec<TitleBlock>, loose: &mut Vec<Inline>) {
    if loose.is_empty() {
        return;
    }
    let inlines = normalize_inlines(std::mem::take(loose));
    if !is_blank(&inlines) {
        out.push(TitleBlock::Paragraph(inlines));
    }
}

/// Body blocks standing in for a title page that cannot be kept as one.
pub fn flatten_title_page(page: TitlePage) -> Vec<Block> {
    let mut blocks = Vec::new();
    for block in page.blocks {
        match block {
            TitleBlock::Center(lines) => blocks.extend(
                lines
                    .into_iter()
                    .filter(|line| !is_blank(line))
                    .map(Block::Paragraph),
            ),
            TitleBlock::Signatures(rows) => {
                let rows = rows
                    .into_iter()
                    .map(|cells| TableRow {
                        cells: cells.into_iter().map(TableCell::new).collect(),
                    })
                    .collect();
                blocks.push(Block::Table(Table::from_rows(rows)));
            }
            TitleBlock::VSpace => blocks.push(Block::VSpace),
            TitleBlock::Paragraph(inlines) => blocks.push(Block::Paragraph(inlines)),
        }
    }
    blocks
}
