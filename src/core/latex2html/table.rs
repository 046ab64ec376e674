//! `table` floats and `tabular` bodies.

use sfudoc_ir::{is_blank, normalize_inlines, Block, Inline, Table, TableCell, TableRow};

use super::parser::Parser;
use super::token::TexToken;

/// Rule commands that carry no cell content.
const RULES: [&str; 4] = ["hline", "toprule", "midrule", "bottomrule"];

/// Column count of a tabular spec such as `|l|p{3cm}|*{2}{c}|`.
pub fn count_columns(spec: &str) -> usize {
    let chars: Vec<char> = spec.chars().collect();
    let mut count: usize = 0;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            'l' | 'c' | 'r' | 'X' | 'L' | 'C' | 'R' => count = count.saturating_add(1),
            'p' | 'm' | 'b' => {
                count = count.saturating_add(1);
                i = skip_braced(&chars, i + 1);
                continue;
            }
            '@' | '!' | '>' | '<' => {
                i = skip_braced(&chars, i + 1);
                continue;
            }
            '*' => {
                let (repeat, after) = braced(&chars, i + 1);
                let (inner, after) = braced(&chars, after);
                let repeat: usize = repeat.trim().parse().unwrap_or(1);
                count = count.saturating_add(repeat.saturating_mul(count_columns(&inner)));
                i = after;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    count
}

/// Contents of the `{...}` starting at `start` and the index after it.
fn braced(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    if chars.get(i) != Some(&'{') {
        return (String::new(), i);
    }
    let mut depth = 0usize;
    let mut inner = String::new();
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '{' => {
                depth += 1;
                if depth == 1 {
                    continue;
                }
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        inner.push(c);
    }
    (inner, i)
}

/// Index after the `{...}` starting at `start`.
fn skip_braced(chars: &[char], start: usize) -> usize {
    braced(chars, start).1
}

impl Parser {
    /// A `table` float: its tabulars, then its captions as paragraphs.
    pub(super) fn parse_table_float(&mut self, env: &str, blocks: &mut Vec<Block>) {
        self.skip_optional_arg();
        self.env_stack.push(env.to_string());
        self.table_floats += 1;
        let captions_before = self.float_captions.len();
        let inner = self.parse_blocks(false);
        self.table_floats -= 1;
        self.expect_end(env);
        let captions: Vec<Vec<Inline>> = self.float_captions.drain(captions_before..).collect();
        blocks.extend(inner);
        for caption in captions {
            if !is_blank(&caption) {
                self.loss("table-caption", "table caption kept as a paragraph");
                blocks.push(Block::Paragraph(caption));
            }
        }
    }

    /// A tabular environment; the cursor is after its name.
    pub(super) fn parse_tabular(&mut self, env: &str) -> Option<Table> {
        let (columns, rows) = self.parse_tabular_rows(env);
        if rows.is_empty() {
            self.loss("empty-table", "tabular without rows dropped");
            return None;
        }
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = if columns == 0 {
            widest
        } else if columns > widest {
            self.loss(
                "column-spec",
                format!("column spec declares {} columns, rows have at most {}", columns, widest),
            );
            widest
        } else {
            columns
        };
        let table = Table {
            columns,
            rows: rows
                .into_iter()
                .map(|cells| TableRow {
                    cells: cells.into_iter().map(TableCell::new).collect(),
                })
                .collect(),
        };
        let ragged = table.ragged_rows();
        if ragged > 0 {
            self.loss(
                "ragged-row",
                format!("{} row(s) do not have {} cells", ragged, columns),
            );
        }
        Some(table)
    }

    /// Column count from the column spec and the inline content of every cell.
    pub(super) fn parse_tabular_rows(&mut self, env: &str) -> (usize, Vec<Vec<Vec<Inline>>>) {
        self.skip_optional_arg();
        if env == "tabularx" || env == "tabular*" {
            self.read_argument_text();
        }
        let spec = self.read_argument_text();
        let columns = count_columns(&spec);
        let body = self.take_env_body(env);

        let mut rows = Vec::new();
        for row in split_rows(body) {
            let cells = split_cells(row);
            let blank = cells.len() == 1 && cells[0].iter().all(TexToken::is_space);
            if blank {
                continue;
            }
            let mut parsed = Vec::with_capacity(cells.len());
            for cell in cells {
                let mut inner = Parser::new(cell);
                let content = normalize_inlines(inner.parse_inline_run());
                self.losses.append(&mut inner.losses);
                parsed.push(content);
            }
            rows.push(parsed);
        }
        (columns, rows)
    }
}

/// Split a tabular body at top-level `\\`, dropping rule commands.
fn split_rows(body: Vec<TexToken>) -> Vec<Vec<TexToken>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut depth = 0usize;
    let mut envs = 0usize;
    let mut tokens = body.into_iter().peekable();
    while let Some(token) = tokens.next() {
        match &token {
            TexToken::BeginGroup => depth += 1,
            TexToken::EndGroup => depth = depth.saturating_sub(1),
            TexToken::ControlSeq(name) if name == "begin" => envs += 1,
            TexToken::ControlSeq(name) if name == "end" => envs = envs.saturating_sub(1),
            TexToken::ControlSeq(name) if depth == 0 && envs == 0 => {
                if name == "\\" || name == "tabularnewline" {
                    rows.push(std::mem::take(&mut row));
                    skip_row_options(&mut tokens);
                    continue;
                }
                if RULES.contains(&name.as_str()) {
                    continue;
                }
                if name == "cline" || name == "cmidrule" {
                    skip_rule_argument(&mut tokens);
                    continue;
                }
            }
            _ => {}
        }
        row.push(token);
    }
    rows.push(row);
    rows
}

/// `\\*` and `\\[2mm]` after a row end.
fn skip_row_options(tokens: &mut std::iter::Peekable<std::vec::IntoIter<TexToken>>) {
    if matches!(tokens.peek(), Some(t) if t.is_char('*')) {
        tokens.next();
    }
    if matches!(tokens.peek(), Some(t) if t.is_char('[')) {
        for token in tokens.by_ref() {
            if token.is_char(']') {
                break;
            }
        }
    }
}

/// Optional `[...]` and the `{...}` range of `\cline` or `\cmidrule`.
fn skip_rule_argument(tokens: &mut std::iter::Peekable<std::vec::IntoIter<TexToken>>) {
    if matches!(tokens.peek(), Some(t) if t.is_char('[')) {
        for token in tokens.by_ref() {
            if token.is_char(']') {
                break;
            }
        }
    }
    if matches!(tokens.peek(), Some(TexToken::BeginGroup)) {
        let mut depth = 0usize;
        for token in tokens.by_ref() {
            match token {
                TexToken::BeginGroup => depth += 1,
                TexToken::EndGroup => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Split a row at top-level `&`.
fn split_cells(row: Vec<TexToken>) -> Vec<Vec<TexToken>> {
    let mut cells = Vec::new();
    let mut cell = Vec::new();
    let mut depth = 0usize;
    let mut envs = 0usize;
    for token in row {
        match &token {
            TexToken::BeginGroup => depth += 1,
            TexToken::EndGroup => depth = depth.saturating_sub(1),
            TexToken::ControlSeq(name) if name == "begin" => envs += 1,
            TexToken::ControlSeq(name) if name == "end" => envs = envs.saturating_sub(1),
            TexToken::AlignTab if depth == 0 && envs == 0 => {
                cells.push(std::mem::take(&mut cell));
                continue;
            }
            _ => {}
        }
        cell.push(token);
    }
    cells.push(cell);
    cells
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn column_counts() {
        assert_eq!(count_columns("|l|l|"), 2);
        assert_eq!(count_columns("lcr"), 3);
        assert_eq!(count_columns("|p{3cm}|X|"), 2);
        assert_eq!(count_columns("*{3}{|c}|"), 3);
        assert_eq!(count_columns("@{}l>{\\bfseries}r@{}"), 2);
        assert_eq!(count_columns(""), 0);
    }

    #[test]
    fn huge_repeat_count_saturates() {
        assert_eq!(count_columns("*{18446744073709551615}{ll}"), usize::MAX);
        assert_eq!(count_columns("*{99999999999999999999999}{l}"), 1);

        let mut parser = Parser::new(tokenize(
            "{*{18446744073709551615}{ll}}a & b \\\\ \\end{tabular}",
        ));
        let table = parser.parse_tabular("tabular").unwrap();
        assert_eq!(table.columns, 2);
        assert_eq!(table.rows.len(), 1);
        assert!(parser.losses.iter().any(|l| l.kind == "column-spec"));
    }

    #[test]
    fn rows_split_and_rules_dropped() {
        let mut parser = Parser::new(tokenize(
            "{|l|l|}\n\\hline\nA & B \\\\ \\hline\n{x \\\\ y} & \\textbf{z} \\\\[2pt]\n\\end{tabular}",
        ));
        let table = parser.parse_tabular("tabular").unwrap();
        assert_eq!(table.columns, 2);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[1].cells[1].content,
            vec![Inline::Strong(vec![Inline::text("z")])]
        );
        assert!(parser.losses.iter().all(|l| l.kind != "ragged-row"));
    }

    #[test]
    fn cell_newline_is_a_line_break() {
        let mut parser = Parser::new(tokenize("{ll}\na\\newline b & c \\\\\n\\end{tabular}"));
        let table = parser.parse_tabular("tabular").unwrap();
        assert_eq!(
            table.rows[0].cells[0].content,
            vec![Inline::text("a"), Inline::LineBreak, Inline::text("b")]
        );
    }

    #[test]
    fn short_rows_are_reported() {
        let mut parser = Parser::new(tokenize("{lll}\na & b & c \\\\\nd & e \\\\\n\\end{tabular}"));
        let table = parser.parse_tabular("tabular").unwrap();
        assert_eq!(table.columns, 3);
        assert!(parser.losses.iter().any(|l| l.kind == "ragged-row"));
    }

    #[test]
    fn empty_tabular_is_dropped() {
        let mut parser = Parser::new(tokenize("{ll}\n\\hline\n\\end{tabular}"));
        assert_eq!(parser.parse_tabular("tabular"), None);
        assert_eq!(parser.losses[0].kind, "empty-table");
    }
}
