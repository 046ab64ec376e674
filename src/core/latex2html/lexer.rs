//! TeX lexer.
//!
//! Follows TeX's own tokenization closely enough for document bodies: control words
//! swallow the spaces after them, a single line end is a space, and a blank line is
//! a paragraph break.

use super::token::TexToken;

/// Streaming tokenizer over a LaTeX source.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    /// Set after a control word, whose trailing spaces are skipped.
    after_cs: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            after_cs: false,
        }
    }

    /// Look at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consume the next character.
    fn next_char(&mut self) -> Option<char> {
        self.chars.next()
    }

    /// Skip spaces and tabs, but not line ends.
    fn skip_blanks(&mut self) {
        while matches!(self.peek_char(), Some(' ') | Some('\t')) {
            self.next_char();
        }
    }

    /// Consume one line end (`\n`, `\r\n` or `\r`). Returns false if there was none.
    fn consume_line_end(&mut self) -> bool {
        match self.peek_char() {
            Some('\r') => {
                self.next_char();
                if self.peek_char() == Some('\n') {
                    self.next_char();
                }
                true
            }
            Some('\n') => {
                self.next_char();
                true
            }
            _ => false,
        }
    }

    /// True if the next character starts a line end.
    fn at_line_end(&mut self) -> bool {
        matches!(self.peek_char(), Some('\n') | Some('\r'))
    }

    /// Skip all whitespace, line ends included.
    fn skip_blank_lines(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Skip the blanks after a control word, including one line end. Returns true if
    /// a blank line followed, which still ends the paragraph.
    fn skip_after_control_word(&mut self) -> bool {
        self.skip_blanks();
        if self.consume_line_end() {
            self.skip_blanks();
            if self.at_line_end() {
                self.skip_blank_lines();
                return true;
            }
        }
        false
    }

    /// Control word (letters) or control symbol (one non-letter).
    fn read_control_seq(&mut self) -> String {
        let mut name = String::new();
        if let Some(c) = self.peek_char() {
            if c.is_ascii_alphabetic() {
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_alphabetic() {
                        name.push(c);
                        self.next_char();
                    } else {
                        break;
                    }
                }
                self.after_cs = true;
            } else if c == '\n' || c == '\r' || c == '\t' {
                // `\` before a line end or tab is a control space.
                self.consume_line_end();
                if c == '\t' {
                    self.next_char();
                }
                name.push(' ');
            } else {
                name.push(c);
                self.next_char();
            }
        }
        name
    }

    /// Text after `%` up to the line end. The line end is consumed.
    fn read_comment(&mut self) -> String {
        let mut comment = String::new();
        while let Some(c) = self.peek_char() {
            if c == '\n' || c == '\r' {
                break;
            }
            comment.push(c);
            self.next_char();
        }
        self.consume_line_end();
        comment
    }

    /// Produce the next token, or `None` at the end of input.
    fn next_token(&mut self) -> Option<TexToken> {
        if self.after_cs {
            self.after_cs = false;
            if self.skip_after_control_word() {
                return Some(TexToken::ParBreak);
            }
        }

        let c = self.next_char()?;
        let token = match c {
            '\\' => {
                let name = self.read_control_seq();
                if name.is_empty() {
                    // Lone backslash at end of input
                    TexToken::Char('\\')
                } else {
                    TexToken::ControlSeq(name)
                }
            }
            '{' => TexToken::BeginGroup,
            '}' => TexToken::EndGroup,
            '%' => TexToken::Comment(self.read_comment()),
            '$' => TexToken::MathShift,
            '&' => TexToken::AlignTab,
            '^' => TexToken::Superscript,
            '_' => TexToken::Subscript,
            '~' => TexToken::ActiveChar('~'),
            ' ' | '\t' => {
                self.skip_blanks();
                if self.at_line_end() {
                    return self.next_token();
                }
                TexToken::Space
            }
            '\n' | '\r' => {
                if c == '\r' && self.peek_char() == Some('\n') {
                    self.next_char();
                }
                self.skip_blanks();
                if self.at_line_end() {
                    self.skip_blank_lines();
                    TexToken::ParBreak
                } else {
                    TexToken::Space
                }
            }
            _ => TexToken::Char(c),
        };
        Some(token)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = TexToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a whole source.
pub fn tokenize(input: &str) -> Vec<TexToken> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cs(name: &str) -> TexToken {
        TexToken::ControlSeq(name.to_string())
    }

    #[test]
    fn control_word_swallows_spaces() {
        assert_eq!(
            tokenize("\\item  a"),
            vec![cs("item"), TexToken::Char('a')]
        );
    }

    #[test]
    fn control_symbol_keeps_following_space() {
        assert_eq!(
            tokenize("\\% a"),
            vec![cs("%"), TexToken::Space, TexToken::Char('a')]
        );
    }

    #[test]
    fn line_end_is_space_and_blank_line_is_par() {
        assert_eq!(
            tokenize("a\nb\n\n\nc"),
            vec![
                TexToken::Char('a'),
                TexToken::Space,
                TexToken::Char('b'),
                TexToken::ParBreak,
                TexToken::Char('c'),
            ]
        );
    }

    #[test]
    fn crlf_line_end_is_one_space() {
        assert_eq!(
            tokenize("a\r\nb"),
            vec![TexToken::Char('a'), TexToken::Space, TexToken::Char('b')]
        );
    }

    #[test]
    fn blank_line_after_control_word_still_breaks() {
        assert_eq!(
            tokenize("\\newpage\n\nText"),
            vec![
                cs("newpage"),
                TexToken::ParBreak,
                TexToken::Char('T'),
                TexToken::Char('e'),
                TexToken::Char('x'),
                TexToken::Char('t'),
            ]
        );
    }

    #[test]
    fn trailing_spaces_before_line_end_collapse() {
        assert_eq!(
            tokenize("a  \n\nb"),
            vec![TexToken::Char('a'), TexToken::ParBreak, TexToken::Char('b')]
        );
    }

    #[test]
    fn comment_runs_to_line_end() {
        assert_eq!(
            tokenize("a%note\nb"),
            vec![
                TexToken::Char('a'),
                TexToken::Comment("note".to_string()),
                TexToken::Char('b'),
            ]
        );
    }

    #[test]
    fn backslash_before_line_end_is_control_space() {
        assert_eq!(
            tokenize("a\\\nb\\\r\nc"),
            vec![
                TexToken::Char('a'),
                cs(" "),
                TexToken::Char('b'),
                cs(" "),
                TexToken::Char('c'),
            ]
        );
    }

    #[test]
    fn special_characters() {
        assert_eq!(
            tokenize("$&^_~"),
            vec![
                TexToken::MathShift,
                TexToken::AlignTab,
                TexToken::Superscript,
                TexToken::Subscript,
                TexToken::ActiveChar('~'),
            ]
        );
    }
}
