//! TeX tokens as seen by the LaTeX reader.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TexToken {
    /// A control sequence like `\section` or `\%`, without the backslash.
    ControlSeq(String),
    /// `{`
    BeginGroup,
    /// `}`
    EndGroup,
    /// Letters, digits, punctuation and anything else without a category of its own.
    Char(char),
    /// A run of spaces, tabs, or a single line end.
    Space,
    /// A blank line: ends the current paragraph.
    ParBreak,
    /// Everything after `%` up to the line end.
    Comment(String),
    /// `$`
    MathShift,
    /// `&`
    AlignTab,
    /// `^`
    Superscript,
    /// `_`
    Subscript,
    /// `~`
    ActiveChar(char),
}

impl TexToken {
    pub fn is_space(&self) -> bool {
        matches!(self, TexToken::Space | TexToken::Comment(_))
    }

    pub fn as_control_seq(&self) -> Option<&str> {
        match self {
            TexToken::ControlSeq(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_cs(&self, name: &str) -> bool {
        matches!(self, TexToken::ControlSeq(n) if n == name)
    }

    pub fn is_char(&self, c: char) -> bool {
        matches!(self, TexToken::Char(x) if *x == c)
    }
}

impl fmt::Display for TexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TexToken::ControlSeq(name) => write!(f, "\\{}", name),
            TexToken::BeginGroup => write!(f, "{{"),
            TexToken::EndGroup => write!(f, "}}"),
            TexToken::Char(c) => write!(f, "{}", c),
            TexToken::Space => write!(f, " "),
            TexToken::ParBreak => write!(f, "\n\n"),
            TexToken::Comment(text) => writeln!(f, "%{}", text),
            TexToken::MathShift => write!(f, "$"),
            TexToken::AlignTab => write!(f, "&"),
            TexToken::Superscript => write!(f, "^"),
            TexToken::Subscript => write!(f, "_"),
            TexToken::ActiveChar(c) => write!(f, "{}", c),
        }
    }
}

/// Turn tokens back into LaTeX source.
///
/// A space is re-inserted after a control word when the next token would otherwise
/// run into its name.
pub fn detokenize(tokens: &[TexToken]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        out.push_str(&token.to_string());
        if let TexToken::ControlSeq(name) = token {
            let is_word = name.chars().all(|c| c.is_ascii_alphabetic());
            let runs_on = match tokens.get(i + 1) {
                Some(TexToken::Char(c)) => c.is_ascii_alphabetic(),
                _ => false,
            };
            if is_word && runs_on {
                out.push(' ');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_display() {
        assert_eq!(TexToken::ControlSeq("textbf".into()).to_string(), "\\textbf");
        assert_eq!(TexToken::BeginGroup.to_string(), "{");
        assert_eq!(TexToken::Comment(" note".into()).to_string(), "% note\n");
    }

    #[test]
    fn detokenize_separates_control_words() {
        let tokens = vec![
            TexToken::ControlSeq("bf".into()),
            TexToken::Char('x'),
            TexToken::ControlSeq("%".into()),
            TexToken::Char('y'),
        ];
        assert_eq!(detokenize(&tokens), "\\bf x\\%y");
    }
}
