//! Conversion frontends that live in the main crate.
//!
//! The HTML frontend and both backends are workspace crates; the LaTeX reader is
//! here because it is the only stage that needs the lexer.

pub mod latex2html;
