//! Lexers for template text and for the HTML it embeds.
//!
//! Both lexers are instantiations of the [`fsm`](crate::fsm) machine. They're
//! exposed as lazy, pull-based iterators: each call to `next()` runs the
//! machine only until it hands off one token, so a lexing error surfaces to
//! whoever asks for the token that would have followed the bad input.
//!
//! A token stream ends in exactly one of two ways: with a single EOF token,
//! or with an error and no EOF token.

pub mod action;
pub mod html;

pub use action::{actions, ActionLexer, Kind};
pub use html::{html, HtmlLexer, Kind as HtmlKind};

use std::fmt;
use std::hash::Hash;

use derive_more::Debug;

use crate::error::{Error, Result};
use crate::fsm::{Data, Machine};

/// A single token: its kind, the source text it covers, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[debug("{kind:?}({value:?})@{offset}")]
pub struct Token<'a, K> {
    pub kind: K,
    pub value: &'a str,
    pub offset: usize,
}

/// The unconsumed remainder of a source string.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Cursor { source, pos: 0 }
    }

    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Splits off the next `n` bytes, returning them and the cursor past them.
    pub fn advance(self, n: usize) -> (&'a str, Cursor<'a>) {
        let taken = &self.rest()[..n];
        (taken, Cursor { source: self.source, pos: self.pos + n })
    }

    /// Builds a token of `kind` from the next `n` bytes.
    pub fn token<K>(self, kind: K, n: usize) -> (Token<'a, K>, Cursor<'a>) {
        let offset = self.pos;
        let (value, rest) = self.advance(n);
        (Token { kind, value, offset }, rest)
    }

    /// Data carrying a lex error located at the cursor's position.
    pub fn fail(self, message: &str) -> Data<Cursor<'a>> {
        let (line, column) = crate::util::line_column(self.source, self.pos);
        let near: String = self.rest().chars().take(12).collect();
        let error = error! {
            Lex: message,
            "line" => line,
            "column" => column,
            "near" => format!("{near:?}"),
        };

        Data::failed(self, error)
    }
}

/// Drives a lexing machine one token at a time.
pub struct Lexer<'a, S, K> {
    machine: Machine<S, Cursor<'a>, Token<'a, K>>,
    eof: S,
    finished: bool,
}

impl<'a, S, K> Lexer<'a, S, K>
    where S: Copy + Eq + Hash + fmt::Debug, K: Copy + PartialEq + fmt::Debug
{
    fn new(machine: Machine<S, Cursor<'a>, Token<'a, K>>, eof: S) -> Self {
        Lexer { machine, eof, finished: false }
    }

    /// Collects the remaining tokens, stopping at the first error.
    pub fn tokens(self) -> Result<Vec<Token<'a, K>>> {
        self.collect()
    }
}

impl<'a, S, K> Iterator for Lexer<'a, S, K>
    where S: Copy + Eq + Hash + fmt::Debug, K: Copy + PartialEq + fmt::Debug
{
    type Item = Result<Token<'a, K>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if let Err(e) = self.machine.process() {
                self.finished = true;
                return Some(Err(e));
            }

            if let Some(token) = self.machine.take() {
                self.finished = self.machine.state() == self.eof;
                tracing::trace!(?token, "lexed");
                return Some(Ok(token));
            }
        }

        None
    }
}

impl<S, K> std::iter::FusedIterator for Lexer<'_, S, K>
    where S: Copy + Eq + Hash + fmt::Debug, K: Copy + PartialEq + fmt::Debug { }

/// Length of the longest prefix of `s` made of name characters.
pub(crate) fn name_len(s: &str) -> usize {
    s.bytes()
        .position(|b| !(b.is_ascii_alphanumeric() || b == b'_'))
        .unwrap_or(s.len())
}
