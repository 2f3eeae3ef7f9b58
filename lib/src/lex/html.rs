use crate::fsm::{Data, Event, Machine};
use crate::lex::{Cursor, Lexer, Token};

/// The kinds of tokens in the HTML subset the escaper understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Text,
    /// `<name ...>`, or `<name ...` when the buffer ends inside the tag.
    StartTag,
    /// `</name>`, or everything from `</` when the buffer ends first.
    EndTag,
    /// `<!-- ... -->`, or everything from `<!--` when the buffer ends first.
    Comment,
    Eof,
}

/// The HTML lexer's states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum State {
    Text,
    StartTag,
    EndTag,
    Comment,
    Eof,
}

type HtmlEvent<'e, 'a> = Event<'e, Cursor<'a>, Token<'a, Kind>>;
type Step<'a> = (State, Data<Cursor<'a>>);

pub type HtmlLexer<'a> = Lexer<'a, State, Kind>;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Returns a lexer over the HTML fragment `source`.
pub fn html(source: &str) -> HtmlLexer<'_> {
    let machine = Machine::new(State::Text, Cursor::new(source))
        .with(State::Text, text)
        .with(State::StartTag, start_tag)
        .with(State::EndTag, end_tag)
        .with(State::Comment, comment)
        .with(State::Eof, eof);

    Lexer::new(machine, State::Eof)
}

impl<'a> Token<'a, Kind> {
    /// Splits the token's text into its opening delimiter, its content, and
    /// its closing delimiter. The closing delimiter is empty when the token
    /// was cut short by the end of the buffer.
    ///
    /// ```rust
    /// use quill::lex;
    ///
    /// let tokens = lex::html("<p class=x>hi</p><br").tokens().unwrap();
    /// assert_eq!(tokens[0].delimited(), ("<", "p class=x", ">"));
    /// assert_eq!(tokens[1].delimited(), ("", "hi", ""));
    /// assert_eq!(tokens[2].delimited(), ("</", "p", ">"));
    /// assert_eq!(tokens[3].delimited(), ("<", "br", ""));
    /// ```
    pub fn delimited(&self) -> (&'a str, &'a str, &'a str) {
        let (open, close) = match self.kind {
            Kind::Text | Kind::Eof => ("", ""),
            Kind::StartTag => ("<", ">"),
            Kind::EndTag => ("</", ">"),
            Kind::Comment => (COMMENT_OPEN, COMMENT_CLOSE),
        };

        let inner = &self.value[open.len()..];
        match inner.strip_suffix(close) {
            Some(inner) if !close.is_empty() => (open, inner, close),
            _ => (open, inner, ""),
        }
    }
}

/// Finds the next `<` in `s` that starts markup rather than plain text, and
/// the state that markup begins.
fn next_markup(s: &str) -> Option<(usize, State)> {
    memchr::memchr_iter(b'<', s.as_bytes()).find_map(|i| {
        let after = &s[i + 1..];
        match after.as_bytes().first()? {
            b'/' => Some((i, State::EndTag)),
            b if b.is_ascii_alphabetic() => Some((i, State::StartTag)),
            b'!' if s[i..].starts_with(COMMENT_OPEN) => Some((i, State::Comment)),
            _ => None,
        }
    })
}

fn text<'a>(event: &mut HtmlEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let rest = cursor.rest();
    match next_markup(rest) {
        Some((0, state)) => (state, Data::new(cursor)),
        Some((i, state)) => {
            let (token, cursor) = cursor.token(Kind::Text, i);
            event.emit(token);
            (state, Data::new(cursor))
        }
        None if !rest.is_empty() => {
            let (token, cursor) = cursor.token(Kind::Text, rest.len());
            event.emit(token);
            (State::Text, Data::new(cursor))
        }
        None => {
            let (token, cursor) = cursor.token(Kind::Eof, 0);
            event.emit(token);
            (State::Eof, Data::new(cursor))
        }
    }
}

/// Length of a tag starting at the beginning of `s`: through the next `>`, or
/// all of `s` if the tag isn't closed.
fn tag_len(s: &str) -> usize {
    memchr::memchr(b'>', s.as_bytes()).map_or(s.len(), |i| i + 1)
}

fn start_tag<'a>(event: &mut HtmlEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let (token, cursor) = cursor.token(Kind::StartTag, tag_len(cursor.rest()));
    event.emit(token);
    (State::Text, Data::new(cursor))
}

fn end_tag<'a>(event: &mut HtmlEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let (token, cursor) = cursor.token(Kind::EndTag, tag_len(cursor.rest()));
    event.emit(token);
    (State::Text, Data::new(cursor))
}

fn comment<'a>(event: &mut HtmlEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let rest = cursor.rest();
    let body = &rest[COMMENT_OPEN.len()..];
    let len = memchr::memmem::find(body.as_bytes(), COMMENT_CLOSE.as_bytes())
        .map_or(rest.len(), |end| COMMENT_OPEN.len() + end + COMMENT_CLOSE.len());

    let (token, cursor) = cursor.token(Kind::Comment, len);
    event.emit(token);
    (State::Text, Data::new(cursor))
}

fn eof<'a>(event: &mut HtmlEvent<'_, 'a>) -> Step<'a> {
    (State::Eof, Data::new(event.data.raw))
}
