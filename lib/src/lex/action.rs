use crate::fsm::{Data, Event, Machine};
use crate::lex::{name_len, Cursor, Lexer, Token};

pub const LEFT_DELIM: &str = "{{";
pub const RIGHT_DELIM: &str = "}}";

/// The kinds of tokens in template text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Literal text outside of any action.
    Text,
    /// `{{`
    LeftDelim,
    /// `}}`
    RightDelim,
    /// `.Name`, including the leading dot.
    Field,
    /// A bare `Name`.
    Identifier,
    /// `|`
    Pipe,
    Eof,
}

/// The action lexer's states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum State {
    Text,
    LeftDelim,
    InsideAction,
    Field,
    Identifier,
    RightDelim,
    Eof,
}

type ActionEvent<'e, 'a> = Event<'e, Cursor<'a>, Token<'a, Kind>>;
type Step<'a> = (State, Data<Cursor<'a>>);

/// A lexer for `{{ }}`-delimited template text.
pub type ActionLexer<'a> = Lexer<'a, State, Kind>;

/// Returns a lexer over the template text `source`.
///
/// ```rust
/// use quill::lex::{self, Kind};
///
/// let kinds: Vec<Kind> = lex::actions("a{{.Foo | html}}")
///     .map(|token| token.unwrap().kind)
///     .collect();
///
/// assert_eq!(kinds, [
///     Kind::Text, Kind::LeftDelim, Kind::Field, Kind::Pipe,
///     Kind::Identifier, Kind::RightDelim, Kind::Eof,
/// ]);
/// ```
pub fn actions(source: &str) -> ActionLexer<'_> {
    let machine = Machine::new(State::Text, Cursor::new(source))
        .with(State::Text, text)
        .with(State::LeftDelim, left_delim)
        .with(State::InsideAction, inside_action)
        .with(State::Field, field)
        .with(State::Identifier, identifier)
        .with(State::RightDelim, right_delim)
        .with(State::Eof, eof);

    Lexer::new(machine, State::Eof)
}

fn text<'a>(event: &mut ActionEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let rest = cursor.rest();
    match memchr::memmem::find(rest.as_bytes(), LEFT_DELIM.as_bytes()) {
        Some(0) => (State::LeftDelim, Data::new(cursor)),
        Some(i) => {
            let (token, cursor) = cursor.token(Kind::Text, i);
            event.emit(token);
            (State::LeftDelim, Data::new(cursor))
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

fn left_delim<'a>(event: &mut ActionEvent<'_, 'a>) -> Step<'a> {
    let (token, cursor) = event.data.raw.token(Kind::LeftDelim, LEFT_DELIM.len());
    event.emit(token);
    (State::InsideAction, Data::new(cursor))
}

fn inside_action<'a>(event: &mut ActionEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let rest = cursor.rest();
    let space = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_whitespace()).len();
    let (_, cursor) = cursor.advance(space);

    let rest = cursor.rest();
    if rest.is_empty() {
        return (State::Text, cursor.fail("unclosed action"));
    }

    if rest.starts_with(RIGHT_DELIM) {
        return (State::RightDelim, Data::new(cursor));
    }

    match rest.as_bytes()[0] {
        b'|' => {
            let (token, cursor) = cursor.token(Kind::Pipe, 1);
            event.emit(token);
            (State::InsideAction, Data::new(cursor))
        }
        b'.' if name_len(&rest[1..]) > 0 => (State::Field, Data::new(cursor)),
        b if b.is_ascii_alphabetic() || b == b'_' => (State::Identifier, Data::new(cursor)),
        _ => (State::Text, cursor.fail("unrecognized character in action")),
    }
}

fn field<'a>(event: &mut ActionEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let len = 1 + name_len(&cursor.rest()[1..]);
    let (token, cursor) = cursor.token(Kind::Field, len);
    event.emit(token);
    (State::InsideAction, Data::new(cursor))
}

fn identifier<'a>(event: &mut ActionEvent<'_, 'a>) -> Step<'a> {
    let cursor = event.data.raw;
    let (token, cursor) = cursor.token(Kind::Identifier, name_len(cursor.rest()));
    event.emit(token);
    (State::InsideAction, Data::new(cursor))
}

fn right_delim<'a>(event: &mut ActionEvent<'_, 'a>) -> Step<'a> {
    let (token, cursor) = event.data.raw.token(Kind::RightDelim, RIGHT_DELIM.len());
    event.emit(token);
    (State::Text, Data::new(cursor))
}

fn eof<'a>(event: &mut ActionEvent<'_, 'a>) -> Step<'a> {
    (State::Eof, Data::new(event.data.raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Result};

    fn lex(source: &str) -> Result<Vec<(Kind, &str)>> {
        actions(source)
            .map(|token| token.map(|t| (t.kind, t.value)))
            .collect()
    }

    #[test]
    fn text_only() {
        assert_eq!(lex("").unwrap(), [(Kind::Eof, "")]);
        assert_eq!(lex("hello { world }").unwrap(), [
            (Kind::Text, "hello { world }"),
            (Kind::Eof, ""),
        ]);
    }

    #[test]
    fn actions_and_text() {
        assert_eq!(lex("a{{.Foo}}b{{ .Bar_2 | Upper }}").unwrap(), [
            (Kind::Text, "a"),
            (Kind::LeftDelim, "{{"),
            (Kind::Field, ".Foo"),
            (Kind::RightDelim, "}}"),
            (Kind::Text, "b"),
            (Kind::LeftDelim, "{{"),
            (Kind::Field, ".Bar_2"),
            (Kind::Pipe, "|"),
            (Kind::Identifier, "Upper"),
            (Kind::RightDelim, "}}"),
            (Kind::Eof, ""),
        ]);
    }

    #[test]
    fn empty_text_is_suppressed() {
        assert_eq!(lex("{{.A}}{{.B}}").unwrap(), [
            (Kind::LeftDelim, "{{"),
            (Kind::Field, ".A"),
            (Kind::RightDelim, "}}"),
            (Kind::LeftDelim, "{{"),
            (Kind::Field, ".B"),
            (Kind::RightDelim, "}}"),
            (Kind::Eof, ""),
        ]);
    }

    #[test]
    fn right_delim_outside_action_is_text() {
        assert_eq!(lex("a }} b").unwrap(), [(Kind::Text, "a }} b"), (Kind::Eof, "")]);
    }

    #[test]
    fn offsets_point_into_source() {
        let tokens = actions("ab{{ .X }}").tokens().unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, [0, 2, 5, 8, 10]);
    }

    #[test]
    fn unclosed_action_truncates_without_eof() {
        let tokens: Vec<_> = actions("x{{.Foo").collect();
        assert_eq!(tokens.len(), 4);
        assert!(tokens[..3].iter().all(|t| t.is_ok()));

        let error = tokens[3].as_ref().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Lex);
        assert!(error.to_string().contains("unclosed action"));
    }

    #[test]
    fn unrecognized_characters_are_errors() {
        for source in ["{{ 1 }}", "{{ . }}", "{{.Foo ! }}", "{{ \"str\" }}", "{{ .é }}"] {
            let error = lex(source).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Lex, "{source}");
        }
    }

    #[test]
    fn exactly_one_terminal() {
        for source in ["", "a", "{{.A}}", "a{{.A}}b", "{{", "{{.A", "{{ ? }}", "a{{.A}"] {
            let items: Vec<_> = actions(source).collect();
            let eofs = items.iter()
                .filter(|t| matches!(t, Ok(t) if t.kind == Kind::Eof))
                .count();

            let errors = items.iter().filter(|t| t.is_err()).count();
            assert_eq!(eofs + errors, 1, "{source}: {items:?}");
            assert!(matches!(items.last(), Some(Err(_)) | Some(Ok(Token { kind: Kind::Eof, .. }))));
        }
    }

    #[test]
    fn error_location_is_reported() {
        let error = lex("line one\n  {{ .A # }}").unwrap_err();
        let report = error.to_string();
        assert!(report.contains("line: 2"), "{report}");
        assert!(report.contains("column: 9"), "{report}");
    }
}
