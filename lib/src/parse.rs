//! Builds a [`Document`] from the action lexer's tokens.
//!
//! The parser itself only routes tokens. The first token of each root-level
//! construct selects a sub-parser from a table keyed by token kind: text
//! tokens go to a text parser, delimiters to an action parser. Every
//! following token is fed to that sub-parser until it reports that it's done.

use rustc_hash::FxHashMap;

use crate::ast::{Document, Node};
use crate::error::{Chainable, Error, Result};
use crate::lex::{self, Kind, Token};

/// Whether a sub-parser needs more tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Open,
    Done,
}

trait SubParser<'a> {
    fn feed(&mut self, token: Token<'a, Kind>) -> Result<Status>;

    fn finish(self: Box<Self>) -> Result<Node>;
}

type Constructor<'a> = fn() -> Box<dyn SubParser<'a> + 'a>;

fn unexpected(token: &Token<'_, Kind>, expected: &str) -> Error {
    error! {
        Parse: format!("unexpected {:?} token", token.kind),
        "expected" => expected,
        "found" => format!("{:?}", token.value),
        "offset" => token.offset,
    }
}

/// Parses the template text `text` into a [`Document`] named `name`.
///
/// ```rust
/// let document = quill::parse("page", "Hi, {{.Name | Upper}}!").unwrap();
/// assert_eq!(document.root.children.len(), 3);
/// assert_eq!(document.root.to_string(), "Hi, {{.Name | Upper}}!");
/// ```
pub fn parse(name: &str, text: &str) -> Result<Document> {
    let mut parser = Parser::new();
    for token in lex::actions(text) {
        let token = token.chain_with(|| error!("failed to lex template", "template" => name))?;
        let status = parser.feed(token).chain_with(|| {
            let (line, column) = crate::util::line_column(text, token.offset);
            error! {
                "failed to parse template",
                "template" => name,
                "line" => line,
                "column" => column,
            }
        })?;

        if status == Status::Done {
            break;
        }
    }

    let root = parser.finish().chain_with(|| error!("failed to parse template", "template" => name))?;
    tracing::debug!(template = name, nodes = root.len(), "parsed template");
    Ok(Document::new(name, root))
}

struct Parser<'a> {
    table: FxHashMap<Kind, Constructor<'a>>,
    active: Option<Box<dyn SubParser<'a> + 'a>>,
    root: Node,
    eof: bool,
}

impl<'a> Parser<'a> {
    fn new() -> Self {
        let mut table: FxHashMap<Kind, Constructor<'a>> = FxHashMap::default();
        table.insert(Kind::Text, TextParser::boxed);
        table.insert(Kind::LeftDelim, ActionParser::boxed);
        table.insert(Kind::RightDelim, ActionParser::boxed);

        Parser { table, active: None, root: Node::root(), eof: false }
    }

    /// Routes `token` to the active sub-parser, selecting one first if none
    /// is active. Returns `Done` once the EOF token has been consumed.
    fn feed(&mut self, token: Token<'a, Kind>) -> Result<Status> {
        if token.kind == Kind::Eof {
            if self.active.is_some() {
                return Err(unexpected(&token, "the end of the open action"));
            }

            self.eof = true;
            return Ok(Status::Done);
        }

        let mut parser = match self.active.take() {
            Some(parser) => parser,
            None => match self.table.get(&token.kind) {
                Some(constructor) => constructor(),
                None => return Err(unexpected(&token, "text or `{{`")),
            }
        };

        match parser.feed(token)? {
            Status::Open => self.active = Some(parser),
            Status::Done => self.root.push(parser.finish()?),
        }

        Ok(Status::Open)
    }

    fn finish(self) -> Result<Node> {
        if !self.eof {
            return err!(Parse: "template ended without an end-of-input token");
        }

        Ok(self.root)
    }
}

#[derive(Default)]
struct TextParser {
    node: Option<Node>,
}

impl TextParser {
    fn boxed<'a>() -> Box<dyn SubParser<'a> + 'a> {
        Box::<Self>::default()
    }
}

impl<'a> SubParser<'a> for TextParser {
    fn feed(&mut self, token: Token<'a, Kind>) -> Result<Status> {
        match token.kind {
            Kind::Text if self.node.is_none() => {
                self.node = Some(Node::text(token.value));
                Ok(Status::Done)
            }
            _ => Err(unexpected(&token, "text")),
        }
    }

    fn finish(self: Box<Self>) -> Result<Node> {
        self.node.ok_or_else(|| error!(Parse: "text parser finished without text"))
    }
}

/// Buffers everything between `{{` and `}}`, then splits it into commands.
#[derive(Default)]
struct ActionParser<'a> {
    open: Option<Token<'a, Kind>>,
    tokens: Vec<Token<'a, Kind>>,
}

impl ActionParser<'_> {
    fn boxed<'a>() -> Box<dyn SubParser<'a> + 'a> {
        Box::<ActionParser<'a>>::default()
    }
}

impl<'a> SubParser<'a> for ActionParser<'a> {
    fn feed(&mut self, token: Token<'a, Kind>) -> Result<Status> {
        match (self.open, token.kind) {
            (None, Kind::LeftDelim) => {
                self.open = Some(token);
                Ok(Status::Open)
            }
            (None, _) => Err(unexpected(&token, "`{{`")),
            (Some(_), Kind::RightDelim) => Ok(Status::Done),
            (Some(_), Kind::Field | Kind::Identifier | Kind::Pipe) => {
                self.tokens.push(token);
                Ok(Status::Open)
            }
            (Some(_), _) => Err(unexpected(&token, "a field, identifier, `|`, or `}}`")),
        }
    }

    fn finish(self: Box<Self>) -> Result<Node> {
        let mut action = Node::action();
        for segment in self.tokens.split(|t| t.kind == Kind::Pipe) {
            if segment.is_empty() {
                return err! {
                    Parse: "missing command in action",
                    "offset" => self.open.map_or(0, |t| t.offset),
                };
            }

            let mut terms = Box::new(TermParser::default());
            for token in segment {
                terms.feed(*token)?;
            }

            action.push(terms.finish()?);
        }

        Ok(action)
    }
}

/// Turns the tokens of one command into field and identifier leaves.
struct TermParser {
    command: Node,
}

impl Default for TermParser {
    fn default() -> Self {
        TermParser { command: Node::command() }
    }
}

impl<'a> SubParser<'a> for TermParser {
    fn feed(&mut self, token: Token<'a, Kind>) -> Result<Status> {
        let term = match token.kind {
            Kind::Field => Node::field(token.value),
            Kind::Identifier => Node::identifier(token.value),
            _ => return Err(unexpected(&token, "a field or identifier")),
        };

        self.command.push(term);
        Ok(Status::Open)
    }

    fn finish(self: Box<Self>) -> Result<Node> {
        Ok(self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Kind as NodeKind;
    use crate::error::ErrorKind;

    fn token(kind: Kind, value: &str) -> Token<'_, Kind> {
        Token { kind, value, offset: 0 }
    }

    #[test]
    fn text_and_actions() {
        let doc = parse("t", "a{{.Foo}}b").unwrap();
        let expected = Node::root()
            .with(Node::text("a"))
            .with(Node::action().with(Node::command().with(Node::field(".Foo"))))
            .with(Node::text("b"));

        assert_eq!(doc.name, "t");
        assert_eq!(doc.root, expected);
        assert!(!doc.is_escaped());
    }

    #[test]
    fn pipelines_split_into_commands() {
        let doc = parse("t", "{{ .A | B | .C D }}").unwrap();
        let action = &doc.root.children[0];
        assert_eq!(action.kind, NodeKind::Action);

        let commands: Vec<Vec<(NodeKind, &str)>> = action.children.iter()
            .map(|c| c.children.iter().map(|t| (t.kind, t.value.as_str())).collect())
            .collect();

        assert_eq!(commands, vec![
            vec![(NodeKind::Field, ".A")],
            vec![(NodeKind::Identifier, "B")],
            vec![(NodeKind::Field, ".C"), (NodeKind::Identifier, "D")],
        ]);
    }

    #[test]
    fn pure_text_round_trips() {
        for text in ["", "plain", "<p>a { b } c</p>\n", "}} stray"] {
            assert_eq!(parse("t", text).unwrap().root.to_string(), text);
        }
    }

    #[test]
    fn empty_commands_are_parse_errors() {
        for text in ["{{}}", "{{ | .A }}", "{{ .A | }}", "{{ .A || B }}"] {
            let error = parse("t", text).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Parse, "{text}");
        }
    }

    #[test]
    fn lex_errors_surface_from_parse() {
        let error = parse("broken.html", "{{.Foo").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Lex);
        assert!(error.to_string().contains("template: broken.html"));
    }

    #[test]
    fn sub_parsers_reject_protocol_violations() {
        let mut action = ActionParser::boxed();
        assert!(action.feed(token(Kind::Field, ".A")).is_err());

        let mut action = ActionParser::boxed();
        assert_eq!(action.feed(token(Kind::LeftDelim, "{{")).unwrap(), Status::Open);
        assert_eq!(action.feed(token(Kind::Text, "x")).unwrap_err().kind(), ErrorKind::Parse);

        let mut text = TextParser::boxed();
        assert_eq!(text.feed(token(Kind::Pipe, "|")).unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn parser_routes_by_token_kind() {
        let mut parser = Parser::new();
        assert!(parser.feed(token(Kind::Pipe, "|")).is_err());

        let mut parser = Parser::new();
        parser.feed(token(Kind::LeftDelim, "{{")).unwrap();
        let error = parser.feed(token(Kind::Eof, "")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);

        let mut parser = Parser::new();
        parser.feed(token(Kind::RightDelim, "}}")).unwrap_err();
        assert!(Parser::new().finish().is_err());
    }
}
