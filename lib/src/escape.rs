//! Contextual autoescaping.
//!
//! [`escape()`] walks a parsed [`Document`] once, left to right, tracking
//! where in the surrounding HTML the walk currently is. Literal text is
//! re-lexed as HTML and rewritten with its special characters replaced by
//! character references; every action gets a trailing call to the escaping
//! helper for its context so its final value is escaped when executed.

use crate::ast::{Document, Kind, Node, VisitorMut};
use crate::error::{Chainable, Result};
use crate::lex::{self, HtmlKind};
use crate::util::escape_html;

/// The name of the built-in helper that escapes HTML text.
pub const HTML_ESCAPER: &str = "html";

/// Where in the HTML an action would write its value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Context {
    /// Between tags.
    Text,
    /// Inside a start tag that hasn't been closed yet.
    Tag,
    /// Where an attribute name is expected.
    AttrName,
}

impl Context {
    /// The escaping helper for values written in this context, if any.
    pub fn escaper(self) -> Option<&'static str> {
        match self {
            Context::Text => Some(HTML_ESCAPER),
            Context::Tag | Context::AttrName => None,
        }
    }
}

/// Rewrites `document` so that everything it emits is HTML-escaped.
///
/// Escaping an already escaped document returns it unchanged.
///
/// ```rust
/// let document = quill::parse("page", "<p>Fish & {{.Dish}}</p>").unwrap();
/// let escaped = quill::escape(document).unwrap();
/// assert_eq!(escaped.root.to_string(), "<p>Fish &amp; {{.Dish html}}</p>");
///
/// let again = quill::escape(escaped.clone()).unwrap();
/// assert_eq!(again, escaped);
/// ```
pub fn escape(mut document: Document) -> Result<Document> {
    if document.escaped {
        tracing::debug!(template = %document.name, "template already escaped");
        return Ok(document);
    }

    let mut escaper = Escaper { context: Context::Text, actions: 0 };
    document.root.walk_mut(&mut escaper)
        .chain_with(|| error!(Escape: "failed to escape template", "template" => &document.name))?;

    tracing::debug!(template = %document.name, actions = escaper.actions, "escaped template");
    document.escaped = true;
    Ok(document)
}

struct Escaper {
    context: Context,
    actions: usize,
}

impl Escaper {
    /// Re-lexes `text` as HTML, updating the context as each token passes,
    /// and returns the text with each token's contents escaped. Comments are
    /// dropped.
    fn rewrite(&mut self, text: &str) -> Result<String> {
        let text = text.trim_start_matches('\n');
        let mut output = String::with_capacity(text.len());
        for token in lex::html(text) {
            let token = token?;
            let (open, inner, close) = token.delimited();
            match token.kind {
                HtmlKind::Comment | HtmlKind::Eof => continue,
                HtmlKind::StartTag if close.is_empty() => self.context = Context::Tag,
                HtmlKind::StartTag | HtmlKind::EndTag | HtmlKind::Text => {
                    self.context = Context::Text;
                }
            }

            output.push_str(open);
            output.push_str(&escape_html(inner));
            output.push_str(close);
        }

        Ok(output)
    }
}

impl VisitorMut for Escaper {
    fn enter(&mut self, node: &mut Node) -> Result<()> {
        match node.kind {
            Kind::Text => {
                node.value = self.rewrite(&node.value)?;
            }
            Kind::Action => {
                if self.context == Context::Tag {
                    self.context = Context::AttrName;
                }

                let Some(escaper) = self.context.escaper() else {
                    tracing::warn!(context = ?self.context, action = %node, "no escaper for action");
                    return err! {
                        Escape: "action appears where no escaper applies",
                        "context" => format!("{:?}", self.context),
                        "action" => node,
                    };
                };

                self.actions += 1;
                if let Some(command) = node.children.last_mut() {
                    command.push(Node::identifier(escaper));
                }
            }
            Kind::Root | Kind::Command | Kind::Field | Kind::Identifier => {}
        }

        Ok(())
    }

    fn leave(&mut self, _: &mut Node) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parse;

    fn escaped(text: &str) -> Result<String> {
        escape(parse("t", text)?).map(|doc| doc.root.to_string())
    }

    #[test]
    fn text_is_escaped_and_tags_survive() {
        assert_eq!(escaped("<p>Tom & 'Jerry'</p>").unwrap(), "<p>Tom &amp; &#39;Jerry&#39;</p>");
        assert_eq!(escaped("1 < 2").unwrap(), "1 &lt; 2");
    }

    #[test]
    fn tag_contents_are_escaped_too() {
        assert_eq!(escaped("<a href=\"/\">x</a>").unwrap(), "<a href=&#34;/&#34;>x</a>");
    }

    #[test]
    fn comments_and_leading_newlines_are_dropped() {
        assert_eq!(escaped("\n\n<p><!-- hidden -->shown</p>\n").unwrap(), "<p>shown</p>\n");
        assert_eq!(escaped("{{.A}}\n<!-- x -->\nb").unwrap(), "{{.A html}}\nb");
    }

    #[test]
    fn actions_get_an_escaper_on_the_last_command() {
        assert_eq!(escaped("{{.A}}").unwrap(), "{{.A html}}");
        assert_eq!(escaped("<b>{{ .A | Upper }}</b>").unwrap(), "<b>{{.A | Upper html}}</b>");

        let doc = escape(parse("t", "{{.A | B}}").unwrap()).unwrap();
        let action = &doc.root.children[0];
        assert_eq!(action.children.len(), 2);
        assert_eq!(action.children[0].children.len(), 1);
        assert_eq!(action.children[1].children[1], Node::identifier(HTML_ESCAPER));
    }

    #[test]
    fn actions_inside_tags_fail_closed() {
        for text in ["<p class={{.A}}>", "<input {{.Attrs}}>", "<p>a</p><img src={{.Src}}"] {
            let error = escaped(text).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Escape, "{text}");
            assert!(error.to_string().contains("AttrName"), "{text}");
        }
    }

    #[test]
    fn closing_a_tag_restores_text_context() {
        assert!(escaped("<p class=x>{{.A}}</p>").is_ok());
        assert!(escaped("<br>{{.A}}<hr>{{.B}}").is_ok());
    }

    #[test]
    fn unterminated_comments_and_end_tags_are_tolerated() {
        assert_eq!(escaped("<!-- {{.X}} -->").unwrap(), "{{.X html}} --&gt;");
        assert_eq!(escaped("a </ b {{.X}}").unwrap(), "a </ b {{.X html}}");
        assert_eq!(escaped("oops </>").unwrap(), "oops </>");
    }

    #[test]
    fn escaping_twice_is_a_no_op() {
        let once = escape(parse("t", "<p>&{{.A}}</p>").unwrap()).unwrap();
        assert!(once.is_escaped());

        let twice = escape(once.clone()).unwrap();
        assert_eq!(twice, once);
        assert_eq!(twice.root.to_string(), "<p>&amp;{{.A html}}</p>");
    }
}
