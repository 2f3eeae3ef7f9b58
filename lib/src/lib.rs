#![doc = svgbobdoc::transform!(
//! A small, contextually autoescaping template engine.
//!
//! # Overview
//!
//! Quill renders templates written in a tiny `{{ }}`-delimited language:
//! literal text interspersed with _actions_ such as `{{.Title}}` or
//! `{{.Body | Summary}}`. Each action is a pipeline of _terms_. A `.Field`
//! term names a member of the data object; a bare `Identifier` names a
//! built-in helper or, failing that, a member of the data object. Each term
//! is invoked with the previous term's value, and the last value is written
//! out.
//!
//! Templates pass through four stages:
//!
//! ```svgbob
//!  +------+   tokens   +--------+  Document   +---------+  Document   +----------+
//!  | text +----------->| parse  +------------>| escape  +------------>| execute  +---> sink
//!  +------+            +--------+             +---------+             +-----+----+
//!     |                                            ^                        |
//!     |  lex::actions()               lex::html()  |                        v
//!     +--------------------------------------------+                 +------+------+
//!                                                                    | data object |
//!                                                                    +-------------+
//! ```
//!
//!   * **Lexing** turns text into tokens. Both lexers, [`lex::actions()`] for
//!     template text and [`lex::html()`] for the HTML inside it, are driven by
//!     the same table-driven state [`fsm::Machine`] and produce tokens lazily,
//!     one per call to `next()`.
//!
//!   * **Parsing**, via [`parse()`], builds a [`Document`]: a root whose
//!     children are text and actions, each action holding one command per
//!     `|`-separated segment.
//!
//!   * **Escaping**, via [`escape()`], re-lexes literal text as HTML to track
//!     where each action writes its value and appends an escaping helper to
//!     every action. Actions that would write inside a tag are rejected.
//!
//!   * **Execution**, via [`execute()`], walks the document, invoking the
//!     [`Invocable`](exec::Invocable) data object by member name and writing
//!     to a [`Sink`](value::Sink).
//!
//! [`templating::Template`] bundles the stages; [`templating::Engine`]
//! manages a directory of templates.
//!
//! ```rust
//! use quill::exec::Methods;
//!
//! let document = quill::parse("page", "<p>{{.Greeting | Shout}}</p>").unwrap();
//! let document = quill::escape(document).unwrap();
//!
//! let data = Methods::new()
//!     .with("Greeting", || "Hello & welcome")
//!     .with("Shout", |s: String| s.to_uppercase());
//!
//! let mut output = String::new();
//! quill::execute(&document, "page", &mut output, &data).unwrap();
//! assert_eq!(output, "<p>HELLO &amp; WELCOME</p>");
//! ```
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod value;
pub mod fsm;
pub mod lex;
pub mod ast;
pub mod parse;
pub mod escape;
pub mod exec;
pub mod templating;

pub use ast::Document;
pub use parse::parse;
pub use escape::escape;
pub use exec::execute;

pub use rayon;
