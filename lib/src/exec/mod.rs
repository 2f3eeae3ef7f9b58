//! Executes documents against data.
//!
//! Execution is a walk over the document that threads a single register,
//! the last computed value, through each action's terms. Each term names a
//! member of the [`Receiver`] which is invoked with the register's current
//! value, if there is one, and replaces it. Text and the final value of each
//! action are written to a [`Sink`] as the walk leaves them.

mod invoke;
mod helpers;

pub use invoke::*;
pub use helpers::helpers;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::ast::{Document, Kind, Node, Visitor};
use crate::error::{Chainable, Result};
use crate::value::{Sink, Value};

/// The target of every lookup during execution: the caller's data object
/// plus the built-in [`helpers()`].
pub struct Receiver<'a> {
    data: &'a dyn Invocable,
    helpers: &'a Methods,
}

impl<'a> Receiver<'a> {
    pub fn new(data: &'a dyn Invocable) -> Self {
        Receiver { data, helpers: helpers() }
    }

    /// Invokes the data object's member `name`.
    pub fn field(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        self.data.invoke(name, arg)
    }

    /// Invokes the built-in helper `name` or, if there's no such helper, the
    /// data object's member `name`.
    pub fn identifier(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        match self.helpers.contains(name) {
            true => self.helpers.invoke(name, arg),
            false => self.data.invoke(name, arg),
        }
    }
}

/// Executes `document` against `data`, writing output to `sink`. `name`
/// identifies the execution in errors and logs.
///
/// Execution stops at the first error. Whatever was written to `sink` before
/// the error remains written.
///
/// ```rust
/// use quill::exec::Methods;
///
/// let data = Methods::new()
///     .with("Foo", || "<b>")
///     .with("Shout", |s: String| format!("{s}!"));
///
/// let document = quill::escape(quill::parse("t", "a{{.Foo | Shout}}b").unwrap()).unwrap();
/// let mut output = String::new();
/// quill::execute(&document, "t", &mut output, &data).unwrap();
/// assert_eq!(output, "a&lt;b&gt;!b");
/// ```
pub fn execute<S: Sink>(document: &Document, name: &str, sink: S, data: &dyn Invocable) -> Result<()> {
    let mut executor = Executor { receiver: Receiver::new(data), sink, last: None, actions: 0 };
    executor.sink.begin()
        .and_then(|_| document.root.walk(&mut executor))
        .chain_with(|| error!("failed to execute template", "template" => name))?;

    tracing::debug!(template = name, actions = executor.actions, "executed template");
    Ok(())
}

struct Executor<'a, S> {
    receiver: Receiver<'a>,
    sink: S,
    last: Option<Value>,
    actions: usize,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string payload>".into()
    }
}

impl<S: Sink> Executor<'_, S> {
    /// Invokes the member named by the field or identifier `node` with the
    /// register, trapping panics.
    fn call(&mut self, node: &Node) -> Result<Value> {
        let arg = self.last.take();
        let receiver = &self.receiver;
        let invocation = panic::catch_unwind(AssertUnwindSafe(|| match node.kind {
            Kind::Field => {
                let name = node.value.strip_prefix('.').unwrap_or(&node.value);
                receiver.field(name, arg)
            }
            _ => receiver.identifier(&node.value, arg),
        }));

        let result = invocation.unwrap_or_else(|payload| err! {
            Panic: "member panicked",
            "message" => panic_message(&*payload),
        });

        result.chain_with(|| error!("failed to evaluate term", "term" => &node.value))
    }
}

impl<S: Sink> Visitor for Executor<'_, S> {
    fn enter(&mut self, node: &Node) -> Result<()> {
        match node.kind {
            Kind::Action => self.last = None,
            Kind::Field | Kind::Identifier => self.last = Some(self.call(node)?),
            Kind::Root | Kind::Text | Kind::Command => {}
        }

        Ok(())
    }

    fn leave(&mut self, node: &Node) -> Result<()> {
        match node.kind {
            Kind::Text => self.sink.write_str(&node.value),
            Kind::Action => {
                self.actions += 1;
                match self.last.take() {
                    Some(value) => self.sink.write_value(&value),
                    None => Ok(()),
                }
            }
            Kind::Root | Kind::Command | Kind::Field | Kind::Identifier => Ok(()),
        }
    }
}
