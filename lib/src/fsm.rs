//! A small, table-driven finite state machine.
//!
//! A [`Machine`] holds exactly one `(state, data)` pair and a table mapping
//! each state to a transition handler. Every call to [`Machine::process()`]
//! looks up the handler for the current state, hands it the current data,
//! and replaces the pair wholesale with whatever the handler returns.
//!
//! Handlers may hand off at most one output item per step through the
//! [`Event`] they receive. The machine keeps that item in a single slot until
//! the driver takes it, so there is never more than one item in flight.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// The machine's data: the unconsumed input and an optional terminal error.
#[derive(Debug, Clone)]
pub struct Data<R> {
    pub error: Option<Error>,
    pub raw: R,
}

impl<R> Data<R> {
    pub fn new(raw: R) -> Self {
        Data { error: None, raw }
    }

    /// Data carrying `error`, which [`Machine::process()`] will return.
    pub fn failed(raw: R, error: Error) -> Self {
        Data { error: Some(error), raw }
    }
}

/// What a handler receives: the current data and a one-item output slot.
pub struct Event<'m, R, T> {
    pub data: Data<R>,
    slot: &'m mut Option<T>,
}

impl<R, T> Event<'_, R, T> {
    /// Hands `item` off to the driver.
    ///
    /// # Panics
    ///
    /// Panics if the handler already emitted an item during this step.
    pub fn emit(&mut self, item: T) {
        assert!(self.slot.is_none(), "a transition may emit at most one item");
        *self.slot = Some(item);
    }
}

/// A transition handler: consumes an event, returns the next state and data.
pub type Handler<S, R, T> = fn(&mut Event<'_, R, T>) -> (S, Data<R>);

pub struct Machine<S, R, T> {
    state: S,
    data: Data<R>,
    handlers: FxHashMap<S, Handler<S, R, T>>,
    slot: Option<T>,
}

impl<S, R, T> Machine<S, R, T>
    where S: Copy + Eq + Hash + Debug, R: Clone
{
    pub fn new(state: S, raw: R) -> Self {
        Machine {
            state,
            data: Data::new(raw),
            handlers: FxHashMap::default(),
            slot: None,
        }
    }

    /// Registers the handler for `state`.
    ///
    /// # Panics
    ///
    /// Panics if a handler for `state` was already registered.
    pub fn add(&mut self, state: S, handler: Handler<S, R, T>) -> &mut Self {
        let existing = self.handlers.insert(state, handler);
        assert!(existing.is_none(), "duplicate handler registered for state {state:?}");
        self
    }

    /// Builder-style version of [`Machine::add()`].
    pub fn with(mut self, state: S, handler: Handler<S, R, T>) -> Self {
        self.add(state, handler);
        self
    }

    /// The current state.
    pub fn state(&self) -> S {
        self.state
    }

    pub fn data(&self) -> &Data<R> {
        &self.data
    }

    /// Runs one transition from the current state.
    ///
    /// Returns the error embedded in the handler's returned data, if any.
    ///
    /// # Panics
    ///
    /// Panics if no handler is registered for the current state.
    pub fn process(&mut self) -> Result<()> {
        let handler = *self.handlers.get(&self.state)
            .unwrap_or_else(|| panic!("no handler registered for state {:?}", self.state));

        let mut event = Event { data: self.data.clone(), slot: &mut self.slot };
        let (state, data) = handler(&mut event);
        self.state = state;
        self.data = data;
        match &self.data.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Takes the item emitted by the last transition, if any.
    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    enum Count { Even, Odd, Done }

    fn even(event: &mut Event<'_, u32, &'static str>) -> (Count, Data<u32>) {
        match event.data.raw {
            0 => (Count::Done, Data::new(0)),
            n => {
                event.emit("even");
                (Count::Odd, Data::new(n - 1))
            }
        }
    }

    fn odd(event: &mut Event<'_, u32, &'static str>) -> (Count, Data<u32>) {
        match event.data.raw {
            0 => (Count::Done, Data::new(0)),
            7 => (Count::Even, Data::failed(7, error!("seven is unlucky"))),
            n => {
                event.emit("odd");
                (Count::Even, Data::new(n - 1))
            }
        }
    }

    fn done(event: &mut Event<'_, u32, &'static str>) -> (Count, Data<u32>) {
        (Count::Done, event.data.clone())
    }

    fn machine(n: u32) -> Machine<Count, u32, &'static str> {
        Machine::new(Count::Even, n)
            .with(Count::Even, even)
            .with(Count::Odd, odd)
            .with(Count::Done, done)
    }

    #[test]
    fn runs_until_absorbing_state() {
        let mut machine = machine(3);
        let mut emitted = vec![];
        while machine.state() != Count::Done {
            machine.process().unwrap();
            emitted.extend(machine.take());
        }

        assert_eq!(emitted, ["even", "odd", "even"]);
        machine.process().unwrap();
        assert_eq!(machine.state(), Count::Done);
        assert!(machine.take().is_none());
    }

    #[test]
    fn errors_in_returned_data_are_propagated() {
        let mut machine = machine(8);
        machine.process().unwrap();
        assert_eq!(machine.take(), Some("even"));
        assert!(machine.process().is_err());
        assert!(machine.data().error.is_some());
        assert_eq!(machine.state(), Count::Even);
    }

    #[test]
    #[should_panic(expected = "duplicate handler")]
    fn duplicate_handlers_panic() {
        let _ = machine(1).with(Count::Odd, odd);
    }

    #[test]
    #[should_panic(expected = "no handler registered")]
    fn unregistered_states_panic() {
        let mut machine = Machine::new(Count::Odd, 1).with(Count::Even, even);
        let _ = machine.process();
    }
}
