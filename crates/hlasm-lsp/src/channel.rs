//! One-shot response channels (`spec.md` §4.9).
//!
//! Grounded in the original's `response_handler`/`message_consumer` split in
//! `examples/original_source/parser_library/src/workspace_manager_response.h`:
//! a channel starts `Pending`, transitions at most once to `Provided`,
//! `Errored`, or `Invalidated`, and every later transition attempt is a no-op.
//! `Rc<RefCell<_>>` stands in for the original's shared pointer since the
//! driver is single-threaded (`spec.md` §5).

use std::cell::RefCell;
use std::rc::Rc;

/// The terminal (or pending) state of a response channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState<T> {
    /// No result has been produced yet.
    Pending,
    /// The handler produced a result.
    Provided(T),
    /// The handler failed with an error code and message.
    Errored(i32, String),
    /// The request was cancelled; no result will ever arrive.
    Invalidated,
}

struct Inner<T> {
    state: ChannelState<T>,
}

/// The producer half: the orchestrator resolves the channel through this.
#[derive(Clone)]
pub struct Producer<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

/// The consumer half: the LSP handler awaits/reads the channel through this.
#[derive(Clone)]
pub struct Consumer<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

/// Creates a linked producer/consumer pair, starting `Pending`.
#[must_use]
pub fn make_response<T>() -> (Producer<T>, Consumer<T>) {
    let inner = Rc::new(RefCell::new(Inner {
        state: ChannelState::Pending,
    }));
    (
        Producer { inner: Rc::clone(&inner) },
        Consumer { inner },
    )
}

impl<T> Producer<T> {
    /// Resolves the channel with a value. A no-op if already terminal.
    pub fn provide(&self, value: T) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.state, ChannelState::Pending) {
            inner.state = ChannelState::Provided(value);
        }
    }

    /// Resolves the channel with an error. A no-op if already terminal.
    pub fn error(&self, code: i32, message: impl Into<String>) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.state, ChannelState::Pending) {
            inner.state = ChannelState::Errored(code, message.into());
        }
    }

    /// Marks the channel invalidated (client cancel, workspace removal). A
    /// no-op if already terminal.
    pub fn invalidate(&self) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.state, ChannelState::Pending) {
            inner.state = ChannelState::Invalidated;
        }
    }

    /// True while the channel is still pending.
    #[must_use]
    pub fn valid(&self) -> bool {
        matches!(self.inner.borrow().state, ChannelState::Pending)
    }
}

impl<T: Clone> Consumer<T> {
    /// The current state, cloned out.
    #[must_use]
    pub fn state(&self) -> ChannelState<T> {
        self.inner.borrow().state.clone()
    }

    /// True while the channel is still pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.inner.borrow().state, ChannelState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provide_resolves_exactly_once() {
        let (producer, consumer) = make_response::<i32>();
        producer.provide(1);
        producer.provide(2);
        assert_eq!(consumer.state(), ChannelState::Provided(1));
    }

    #[test]
    fn invalidate_on_terminal_channel_is_a_no_op() {
        let (producer, consumer) = make_response::<i32>();
        producer.provide(1);
        producer.invalidate();
        assert_eq!(consumer.state(), ChannelState::Provided(1));
    }

    #[test]
    fn valid_becomes_false_after_resolution() {
        let (producer, _consumer) = make_response::<i32>();
        assert!(producer.valid());
        producer.error(1, "boom");
        assert!(!producer.valid());
    }
}
