//! Per-document observer lists.
//!
//! Each [`Document`](crate::Document) owns its own [`DocumentEvents`];
//! there is no global registry. Callbacks run synchronously on the thread
//! that mutates the document.

use std::fmt;

/// Handle returned by [`Observers::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// Ordered list of callbacks for one event.
pub struct Observers<T> {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}

impl<T> Observers<T> {
    /// Register a callback.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sub, _)| *sub != id);
        self.callbacks.len() != before
    }

    /// Invoke every callback in subscription order.
    pub fn emit(&mut self, payload: &T) {
        for (_, callback) in &mut self.callbacks {
            callback(payload);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// Events a document raises toward its host.
#[derive(Debug, Default)]
pub struct DocumentEvents {
    /// Caret moved to a new position.
    pub caret_moved: Observers<()>,
    /// Overall document size changed; payload is true when the height changed.
    pub size_changed: Observers<bool>,
    /// Selection bounds changed.
    pub selection_changed: Observers<()>,
    /// Total character count changed.
    pub length_changed: Observers<()>,
}
