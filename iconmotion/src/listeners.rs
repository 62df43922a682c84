//! Explicit publish/subscribe for controller observers.
//!
//! Callbacks run synchronously, in subscription order, on the thread that changed the state.

use std::fmt::Debug;

/// Handle returned by [`Listeners::subscribe`], pass it back to unsubscribe
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub type Callback<T> = Box<dyn FnMut(&T)>;

pub struct Listeners<T> {
    next_id: u64,
    entries: Vec<(Subscription, Callback<T>)>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> Debug for Listeners<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<T> Listeners<T> {
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.entries.push((subscription, Box::new(callback)));
        subscription
    }

    /// True if the subscription was live
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(s, _)| *s != subscription);
        before != self.entries.len()
    }

    pub fn notify(&mut self, value: &T) {
        for (_, callback) in self.entries.iter_mut() {
            callback(value);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
