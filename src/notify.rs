//! Synchronous change channels.
//!
//! Listeners run on the calling (UI) thread, in subscription order, before
//! the mutating call returns.

type Listener<E> = Box<dyn FnMut(&E)>;

pub struct Notifier<E> {
    listeners: Vec<Listener<E>>,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<E> Notifier<E> {
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: &E) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> std::fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
