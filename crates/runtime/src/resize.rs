use crate::registry::{CallbackRegistry, Token};

/// Handle for one resize listener.
#[derive(Debug, Clone)]
pub struct Subscription(Token);

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.0.is_live()
    }

    /// Stop receiving notifications. Idempotent.
    pub fn unsubscribe(&self) {
        self.0.cancel();
    }
}

/// Fan-out for "the drawable box changed size" events from the host.
#[derive(Default)]
pub struct ResizeNotifier {
    listeners: CallbackRegistry,
}

impl ResizeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Box<dyn FnMut()>) -> Subscription {
        Subscription(self.listeners.register(listener))
    }

    pub fn unsubscribe(&self, subscription: &Subscription) {
        self.listeners.remove(&subscription.0);
    }

    /// Deliver one resize event. Returns how many listeners ran.
    pub fn notify(&self) -> usize {
        let ran = self.listeners.dispatch();
        tracing::debug!(listeners = ran, "resize notified");
        ran
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}
