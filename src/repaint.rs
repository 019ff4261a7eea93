use std::sync::Arc;

use tokio::sync::Notify;

/// Wakes whoever drives a channel view when background work has queued a result.
pub trait Repaint: Sized + Send + Sync + 'static {
    fn repaint(&self) {}

    fn erased(self) -> ErasedRepaint {
        Arc::new(move || self.repaint())
    }
}

impl Repaint for () {}

impl Repaint for Arc<Notify> {
    fn repaint(&self) {
        self.notify_one();
    }
}

pub type ErasedRepaint = Arc<dyn Fn() + Send + Sync + 'static>;
