use std::time::Duration;

use tokio::{sync::oneshot, task::JoinHandle};

/// A cancellable periodic task.
///
/// `tick` runs once per period until it returns `false` or the ticker is
/// dropped. Dropping stops it at once, a tick that has not fired yet never will.
pub struct Ticker {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn(every: Duration, mut tick: impl FnMut() -> bool + Send + 'static) -> Self {
        let (stop, mut stopped) = oneshot::channel();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(every) => {
                        if !tick() {
                            break;
                        }
                    }
                    _ = &mut stopped => break,
                }
            }
        });

        Self {
            stop: Some(stop),
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the ticker. No tick fires after this returns.
    pub fn cancel(self) {
        drop(self)
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn ticks_until_told_to_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticker = Ticker::spawn(Duration::from_millis(5), {
            let count = Arc::clone(&count);
            move || count.fetch_add(1, Ordering::SeqCst) < 2
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while !ticker.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("ticker should stop on its own");

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn dropping_stops_further_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let ticker = Ticker::spawn(Duration::from_millis(20), {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        ticker.cancel();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
