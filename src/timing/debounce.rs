use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A value that only publishes once its input has been stable for `delay`.
///
/// Each new input aborts the pending timer and starts another one, so only
/// the last value of a burst is ever published. Changing the delay affects
/// timers scheduled afterwards, not the one already running. Dropping the
/// debouncer aborts any pending timer.
///
/// Must be used from within a tokio runtime.
pub struct Debounced<T> {
    input: T,
    delay: Duration,
    output: Arc<watch::Sender<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (output, _) = watch::channel(initial.clone());
        Self {
            input: initial,
            delay,
            output: Arc::new(output),
            pending: None,
        }
    }

    /// Latest published value.
    pub fn get(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Receivers are only notified when the published value actually changes.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn update(&mut self, value: T) {
        if value == self.input {
            return;
        }
        self.input = value.clone();
        self.cancel();

        let output = Arc::clone(&self.output);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            output.send_if_modified(|current| {
                if *current == value {
                    return false;
                }
                *current = value;
                true
            });
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn publishes_after_delay() {
        let mut value = Debounced::new("hello", Duration::from_millis(500));
        assert_eq!(value.get(), "hello");

        value.update("world");
        assert_eq!(value.get(), "hello");

        sleep(Duration::from_millis(499)).await;
        assert_eq!(value.get(), "hello");

        sleep(Duration::from_millis(2)).await;
        assert_eq!(value.get(), "world");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_publishes_only_the_last_value_once() {
        let mut value = Debounced::new(0u32, Duration::from_millis(300));
        let mut rx = value.subscribe();

        for next in 1..=5 {
            value.update(next);
            sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(value.get(), 0);
        assert!(!rx.has_changed().unwrap());

        sleep(Duration::from_millis(201)).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 5);

        sleep(Duration::from_secs(5)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn new_delay_applies_to_the_next_schedule() {
        let mut value = Debounced::new(1u32, Duration::from_millis(300));
        value.set_delay(Duration::from_millis(50));
        value.update(2);

        sleep(Duration::from_millis(51)).await;
        assert_eq!(value.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending_publish() {
        let mut value = Debounced::new(1u32, Duration::from_millis(300));
        let rx = value.subscribe();
        value.update(2);
        assert!(value.is_pending());
        drop(value);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_published_value_does_not_notify() {
        let mut value = Debounced::new(1u32, Duration::from_millis(300));
        let mut rx = value.subscribe();
        value.update(2);
        sleep(Duration::from_millis(100)).await;
        value.update(1);

        sleep(Duration::from_secs(1)).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
    }
}
