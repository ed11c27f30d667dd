use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

struct ThrottleState<A> {
    last_fired: Option<Instant>,
    trailing_args: Option<A>,
    timer: Option<JoinHandle<()>>,
}

/// Rate-limits a callback to one invocation per `wait`.
///
/// A call in a quiet period fires immediately. Calls inside the window are
/// coalesced: the latest arguments are kept and delivered once when the
/// window closes. At most one trailing timer exists at a time, and dropping
/// the throttle aborts it.
pub struct Throttle<A> {
    wait: Duration,
    callback: Callback<A>,
    state: Arc<Mutex<ThrottleState<A>>>,
}

impl<A: Send + 'static> Throttle<A> {
    pub fn new(wait: Duration, callback: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            wait,
            callback: Arc::new(callback),
            state: Arc::new(Mutex::new(ThrottleState {
                last_fired: None,
                trailing_args: None,
                timer: None,
            })),
        }
    }

    pub fn has_trailing(&self) -> bool {
        lock(&self.state).timer.is_some()
    }

    pub fn call(&self, args: A) {
        let now = Instant::now();
        let mut state = lock(&self.state);

        if state.timer.is_some() {
            state.trailing_args = Some(args);
            return;
        }

        let last_fired = state.last_fired;
        let deadline = match last_fired {
            Some(last) if now.duration_since(last) < self.wait => last + self.wait,
            _ => {
                state.last_fired = Some(now);
                drop(state);
                (self.callback)(args);
                return;
            }
        };

        state.trailing_args = Some(args);
        let shared = Arc::clone(&self.state);
        let callback = Arc::clone(&self.callback);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let args = {
                let mut state = lock(&shared);
                state.timer = None;
                state.last_fired = Some(Instant::now());
                state.trailing_args.take()
            };
            if let Some(args) = args {
                callback(args);
            }
        }));
    }
}

impl<A> Drop for Throttle<A> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}

fn lock<A>(state: &Mutex<ThrottleState<A>>) -> MutexGuard<'_, ThrottleState<A>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
