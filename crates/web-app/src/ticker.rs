//! Background execution
//!
//! The app runs on the single browser thread. Remote work is spawned onto the local executor and
//! recurring timers are abortable interval loops.

use futures_util::{
    StreamExt,
    future::{AbortHandle, abortable},
};
use gloo_timers::future::IntervalStream;
use wasm_bindgen_futures::spawn_local;

pub const ONE_SECOND_MS: u32 = 1000;

/// Handle of a running recurring timer. The timer stops when the handle is dropped.
#[derive(Debug)]
pub struct Ticker {
    handle: AbortHandle,
}

impl Ticker {
    #[must_use]
    pub fn new(handle: AbortHandle) -> Self {
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.handle.is_aborted()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

pub trait Executor {
    /// Run a future to completion in the background.
    fn spawn(&self, future: impl Future<Output = ()> + 'static);
    /// Call `on_tick` every `period_ms` milliseconds until the returned ticker is stopped.
    fn start_ticker(&self, period_ms: u32, on_tick: impl FnMut() + 'static) -> Ticker;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Browser;

impl Executor for Browser {
    fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        spawn_local(future);
    }

    fn start_ticker(&self, period_ms: u32, mut on_tick: impl FnMut() + 'static) -> Ticker {
        let (ticks, handle) = abortable(async move {
            let mut interval = IntervalStream::new(period_ms);
            while interval.next().await.is_some() {
                on_tick();
            }
        });
        spawn_local(async move {
            let _ = ticks.await;
        });
        Ticker::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_stops_on_drop() {
        let (handle, _registration) = AbortHandle::new_pair();
        let ticker = Ticker::new(handle.clone());
        assert!(!ticker.is_stopped());

        drop(ticker);

        assert!(handle.is_aborted());
    }
}
