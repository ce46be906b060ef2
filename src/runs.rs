//! Run channel — mpsc bridge carrying finished pipeline runs back to the UI loop.

use std::sync::mpsc;
use std::time::Duration;

use crate::pipeline::CompileFault;
use crate::state::{Event, RequestId};

/// A pipeline run that has finished, successfully or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResolved {
    pub request: RequestId,
    pub result: Result<String, CompileFault>,
}

impl From<RunResolved> for Event {
    fn from(run: RunResolved) -> Self {
        Event::RunResolved {
            request: run.request,
            result: run.result,
        }
    }
}

/// Sender half, cloned into every worker thread.
pub type RunSender = mpsc::Sender<RunResolved>;

/// Receiver half, held by the controller.
pub struct RunReceiver {
    rx: mpsc::Receiver<RunResolved>,
}

impl RunReceiver {
    /// Non-blocking poll for the next resolved run.
    pub fn poll(&self) -> Option<RunResolved> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&self) -> Vec<RunResolved> {
        let mut runs = Vec::new();
        while let Ok(run) = self.rx.try_recv() {
            runs.push(run);
        }
        runs
    }

    /// Block until one run resolves or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<RunResolved> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Create a new run channel pair.
pub fn run_channel() -> (RunSender, RunReceiver) {
    let (tx, rx) = mpsc::channel();
    (tx, RunReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(id: u64) -> RunResolved {
        RunResolved {
            request: RequestId::new(id),
            result: Ok(format!("run {id}")),
        }
    }

    #[test]
    fn poll_empty_returns_none() {
        let (_tx, rx) = run_channel();
        assert!(rx.poll().is_none());
    }

    #[test]
    fn drain_preserves_arrival_order() {
        let (tx, rx) = run_channel();
        let tx2 = tx.clone();
        tx.send(ok(2)).unwrap();
        tx2.send(ok(1)).unwrap();

        let runs = rx.drain();
        assert_eq!(runs, vec![ok(2), ok(1)]);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn wait_times_out() {
        let (_tx, rx) = run_channel();
        assert!(rx.wait(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn wait_receives_from_thread() {
        let (tx, rx) = run_channel();
        std::thread::spawn(move || tx.send(ok(0)).unwrap());
        assert_eq!(rx.wait(Duration::from_secs(5)), Some(ok(0)));
    }

    #[test]
    fn converts_to_event() {
        let event: Event = ok(3).into();
        assert!(matches!(event, Event::RunResolved { request, .. } if request == RequestId::new(3)));
    }
}
