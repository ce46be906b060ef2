//! Overlapping runs resolving out of order, under both stale-result policies.

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use sieveplay::controller::Controller;
use sieveplay::jsfmt::FormatOptions;
use sieveplay::pipeline::{Compile, CompilePipeline, Format};
use sieveplay::state::{Phase, RequestId, StalePolicy};

const WAIT: Duration = Duration::from_secs(10);

/// Compiler that holds each source until the test releases it.
#[derive(Clone, Default)]
struct Gated {
    released: Arc<(Mutex<HashSet<String>>, Condvar)>,
}

impl Gated {
    fn release(&self, source: &str) {
        let (lock, cvar) = &*self.released;
        lock.lock().unwrap().insert(source.to_string());
        cvar.notify_all();
    }
}

impl Compile for Gated {
    type Error = Infallible;

    fn compile(&self, source: &str) -> Result<String, Infallible> {
        let (lock, cvar) = &*self.released;
        let mut released = lock.lock().unwrap();
        while !released.contains(source) {
            released = cvar.wait(released).unwrap();
        }
        Ok(format!("compiled {source}"))
    }
}

struct PassThrough;

impl Format for PassThrough {
    type Error = Infallible;

    fn format(&self, code: &str, _options: &FormatOptions) -> Result<String, Infallible> {
        Ok(code.to_string())
    }
}

fn controller(policy: StalePolicy) -> (Controller<Gated, PassThrough>, Gated) {
    let gated = Gated::default();
    let controller = Controller::new(CompilePipeline::new(gated.clone(), PassThrough), policy);
    (controller, gated)
}

/// Issue A then B, let B finish first, then A.
fn b_before_a(policy: StalePolicy) -> Controller<Gated, PassThrough> {
    let (mut c, gate) = controller(policy);
    let a = c.on_change("A");
    let b = c.on_change("B");
    assert_eq!((a, b), (RequestId::new(0), RequestId::new(1)));
    assert_eq!(c.state().in_flight, 2);

    gate.release("B");
    assert!(c.wait_for_resolution(WAIT));
    assert_eq!(c.state().artifact().unwrap().code, "compiled B");
    assert_eq!(c.state().phase, Phase::Success);

    gate.release("A");
    assert!(c.wait_for_resolution(WAIT));
    assert_eq!(c.state().in_flight, 0);
    c
}

#[test]
fn last_resolved_shows_the_older_run() {
    let c = b_before_a(StalePolicy::LastResolved);
    let state = c.state();
    assert_eq!(state.artifact().unwrap().code, "compiled A");
    assert_eq!(state.artifact().unwrap().request, RequestId::new(0));
    assert_eq!(state.source_text, "B");
    assert!(!state.is_current());
}

#[test]
fn discard_stale_keeps_the_newest_run() {
    let c = b_before_a(StalePolicy::DiscardStale);
    let state = c.state();
    assert_eq!(state.artifact().unwrap().code, "compiled B");
    assert_eq!(state.source_text, "B");
    assert!(state.is_current());
}

#[test]
fn in_order_resolution_is_the_same_under_both_policies() {
    for policy in [StalePolicy::DiscardStale, StalePolicy::LastResolved] {
        let (mut c, gate) = controller(policy);
        c.on_change("A");
        c.on_change("B");
        gate.release("A");
        assert!(c.wait_for_resolution(WAIT));
        gate.release("B");
        assert!(c.wait_for_resolution(WAIT));
        assert_eq!(c.state().artifact().unwrap().code, "compiled B");
    }
}

#[test]
fn hung_run_leaves_ui_state_usable() {
    let (mut c, gate) = controller(StalePolicy::DiscardStale);
    c.on_change("never");
    c.on_change("soon");
    gate.release("soon");
    assert!(c.wait_for_resolution(WAIT));
    assert_eq!(c.poll(), 0);
    assert_eq!(c.state().in_flight, 1);
    assert_eq!(c.state().artifact().unwrap().code, "compiled soon");
    // Unblock the first worker so the test process can exit cleanly.
    gate.release("never");
}
