//! Controller — owns the playground state and issues pipeline runs.
//!
//! Each change spawns one short-lived worker thread. Results come back over
//! the run channel and are applied on the caller's thread by [`Controller::poll`].
//! Every issued run resolves: a panicking collaborator or a thread that
//! cannot be spawned still produces a fault for that request.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::pipeline::{Compile, CompileFault, CompilePipeline, Format};
use crate::runs::{run_channel, RunReceiver, RunResolved, RunSender};
use crate::state::{reduce, AppState, Event, RequestId, StalePolicy};

pub struct Controller<C, F> {
    pipeline: Arc<CompilePipeline<C, F>>,
    state: AppState,
    tx: RunSender,
    rx: RunReceiver,
    mounted: bool,
}

impl<C, F> Controller<C, F>
where
    C: Compile + Send + Sync + 'static,
    F: Format + Send + Sync + 'static,
{
    pub fn new(pipeline: CompilePipeline<C, F>, policy: StalePolicy) -> Self {
        let (tx, rx) = run_channel();
        Self {
            pipeline: Arc::new(pipeline),
            state: AppState::new(policy),
            tx,
            rx,
            mounted: false,
        }
    }

    /// Issue the initial run. Only the first call does anything.
    pub fn mount(&mut self, initial: &str) -> Option<RequestId> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        Some(self.on_change(initial))
    }

    /// The input text changed. Always issues a new run, whatever the text.
    pub fn on_change(&mut self, text: &str) -> RequestId {
        let request = self.issue(text);

        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.tx.clone();
        let source = text.to_string();
        let spawned = thread::Builder::new()
            .name(format!("pipeline-run-{}", request.get()))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    pipeline.run_request(request, &source)
                }))
                .unwrap_or_else(|payload| {
                    let fault = CompileFault::crashed(payload.as_ref()).with_request(request);
                    warn!(%request, "pipeline run panicked: {}", fault.message);
                    Err(fault)
                });
                // The receiver only goes away when the controller is dropped.
                let _ = tx.send(RunResolved { request, result });
            });
        match spawned {
            Ok(_) => debug!(%request, bytes = text.len(), "pipeline run issued"),
            Err(e) => self.spawn_failed(request, e),
        }
        request
    }

    fn issue(&mut self, text: &str) -> RequestId {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(
            state,
            Event::Edit {
                text: text.to_string(),
            },
        );
        self.state.latest_issued
    }

    /// No thread will ever report for `request`, so resolve it here.
    fn spawn_failed(&mut self, request: RequestId, err: io::Error) {
        warn!(%request, "failed to spawn pipeline run: {err}");
        let fault = CompileFault::from_output(&err).with_request(request);
        self.apply(RunResolved {
            request,
            result: Err(fault),
        });
    }

    /// Apply every run that has resolved so far. Never blocks.
    pub fn poll(&mut self) -> usize {
        let runs = self.rx.drain();
        let applied = runs.len();
        for run in runs {
            self.apply(run);
        }
        applied
    }

    /// Block until one run resolves, then apply it.
    pub fn wait_for_resolution(&mut self, timeout: Duration) -> bool {
        match self.rx.wait(timeout) {
            Some(run) => {
                self.apply(run);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn policy(&self) -> StalePolicy {
        self.state.policy
    }

    fn apply(&mut self, run: RunResolved) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, run.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DEFAULT_SCRIPT;
    use crate::jsfmt::FormatOptions;
    use crate::pipeline::FaultOrigin;
    use crate::sieve::GenerateOpts;
    use crate::state::Phase;
    use std::convert::Infallible;

    const WAIT: Duration = Duration::from_secs(10);

    fn controller() -> Controller<crate::sieve::SieveCompiler, crate::jsfmt::JsFormatter> {
        Controller::new(
            CompilePipeline::sieve(GenerateOpts::default()),
            StalePolicy::default(),
        )
    }

    #[test]
    fn mount_runs_once() {
        let mut c = controller();
        assert_eq!(c.mount(DEFAULT_SCRIPT), Some(RequestId::new(0)));
        assert_eq!(c.mount(DEFAULT_SCRIPT), None);
        assert_eq!(c.state().phase, Phase::Compiling);

        assert!(c.wait_for_resolution(WAIT));
        assert_eq!(c.state().phase, Phase::Success);
        assert!(c.state().artifact().is_some());
    }

    #[test]
    fn empty_text_still_compiles() {
        let mut c = controller();
        c.on_change("");
        assert!(c.wait_for_resolution(WAIT));
        let code = &c.state().artifact().unwrap().code;
        assert!(code.contains("export async function run"));
    }

    #[test]
    fn malformed_text_fails() {
        let mut c = controller();
        c.on_change("if header :is \"subject\" \"oops { discard; }");
        assert!(c.wait_for_resolution(WAIT));
        assert_eq!(c.state().phase, Phase::Failed);
        assert!(c.state().fault().unwrap().message.contains("Unterminated string"));
    }

    #[test]
    fn poll_without_results_is_zero() {
        let mut c = controller();
        assert_eq!(c.poll(), 0);
        assert!(!c.wait_for_resolution(Duration::from_millis(10)));
    }

    #[test]
    fn every_change_issues_a_run() {
        let mut c = controller();
        for text in ["keep;", "stop;", "discard;"] {
            c.on_change(text);
        }
        assert_eq!(c.state().in_flight, 3);
        let mut resolved = 0;
        while resolved < 3 && c.wait_for_resolution(WAIT) {
            resolved += 1;
        }
        assert_eq!(resolved, 3);
        assert_eq!(c.state().in_flight, 0);
        assert!(c.state().is_current());
        assert!(c.state().artifact().unwrap().code.contains("// discard the email"));
    }

    /// Compiles by panicking, the way a buggy compiler would.
    struct Crashing;

    impl Compile for Crashing {
        type Error = Infallible;

        fn compile(&self, source: &str) -> Result<String, Infallible> {
            panic!("cannot handle {source:?}");
        }
    }

    struct PassThrough;

    impl Format for PassThrough {
        type Error = Infallible;

        fn format(&self, code: &str, _options: &FormatOptions) -> Result<String, Infallible> {
            Ok(code.to_string())
        }
    }

    #[test]
    fn panicking_compiler_still_resolves() {
        let mut c = Controller::new(
            CompilePipeline::new(Crashing, PassThrough),
            StalePolicy::default(),
        );
        let request = c.on_change("keep;");
        assert!(c.wait_for_resolution(WAIT));

        let state = c.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.in_flight, 0);
        let fault = state.fault().unwrap();
        assert_eq!(fault.origin, FaultOrigin::Output);
        assert_eq!(fault.request, Some(request));
        assert!(fault.message.contains("cannot handle \"keep;\""), "{}", fault.message);
    }

    #[test]
    fn failed_spawn_resolves_immediately() {
        let mut c = controller();
        let request = c.issue("keep;");
        assert_eq!(c.state().in_flight, 1);

        c.spawn_failed(request, io::Error::other("no more threads"));
        let state = c.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.in_flight, 0);
        assert_eq!(state.fault().unwrap().origin, FaultOrigin::Output);
        assert!(state.fault().unwrap().message.contains("no more threads"));
    }
}
