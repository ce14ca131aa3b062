//! Fire-and-forget execution on a bounded worker pool.
//!
//! A [`Dispatcher`] owns a Tokio runtime whose blocking pool is capped at a
//! fixed number of threads. It is created explicitly (usually once, at
//! startup) and passed to whoever submits work. Create and drop it outside of
//! async code: dropping a runtime from within one panics.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use log::debug;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;

use crate::config::ASYNC_WORKER_THREADS;
use crate::error_handling::{InitializationError, RequestError};
use crate::fetch::{FormData, HttpRequest, Method};

/// Produces the request a job executes.
type Supplier = Box<dyn FnOnce() -> Result<HttpRequest, RequestError> + Send>;

/// Outcome of an async submission.
pub type Outcome = Result<HttpRequest, RequestError>;

enum Source {
    Ready(HttpRequest),
    Supplier(Supplier),
}

/// A request, a method and optional data, executed on a worker.
pub struct Job {
    source: Source,
    method: Method,
    data: Option<FormData>,
}

impl Job {
    /// Executes an already configured request.
    pub fn new(request: HttpRequest, method: Method) -> Self {
        Self {
            source: Source::Ready(request),
            method,
            data: None,
        }
    }

    /// Builds the request on the worker; a supplier error is reported like an
    /// execution error.
    pub fn from_supplier<F>(supplier: F, method: Method) -> Self
    where
        F: FnOnce() -> Result<HttpRequest, RequestError> + Send + 'static,
    {
        Self {
            source: Source::Supplier(Box::new(supplier)),
            method,
            data: None,
        }
    }

    /// Data sent with the request.
    pub fn data(mut self, data: FormData) -> Self {
        self.data = Some(data);
        self
    }

    fn run(self) -> Outcome {
        let mut request = match self.source {
            Source::Ready(request) => request,
            Source::Supplier(supplier) => supplier()?,
        };
        request.execute(self.method, self.data)?;
        Ok(request)
    }
}

/// Bounded pool running [`Job`]s off the caller's thread.
pub struct Dispatcher {
    runtime: Runtime,
}

impl Dispatcher {
    /// A pool of `ASYNC_WORKER_THREADS` workers.
    pub fn new() -> Result<Self, InitializationError> {
        Self::with_workers(ASYNC_WORKER_THREADS)
    }

    /// A pool of `workers` workers (at least one).
    pub fn with_workers(workers: usize) -> Result<Self, InitializationError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers.max(1))
            .thread_name("http-request-worker")
            .enable_all()
            .build()?;
        debug!("Async dispatcher started with {} worker(s)", workers.max(1));
        Ok(Self { runtime })
    }

    /// Queues `job` and returns at once. The outcome arrives through the
    /// returned [`Submission`].
    pub fn submit(&self, job: Job) -> Submission {
        let (tx, rx) = oneshot::channel();
        self.runtime.spawn_blocking(move || {
            // nobody listening is fine: the submission was dropped
            let _ = tx.send(job.run());
        });
        Submission { rx }
    }

    /// Queues `job` and returns at once. Exactly one of the callbacks runs,
    /// on the worker thread, when the job finishes.
    pub fn observe<S, E>(&self, job: Job, on_success: S, on_error: E)
    where
        S: FnOnce(HttpRequest) + Send + 'static,
        E: FnOnce(RequestError) + Send + 'static,
    {
        self.runtime.spawn_blocking(move || match job.run() {
            Ok(request) => on_success(request),
            Err(e) => on_error(e),
        });
    }

    /// Stops accepting work and waits up to `timeout` for running jobs.
    pub fn shutdown(self, timeout: Duration) {
        self.runtime.shutdown_timeout(timeout);
    }
}

/// Pending outcome of [`Dispatcher::submit`].
///
/// Await it from async code or call [`Submission::wait`] from blocking code.
pub struct Submission {
    rx: oneshot::Receiver<Outcome>,
}

fn worker_gone() -> RequestError {
    RequestError::Dispatch("worker stopped before reporting an outcome".to_string())
}

impl Submission {
    /// Blocks until the job finished. Must not be called from async code.
    pub fn wait(self) -> Outcome {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(worker_gone()))
    }

    /// The outcome if the job already finished.
    pub fn try_outcome(&mut self) -> Option<Outcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(worker_gone())),
        }
    }
}

impl Future for Submission {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(worker_gone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::test_support::{Scripted, ScriptedTransport};
    use crate::fetch::transport::{Connection, ProxyRef, Transport};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use url::Url;

    /// Blocks every `open` until the test releases it.
    struct GatedTransport {
        gate: Mutex<mpsc::Receiver<()>>,
        inner: ScriptedTransport,
    }

    impl Transport for GatedTransport {
        fn open(&self, url: &Url, proxy: Option<&ProxyRef>) -> Result<Box<dyn Connection>, RequestError> {
            let _ = self.gate.lock().unwrap().recv();
            self.inner.open(url, proxy)
        }
    }

    fn gated(script: Vec<Scripted>) -> (Arc<GatedTransport>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let transport = GatedTransport {
            gate: Mutex::new(rx),
            inner: ScriptedTransport::new(script),
        };
        (Arc::new(transport), tx)
    }

    #[test]
    fn test_submit_returns_before_work_completes() {
        let dispatcher = Dispatcher::new().unwrap();
        let (transport, release) = gated(vec![Scripted::status(200).body("ok")]);
        let request = HttpRequest::with_transport("http://example.com/", None, transport);

        let mut submission = dispatcher.submit(Job::new(request, Method::Head));
        // the worker is parked on the gate, so no outcome can exist yet
        assert!(submission.try_outcome().is_none());

        release.send(()).unwrap();
        let request = submission.wait().unwrap();
        assert_eq!(request.status(), Some(200));
    }

    #[test]
    fn test_exactly_one_observer_fires() {
        let dispatcher = Dispatcher::new().unwrap();
        let (tx, rx) = mpsc::channel::<&'static str>();

        let ok = ScriptedTransport::new([Scripted::status(200)]);
        let failing = ScriptedTransport::new([Scripted::failure(std::io::ErrorKind::TimedOut)]);

        for transport in [ok, failing] {
            let request = HttpRequest::with_transport("http://example.com/", None, Arc::new(transport));
            let (on_ok, on_err) = (tx.clone(), tx.clone());
            dispatcher.observe(
                Job::new(request, Method::Head),
                move |request| {
                    assert_eq!(request.status(), Some(200));
                    on_ok.send("success").unwrap();
                },
                move |error| {
                    assert!(error.is_network());
                    on_err.send("error").unwrap();
                },
            );
        }
        drop(tx);

        let mut fired: Vec<&str> = rx.iter().collect();
        fired.sort_unstable();
        assert_eq!(fired, vec!["error", "success"]);
    }

    #[test]
    fn test_supplier_error_reaches_error_path() {
        let dispatcher = Dispatcher::with_workers(1).unwrap();
        let job = Job::from_supplier(
            || Err(RequestError::malformed("::", "supplier refused")),
            Method::Get,
        );
        let err = dispatcher.submit(job).wait().unwrap_err();
        assert!(matches!(err, RequestError::MalformedEndpoint { .. }));
    }

    #[test]
    fn test_job_data_is_sent() {
        let dispatcher = Dispatcher::new().unwrap();
        let transport = ScriptedTransport::new([Scripted::status(201)]);
        let recorder = transport.clone();
        let job = Job::from_supplier(
            move || Ok(HttpRequest::with_transport("http://example.com/api", None, Arc::new(transport))),
            Method::Post,
        )
        .data(FormData::new().data("k", "v"));

        let request = dispatcher.submit(job).wait().unwrap();
        assert_eq!(request.status(), Some(201));
        assert_eq!(recorder.requests()[0].body_text(), "k=v");
    }

    #[test]
    fn test_submission_is_awaitable() {
        let dispatcher = Dispatcher::new().unwrap();
        let transport = ScriptedTransport::new([Scripted::status(204)]);
        let request = HttpRequest::with_transport("http://example.com/", None, Arc::new(transport));
        let submission = dispatcher.submit(Job::new(request, Method::Delete));

        let outcome = block_on(submission);
        assert_eq!(outcome.unwrap().status(), Some(204));
    }

    fn block_on(submission: Submission) -> Outcome {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(submission)
    }
}
