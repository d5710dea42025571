use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use shellwire_envelope::ResultEnvelope;
use tokio::sync::oneshot;

use crate::error::{PipelineError, Result};

/// Resolves to a submitted command's envelope, or the reason it failed.
///
/// Handles settle in submission order. A handle for a command stranded by
/// [`Pipeline::shutdown`](crate::Pipeline::shutdown) stays pending until the
/// pipeline itself is dropped, then resolves to [`PipelineError::Closed`].
#[derive(Debug)]
#[must_use = "a completion handle does nothing unless awaited"]
pub struct CompletionHandle {
    id: u64,
    rx: oneshot::Receiver<Result<ResultEnvelope>>,
}

impl CompletionHandle {
    pub(crate) fn new(id: u64) -> (oneshot::Sender<Result<ResultEnvelope>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { id, rx })
    }

    /// Submission sequence number, unique per pipeline.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Take the outcome if the command has already settled.
    pub fn try_result(&mut self) -> Option<Result<ResultEnvelope>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(PipelineError::Closed)),
        }
    }
}

impl Future for CompletionHandle {
    type Output = Result<ResultEnvelope>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(Err(PipelineError::Closed)))
    }
}
