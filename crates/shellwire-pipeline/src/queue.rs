use std::collections::VecDeque;

use shellwire_envelope::{Demultiplexer, OutputFormat, ResultEnvelope};
use shellwire_frame::{Frame, FrameReader, TransportWriter};
use shellwire_process::EngineProcess;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};

/// Observable state of the command queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing in flight; the next submission is written immediately.
    Idle,
    /// One command has been written and its frame has not arrived yet.
    Dispatching,
    /// Shut down or failed. Nothing is ever dispatched again.
    ShutDown,
}

/// A command waiting for, or occupying, the engine.
#[derive(Debug)]
pub(crate) struct QueuedCommand {
    pub id: u64,
    pub command: String,
    pub encoded: String,
    pub format: OutputFormat,
    pub reply: oneshot::Sender<Result<ResultEnvelope>>,
}

/// Messages from pipeline handles to the queue task.
#[derive(Debug)]
pub(crate) enum Inbox {
    Submit(QueuedCommand),
    Shutdown,
}

/// Single-flight FIFO between callers and the engine.
///
/// Runs as one task that owns the transport, the frame reader and the engine
/// process. At most one command is written to the engine before its frame is
/// read back; everything else waits in `backlog`, in submission order. The
/// inbox stays live while a write waits for the engine to drain its input.
pub(crate) struct CommandQueue<R, W> {
    inbox: mpsc::UnboundedReceiver<Inbox>,
    frames: FrameReader<R>,
    writer: TransportWriter<W>,
    demux: Demultiplexer,
    process: Option<EngineProcess>,
    backlog: VecDeque<QueuedCommand>,
    in_flight: Option<QueuedCommand>,
    state: watch::Sender<QueueState>,
}

impl<R, W> CommandQueue<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        inbox: mpsc::UnboundedReceiver<Inbox>,
        frames: FrameReader<R>,
        writer: TransportWriter<W>,
        demux: Demultiplexer,
        process: Option<EngineProcess>,
        state: watch::Sender<QueueState>,
    ) -> Self {
        Self {
            inbox,
            frames,
            writer,
            demux,
            process,
            backlog: VecDeque::new(),
            in_flight: None,
            state,
        }
    }

    /// Drive the queue until every pipeline handle is gone.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.inbox.recv() => match msg {
                    Some(Inbox::Submit(cmd)) => self.enqueue(cmd).await,
                    Some(Inbox::Shutdown) => {
                        self.shut_down();
                        break;
                    }
                    None => {
                        self.shut_down();
                        return;
                    }
                },
                frame = self.frames.next_frame() => match frame {
                    Ok(Some(frame)) => self.on_frame(frame).await,
                    Ok(None) => {
                        self.fail(PipelineError::EngineExited);
                        break;
                    }
                    Err(err) => {
                        self.fail(PipelineError::Output(err));
                        break;
                    }
                },
            }

            if self.is_shut_down() {
                break;
            }
        }

        self.park().await;
    }

    fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    fn is_shut_down(&self) -> bool {
        *self.state.borrow() == QueueState::ShutDown
    }

    fn set_state(&self, state: QueueState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    async fn enqueue(&mut self, cmd: QueuedCommand) {
        if self.is_idle() && self.backlog.is_empty() {
            self.dispatch(cmd).await;
        } else {
            debug!(id = cmd.id, backlog = self.backlog.len() + 1, "command queued");
            self.backlog.push_back(cmd);
        }
    }

    /// Write one command. The caller guarantees nothing is in flight.
    ///
    /// Submissions arriving mid-write join the backlog. A shutdown (or the
    /// inbox closing) abandons the write and strands the command.
    async fn dispatch(&mut self, cmd: QueuedCommand) {
        self.set_state(QueueState::Dispatching);
        debug!(id = cmd.id, command = %cmd.command, format = %cmd.format, "dispatching command");

        let written = {
            let write = self.writer.write(&cmd.encoded);
            tokio::pin!(write);
            loop {
                tokio::select! {
                    biased;
                    result = &mut write => break Some(result),
                    msg = self.inbox.recv() => match msg {
                        Some(Inbox::Submit(next)) => {
                            debug!(
                                id = next.id,
                                backlog = self.backlog.len() + 1,
                                "command queued behind pending write"
                            );
                            self.backlog.push_back(next);
                        }
                        Some(Inbox::Shutdown) | None => break None,
                    },
                }
            }
        };

        match written {
            Some(Ok(())) => self.in_flight = Some(cmd),
            Some(Err(err)) => {
                error!(id = cmd.id, error = %err, "command write failed");
                let _ = cmd.reply.send(Err(PipelineError::Transport(err)));
                self.abort();
            }
            None => {
                warn!(id = cmd.id, "shutdown while command write was pending");
                self.in_flight = Some(cmd);
                self.shut_down();
            }
        }
    }

    async fn on_frame(&mut self, frame: Frame) {
        let Some(cmd) = self.in_flight.take() else {
            warn!(size = frame.payload.len(), "frame arrived with no command in flight");
            let _ = self.demux.demultiplex(&frame.payload, OutputFormat::Json);
            return;
        };

        let outcome = self
            .demux
            .demultiplex(&frame.payload, cmd.format)
            .map_err(PipelineError::from);
        match &outcome {
            Ok(envelope) => debug!(id = cmd.id, errors = envelope.has_errors(), "command settled"),
            Err(err) => warn!(id = cmd.id, error = %err, "command rejected; continuing with next"),
        }
        if cmd.reply.send(outcome).is_err() {
            debug!(id = cmd.id, "completion handle dropped before settling");
        }

        match self.backlog.pop_front() {
            Some(next) => self.dispatch(next).await,
            None => self.set_state(QueueState::Idle),
        }
    }

    /// Reject the in-flight command with `err`, then abort.
    fn fail(&mut self, err: PipelineError) {
        error!(error = %err, "fatal engine error");
        if let Some(cmd) = self.in_flight.take() {
            let _ = cmd.reply.send(Err(err));
        }
        self.abort();
    }

    /// Reject the backlog and stop for good.
    fn abort(&mut self) {
        for cmd in self.backlog.drain(..) {
            let _ = cmd.reply.send(Err(PipelineError::Aborted));
        }
        self.terminate_process();
        self.set_state(QueueState::ShutDown);
    }

    /// Stop dispatching and terminate the engine.
    ///
    /// The in-flight command and the backlog are left unsettled.
    fn shut_down(&mut self) {
        if self.is_shut_down() {
            return;
        }
        info!(
            in_flight = self.in_flight.is_some(),
            backlog = self.backlog.len(),
            "pipeline shutting down"
        );
        self.terminate_process();
        self.set_state(QueueState::ShutDown);
    }

    fn terminate_process(&mut self) {
        if let Some(process) = self.process.as_mut() {
            if let Err(err) = process.terminate() {
                warn!(pid = process.pid(), error = %err, "failed to terminate engine");
            }
        }
    }

    /// Refuse new submissions until the last pipeline handle is dropped.
    ///
    /// Stranded completion handles stay pending for as long as this runs.
    async fn park(mut self) {
        while let Some(msg) = self.inbox.recv().await {
            if let Inbox::Submit(cmd) = msg {
                debug!(id = cmd.id, "submission refused after shutdown");
                let _ = cmd.reply.send(Err(PipelineError::ShutDown));
            }
        }
        debug!(
            stranded = self.backlog.len() + usize::from(self.in_flight.is_some()),
            "pipeline closed"
        );
    }
}
