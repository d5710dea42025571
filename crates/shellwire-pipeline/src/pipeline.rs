use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shellwire_envelope::{Category, CategoryValue, ChannelRegistry, Demultiplexer, OutputFormat};
use shellwire_frame::{FrameReader, TransportWriter};
use shellwire_process::EngineProcess;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::encoder::CommandEncoder;
use crate::error::{PipelineError, Result};
use crate::handle::CompletionHandle;
use crate::queue::{CommandQueue, Inbox, QueueState, QueuedCommand};

const DIAGNOSTIC_CHUNK: usize = 8 * 1024;

/// A running engine and the single-flight queue in front of it.
///
/// Submissions return immediately; results come back through
/// [`CompletionHandle`]s in submission order, and every non-empty category is
/// also broadcast to [`Pipeline::subscribe`]rs. Dropping the pipeline
/// terminates the engine.
pub struct Pipeline {
    inbox: mpsc::UnboundedSender<Inbox>,
    encoder: Arc<dyn CommandEncoder>,
    config: PipelineConfig,
    channels: Arc<ChannelRegistry>,
    state: watch::Receiver<QueueState>,
    pid: Option<u32>,
    next_id: AtomicU64,
    diagnostics_task: JoinHandle<()>,
}

impl Pipeline {
    /// Launch the configured engine and start the queue.
    ///
    /// Must be called from within a Tokio runtime. Fails if the engine cannot
    /// be started; there is no retry.
    pub fn spawn(config: PipelineConfig, encoder: impl CommandEncoder + 'static) -> Result<Self> {
        let mut process = EngineProcess::start(&config.engine)?;
        let io = process.take_io()?;
        let pid = process.pid();
        info!(pid, "pipeline starting");
        Ok(Self::start(
            io.stdout,
            io.stdin,
            io.stderr,
            Some(process),
            config,
            Arc::new(encoder),
        ))
    }

    /// Run the queue over already-connected streams instead of a spawned
    /// process. `config.engine` is ignored.
    pub fn from_io<R, W, E>(
        stdout: R,
        stdin: W,
        stderr: E,
        config: PipelineConfig,
        encoder: impl CommandEncoder + 'static,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        Self::start(stdout, stdin, stderr, None, config, Arc::new(encoder))
    }

    fn start<R, W, E>(
        stdout: R,
        stdin: W,
        stderr: E,
        process: Option<EngineProcess>,
        config: PipelineConfig,
        encoder: Arc<dyn CommandEncoder>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let channels = Arc::new(ChannelRegistry::with_config(config.channels));
        let demux = Demultiplexer::new(Arc::clone(&channels));
        let pid = process.as_ref().map(EngineProcess::pid);

        let (state_tx, state) = watch::channel(QueueState::Idle);
        let (inbox, inbox_rx) = mpsc::unbounded_channel();

        let queue = CommandQueue::new(
            inbox_rx,
            FrameReader::with_config(stdout, config.frame.clone()),
            TransportWriter::new(stdin),
            demux.clone(),
            process,
            state_tx,
        );
        tokio::spawn(queue.run());
        let diagnostics_task = tokio::spawn(forward_diagnostics(stderr, demux));

        Self {
            inbox,
            encoder,
            config,
            channels,
            state,
            pid,
            next_id: AtomicU64::new(1),
            diagnostics_task,
        }
    }

    /// Queue a command. Never blocks; await the handle for the result.
    ///
    /// After [`Pipeline::shutdown`] the handle resolves to
    /// [`PipelineError::ShutDown`].
    pub fn submit(&self, command: impl Into<String>, format: OutputFormat) -> CompletionHandle {
        let command = command.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, handle) = CompletionHandle::new(id);

        let encoded = self.encoder.encode(
            &command,
            &self.config.frame.sentinels,
            format,
            self.config.scratch_dir.as_deref(),
        );
        debug!(id, %format, encoded_len = encoded.len(), "command submitted");

        let cmd = QueuedCommand {
            id,
            command,
            encoded,
            format,
            reply,
        };
        if let Err(mpsc::error::SendError(Inbox::Submit(cmd))) = self.inbox.send(Inbox::Submit(cmd)) {
            let _ = cmd.reply.send(Err(PipelineError::Closed));
        }
        handle
    }

    /// Queue a command with [`OutputFormat::Json`].
    pub fn submit_default(&self, command: impl Into<String>) -> CompletionHandle {
        self.submit(command, OutputFormat::default())
    }

    /// Receive every future value published on one category.
    pub fn subscribe(&self, category: Category) -> broadcast::Receiver<CategoryValue> {
        self.channels.subscribe(category)
    }

    /// The category channel registry.
    pub fn channels(&self) -> &Arc<ChannelRegistry> {
        &self.channels
    }

    /// Current queue state.
    pub fn state(&self) -> QueueState {
        *self.state.borrow()
    }

    /// A receiver that observes every queue state change.
    pub fn watch_state(&self) -> watch::Receiver<QueueState> {
        self.state.clone()
    }

    /// Engine process id, if this pipeline spawned the engine.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stop dispatching and terminate the engine. Does not wait for it.
    ///
    /// The in-flight command and any backlog are not settled. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.inbox.send(Inbox::Shutdown);
    }

    /// Shut down and wait until the queue has stopped dispatching.
    pub async fn shutdown_and_wait(&self) {
        self.shutdown();
        let mut state = self.state.clone();
        let _ = state.wait_for(|state| *state == QueueState::ShutDown).await;
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // The queue task terminates the engine once it sees the inbox close.
        self.diagnostics_task.abort();
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("pid", &self.pid)
            .field("state", &self.state())
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Forward the engine's diagnostic stream to the `error` channel, chunk by
/// chunk, until it closes.
async fn forward_diagnostics<E: AsyncRead + Unpin>(mut stderr: E, demux: Demultiplexer) {
    let mut buf = vec![0u8; DIAGNOSTIC_CHUNK];
    loop {
        match stderr.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => demux.diagnostic(&String::from_utf8_lossy(&buf[..n])),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!(error = %err, "diagnostic stream read failed");
                break;
            }
        }
    }
    debug!("diagnostic stream closed");
}
