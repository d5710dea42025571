use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{ProcessError, Result};

/// The three piped byte streams of a running engine.
#[derive(Debug)]
pub struct EngineIo {
    /// Command input.
    pub stdin: ChildStdin,
    /// Framed result output.
    pub stdout: ChildStdout,
    /// Diagnostic text, never part of the framing protocol.
    pub stderr: ChildStderr,
}

/// A spawned engine process.
///
/// Exactly one per pipeline; it is never respawned.
pub struct EngineProcess {
    child: Child,
    pid: u32,
    executable: PathBuf,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    terminated: bool,
}

impl EngineProcess {
    /// Spawn the engine with all three standard streams piped.
    ///
    /// Must be called from within a Tokio runtime. A spawn failure or a
    /// missing process id is fatal; there is no retry.
    pub fn start(config: &EngineConfig) -> Result<Self> {
        let executable = config.resolved_executable().to_path_buf();

        let mut cmd = Command::new(&executable);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(config.kill_on_drop);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            executable: executable.clone(),
            source,
        })?;
        let pid = child.id().ok_or_else(|| ProcessError::MissingPid {
            executable: executable.clone(),
        })?;

        info!(pid, executable = %executable.display(), "engine process started");

        Ok(Self {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
            child,
            pid,
            executable,
            terminated: false,
        })
    }

    /// Operating system process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// The executable this process was started from.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Take the command input stream.
    pub fn take_stdin(&mut self) -> Result<ChildStdin> {
        self.stdin
            .take()
            .ok_or(ProcessError::StreamUnavailable("stdin"))
    }

    /// Take the framed output stream.
    pub fn take_stdout(&mut self) -> Result<ChildStdout> {
        self.stdout
            .take()
            .ok_or(ProcessError::StreamUnavailable("stdout"))
    }

    /// Take the diagnostic stream.
    pub fn take_stderr(&mut self) -> Result<ChildStderr> {
        self.stderr
            .take()
            .ok_or(ProcessError::StreamUnavailable("stderr"))
    }

    /// Take all three streams at once.
    pub fn take_io(&mut self) -> Result<EngineIo> {
        Ok(EngineIo {
            stdin: self.take_stdin()?,
            stdout: self.take_stdout()?,
            stderr: self.take_stderr()?,
        })
    }

    /// Whether the process has not exited yet.
    pub fn is_running(&mut self) -> Result<bool> {
        Ok(self.child.try_wait()?.is_none())
    }

    /// Ask the engine to exit. Does not wait for it.
    ///
    /// Idempotent; terminating an already-exited process is not an error.
    pub fn terminate(&mut self) -> Result<()> {
        if self.terminated || !self.is_running()? {
            self.terminated = true;
            return Ok(());
        }
        self.send_terminate()?;
        self.terminated = true;
        info!(pid = self.pid, "engine process terminated");
        Ok(())
    }

    /// Wait for the process to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait().await?;
        debug!(pid = self.pid, ?status, "engine process exited");
        Ok(status)
    }

    #[cfg(unix)]
    fn send_terminate(&mut self) -> Result<()> {
        let pid = libc::pid_t::try_from(self.pid)
            .map_err(|_| std::io::Error::other(format!("pid {} out of range", self.pid)))?;

        // SAFETY: `kill` has no memory-safety preconditions; `pid` names the
        // child this supervisor spawned and has not yet reaped.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc == 0 {
            return Ok(());
        }

        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            debug!(pid = self.pid, "engine already gone");
            return Ok(());
        }
        Err(ProcessError::Io(err))
    }

    #[cfg(not(unix))]
    fn send_terminate(&mut self) -> Result<()> {
        self.child.start_kill().map_err(ProcessError::Io)
    }
}

impl std::fmt::Debug for EngineProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineProcess")
            .field("pid", &self.pid)
            .field("executable", &self.executable)
            .field("terminated", &self.terminated)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn sh(script: &str) -> EngineConfig {
        EngineConfig::with_executable("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn start_exposes_all_three_streams() {
        let mut engine = EngineProcess::start(&sh("cat; echo done >&2")).unwrap();
        assert!(engine.pid() > 0);

        let mut io = engine.take_io().unwrap();
        io.stdin.write_all(b"ping").await.unwrap();
        drop(io.stdin);

        let mut out = String::new();
        io.stdout.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "ping");

        let mut err = String::new();
        io.stderr.read_to_string(&mut err).await.unwrap();
        assert_eq!(err, "done\n");

        assert!(engine.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn missing_executable_is_spawn_error() {
        let cfg = EngineConfig::with_executable("/nonexistent/shellwire-engine");
        let err = EngineProcess::start(&cfg).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/shellwire-engine"));
    }

    #[tokio::test]
    async fn streams_can_only_be_taken_once() {
        let mut engine = EngineProcess::start(&sh("cat")).unwrap();
        let _stdin = engine.take_stdin().unwrap();
        let err = engine.take_stdin().unwrap_err();
        assert!(matches!(err, ProcessError::StreamUnavailable("stdin")));
        assert!(matches!(
            engine.take_io().unwrap_err(),
            ProcessError::StreamUnavailable("stdin")
        ));
        engine.terminate().unwrap();
    }

    #[tokio::test]
    async fn terminate_stops_a_long_lived_engine() {
        let mut engine = EngineProcess::start(&sh("exec sleep 30")).unwrap();
        assert!(engine.is_running().unwrap());

        engine.terminate().unwrap();
        let status = engine.wait().await.unwrap();
        assert!(!status.success());
        assert!(!engine.is_running().unwrap());

        // Second call is a no-op.
        engine.terminate().unwrap();
    }

    #[tokio::test]
    async fn terminate_after_exit_is_ok() {
        let mut engine = EngineProcess::start(&sh("exit 0")).unwrap();
        engine.wait().await.unwrap();
        engine.terminate().unwrap();
    }

    #[tokio::test]
    async fn env_and_working_dir_are_applied() {
        let dir = std::env::temp_dir();
        let mut cfg = sh("printf '%s|' \"$SHELLWIRE_TEST\"; pwd");
        cfg.env.push(("SHELLWIRE_TEST".to_string(), "yes".to_string()));
        cfg.working_dir = Some(dir.clone());

        let mut engine = EngineProcess::start(&cfg).unwrap();
        let mut stdout = engine.take_stdout().unwrap();
        let mut out = String::new();
        stdout.read_to_string(&mut out).await.unwrap();

        let (var, cwd) = out.trim_end().split_once('|').unwrap();
        assert_eq!(var, "yes");
        assert_eq!(
            std::fs::canonicalize(cwd).unwrap(),
            std::fs::canonicalize(&dir).unwrap()
        );
        engine.wait().await.unwrap();
    }
}
