use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::types::{ToolCommand, ToolError};

/// How long output relays may keep draining after the tool has exited.
const RELAY_GRACE: Duration = Duration::from_millis(500);

/// Run a tool to completion, relaying its output into the log.
///
/// Blocks until the child exits. Stdout goes to the log unless the command
/// asks for it to be captured to a file; stderr always goes to the log.
pub fn run(cmd: &ToolCommand) -> Result<(), ToolError> {
    let program = cmd.program.clone();
    let io_err = |source| ToolError::Io {
        program: program.clone(),
        source,
    };

    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .current_dir(&cmd.work_dir)
        .stdin(Stdio::null())
        .stderr(Stdio::piped());

    match cmd.stdout_file() {
        Some(path) => {
            let file = File::create(&path).map_err(io_err)?;
            command.stdout(Stdio::from(file));
        }
        None => {
            command.stdout(Stdio::piped());
        }
    }

    debug!(program = %cmd.program, args = ?cmd.args, dir = %cmd.work_dir.display(), "spawning tool");
    let start = Instant::now();
    let child = command.spawn().map_err(|source| ToolError::Spawn {
        program: cmd.program.clone(),
        source,
    })?;

    let mut guard = ChildGuard::new(child);
    let relays = guard.relay_output(&cmd.program);
    let waited = guard.wait();

    // A background process started by the tool can inherit its pipes and
    // keep them open after the tool itself has exited.
    relays.finish(&cmd.program, RELAY_GRACE);

    let status = waited.map_err(io_err)?;
    let elapsed = start.elapsed();
    debug!(program = %cmd.program, %status, ?elapsed, "tool exited");

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(ToolError::Failed {
            program: cmd.program.clone(),
            code,
        }),
        None => Err(ToolError::Terminated {
            program: cmd.program.clone(),
        }),
    }
}

/// Owns a running child and reaps it on every exit path.
///
/// Dropping the guard before [`ChildGuard::wait`] succeeded kills the child
/// and waits for it, so no process outlives a failed tool call.
struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// Start one reader thread per piped stream.
    fn relay_output(&mut self, program: &str) -> Relays {
        let (tx, done) = mpsc::channel();
        let mut handles = Vec::with_capacity(2);
        let Some(child) = self.child.as_mut() else {
            return Relays { handles, done };
        };

        if let Some(stdout) = child.stdout.take() {
            let program = program.to_string();
            let tx = tx.clone();
            handles.push(std::thread::spawn(move || {
                relay_lines(stdout, |line| info!(program = %program, "{line}"));
                let _ = tx.send(());
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            let program = program.to_string();
            let tx = tx.clone();
            handles.push(std::thread::spawn(move || {
                relay_lines(stderr, |line| warn!(program = %program, "{line}"));
                let _ = tx.send(());
            }));
        }
        Relays { handles, done }
    }

    fn wait(mut self) -> io::Result<ExitStatus> {
        let Some(child) = self.child.as_mut() else {
            return Err(io::Error::other("child already reaped"));
        };
        let status = child.wait()?;
        self.child = None;
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Reader threads for a child's piped streams.
///
/// Each thread signals `done` when its stream reaches EOF.
struct Relays {
    handles: Vec<JoinHandle<()>>,
    done: Receiver<()>,
}

impl Relays {
    /// Wait up to `grace` for the relays to drain, then detach the rest.
    ///
    /// Returns `true` when every relay finished and was joined.
    fn finish(self, program: &str, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        let mut pending = self.handles.len();
        while pending > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.done.recv_timeout(left) {
                Ok(()) => pending -= 1,
                Err(_) => break,
            }
        }

        if pending > 0 {
            debug!(program, pending, "output still held open after exit; detaching relays");
            return false;
        }
        for handle in self.handles {
            let _ = handle.join();
        }
        true
    }
}

/// Emit each line of `stream`, decoding invalid UTF-8 lossily.
///
/// The stream is read to EOF even after a read error so the writer never
/// sees its pipe close early.
fn relay_lines(stream: impl Read, mut emit: impl FnMut(&str)) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                emit(line.trim_end_matches(['\n', '\r']));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => {
                let _ = io::copy(&mut reader, &mut io::sink());
                return;
            }
        }
    }
}
