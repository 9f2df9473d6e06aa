// ABOUTME: Child process running inside a pseudo-terminal for one session
// Output and input each get a blocking thread bridged by async channels

use crate::bridge::Geometry;
use crate::server::error::ServerError;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{self, Read, Write};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Largest chunk forwarded per output frame.
pub const READ_CHUNK: usize = 8192;

/// What to run in the PTY.
#[derive(Debug, Clone)]
pub struct PtyCommand {
    pub program: String,
    pub args: Vec<String>,
    pub term: String,
    pub size: Geometry,
}

pub struct PtyProcess {
    master: Box<dyn MasterPty + Send>,
    input: mpsc::UnboundedSender<Vec<u8>>,
    child: Box<dyn Child + Send + Sync>,
}

impl PtyProcess {
    /// Spawn the command and start pumping its output.
    ///
    /// The receiver yields output chunks and ends when the PTY reaches EOF.
    pub fn spawn(
        command: &PtyCommand,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Vec<u8>>), ServerError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(pty_size(command.size))
            .map_err(|e| ServerError::PtyCreationFailed(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&command.program);
        for arg in &command.args {
            cmd.arg(arg);
        }
        cmd.env("TERM", &command.term);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ServerError::SpawnFailed(e.to_string()))?;
        // The child holds its own handle to the slave side.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| ServerError::PtyCreationFailed(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| ServerError::PtyCreationFailed(e.to_string()))?;

        let (output_tx, output_rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || pump_output(reader, output_tx));

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || pump_input(writer, input_rx));

        Ok((
            Self {
                master: pair.master,
                input: input_tx,
                child,
            },
            output_rx,
        ))
    }

    /// Queue bytes for the child. Never blocks; fails once the writer is gone.
    pub fn write_input(&self, data: &[u8]) -> Result<(), ServerError> {
        self.input
            .send(data.to_vec())
            .map_err(|_| ServerError::IoError(io::Error::from(io::ErrorKind::BrokenPipe)))
    }

    pub fn resize(&self, size: Geometry) -> Result<(), ServerError> {
        self.master
            .resize(pty_size(size))
            .map_err(|e| ServerError::PtyCreationFailed(e.to_string()))
    }

    /// Kill and reap the child. Safe to call on an exited child.
    pub fn terminate(&mut self) {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!("Child already exited: {:?}", status);
            return;
        }
        if let Err(e) = self.child.kill() {
            debug!("Failed to kill child: {}", e);
        }
        if let Err(e) = self.child.wait() {
            debug!("Failed to reap child: {}", e);
        }
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn pty_size(size: Geometry) -> PtySize {
    PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn pump_output(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                // EIO is how Linux reports the slave side closing.
                if !is_hangup(&e) {
                    warn!("PTY read error: {}", e);
                }
                break;
            }
        }
    }
}

fn pump_input(mut writer: Box<dyn Write + Send>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(data) = rx.blocking_recv() {
        let result = writer.write_all(&data).and_then(|()| writer.flush());
        if let Err(e) = result {
            if !is_hangup(&e) {
                warn!("PTY write error: {}", e);
            }
            break;
        }
    }
}

fn is_hangup(e: &io::Error) -> bool {
    const EIO: i32 = 5;
    e.kind() == io::ErrorKind::UnexpectedEof || e.raw_os_error() == Some(EIO)
}
