//! Bounded in-process byte pipe between two threads.
//!
//! The writer half sends chunks over a bounded channel, so a producer can
//! run at most [`PIPE_DEPTH`] chunks ahead of its consumer. Closing either
//! half is observed by the other:
//! - writer dropped → reader sees end of stream
//! - writer closed with an error → reader returns that error, on every read
//! - reader dropped → every later write fails with `BrokenPipe`

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};

/// Chunks buffered between writer and reader.
pub const PIPE_DEPTH: usize = 4;

type Chunk = io::Result<Vec<u8>>;

/// Create a connected writer/reader pair.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::sync_channel(PIPE_DEPTH);
    (
        PipeWriter { tx },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
            failed: None,
            done: false,
        },
    )
}

/// Producer half.
#[derive(Debug)]
pub struct PipeWriter {
    tx: SyncSender<Chunk>,
}

impl PipeWriter {
    /// Close the pipe so the reader fails with `err` instead of seeing EOF.
    pub fn close_with_error(self, err: io::Error) {
        // The reader may already be gone; nobody is left to tell.
        let _ = self.tx.send(Err(err));
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(Ok(buf.to_vec()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<Chunk>,
    chunk: Vec<u8>,
    pos: usize,
    failed: Option<(io::ErrorKind, String)>,
    done: bool,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.pos < self.chunk.len() {
                let n = buf.len().min(self.chunk.len() - self.pos);
                buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if let Some((kind, message)) = &self.failed {
                return Err(io::Error::new(*kind, message.clone()));
            }
            if self.done {
                return Ok(0);
            }
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Ok(Err(err)) => {
                    self.failed = Some((err.kind(), err.to_string()));
                    return Err(err);
                }
                Err(mpsc::RecvError) => self.done = true,
            }
        }
    }
}
