//! Serial channel abstraction.
//!
//! The streamer depends only on `open`, `write` and `close`; how a port is found or
//! configured is up to the [`ChannelOpener`].

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

/// Byte-oriented, write-only link to a cube controller.
pub trait SerialChannel: Send {
    /// Write the whole buffer as one unit.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Release the link. Further writes fail.
    fn close(&mut self) -> io::Result<()>;
}

impl<C: SerialChannel + ?Sized> SerialChannel for Box<C> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Opens channels from a connection descriptor.
pub trait ChannelOpener {
    fn open(&self, descriptor: &str, baud: u32) -> io::Result<Box<dyn SerialChannel>>;
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "channel is closed")
}

/// Channel writing to a device node (e.g. `/dev/ttyUSB0`) opened as a file.
///
/// The line speed is not applied here; configure the port beforehand
/// (`stty -F /dev/ttyUSB0 115200 raw`).
#[derive(Debug)]
pub struct FileChannel {
    file: Option<File>,
}

impl FileChannel {
    pub fn new(file: File) -> Self {
        Self { file: Some(file) }
    }
}

impl SerialChannel for FileChannel {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(closed_error)?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Opens device nodes with [`FileChannel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FileChannelOpener;

impl ChannelOpener for FileChannelOpener {
    fn open(&self, descriptor: &str, baud: u32) -> io::Result<Box<dyn SerialChannel>> {
        let file = OpenOptions::new().write(true).open(descriptor)?;
        debug!("opened {descriptor} (expecting {baud} baud, configured externally)");
        Ok(Box::new(FileChannel::new(file)))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    writes: Vec<Vec<u8>>,
    attempts: usize,
    fail_on_write: Option<usize>,
    fail_on_close: bool,
    closed: bool,
}

/// In-memory channel recording every write, with optional failure injection.
///
/// Clones share the same record, so a clone kept by the caller can inspect what a
/// streamer wrote after the original was moved into it.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th write attempt (1-based) and every one after it.
    pub fn failing_on_write(self, n: usize) -> Self {
        self.lock().fail_on_write = Some(n);
        self
    }

    /// Fail the `close` call.
    pub fn failing_on_close(self) -> Self {
        self.lock().fail_on_close = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the record half-written.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    /// All written bytes concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().writes.concat()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl SerialChannel for MemoryChannel {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(closed_error());
        }
        state.attempts += 1;
        if state.fail_on_write.is_some_and(|n| state.attempts >= n) {
            warn!("simulated write failure on attempt {}", state.attempts);
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated write failure",
            ));
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let mut state = self.lock();
        state.closed = true;
        if state.fail_on_close {
            return Err(io::Error::other("simulated close failure"));
        }
        Ok(())
    }
}

/// Opener handing out clones of one [`MemoryChannel`].
#[derive(Debug, Clone, Default)]
pub struct MemoryChannelOpener {
    channel: MemoryChannel,
}

impl MemoryChannelOpener {
    pub fn new(channel: MemoryChannel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &MemoryChannel {
        &self.channel
    }
}

impl ChannelOpener for MemoryChannelOpener {
    fn open(&self, descriptor: &str, baud: u32) -> io::Result<Box<dyn SerialChannel>> {
        debug!("opened in-memory channel for {descriptor} at {baud} baud");
        Ok(Box::new(self.channel.clone()))
    }
}
