//! Session state machine that streams frames to a cube over a [`SerialChannel`].

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use log::{debug, info, warn};

use super::channel::{ChannelOpener, SerialChannel};
use super::protocol::{CLOSE_MARKER, MARKER_LEN, OPEN_MARKER, PACKET_LEN, frame_packet};
use super::timer::CancellableTimer;
use crate::schema::StreamConfig;
use crate::voxel::Frame;

/// Lifecycle of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Opening,
    Streaming,
    Closing,
    /// Last session aborted. A new session may be started from here.
    Failed,
}

impl SessionState {
    /// True while a session owns the wire.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Opening | SessionState::Streaming | SessionState::Closing
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Opening => "opening",
            SessionState::Streaming => "streaming",
            SessionState::Closing => "closing",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Streaming errors. The variant identifies the phase that failed.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Failed to open channel '{descriptor}': {source}")]
    Open {
        descriptor: String,
        source: io::Error,
    },
    #[error("Failed to write open marker: {0}")]
    OpenMarker(#[source] io::Error),
    #[error("Failed to write frame {index}: {source}")]
    Frame { index: usize, source: io::Error },
    #[error("Failed to write close marker: {0}")]
    CloseMarker(#[source] io::Error),
    #[error("Failed to close channel: {0}")]
    Close(#[source] io::Error),
    #[error("A session is already in progress ({state})")]
    SessionActive { state: SessionState },
    #[error("No channel is connected")]
    NotConnected,
    #[error("No session is streaming ({state})")]
    NotStreaming { state: SessionState },
    #[error("Session cancelled after {frames_sent} frames")]
    Cancelled { frames_sent: usize },
}

/// Summary of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    /// Frame packets written.
    pub frames_sent: usize,
    /// Total bytes written, markers included.
    pub bytes_written: usize,
}

impl fmt::Display for StreamReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames streamed, {} bytes on the wire",
            self.frames_sent, self.bytes_written
        )
    }
}

/// Streams animations to one connection, one session at a time.
///
/// A session is `begin` (open marker), one `send_frame` per frame (packet then
/// inter-frame delay), and `finish` (close marker). Any write failure or
/// cancellation moves the session to [`SessionState::Failed`] and nothing further is
/// written; in particular the close marker is only sent after every frame went out.
///
/// Usage:
/// ```ignore
/// let mut streamer = DeviceStreamer::new(&config);
/// streamer.connect(&FileChannelOpener, &config)?;
/// let report = streamer.stream(&animation.snapshot())?;
/// ```
pub struct DeviceStreamer {
    channel: Option<Box<dyn SerialChannel>>,
    state: SessionState,
    frame_delay: Duration,
    timer: CancellableTimer,
    frames_sent: usize,
    bytes_written: usize,
}

impl fmt::Debug for DeviceStreamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceStreamer")
            .field("connected", &self.channel.is_some())
            .field("state", &self.state)
            .field("frame_delay", &self.frame_delay)
            .field("frames_sent", &self.frames_sent)
            .finish()
    }
}

impl DeviceStreamer {
    /// Create an unconnected streamer using the config's (floor-clamped) frame delay.
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            channel: None,
            state: SessionState::Idle,
            frame_delay: config.effective_delay(),
            timer: CancellableTimer::new(),
            frames_sent: 0,
            bytes_written: 0,
        }
    }

    /// Create a streamer bound to an already open channel.
    pub fn with_channel<C: SerialChannel + 'static>(config: &StreamConfig, channel: C) -> Self {
        let mut streamer = Self::new(config);
        streamer.channel = Some(Box::new(channel));
        streamer
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Frames written in the current or last session.
    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    /// Change the inter-frame delay; values below the floor are raised to it.
    pub fn set_frame_delay_ms(&mut self, ms: u64) {
        self.frame_delay = StreamConfig::clamp_delay(ms);
    }

    /// Get cancellation handle. Raising it stops the running session, or the next one
    /// if raised while idle. The flag is cleared when a session ends.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.timer.cancel_handle()
    }

    /// Open a channel through `opener`, replacing any idle one.
    ///
    /// A failure to close the previous channel is logged and does not prevent the new
    /// one from opening.
    pub fn connect(
        &mut self,
        opener: &dyn ChannelOpener,
        config: &StreamConfig,
    ) -> Result<(), StreamError> {
        if self.state.is_active() {
            return Err(StreamError::SessionActive { state: self.state });
        }
        if let Some(mut previous) = self.channel.take()
            && let Err(e) = previous.close()
        {
            warn!("closing previous channel failed: {e}");
        }
        let channel = opener
            .open(&config.descriptor, config.baud)
            .map_err(|source| StreamError::Open {
                descriptor: config.descriptor.clone(),
                source,
            })?;
        info!("connected to {} at {} baud", config.descriptor, config.baud);
        self.channel = Some(channel);
        Ok(())
    }

    /// Close and drop the channel. Refused while a session is active.
    pub fn disconnect(&mut self) -> Result<(), StreamError> {
        if self.state.is_active() {
            return Err(StreamError::SessionActive { state: self.state });
        }
        match self.channel.take() {
            Some(mut channel) => channel.close().map_err(StreamError::Close),
            None => Ok(()),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no channel"))?;
        channel.write(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    fn fail(&mut self, err: StreamError) -> StreamError {
        warn!("streaming session failed: {err}");
        self.timer.reset();
        self.state = SessionState::Failed;
        err
    }

    /// Start a session by writing the open marker.
    ///
    /// Allowed from `Idle` or `Failed`. A cancel request raised before this call stops
    /// the session at its first frame.
    pub fn begin(&mut self) -> Result<(), StreamError> {
        if self.state.is_active() {
            return Err(StreamError::SessionActive { state: self.state });
        }
        if self.channel.is_none() {
            return Err(StreamError::NotConnected);
        }

        self.frames_sent = 0;
        self.bytes_written = 0;
        self.state = SessionState::Opening;

        if let Err(e) = self.write(&OPEN_MARKER) {
            return Err(self.fail(StreamError::OpenMarker(e)));
        }
        debug!("open marker sent ({MARKER_LEN} bytes)");
        self.state = SessionState::Streaming;
        Ok(())
    }

    /// Write one frame packet, then wait the inter-frame delay.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), StreamError> {
        if self.state != SessionState::Streaming {
            return Err(StreamError::NotStreaming { state: self.state });
        }
        if self.timer.is_cancelled() {
            let frames_sent = self.frames_sent;
            return Err(self.fail(StreamError::Cancelled { frames_sent }));
        }

        let index = self.frames_sent;
        if let Err(source) = self.write(&frame_packet(frame)) {
            return Err(self.fail(StreamError::Frame { index, source }));
        }
        self.frames_sent += 1;
        debug!("frame {index} sent ({PACKET_LEN} bytes)");

        if !self.timer.sleep(self.frame_delay) {
            let frames_sent = self.frames_sent;
            return Err(self.fail(StreamError::Cancelled { frames_sent }));
        }
        Ok(())
    }

    /// End the session by writing the close marker.
    pub fn finish(&mut self) -> Result<StreamReport, StreamError> {
        if self.state != SessionState::Streaming {
            return Err(StreamError::NotStreaming { state: self.state });
        }
        self.state = SessionState::Closing;
        if let Err(e) = self.write(&CLOSE_MARKER) {
            return Err(self.fail(StreamError::CloseMarker(e)));
        }
        self.state = SessionState::Idle;
        self.timer.reset();

        let report = StreamReport {
            frames_sent: self.frames_sent,
            bytes_written: self.bytes_written,
        };
        info!("session complete: {report}");
        Ok(report)
    }

    /// Run a whole session over `frames`.
    ///
    /// Succeeds only once the close marker has been written.
    pub fn stream(&mut self, frames: &[Frame]) -> Result<StreamReport, StreamError> {
        info!(
            "streaming {} frames with {} ms delay",
            frames.len(),
            self.frame_delay.as_millis()
        );
        self.begin()?;
        for frame in frames {
            self.send_frame(frame)?;
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::channel::{MemoryChannel, MemoryChannelOpener};
    use crate::device::protocol::{CLOSE_BYTE, FRAME_HEADER, OPEN_BYTE, session_len};
    use std::sync::atomic::Ordering;
    use std::thread;

    fn fast_config() -> StreamConfig {
        StreamConfig {
            frame_delay_ms: 0,
            ..Default::default()
        }
    }

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| {
                let cells: Vec<u8> = (0..64).map(|c| (c + i * 7) as u8).collect();
                Frame::from_cells(&cells)
            })
            .collect()
    }

    #[test]
    fn test_successful_session_wire_shape() {
        let probe = MemoryChannel::new();
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());
        let anim = frames(3);

        let report = streamer.stream(&anim).unwrap();
        assert_eq!(report.frames_sent, 3);
        assert_eq!(report.bytes_written, session_len(3));
        assert_eq!(streamer.state(), SessionState::Idle);

        let writes = probe.writes();
        assert_eq!(writes.len(), 5);
        assert_eq!(writes[0].len(), 70);
        assert!(writes[0].iter().all(|&b| b == OPEN_BYTE));
        for (packet, frame) in writes[1..4].iter().zip(&anim) {
            assert_eq!(packet.len(), 65);
            assert_eq!(packet[0], FRAME_HEADER);
            assert_eq!(&packet[1..], frame.cells());
        }
        assert_eq!(writes[4].len(), 70);
        assert!(writes[4].iter().all(|&b| b == CLOSE_BYTE));
        assert_eq!(probe.bytes().len(), 70 + 65 * 3 + 70);
    }

    #[test]
    fn test_empty_animation_sends_only_markers() {
        let probe = MemoryChannel::new();
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());
        let report = streamer.stream(&[]).unwrap();
        assert_eq!(report.frames_sent, 0);
        assert_eq!(probe.write_count(), 2);
    }

    #[test]
    fn test_failure_on_packet_k() {
        for k in 1..=4 {
            // Write 1 is the open marker, so packet k is write k + 1
            let probe = MemoryChannel::new().failing_on_write(k + 1);
            let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());

            let err = streamer.stream(&frames(4)).unwrap_err();
            assert!(
                matches!(err, StreamError::Frame { index, .. } if index == k - 1),
                "k={k}: {err}"
            );
            assert_eq!(streamer.state(), SessionState::Failed);

            let writes = probe.writes();
            assert_eq!(writes.len(), k, "open marker + {} packets", k - 1);
            assert!(writes[1..].iter().all(|w| w.len() == 65));
            assert!(!writes.iter().any(|w| w.first() == Some(&CLOSE_BYTE)));
        }
    }

    #[test]
    fn test_open_marker_failure_sends_nothing_else() {
        let probe = MemoryChannel::new().failing_on_write(1);
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());
        let err = streamer.stream(&frames(2)).unwrap_err();
        assert!(matches!(err, StreamError::OpenMarker(_)));
        assert_eq!(streamer.state(), SessionState::Failed);
        assert_eq!(probe.write_count(), 0);
    }

    #[test]
    fn test_close_marker_failure_is_not_success() {
        let probe = MemoryChannel::new().failing_on_write(4);
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());
        let err = streamer.stream(&frames(2)).unwrap_err();
        assert!(matches!(err, StreamError::CloseMarker(_)));
        assert_eq!(streamer.state(), SessionState::Failed);
        assert_eq!(probe.write_count(), 3);
    }

    #[test]
    fn test_second_begin_rejected_without_writes() {
        let probe = MemoryChannel::new();
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());

        streamer.begin().unwrap();
        assert_eq!(streamer.state(), SessionState::Streaming);
        assert_eq!(probe.write_count(), 1);

        let err = streamer.begin().unwrap_err();
        assert!(matches!(
            err,
            StreamError::SessionActive {
                state: SessionState::Streaming
            }
        ));
        assert_eq!(probe.write_count(), 1);
        assert_eq!(streamer.state(), SessionState::Streaming);

        // Connection changes are refused mid-session too
        assert!(streamer.disconnect().is_err());
        assert!(streamer.is_connected());
    }

    #[test]
    fn test_not_connected_and_not_streaming() {
        let mut streamer = DeviceStreamer::new(&fast_config());
        assert!(matches!(streamer.begin(), Err(StreamError::NotConnected)));
        assert_eq!(streamer.state(), SessionState::Idle);

        assert!(matches!(
            streamer.send_frame(&Frame::blank()),
            Err(StreamError::NotStreaming { .. })
        ));
        assert!(matches!(
            streamer.finish(),
            Err(StreamError::NotStreaming { .. })
        ));
    }

    #[test]
    fn test_restart_after_failure() {
        let broken = MemoryChannel::new().failing_on_write(2);
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), broken);
        assert!(streamer.stream(&frames(2)).is_err());
        assert_eq!(streamer.state(), SessionState::Failed);

        let healthy = MemoryChannel::new();
        let opener = MemoryChannelOpener::new(healthy.clone());
        streamer.connect(&opener, &fast_config()).unwrap();

        let report = streamer.stream(&frames(2)).unwrap();
        assert_eq!(report.frames_sent, 2);
        assert_eq!(healthy.write_count(), 4);
    }

    #[test]
    fn test_cancel_before_packet() {
        let probe = MemoryChannel::new();
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());
        streamer.begin().unwrap();

        streamer.cancel_handle().store(true, Ordering::Release);
        let err = streamer.send_frame(&Frame::blank()).unwrap_err();
        assert!(matches!(err, StreamError::Cancelled { frames_sent: 0 }));
        assert_eq!(streamer.state(), SessionState::Failed);
        assert_eq!(probe.write_count(), 1);
    }

    #[test]
    fn test_cancel_raised_before_stream_is_honoured() {
        let probe = MemoryChannel::new();
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), probe.clone());
        streamer.cancel_handle().store(true, Ordering::Release);

        let err = streamer.stream(&frames(3)).unwrap_err();
        assert!(matches!(err, StreamError::Cancelled { frames_sent: 0 }));
        assert_eq!(streamer.state(), SessionState::Failed);
        assert_eq!(probe.write_count(), 1);

        // The request is consumed by the session it stopped
        assert!(!streamer.cancel_handle().load(Ordering::Acquire));
        assert_eq!(streamer.stream(&frames(3)).unwrap().frames_sent, 3);
    }

    #[test]
    fn test_connect_replaces_channel_whose_close_fails() {
        let stale = MemoryChannel::new().failing_on_close();
        let mut streamer = DeviceStreamer::with_channel(&fast_config(), stale.clone());

        let fresh = MemoryChannel::new();
        streamer
            .connect(&MemoryChannelOpener::new(fresh.clone()), &fast_config())
            .unwrap();
        assert!(stale.is_closed());
        assert!(streamer.is_connected());

        streamer.stream(&frames(1)).unwrap();
        assert_eq!(fresh.write_count(), 3);
        assert_eq!(stale.write_count(), 0);
    }

    #[test]
    fn test_cancel_during_delay_skips_close_marker() {
        let probe = MemoryChannel::new();
        let config = StreamConfig {
            frame_delay_ms: 400,
            ..Default::default()
        };
        let mut streamer = DeviceStreamer::with_channel(&config, probe.clone());
        let cancel = streamer.cancel_handle();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            cancel.store(true, Ordering::Release);
        });

        let err = streamer.stream(&frames(10)).unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, StreamError::Cancelled { frames_sent: 1 }));
        assert_eq!(streamer.state(), SessionState::Failed);
        let writes = probe.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|w| w[0] != CLOSE_BYTE));
    }

    #[test]
    fn test_delay_floor() {
        let mut streamer = DeviceStreamer::new(&fast_config());
        assert_eq!(
            streamer.frame_delay(),
            Duration::from_millis(crate::schema::MIN_FRAME_DELAY_MS)
        );
        streamer.set_frame_delay_ms(250);
        assert_eq!(streamer.frame_delay(), Duration::from_millis(250));
    }
}
