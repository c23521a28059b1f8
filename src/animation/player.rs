//! Paced on-host playback of an animation snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::debug;

use crate::device::CancellableTimer;
use crate::schema::PlaybackConfig;
use crate::voxel::Frame;

/// How a playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Reached the last frame (non-looping).
    Completed { frames_shown: usize },
    /// Stopped through the cancel handle.
    Stopped { frames_shown: usize },
}

/// Playback scheduler.
///
/// Owns the single "is playing" flag and the pacing timer. Each frame is handed to
/// the caller's callback, then the player waits the configured interval (never less
/// than the 50 ms floor).
///
/// Usage:
/// ```ignore
/// let mut player = Player::new(config.playback.clone());
/// let stop = player.cancel_handle();
/// let outcome = player.play(&animation.snapshot(), |index, frame| render(index, frame));
/// ```
#[derive(Debug)]
pub struct Player {
    config: PlaybackConfig,
    timer: CancellableTimer,
    playing: Arc<AtomicBool>,
    position: usize,
}

impl Player {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            timer: CancellableTimer::new(),
            playing: Arc::new(AtomicBool::new(false)),
            position: 0,
        }
    }

    /// Get cancellation handle. Raising it stops playback after the current frame, or
    /// before the first one if raised while stopped. The flag is cleared when playback ends.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.timer.cancel_handle()
    }

    /// Shared view of the "is playing" flag.
    pub fn playing_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.playing)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Index of the next frame to show.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the playhead; wrapped into `0..len`.
    pub fn seek(&mut self, index: usize, len: usize) {
        self.position = if len == 0 { 0 } else { index % len };
    }

    pub fn interval(&self) -> Duration {
        self.config.effective_interval()
    }

    /// Play `frames` from the current position, blocking until done or stopped.
    ///
    /// Non-looping playback ends after the last frame and rewinds the playhead.
    pub fn play<F>(&mut self, frames: &[Frame], mut on_frame: F) -> PlaybackOutcome
    where
        F: FnMut(usize, &Frame),
    {
        if frames.is_empty() {
            self.timer.reset();
            return PlaybackOutcome::Completed { frames_shown: 0 };
        }

        self.playing.store(true, Ordering::Release);
        let interval = self.interval();
        let mut frames_shown = 0;
        debug!(
            "playback started at frame {} ({} ms interval, looping: {})",
            self.position,
            interval.as_millis(),
            self.config.looping
        );

        if self.position >= frames.len() {
            self.position = 0;
        }

        let outcome = loop {
            if self.timer.is_cancelled() {
                break PlaybackOutcome::Stopped { frames_shown };
            }

            on_frame(self.position, &frames[self.position]);
            frames_shown += 1;

            let next = self.position + 1;
            if next >= frames.len() && !self.config.looping {
                self.position = 0;
                break PlaybackOutcome::Completed { frames_shown };
            }
            self.position = next % frames.len();

            if !self.timer.sleep(interval) {
                break PlaybackOutcome::Stopped { frames_shown };
            }
        };

        self.timer.reset();
        self.playing.store(false, Ordering::Release);
        debug!("playback ended: {outcome:?}");
        outcome
    }
}
