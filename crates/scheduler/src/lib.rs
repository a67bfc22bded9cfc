use std::time::{Duration, Instant};

use pickerconfig::PickerConfig;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchedulerError {
    #[error("frame rate {0} is invalid; expected a finite value >= 0")]
    InvalidFps(f32),
}

/// Handle for one requested frame. Only the most recent token can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Asks the host for another display refresh.
pub trait RefreshSignal {
    fn request_refresh(&self);
}

impl<F: Fn()> RefreshSignal for F {
    fn request_refresh(&self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub requested: u64,
    pub cancelled: u64,
    pub fired: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    token: FrameToken,
    requested_at: Instant,
}

pub struct FrameScheduler {
    next_id: u64,
    pending: Option<Pending>,
    min_interval: Option<Duration>,
    last_fired: Option<Instant>,
    stats: FrameStats,
    signal: Option<Box<dyn RefreshSignal>>,
}

fn normalize_fps(value: Option<f32>) -> Option<f32> {
    value.and_then(|fps| if fps > 0.0 { Some(fps) } else { None })
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    /// Uncapped scheduler: a pending frame fires on the next refresh.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: None,
            min_interval: None,
            last_fired: None,
            stats: FrameStats::default(),
            signal: None,
        }
    }

    /// Caps fired frames to `fps`; zero means uncapped.
    pub fn with_fps(fps: f32) -> Result<Self, SchedulerError> {
        if !fps.is_finite() || fps < 0.0 {
            return Err(SchedulerError::InvalidFps(fps));
        }
        let mut scheduler = Self::new();
        scheduler.min_interval =
            normalize_fps(Some(fps)).map(|fps| Duration::from_secs_f32(1.0 / fps));
        Ok(scheduler)
    }

    pub fn from_config(config: &PickerConfig) -> Result<Self, SchedulerError> {
        Self::with_fps(config.fps.unwrap_or(0.0))
    }

    pub fn set_signal(&mut self, signal: Box<dyn RefreshSignal>) {
        self.signal = Some(signal);
    }

    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Registers a frame request, superseding any pending one.
    pub fn request(&mut self, now: Instant) -> FrameToken {
        if self.pending.take().is_some() {
            self.stats.cancelled += 1;
        }
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.pending = Some(Pending {
            token,
            requested_at: now,
        });
        self.stats.requested += 1;
        if let Some(signal) = self.signal.as_ref() {
            signal.request_refresh();
        }
        token
    }

    /// Drops the pending request, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) -> Option<FrameToken> {
        let cancelled = self.pending.take().map(|pending| pending.token);
        if cancelled.is_some() {
            self.stats.cancelled += 1;
        }
        cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_token(&self) -> Option<FrameToken> {
        self.pending.map(|pending| pending.token)
    }

    /// Earliest instant at which the pending frame may fire.
    pub fn next_deadline(&self) -> Option<Instant> {
        let pending = self.pending?;
        match (self.min_interval, self.last_fired) {
            (Some(interval), Some(last)) => Some((last + interval).max(pending.requested_at)),
            _ => Some(pending.requested_at),
        }
    }

    /// Called on each display refresh; returns the token that should be drawn.
    pub fn poll(&mut self, now: Instant) -> Option<FrameToken> {
        let deadline = self.next_deadline()?;
        if now < deadline {
            return None;
        }
        let pending = self.pending.take()?;
        self.last_fired = Some(now);
        self.stats.fired += 1;
        Some(pending.token)
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
