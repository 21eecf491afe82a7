//! Fixed-step frame loop driving a [`Window`].
//!
//! The host owns time. [`FrameLoop`] is the convenience driver for headless
//! hosts and tests: every [`frame`](FrameLoop::frame) calls
//! [`Window::advance`] with the configured `frame_dt`, so runs with the same
//! inputs produce the same sequence of lifecycle events and opacities.
//!
//! # Example
//!
//! ```
//! use nova_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Splash;
//! impl ViewController for Splash {}
//!
//! let mut pool = ControllerPrefabPool::new();
//! pool.register(ControllerTemplate::new("Splash", Splash));
//! let window = Window::new("main", WindowConfig::default(), pool);
//!
//! let mut frames = FrameLoop::new(window, FrameConfig::default()).unwrap();
//! let splash = frames.window_mut().present::<Splash>(true).unwrap();
//! assert_eq!(frames.window().opacity(splash), Some(0.0));
//!
//! frames.run_until_idle(600);
//! assert_eq!(frames.window().opacity(splash), Some(1.0));
//! ```

use std::time::{Duration, Instant};

use nova_core::NovaError;
use serde::{Deserialize, Serialize};

use crate::window::Window;

// ---------------------------------------------------------------------------
// FrameConfig
// ---------------------------------------------------------------------------

/// Configuration for the frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Seconds per frame. Must be positive and finite.
    pub frame_dt: f32,
}

impl Default for FrameConfig {
    /// 60 frames per second.
    fn default() -> Self {
        Self {
            frame_dt: 1.0 / 60.0,
        }
    }
}

impl FrameConfig {
    pub fn validate(&self) -> Result<(), NovaError> {
        if !(self.frame_dt.is_finite() && self.frame_dt > 0.0) {
            return Err(NovaError::InvalidConfig(format!(
                "frame_dt must be positive and finite, got {}",
                self.frame_dt
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FrameReport
// ---------------------------------------------------------------------------

/// What one call to [`Window::advance`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Frame number after advancing.
    pub frame: u64,
    /// Controllers that ran their did-load step.
    pub controllers_loaded: usize,
    /// Fades that stepped without finishing.
    pub fades_advanced: usize,
    /// Fades that reached their target.
    pub fades_completed: usize,
    /// Hook commands applied at the end of the frame.
    pub commands_applied: usize,
}

// ---------------------------------------------------------------------------
// FrameLoop
// ---------------------------------------------------------------------------

pub struct FrameLoop {
    window: Window,
    config: FrameConfig,
    frame_count: u64,
    last_report: FrameReport,
    last_frame_time: Duration,
}

impl FrameLoop {
    pub fn new(window: Window, config: FrameConfig) -> Result<Self, NovaError> {
        config.validate()?;
        Ok(Self {
            window,
            config,
            frame_count: 0,
            last_report: FrameReport::default(),
            last_frame_time: Duration::ZERO,
        })
    }

    /// Advance one frame.
    pub fn frame(&mut self) -> FrameReport {
        let start = Instant::now();
        let report = self.window.advance(self.config.frame_dt);
        self.last_frame_time = start.elapsed();
        self.frame_count += 1;
        self.last_report = report;
        report
    }

    /// Advance `count` frames.
    pub fn run_frames(&mut self, count: u64) {
        for _ in 0..count {
            self.frame();
        }
    }

    /// Advance until the window is idle, at most `max_frames` times. Returns
    /// the number of frames run, or `None` if the window was still busy.
    pub fn run_until_idle(&mut self, max_frames: u64) -> Option<u64> {
        for ran in 0..max_frames {
            if self.window.is_idle() {
                return Some(ran);
            }
            self.frame();
        }
        self.window.is_idle().then_some(max_frames)
    }

    // -- accessors ----------------------------------------------------------

    /// Frames run by this loop.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Simulated seconds, computed as `frame_count * frame_dt`.
    pub fn elapsed(&self) -> f64 {
        self.frame_count as f64 * f64::from(self.config.frame_dt)
    }

    pub fn frame_dt(&self) -> f32 {
        self.config.frame_dt
    }

    pub fn last_report(&self) -> &FrameReport {
        &self.last_report
    }

    /// Wall-clock time the last frame took.
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn into_window(self) -> Window {
        self.window
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
