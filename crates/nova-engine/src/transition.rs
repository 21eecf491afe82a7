//! Frame-driven opacity fades.
//!
//! A [`Fader`] owns one controller's opacity and at most one in-flight fade.
//! The window calls [`Fader::step`] once per frame with the frame's elapsed
//! time; each step adds `dt / duration` to a normalized progress counter and
//! sets the opacity to `start + progress * (target - start)`. When progress
//! reaches 1 the opacity is set to exactly `target` and the fade ends.
//!
//! Requests that arrive while a fade is running are rejected: they are not
//! queued, and the running fade is not cancelled.
//!
//! ```
//! use nova_engine::transition::{Fader, FadeStep};
//!
//! let mut fader = Fader::new(0.0);
//! assert!(fader.begin(1.0, 0.5).is_ok());
//! assert!(fader.begin(0.0, 0.5).is_err(), "second fade is dropped");
//!
//! assert_eq!(fader.step(0.25), FadeStep::Running(0.5));
//! assert_eq!(fader.step(0.25), FadeStep::Finished(1.0));
//! assert!(!fader.is_fading());
//! ```

use serde::{Deserialize, Serialize};

/// Why a fade request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeRejected {
    /// Another fade is still running.
    AlreadyFading,
    /// The controller is not active in hierarchy.
    Inactive,
    /// Duration was zero, negative, or not finite.
    InvalidDuration,
}

/// Result of advancing a fader by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeStep {
    /// No fade in flight.
    Idle,
    /// Still fading; carries the new opacity.
    Running(f32),
    /// The fade reached its target this frame.
    Finished(f32),
}

/// An in-flight fade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fade {
    pub start: f32,
    pub target: f32,
    pub duration: f32,
    /// Normalized elapsed time, `0.0..=1.0`.
    pub progress: f32,
}

/// A controller's opacity plus its single-flight fade slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fader {
    opacity: f32,
    fade: Option<Fade>,
}

impl Fader {
    pub fn new(opacity: f32) -> Self {
        Self {
            opacity: clamp_opacity(opacity),
            fade: None,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn current_fade(&self) -> Option<&Fade> {
        self.fade.as_ref()
    }

    /// Jump straight to `opacity`, ending any running fade. Returns the fade
    /// that was cut short.
    pub fn finish_at(&mut self, opacity: f32) -> Option<Fade> {
        self.opacity = clamp_opacity(opacity);
        self.fade.take()
    }

    /// Start fading from the current opacity to `target` over `duration`
    /// seconds.
    pub fn begin(&mut self, target: f32, duration: f32) -> Result<(), FadeRejected> {
        self.begin_from(self.opacity, target, duration)
    }

    /// Like [`begin`](Self::begin), but jump to `start` first. The jump only
    /// happens if the request is accepted.
    pub fn begin_from(&mut self, start: f32, target: f32, duration: f32) -> Result<(), FadeRejected> {
        if self.fade.is_some() {
            return Err(FadeRejected::AlreadyFading);
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Err(FadeRejected::InvalidDuration);
        }
        self.opacity = clamp_opacity(start);
        self.fade = Some(Fade {
            start: self.opacity,
            target: clamp_opacity(target),
            duration,
            progress: 0.0,
        });
        Ok(())
    }

    /// Advance the running fade by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> FadeStep {
        let Some(fade) = self.fade.as_mut() else {
            return FadeStep::Idle;
        };

        fade.progress += dt.max(0.0) / fade.duration;
        if fade.progress >= 1.0 {
            self.opacity = fade.target;
            self.fade = None;
            return FadeStep::Finished(self.opacity);
        }

        self.opacity = clamp_opacity(fade.start + fade.progress * (fade.target - fade.start));
        FadeStep::Running(self.opacity)
    }
}

impl Default for Fader {
    fn default() -> Self {
        Self::new(1.0)
    }
}

fn clamp_opacity(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
