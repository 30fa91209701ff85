// SPDX-License-Identifier: MIT
//
// Frontend configuration.
//
// Plain data with sensible defaults. Everything here is fixed for the life
// of a session: the frame buffer is sized from it once and never resized.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::frame::{Gradient, RenderMode, worst_case_len};
use crate::terminal::Features;

/// How stdin bytes reach the tick thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    /// `read(2)` on the tick thread, never blocking.
    #[default]
    NonBlocking,
    /// A background thread polls stdin and hands chunks over a channel.
    Threaded,
}

/// Everything a [`Frontend`](crate::frontend::Frontend) needs up front.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Pixel columns in each frame.
    pub width: usize,
    /// Pixel rows in each frame.
    pub height: usize,
    pub mode: RenderMode,
    /// Brightness ramp for [`RenderMode::Gradient`].
    pub gradient: Gradient,
    pub input: InputMode,
    pub features: Features,
    /// Target time between ticks (milliseconds). Default: 16 (~60 Hz).
    pub tick_interval_ms: u64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 400,
            mode: RenderMode::Gradient,
            gradient: Gradient::default(),
            input: InputMode::NonBlocking,
            features: Features::default(),
            tick_interval_ms: 16,
        }
    }
}

impl FrontendConfig {
    /// Check the configuration before any terminal state is touched.
    ///
    /// The gradient needs no check here: [`Gradient::new`] already refuses
    /// anything but non-empty printable ASCII.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if width or height is zero, or the pixel
    /// count or frame buffer size would overflow `usize`.
    pub fn validate(&self) -> Result<()> {
        let fits = self.width > 0
            && self.height > 0
            && self.width.checked_mul(self.height).is_some()
            && worst_case_len(self.mode, self.width, self.height).is_some();
        if !fits {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Pixels per frame the engine must supply.
    ///
    /// Only meaningful once [`validate`](Self::validate) has passed.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = FrontendConfig::default();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 400);
        assert_eq!(config.mode, RenderMode::Gradient);
        assert_eq!(config.input, InputMode::NonBlocking);
        assert_eq!(config.features, Features::ALT_SCREEN | Features::HIDE_CURSOR);
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
        assert_eq!(config.gradient.as_bytes(), Gradient::default().as_bytes());
    }

    #[test]
    fn default_validates() {
        assert!(FrontendConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_width_rejected() {
        let config = FrontendConfig {
            width: 0,
            ..FrontendConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidDimensions { width: 0, height: 400 })
        ));
    }

    #[test]
    fn zero_height_rejected() {
        let config = FrontendConfig {
            height: 0,
            ..FrontendConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overflowing_dimensions_rejected() {
        let big = 1usize << (usize::BITS / 2);
        let config = FrontendConfig {
            width: big,
            height: big,
            ..FrontendConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidDimensions { .. })
        ));
        assert_eq!(config.pixel_count(), usize::MAX);
    }

    #[test]
    fn color_buffer_overflow_rejected() {
        // Pixel count fits; 21 bytes per pixel does not.
        let config = FrontendConfig {
            width: usize::MAX / 8,
            height: 2,
            mode: RenderMode::Color,
            ..FrontendConfig::default()
        };
        assert!(config.validate().is_err());
        let gradient = FrontendConfig {
            mode: RenderMode::Gradient,
            ..config
        };
        assert!(gradient.validate().is_ok());
    }

    #[test]
    fn pixel_count() {
        let config = FrontendConfig {
            width: 4,
            height: 2,
            ..FrontendConfig::default()
        };
        assert_eq!(config.pixel_count(), 8);
    }
}
