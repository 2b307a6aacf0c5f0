//! Runtime configuration.
//!
//! Tuning parameters are exposed as a keyed batch API: a slice of
//! `(parameter, value)` pairs is applied in order and the first invalid
//! pair aborts the batch, reporting its 1-indexed position. Pairs before
//! the failing one stay applied. The distinguished [`USE_DEFAULT`] value
//! restores the built-in default of any key.
//!
//! Soft-button edges are configured as percentages of the device
//! coordinate range. 0 and 100 map to the integer infinities rather than
//! the announced axis bounds; touchpads routinely report coordinates
//! outside their own advertised range and a button area touching the pad
//! edge has to catch those.

use crate::filter::MAX_MOTION_HISTORY_SIZE;
use crate::scroll::ScrollMethods;
use crate::touchpad::{AxisRange, Touchpad};

/// Value restoring the built-in default of any parameter.
pub const USE_DEFAULT: i32 = i32::MIN;

/// Longest accepted timeout value, in milliseconds.
const MAX_TIMEOUT: i32 = 60_000;

/// Soft-button right edge defaults, in percent: left, right, top, bottom.
const DEFAULT_RIGHT_EDGE: [i32; 4] = [50, 100, 82, 100];

/// A configurable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Tap-to-click enabled; 0 or 1.
    TapEnable,
    /// Single-tap timeout in milliseconds.
    TapTimeout,
    /// Double-tap window in milliseconds.
    TapDoubletapTimeout,
    /// Movement in device units beyond which a tap is cancelled.
    TapMoveThreshold,
    /// Enabled scroll methods, a [`ScrollMethods`] bitmask.
    ScrollMethods,
    /// Device units per vertical scroll unit.
    ScrollDeltaVertical,
    /// Device units per horizontal scroll unit.
    ScrollDeltaHorizontal,
    /// Motion history ring capacity, 1 to 10.
    MotionHistorySize,
    /// Left edge of the right-button area, percent of the x range.
    SoftButtonRightEdgeLeft,
    /// Right edge of the right-button area, percent of the x range.
    SoftButtonRightEdgeRight,
    /// Top edge of the button area, percent of the y range.
    SoftButtonRightEdgeTop,
    /// Bottom edge of the button area, percent of the y range.
    SoftButtonRightEdgeBottom,
    /// Soft-button area enter debounce in milliseconds.
    SoftButtonEnterTimeout,
    /// Soft-button area leave debounce in milliseconds.
    SoftButtonLeaveTimeout,
}

/// Why a configuration pair was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigErrorKind {
    /// The key is not known.
    #[error("unknown configuration key")]
    KeyInvalid,
    /// The value does not fit the key.
    #[error("invalid value")]
    ValueInvalid,
    /// The value exceeds the permitted range.
    #[error("value too high")]
    ValueTooHigh,
    /// The value falls below the permitted range.
    #[error("value too low")]
    ValueTooLow,
    /// The key is not supported on this device.
    #[error("not supported on this device")]
    NotSupported,
}

/// A rejected configuration batch.
///
/// Pairs before `position` were applied, the pair at `position` and
/// everything after it were not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("configuration pair #{position}: {kind}")]
pub struct ConfigError {
    /// 1-indexed position of the offending pair.
    pub position: usize,
    /// What was wrong with it.
    pub kind: ConfigErrorKind,
}

fn scale_percent(range: &AxisRange, percent: i32) -> i32 {
    match percent {
        100 => i32::MAX,
        0 => i32::MIN,
        _ => (range.span() * i64::from(percent) / 100) as i32 + range.minimum,
    }
}

fn unscale_percent(range: &AxisRange, value: i32) -> i32 {
    match value {
        i32::MAX => 100,
        i32::MIN => 0,
        _ => (f64::from(value - range.minimum) * 100.0 / range.span() as f64 + 0.5) as i32,
    }
}

fn check_timeout(value: i32) -> Result<u64, ConfigErrorKind> {
    if value < 0 {
        Err(ConfigErrorKind::ValueTooLow)
    } else if value > MAX_TIMEOUT {
        Err(ConfigErrorKind::ValueTooHigh)
    } else {
        Ok(value as u64)
    }
}

impl Touchpad {
    /// Apply a batch of configuration pairs in order.
    ///
    /// On error the returned [`ConfigError`] names the first bad pair;
    /// earlier pairs remain in effect.
    pub fn set_config(&mut self, pairs: &[(Parameter, i32)]) -> Result<(), ConfigError> {
        for (index, &(parameter, value)) in pairs.iter().enumerate() {
            self.set_parameter(parameter, value).map_err(|kind| ConfigError {
                position: index + 1,
                kind,
            })?;
        }
        Ok(())
    }

    /// Current value of one parameter.
    ///
    /// Percentage keys are mapped back from device coordinates and may be
    /// off by one percent against the value that was set.
    pub fn get_config(&self, parameter: Parameter) -> i32 {
        match parameter {
            Parameter::TapEnable => i32::from(self.tap.config.enabled),
            Parameter::TapTimeout => self.tap.config.timeout as i32,
            Parameter::TapDoubletapTimeout => self.tap.config.doubletap_timeout as i32,
            Parameter::TapMoveThreshold => self.tap.config.move_threshold,
            Parameter::ScrollMethods => self.scroll.config.methods.bits() as i32,
            Parameter::ScrollDeltaVertical => self.scroll.config.vdelta,
            Parameter::ScrollDeltaHorizontal => self.scroll.config.hdelta,
            Parameter::MotionHistorySize => self.config.motion_history_size as i32,
            Parameter::SoftButtonRightEdgeLeft => {
                unscale_percent(&self.caps.x, self.buttons.config.right[0])
            }
            Parameter::SoftButtonRightEdgeRight => {
                unscale_percent(&self.caps.x, self.buttons.config.right[1])
            }
            Parameter::SoftButtonRightEdgeTop => {
                unscale_percent(&self.caps.y, self.buttons.config.top)
            }
            Parameter::SoftButtonRightEdgeBottom => {
                unscale_percent(&self.caps.y, self.buttons.config.bottom)
            }
            Parameter::SoftButtonEnterTimeout => self.buttons.config.enter_timeout as i32,
            Parameter::SoftButtonLeaveTimeout => self.buttons.config.leave_timeout as i32,
        }
    }

    fn set_parameter(&mut self, parameter: Parameter, value: i32) -> Result<(), ConfigErrorKind> {
        use Parameter as P;

        match parameter {
            P::TapEnable => {
                self.tap.config.enabled = match value {
                    USE_DEFAULT => true,
                    0 => false,
                    1 => true,
                    _ => return Err(ConfigErrorKind::ValueInvalid),
                };
            }
            P::TapTimeout => {
                self.tap.config.timeout = match value {
                    USE_DEFAULT => crate::tap::TapConfig::default().timeout,
                    _ => check_timeout(value)?,
                };
            }
            P::TapDoubletapTimeout => {
                self.tap.config.doubletap_timeout = match value {
                    USE_DEFAULT => crate::tap::TapConfig::default().doubletap_timeout,
                    _ => check_timeout(value)?,
                };
            }
            P::TapMoveThreshold => {
                self.tap.config.move_threshold = match value {
                    USE_DEFAULT => crate::tap::TapConfig::default().move_threshold,
                    _ if value < 0 => return Err(ConfigErrorKind::ValueTooLow),
                    _ => value,
                };
            }
            P::ScrollMethods => {
                self.scroll.config.methods = match value {
                    USE_DEFAULT => crate::scroll::ScrollConfig::default().methods,
                    _ => ScrollMethods::from_bits(value as u32)
                        .ok_or(ConfigErrorKind::ValueInvalid)?,
                };
            }
            P::ScrollDeltaVertical => {
                self.scroll.config.vdelta = match value {
                    USE_DEFAULT => crate::scroll::ScrollConfig::default().vdelta,
                    _ if value <= 0 => return Err(ConfigErrorKind::ValueTooLow),
                    _ => value,
                };
            }
            P::ScrollDeltaHorizontal => {
                self.scroll.config.hdelta = match value {
                    USE_DEFAULT => crate::scroll::ScrollConfig::default().hdelta,
                    _ if value <= 0 => return Err(ConfigErrorKind::ValueTooLow),
                    _ => value,
                };
            }
            P::MotionHistorySize => {
                let size = match value {
                    USE_DEFAULT => crate::touchpad::TouchpadConfig::default().motion_history_size,
                    _ if value <= 0 => return Err(ConfigErrorKind::ValueTooLow),
                    _ if value as usize > MAX_MOTION_HISTORY_SIZE => {
                        return Err(ConfigErrorKind::ValueTooHigh)
                    }
                    _ => value as usize,
                };
                self.config.motion_history_size = size;
                // active touches keep their ring until they end; idle slots
                // adopt the new capacity right away
                for t in self.touches.iter_mut() {
                    if t.state == crate::touch::TouchState::None {
                        t.history.reset(size);
                    }
                }
            }
            P::SoftButtonRightEdgeLeft
            | P::SoftButtonRightEdgeRight
            | P::SoftButtonRightEdgeTop
            | P::SoftButtonRightEdgeBottom => return self.set_softbutton_edge(parameter, value),
            P::SoftButtonEnterTimeout => {
                self.buttons.config.enter_timeout = match value {
                    USE_DEFAULT => crate::button::DEFAULT_ENTER_TIMEOUT,
                    _ => check_timeout(value)?,
                };
            }
            P::SoftButtonLeaveTimeout => {
                self.buttons.config.leave_timeout = match value {
                    USE_DEFAULT => crate::button::DEFAULT_LEAVE_TIMEOUT,
                    _ => check_timeout(value)?,
                };
            }
        }

        Ok(())
    }

    fn set_softbutton_edge(
        &mut self,
        parameter: Parameter,
        value: i32,
    ) -> Result<(), ConfigErrorKind> {
        let (range, default) = match parameter {
            Parameter::SoftButtonRightEdgeLeft => (self.caps.x, DEFAULT_RIGHT_EDGE[0]),
            Parameter::SoftButtonRightEdgeRight => (self.caps.x, DEFAULT_RIGHT_EDGE[1]),
            Parameter::SoftButtonRightEdgeTop => (self.caps.y, DEFAULT_RIGHT_EDGE[2]),
            Parameter::SoftButtonRightEdgeBottom => (self.caps.y, DEFAULT_RIGHT_EDGE[3]),
            _ => return Err(ConfigErrorKind::KeyInvalid),
        };

        let percent = if value == USE_DEFAULT { default } else { value };
        if percent < 0 {
            return Err(ConfigErrorKind::ValueTooLow);
        }
        if percent > 100 {
            return Err(ConfigErrorKind::ValueTooHigh);
        }

        let scaled = scale_percent(&range, percent);
        match parameter {
            Parameter::SoftButtonRightEdgeLeft => self.buttons.config.right[0] = scaled,
            Parameter::SoftButtonRightEdgeRight => self.buttons.config.right[1] = scaled,
            Parameter::SoftButtonRightEdgeTop => self.buttons.config.top = scaled,
            Parameter::SoftButtonRightEdgeBottom => self.buttons.config.bottom = scaled,
            _ => {}
        }

        Ok(())
    }

    /// Place the soft-button areas at their default edges.
    pub(crate) fn apply_softbutton_defaults(&mut self) {
        for parameter in [
            Parameter::SoftButtonRightEdgeLeft,
            Parameter::SoftButtonRightEdgeRight,
            Parameter::SoftButtonRightEdgeTop,
            Parameter::SoftButtonRightEdgeBottom,
        ] {
            // defaults are in range, this cannot fail
            let _ = self.set_softbutton_edge(parameter, USE_DEFAULT);
        }
    }
}
