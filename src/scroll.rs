//! Two-finger scroll recognition.
//!
//! With exactly two fingers on the pad and no physical button down, motion
//! along an enabled axis turns into scroll events. The first event of a
//! gesture requires at least one full scroll unit so that resting fingers do
//! not trigger it; once scrolling, the direction is locked and motion along
//! the other axis is ignored. The gesture terminates with a single
//! zero-unit event when the finger count changes.

use tracing::trace;

use crate::event::{ScrollDirection, TouchpadHandler};
use crate::touch::{Touch, TouchState, Touches};

bitflags::bitflags! {
    /// Enabled scroll methods, one bit per method and axis.
    ///
    /// Only the two-finger methods are acted upon; the edge bits are
    /// accepted by the configuration but currently have no recognizer
    /// behind them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScrollMethods: u32 {
        /// Edge scrolling along the y axis.
        const EDGE_VERTICAL = 0x1;
        /// Edge scrolling along the x axis.
        const EDGE_HORIZONTAL = 0x2;
        /// Two-finger scrolling along the y axis.
        const TWOFINGER_VERTICAL = 0x4;
        /// Two-finger scrolling along the x axis.
        const TWOFINGER_HORIZONTAL = 0x8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollState {
    None,
    Scrolling,
}

#[derive(Debug, Clone)]
pub(crate) struct ScrollConfig {
    pub methods: ScrollMethods,
    /// Device units per scroll unit, x axis.
    pub hdelta: i32,
    /// Device units per scroll unit, y axis.
    pub vdelta: i32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        ScrollConfig {
            methods: ScrollMethods::TWOFINGER_VERTICAL,
            hdelta: 100,
            vdelta: 100,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Scroll {
    pub config: ScrollConfig,
    state: ScrollState,
    /// Locked direction, meaningful only while scrolling.
    direction: ScrollDirection,
}

impl Scroll {
    pub fn new() -> Self {
        Scroll {
            config: ScrollConfig::default(),
            state: ScrollState::None,
            direction: ScrollDirection::Vertical,
        }
    }

    /// Run scroll detection for this report.
    ///
    /// Returns `true` when the report was consumed by a scroll gesture, in
    /// which case pointer motion must not be emitted for it. A non-zero
    /// physical button mask disables scrolling outright so that
    /// click-and-drag wins over two-finger scrolling.
    pub fn handle_state<H: TouchpadHandler>(
        &mut self,
        touches: &Touches,
        button_state: u32,
        handler: &mut H,
    ) -> bool {
        if button_state != 0 {
            return false;
        }

        if self.state != ScrollState::None {
            return self.continue_scroll(touches, handler);
        }

        if self.config.methods.contains(ScrollMethods::TWOFINGER_VERTICAL)
            && self.handle_twofinger(touches, ScrollDirection::Vertical, handler)
        {
            return true;
        }

        self.config.methods.contains(ScrollMethods::TWOFINGER_HORIZONTAL)
            && self.handle_twofinger(touches, ScrollDirection::Horizontal, handler)
    }

    /// Keep feeding the locked direction until the gesture terminates.
    fn continue_scroll<H: TouchpadHandler>(&mut self, touches: &Touches, handler: &mut H) -> bool {
        let method = match self.direction {
            ScrollDirection::Vertical => ScrollMethods::TWOFINGER_VERTICAL,
            ScrollDirection::Horizontal => ScrollMethods::TWOFINGER_HORIZONTAL,
        };

        if self.config.methods.contains(method) {
            self.handle_twofinger(touches, self.direction, handler);
        }

        true
    }

    fn handle_twofinger<H: TouchpadHandler>(
        &mut self,
        touches: &Touches,
        direction: ScrollDirection,
        handler: &mut H,
    ) -> bool {
        if touches.fingers_down != 2 {
            if self.state != ScrollState::None {
                self.state = ScrollState::None;
                trace!(?direction, "scroll terminated");
                handler.scroll(direction, 0.0);
                return true;
            }
            return false;
        }

        let mut delta: f64 = 0.0;
        for t in touches.iter() {
            if !t.dirty || t.state != TouchState::Update {
                continue;
            }

            let units = self.units(t, direction);
            if units.abs() > delta.abs() {
                delta = units;
            }
        }

        // the first event of a gesture needs a full unit of commitment
        if delta.abs() < 1.0 && self.state == ScrollState::None {
            delta = 0.0;
        }

        if delta != 0.0 {
            handler.scroll(direction, delta);
            self.state = ScrollState::Scrolling;
            self.direction = direction;
        }

        self.state == ScrollState::Scrolling
    }

    fn units(&self, t: &Touch, direction: ScrollDirection) -> f64 {
        let (dx, dy) = t.motion_to_delta();

        match direction {
            ScrollDirection::Vertical => f64::from(dy) / f64::from(self.config.vdelta),
            ScrollDirection::Horizontal => f64::from(dx) / f64::from(self.config.hdelta),
        }
    }
}
