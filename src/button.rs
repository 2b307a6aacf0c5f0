//! Physical buttons and clickpad soft-button emulation.
//!
//! Traditional touchpads expose several physical buttons; their state is
//! edge-detected from the wire bitmask and reported verbatim. Clickpads have
//! a single physical button under the pad, so a press is reinterpreted based
//! on where the pressing finger sits: inside the configured right-edge
//! rectangle it becomes a right click, everywhere else a left click.
//!
//! The emulation runs one state machine per touch. Entering or leaving a
//! button area only takes effect after a debounce timer so a finger
//! wobbling across the boundary does not flip the active button, and the
//! button code chosen at press time is remembered so the release always
//! matches it.

use tracing::{error, trace};

use crate::event::{codes, TouchpadHandler};
use crate::touch::{Touch, TouchState, Touches};
use crate::touchpad::{QueuedEvents, Timers};

/// Per-touch soft-button state.
///
/// `*New` states debounce entering a button area from a fresh touch,
/// `*To*` states debounce moving between areas. `Pressed*` latches the
/// emitted button for the duration of a physical press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ButtonState {
    None,
    Area,
    Left,
    LeftNew,
    Right,
    RightNew,
    LeftToArea,
    RightToArea,
    LeftToRight,
    RightToLeft,
    PressedRight,
    PressedLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ButtonEvent {
    InRight,
    InLeft,
    InArea,
    Up,
    Press,
    Release,
    Timeout,
}

/// Soft-button region and debounce configuration, in device coordinates.
#[derive(Debug, Clone)]
pub(crate) struct ButtonConfig {
    pub top: i32,
    pub bottom: i32,
    /// Left and right edge of the right-button rectangle.
    pub right: [i32; 2],
    pub enter_timeout: u64,
    pub leave_timeout: u64,
}

pub(crate) const DEFAULT_ENTER_TIMEOUT: u64 = 100;
pub(crate) const DEFAULT_LEAVE_TIMEOUT: u64 = 300;

impl Default for ButtonConfig {
    fn default() -> Self {
        ButtonConfig {
            top: 0,
            bottom: 0,
            right: [0, 0],
            enter_timeout: DEFAULT_ENTER_TIMEOUT,
            leave_timeout: DEFAULT_LEAVE_TIMEOUT,
        }
    }
}

/// How button state is turned into events, fixed at device probe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ButtonPolicy {
    /// Single physical button, right click emulated by location.
    Clickpad,
    /// Real buttons, reported as-is.
    Traditional,
}

#[derive(Debug)]
pub(crate) struct Buttons {
    pub config: ButtonConfig,
    pub policy: ButtonPolicy,

    /// Current physical button bitmask, bit k for `BTN_LEFT + k`.
    pub state: u32,
    /// Bitmask as of the previous report.
    pub old_state: u32,

    /// Button code emitted at press time, replayed on release in case the
    /// finger wandered to a different area in between.
    active_softbutton: u32,
}

impl Buttons {
    pub fn new(policy: ButtonPolicy) -> Self {
        Buttons {
            config: ButtonConfig::default(),
            policy,
            state: 0,
            old_state: 0,
            active_softbutton: codes::BTN_LEFT as u32,
        }
    }

    fn is_inside_button_area(&self, t: &Touch) -> bool {
        t.y >= self.config.top && t.y <= self.config.bottom
    }

    fn is_inside_right_area(&self, t: &Touch) -> bool {
        self.is_inside_button_area(t) && t.x >= self.config.right[0] && t.x <= self.config.right[1]
    }

    fn is_inside_left_area(&self, t: &Touch) -> bool {
        self.is_inside_button_area(t) && !self.is_inside_right_area(t)
    }

    /// Whether `t` qualifies for the pointer role under this policy.
    pub fn select_pointer_touch(&self, t: &Touch) -> bool {
        match self.policy {
            ButtonPolicy::Clickpad => t.button_state == ButtonState::Area,
            ButtonPolicy::Traditional => t.state != TouchState::None,
        }
    }

    /// Run the per-report button processing and emit button events.
    pub fn handle_state<H: TouchpadHandler>(
        &mut self,
        touches: &mut Touches,
        queued: QueuedEvents,
        ms: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        match self.policy {
            ButtonPolicy::Clickpad => self.handle_clickpad_state(touches, queued, ms, timers, handler),
            ButtonPolicy::Traditional => self.handle_phys_state(handler),
        }
    }

    /// Fire expired debounce timers; returns the next pending expiry or 0.
    pub fn handle_timeout<H: TouchpadHandler>(
        &mut self,
        touches: &mut Touches,
        now: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) -> u64 {
        if self.policy == ButtonPolicy::Traditional {
            return 0;
        }

        let mut min_timeout = u64::MAX;
        for i in 0..touches.ntouches() {
            let expiry = touches.get(i).button_timeout;
            if expiry != 0 && expiry <= now {
                let t = touches.get_mut(i);
                t.button_timeout = 0;
                self.handle_softbutton_event(t, ButtonEvent::Timeout, now, timers, handler);
            }
            let expiry = touches.get(i).button_timeout;
            if expiry != 0 {
                min_timeout = min_timeout.min(expiry);
            }
        }

        if min_timeout == u64::MAX {
            0
        } else {
            min_timeout
        }
    }

    fn handle_clickpad_state<H: TouchpadHandler>(
        &mut self,
        touches: &mut Touches,
        queued: QueuedEvents,
        ms: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        let mut button = codes::BTN_LEFT as u32;

        for i in 0..touches.ntouches() {
            if touches.get(i).state == TouchState::None {
                continue;
            }

            if touches.get(i).state == TouchState::End {
                let t = touches.get_mut(i);
                self.handle_softbutton_event(t, ButtonEvent::Up, ms, timers, handler);
            } else if touches.get(i).dirty {
                let event = if self.is_inside_right_area(touches.get(i)) {
                    ButtonEvent::InRight
                } else if self.is_inside_left_area(touches.get(i)) {
                    ButtonEvent::InLeft
                } else {
                    ButtonEvent::InArea
                };
                let t = touches.get_mut(i);
                self.handle_softbutton_event(t, event, ms, timers, handler);
            }

            if queued.contains(QueuedEvents::BUTTON_RELEASE) {
                let t = touches.get_mut(i);
                self.handle_softbutton_event(t, ButtonEvent::Release, ms, timers, handler);
            }
            if queued.contains(QueuedEvents::BUTTON_PRESS) {
                let t = touches.get_mut(i);
                self.handle_softbutton_event(t, ButtonEvent::Press, ms, timers, handler);
            }

            // A finger resting on the right-click area qualifies the click
            // as a right click even when another finger does the pressing,
            // so the button is picked after all touches have been fed.
            if touches.get(i).button_state == ButtonState::PressedRight {
                button = codes::BTN_RIGHT as u32;
            }
        }

        if queued.contains(QueuedEvents::BUTTON_RELEASE) {
            handler.button(self.active_softbutton, false);
        }
        if queued.contains(QueuedEvents::BUTTON_PRESS) {
            handler.button(button, true);
            self.active_softbutton = button;
        }
    }

    /// Edge-detect the wire bitmask and report every changed bit.
    fn handle_phys_state<H: TouchpadHandler>(&mut self, handler: &mut H) {
        let mut current = self.state;
        let mut old = self.old_state;
        let mut shift = 0u32;

        while current != 0 || old != 0 {
            if (current ^ old) & 0x1 != 0 {
                handler.button(codes::BTN_LEFT as u32 + shift, current & 0x1 != 0);
            }
            shift += 1;
            current >>= 1;
            old >>= 1;
        }

        self.old_state = self.state;
    }

    fn set_enter_timer<H: TouchpadHandler>(
        &self,
        t: &mut Touch,
        ms: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        t.button_timeout = ms + self.config.enter_timeout;
        timers.request(handler, ms, self.config.enter_timeout);
    }

    fn set_leave_timer<H: TouchpadHandler>(
        &self,
        t: &mut Touch,
        ms: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        t.button_timeout = ms + self.config.leave_timeout;
        timers.request(handler, ms, self.config.leave_timeout);
    }

    fn clear_timer(&self, t: &mut Touch) {
        t.button_timeout = 0;
    }

    fn handle_softbutton_event<H: TouchpadHandler>(
        &self,
        t: &mut Touch,
        event: ButtonEvent,
        ms: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        use ButtonEvent as E;
        use ButtonState as S;

        let from = t.button_state;

        // These states never hold a timer across further events.
        if matches!(
            from,
            S::Area | S::Left | S::Right | S::PressedLeft | S::PressedRight
        ) {
            self.clear_timer(t);
        }

        match (from, event) {
            (S::None, E::InRight) => {
                t.button_state = S::RightNew;
                self.set_enter_timer(t, ms, timers, handler);
            }
            (S::None, E::InLeft) => {
                t.button_state = S::LeftNew;
                self.set_enter_timer(t, ms, timers, handler);
            }
            (S::None, E::InArea) => t.button_state = S::Area,
            (S::None, E::Up) => {}

            (S::Area, E::InRight | E::InLeft | E::InArea) => {}
            (S::Area, E::Up) => t.button_state = S::None,
            (S::Area, E::Press) => t.button_state = S::PressedLeft,

            (S::Left, E::InRight) => {
                t.button_state = S::LeftToRight;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::Left, E::InLeft) => {}
            (S::Left, E::InArea) => {
                t.button_state = S::LeftToArea;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::Left, E::Up) => t.button_state = S::None,
            (S::Left, E::Press) => t.button_state = S::PressedLeft,

            (S::LeftNew, E::InRight) => {
                t.button_state = S::RightNew;
                self.set_enter_timer(t, ms, timers, handler);
            }
            (S::LeftNew, E::InLeft) => {}
            (S::LeftNew, E::InArea) => {
                t.button_state = S::LeftToArea;
                self.clear_timer(t);
            }
            (S::LeftNew, E::Up) => {
                t.button_state = S::None;
                self.clear_timer(t);
            }
            (S::LeftNew, E::Press) => {
                t.button_state = S::PressedLeft;
                self.clear_timer(t);
            }
            (S::LeftNew, E::Timeout) => t.button_state = S::Left,

            (S::Right, E::InRight) => {}
            (S::Right, E::InLeft) => {
                t.button_state = S::RightToLeft;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::Right, E::InArea) => {
                t.button_state = S::RightToArea;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::Right, E::Up) => t.button_state = S::None,
            (S::Right, E::Press) => t.button_state = S::PressedRight,

            (S::RightNew, E::InRight) => {}
            (S::RightNew, E::InLeft) => {
                t.button_state = S::LeftNew;
                self.set_enter_timer(t, ms, timers, handler);
            }
            (S::RightNew, E::InArea) => {
                t.button_state = S::Area;
                self.clear_timer(t);
            }
            (S::RightNew, E::Up) => {
                t.button_state = S::None;
                self.clear_timer(t);
            }
            (S::RightNew, E::Press) => {
                t.button_state = S::PressedRight;
                self.clear_timer(t);
            }
            (S::RightNew, E::Timeout) => t.button_state = S::Right,

            (S::LeftToArea, E::InRight) => {
                t.button_state = S::LeftToRight;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::LeftToArea, E::InLeft) => {
                t.button_state = S::Left;
                self.clear_timer(t);
            }
            (S::LeftToArea, E::InArea) => {}
            (S::LeftToArea, E::Up) => {
                t.button_state = S::None;
                self.clear_timer(t);
            }
            (S::LeftToArea, E::Press) => {
                t.button_state = S::PressedLeft;
                self.clear_timer(t);
            }
            (S::LeftToArea, E::Timeout) => t.button_state = S::Area,

            (S::RightToArea, E::InRight) => {
                t.button_state = S::Right;
                self.clear_timer(t);
            }
            (S::RightToArea, E::InLeft) => {
                t.button_state = S::RightToLeft;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::RightToArea, E::InArea) => {}
            (S::RightToArea, E::Up) => {
                t.button_state = S::None;
                self.clear_timer(t);
            }
            (S::RightToArea, E::Press) => {
                t.button_state = S::PressedRight;
                self.clear_timer(t);
            }
            (S::RightToArea, E::Timeout) => t.button_state = S::Area,

            (S::LeftToRight, E::InRight) => {}
            (S::LeftToRight, E::InLeft) => {
                t.button_state = S::Left;
                self.clear_timer(t);
            }
            (S::LeftToRight, E::InArea) => {
                t.button_state = S::LeftToArea;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::LeftToRight, E::Up) => {
                t.button_state = S::None;
                self.clear_timer(t);
            }
            (S::LeftToRight, E::Press) => {
                t.button_state = S::PressedLeft;
                self.clear_timer(t);
            }
            (S::LeftToRight, E::Timeout) => t.button_state = S::Right,

            (S::RightToLeft, E::InRight) => {
                t.button_state = S::Right;
                self.clear_timer(t);
            }
            (S::RightToLeft, E::InLeft) => {}
            (S::RightToLeft, E::InArea) => {
                t.button_state = S::RightToArea;
                self.set_leave_timer(t, ms, timers, handler);
            }
            (S::RightToLeft, E::Up) => {
                t.button_state = S::None;
                self.clear_timer(t);
            }
            (S::RightToLeft, E::Press) => {
                t.button_state = S::PressedRight;
                self.clear_timer(t);
            }
            (S::RightToLeft, E::Timeout) => t.button_state = S::Left,

            (S::PressedLeft | S::PressedRight, E::Release) => t.button_state = S::None,
            (S::PressedLeft | S::PressedRight, _) => {}

            (_, _) => {
                error!(state = ?from, ?event, "ignoring soft-button event this state cannot accept");
            }
        }

        if t.button_state != from {
            trace!(touch = t.number, from = ?from, ?event, to = ?t.button_state, "soft-button transition");
        }
    }
}
