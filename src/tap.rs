//! Tap-to-click recognition.
//!
//! A short press and release of one, two or three fingers is turned into a
//! pair of tap events, provided the fingers release within the tap timeout
//! and move less than the move threshold. A tap immediately followed by a
//! touch-and-hold turns into a drag: the button is pressed once and held
//! until the last finger leaves the pad.
//!
//! Recognition runs as a single machine over all touches. A physical button
//! press always kills the gesture; the machine then sits dead until every
//! finger has left the pad.

use tracing::{error, trace};

use crate::event::TouchpadHandler;
use crate::touch::{Touch, TouchState, Touches};
use crate::touchpad::{QueuedEvents, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TapState {
    Idle,
    Touch,
    /// Fingers resting on the pad, gesture over, nothing to emit.
    Hold,
    /// A single tap registered, press emitted, release pending.
    Tapped,
    Touch2,
    Touch2Hold,
    Touch3,
    Touch3Hold,
    /// A finger came back within the double-tap window; could become a
    /// second tap or a drag.
    DraggingOrDoubletap,
    Dragging,
    /// Drag-lock window after the dragging finger lifted.
    DraggingWait,
    Dragging2,
    /// Finger count exceeded or physical button interfered.
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TapEvent {
    Touch,
    Motion,
    Release,
    Button,
    Timeout,
}

#[derive(Debug, Clone)]
pub(crate) struct TapConfig {
    pub enabled: bool,
    /// Single-tap timeout in milliseconds.
    pub timeout: u64,
    /// Window for the second touch of a double tap or drag.
    pub doubletap_timeout: u64,
    /// Motion beyond this many device units cancels a tap.
    pub move_threshold: i32,
}

impl Default for TapConfig {
    fn default() -> Self {
        TapConfig {
            enabled: true,
            timeout: 180,
            doubletap_timeout: 180,
            move_threshold: 30,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Tap {
    pub config: TapConfig,
    pub state: TapState,
    /// Absolute expiry of the tap timer, 0 when unarmed.
    timeout: u64,
}

impl Tap {
    pub fn new() -> Self {
        Tap {
            config: TapConfig::default(),
            state: TapState::Idle,
            timeout: 0,
        }
    }

    /// Feed the per-report touch transitions into the machine.
    pub fn handle_state<H: TouchpadHandler>(
        &mut self,
        touches: &Touches,
        queued: QueuedEvents,
        ms: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        if !self.config.enabled {
            return;
        }

        if queued.contains(QueuedEvents::BUTTON_PRESS) {
            self.handle_event(TapEvent::Button, ms, touches.fingers_down, timers, handler);
        }

        for t in touches.iter() {
            if !t.dirty || t.state == TouchState::None {
                continue;
            }

            let event = match t.state {
                TouchState::Begin => TapEvent::Touch,
                TouchState::End => TapEvent::Release,
                TouchState::Update if self.exceeds_motion_threshold(t) => TapEvent::Motion,
                _ => continue,
            };
            self.handle_event(event, ms, touches.fingers_down, timers, handler);
        }
    }

    /// Fire an expired tap timer; returns the next pending expiry or 0.
    pub fn handle_timeout<H: TouchpadHandler>(
        &mut self,
        now: u64,
        fingers_down: u32,
        timers: &mut Timers,
        handler: &mut H,
    ) -> u64 {
        if self.timeout != 0 && self.timeout <= now {
            self.timeout = 0;
            self.handle_event(TapEvent::Timeout, now, fingers_down, timers, handler);
        }
        self.timeout
    }

    fn exceeds_motion_threshold(&self, t: &Touch) -> bool {
        let Some(last) = t.history.last() else {
            return false;
        };
        let dx = t.x - last.x;
        let dy = t.y - last.y;
        let threshold = self.config.move_threshold;

        dx * dx + dy * dy > threshold * threshold
    }

    fn set_timer<H: TouchpadHandler>(
        &mut self,
        ms: u64,
        period: u64,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        self.timeout = ms + period;
        timers.request(handler, ms, period);
    }

    fn clear_timer(&mut self) {
        self.timeout = 0;
    }

    fn handle_event<H: TouchpadHandler>(
        &mut self,
        event: TapEvent,
        ms: u64,
        fingers_down: u32,
        timers: &mut Timers,
        handler: &mut H,
    ) {
        use TapEvent as E;
        use TapState as S;

        let from = self.state;
        let timeout = self.config.timeout;
        let doubletap_timeout = self.config.doubletap_timeout;

        match (from, event) {
            (S::Idle, E::Touch) => {
                self.state = S::Touch;
                self.set_timer(ms, timeout, timers, handler);
            }
            (S::Idle, E::Button | E::Motion) => {}

            (S::Touch, E::Touch) => {
                self.state = S::Touch2;
                self.set_timer(ms, timeout, timers, handler);
            }
            (S::Touch, E::Release) => {
                self.state = S::Tapped;
                handler.tap(1, true);
                self.set_timer(ms, doubletap_timeout, timers, handler);
            }
            (S::Touch, E::Motion) => {
                self.state = S::Hold;
                self.clear_timer();
            }
            (S::Touch, E::Timeout) => self.state = S::Hold,
            (S::Touch, E::Button) => {
                self.state = S::Dead;
                self.clear_timer();
            }

            (S::Hold, E::Touch) => {
                self.state = S::Touch2;
                self.set_timer(ms, timeout, timers, handler);
            }
            (S::Hold, E::Release) => self.state = S::Idle,
            (S::Hold, E::Motion | E::Timeout) => {}
            (S::Hold, E::Button) => self.state = S::Dead,

            (S::Tapped, E::Touch) => {
                self.state = S::DraggingOrDoubletap;
                self.set_timer(ms, timeout, timers, handler);
            }
            (S::Tapped, E::Timeout) => {
                self.state = S::Idle;
                handler.tap(1, false);
            }
            (S::Tapped, E::Button) => {
                self.state = S::Dead;
                handler.tap(1, false);
                self.clear_timer();
            }

            (S::Touch2, E::Touch) => {
                self.state = S::Touch3;
                self.set_timer(ms, timeout, timers, handler);
            }
            (S::Touch2, E::Release) => {
                self.state = S::Hold;
                handler.tap(2, true);
                handler.tap(2, false);
                self.clear_timer();
            }
            (S::Touch2, E::Motion | E::Timeout) => {
                self.state = S::Touch2Hold;
                self.clear_timer();
            }
            (S::Touch2, E::Button) => {
                self.state = S::Dead;
                self.clear_timer();
            }

            (S::Touch2Hold, E::Touch) => {
                self.state = S::Touch3;
                self.set_timer(ms, timeout, timers, handler);
            }
            (S::Touch2Hold, E::Release) => self.state = S::Hold,
            (S::Touch2Hold, E::Motion | E::Timeout) => {}
            (S::Touch2Hold, E::Button) => self.state = S::Dead,

            (S::Touch3, E::Touch) => {
                self.state = S::Dead;
                self.clear_timer();
            }
            (S::Touch3, E::Release) => {
                self.state = S::Touch2Hold;
                handler.tap(3, true);
                handler.tap(3, false);
                self.clear_timer();
            }
            (S::Touch3, E::Motion | E::Timeout) => {
                self.state = S::Touch3Hold;
                self.clear_timer();
            }
            (S::Touch3, E::Button) => {
                self.state = S::Dead;
                self.clear_timer();
            }

            (S::Touch3Hold, E::Touch) => self.state = S::Dead,
            (S::Touch3Hold, E::Release) => self.state = S::Touch2Hold,
            (S::Touch3Hold, E::Motion | E::Timeout) => {}
            (S::Touch3Hold, E::Button) => self.state = S::Dead,

            (S::DraggingOrDoubletap, E::Touch) => {
                self.state = S::Dragging2;
                self.clear_timer();
            }
            (S::DraggingOrDoubletap, E::Release) => {
                self.state = S::Idle;
                handler.tap(1, false);
                handler.tap(1, true);
                handler.tap(1, false);
                self.clear_timer();
            }
            (S::DraggingOrDoubletap, E::Motion | E::Timeout) => {
                self.state = S::Dragging;
                self.clear_timer();
            }
            (S::DraggingOrDoubletap, E::Button) => {
                self.state = S::Dead;
                handler.tap(1, false);
                self.clear_timer();
            }

            (S::Dragging, E::Touch) => self.state = S::Dragging2,
            (S::Dragging, E::Release) => {
                self.state = S::Idle;
                handler.tap(1, false);
            }
            (S::Dragging, E::Motion | E::Timeout) => {}
            (S::Dragging, E::Button) => {
                self.state = S::Dead;
                handler.tap(1, false);
            }

            (S::DraggingWait, E::Touch) => self.state = S::Dragging,
            (S::DraggingWait, E::Timeout) => {
                self.state = S::Idle;
                handler.tap(1, false);
            }
            (S::DraggingWait, E::Button) => {
                self.state = S::Dead;
                handler.tap(1, false);
            }

            (S::Dragging2, E::Touch) => {
                self.state = S::Dead;
                handler.tap(1, false);
            }
            (S::Dragging2, E::Release) => self.state = S::Dragging,
            (S::Dragging2, E::Motion | E::Timeout) => {}
            (S::Dragging2, E::Button) => {
                self.state = S::Dead;
                handler.tap(1, false);
            }

            (S::Dead, _) => {}

            (_, _) => {
                error!(state = ?from, ?event, "ignoring tap event this state cannot accept");
            }
        }

        // The dead state drains once the pad is clear.
        if self.state == TapState::Dead && fingers_down == 0 {
            self.state = TapState::Idle;
        }

        if self.state != from {
            trace!(from = ?from, ?event, to = ?self.state, "tap transition");
        }
    }
}
