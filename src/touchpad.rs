//! The touchpad instance and the per-report sequencer.
//!
//! A [`Touchpad`] is a synchronous processor. The caller feeds it raw
//! [`InputEvent`]s one at a time; on a [`EventKind::Sync`] frame terminator
//! it commits the accumulated device state in a fixed sequence: expired
//! timers fire, touches are pre-processed (pointer selection, history,
//! dejitter, pinning), then the state machines run in order soft-button →
//! tap → scroll, motion is emitted unless the scroll recognizer consumed
//! the report, and finally the touch lifecycle advances.
//!
//! The library never reads a clock. Timestamps ride on the events, and
//! whenever a subsystem needs a future wake-up the caller is told through
//! [`TouchpadHandler::register_timer`] and expected to call
//! [`Touchpad::handle_timeouts`] once that moment passed.

use tracing::{debug, trace};

use crate::button::{ButtonPolicy, Buttons};
use crate::event::{codes, EventKind, InputEvent, TouchpadHandler};
use crate::scroll::Scroll;
use crate::tap::Tap;
use crate::touch::{TouchState, Touches};

bitflags::bitflags! {
    /// Event classes accumulated between two sync markers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct QueuedEvents: u32 {
        const BUTTON_PRESS = 0x1;
        const BUTTON_RELEASE = 0x2;
        const MOTION = 0x4;
    }
}

/// Value range of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    /// Smallest reportable value.
    pub minimum: i32,
    /// Largest reportable value.
    pub maximum: i32,
    /// Device units per millimeter, 0 when unknown.
    pub resolution: i32,
}

impl AxisRange {
    pub(crate) fn span(&self) -> i64 {
        i64::from(self.maximum) - i64::from(self.minimum) + 1
    }
}

/// Static capabilities of a touchpad device, gathered once at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Range of `ABS_MT_POSITION_X`.
    pub x: AxisRange,
    /// Range of `ABS_MT_POSITION_Y`.
    pub y: AxisRange,
    /// Number of MT slots the device reports.
    pub slots: u32,
    /// The device has a real right button; soft-button emulation is
    /// bypassed.
    pub has_right_button: bool,
    /// `BTN_TOOL_DOUBLETAP` is present.
    pub has_tool_doubletap: bool,
    /// `BTN_TOOL_TRIPLETAP` is present.
    pub has_tool_tripletap: bool,
    /// `BTN_TOOL_QUADTAP` is present.
    pub has_tool_quadtap: bool,
}

impl DeviceCapabilities {
    /// Range of the given absolute axis, if the device has it.
    pub fn axis_range(&self, axis: u16) -> Option<AxisRange> {
        match axis {
            codes::ABS_MT_POSITION_X => Some(self.x),
            codes::ABS_MT_POSITION_Y => Some(self.y),
            _ => None,
        }
    }

    /// Highest finger count reportable through tool bits.
    fn highest_tool_fingers(&self) -> usize {
        if self.has_tool_quadtap {
            4
        } else if self.has_tool_tripletap {
            3
        } else if self.has_tool_doubletap {
            2
        } else {
            0
        }
    }
}

/// Errors of touchpad creation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device does not report multi-touch slots.
    #[error("device reports no multi-touch slots")]
    NoMtSlots,
    /// The device has no usable absolute x/y axes.
    #[error("device has no usable absolute axes")]
    NoAbsoluteAxes,
    /// Opening or probing the device failed.
    #[error("failed to access the input device")]
    Io(#[from] std::io::Error),
}

/// Pending wake-up bookkeeping shared by the state machines.
///
/// At most one wake time is kept; arming a timer lowers it, never raises
/// it. The real minimum across subsystems is re-established whenever
/// timeouts fire.
#[derive(Debug)]
pub(crate) struct Timers {
    pub next_timeout: u64,
}

impl Timers {
    pub fn new() -> Self {
        Timers { next_timeout: 0 }
    }

    /// Arm a wake-up `delta` ms after `now` and tell the caller.
    pub fn request<H: TouchpadHandler>(&mut self, handler: &mut H, now: u64, delta: u64) {
        if delta == 0 {
            return;
        }

        let target = now + delta;
        self.next_timeout = if self.next_timeout == 0 {
            target
        } else {
            self.next_timeout.min(target)
        };

        handler.register_timer(now, delta);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TouchpadConfig {
    pub motion_history_size: usize,
}

impl Default for TouchpadConfig {
    fn default() -> Self {
        TouchpadConfig {
            motion_history_size: 10,
        }
    }
}

/// One touchpad device being processed.
///
/// All state lives here; nothing is shared between instances and no entry
/// point blocks, allocates or suspends. Operations on one instance must be
/// serialized by the caller.
#[derive(Debug)]
pub struct Touchpad {
    pub(crate) caps: DeviceCapabilities,
    pub(crate) config: TouchpadConfig,

    pub(crate) touches: Touches,
    /// Currently addressed MT slot.
    slot: i32,

    pub(crate) buttons: Buttons,
    pub(crate) tap: Tap,
    pub(crate) scroll: Scroll,

    /// Time of the last committed report.
    ms: u64,
    queued: QueuedEvents,
    pub(crate) timers: Timers,
}

impl Touchpad {
    /// Create an instance for a device with the given capabilities.
    ///
    /// Fails without leaving partial state behind when the device cannot
    /// work as a touchpad.
    pub fn new(caps: DeviceCapabilities) -> Result<Self, Error> {
        if caps.slots == 0 {
            return Err(Error::NoMtSlots);
        }
        if caps.x.maximum <= caps.x.minimum || caps.y.maximum <= caps.y.minimum {
            return Err(Error::NoAbsoluteAxes);
        }

        let policy = if caps.has_right_button {
            ButtonPolicy::Traditional
        } else {
            ButtonPolicy::Clickpad
        };
        debug!(?policy, slots = caps.slots, "initializing touchpad");

        let config = TouchpadConfig::default();
        let touches = Touches::new(
            caps.slots as usize,
            caps.highest_tool_fingers(),
            config.motion_history_size,
        );

        let mut touchpad = Touchpad {
            caps,
            config,
            touches,
            slot: 0,
            buttons: Buttons::new(policy),
            tap: Tap::new(),
            scroll: Scroll::new(),
            ms: 0,
            queued: QueuedEvents::empty(),
            timers: Timers::new(),
        };
        touchpad.apply_softbutton_defaults();

        Ok(touchpad)
    }

    /// The capabilities this instance was created with.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    /// Number of fingers currently on the pad, fake touches included.
    pub fn fingers_down(&self) -> u32 {
        self.touches.fingers_down
    }

    /// Absolute time of the earliest pending wake-up, 0 when none.
    pub fn next_timeout(&self) -> u64 {
        self.timers.next_timeout
    }

    /// Feed one raw event.
    ///
    /// Anything between two sync markers mutates internal state only; the
    /// sync marker commits the report and drives the handler callbacks.
    pub fn handle_event<H: TouchpadHandler>(&mut self, handler: &mut H, event: &InputEvent) {
        match event.kind {
            EventKind::Absolute { axis, value } => self.update_abs_state(axis, value, event.time),
            EventKind::Key { code, pressed } => self.update_key_state(code, pressed),
            EventKind::Sync => {
                // a timestamp going backwards counts as "same time"
                let now = event.time.max(self.ms);
                self.fire_timeouts(handler, now);

                if self.queued.is_empty() {
                    return;
                }
                trace!(ms = now, queued = ?self.queued, "committing report");

                self.ms = now;
                self.pre_process_touches();
                self.post_events(handler);
                self.post_process_touches();
            }
        }
    }

    /// Fire every subsystem timeout that expired by `now`.
    ///
    /// To be called by the owner of the timer that was requested through
    /// [`TouchpadHandler::register_timer`]. A new wake-up is requested if
    /// any timer remains pending.
    pub fn handle_timeouts<H: TouchpadHandler>(&mut self, handler: &mut H, now: u64) {
        let now = now.max(self.ms);
        self.fire_timeouts(handler, now);
    }

    fn fire_timeouts<H: TouchpadHandler>(&mut self, handler: &mut H, now: u64) {
        if self.timers.next_timeout == 0 || self.timers.next_timeout > now {
            return;
        }

        let tap_next =
            self.tap
                .handle_timeout(now, self.touches.fingers_down, &mut self.timers, handler);
        let button_next = self
            .buttons
            .handle_timeout(&mut self.touches, now, &mut self.timers, handler);

        let next = match (tap_next, button_next) {
            (0, next) => next,
            (next, 0) => next,
            (a, b) => a.min(b),
        };
        self.timers.next_timeout = next;

        if next != 0 {
            handler.register_timer(now, next - now);
        } else {
            handler.register_timer(now, 0);
        }
    }

    fn current_touch_index(&self) -> Option<usize> {
        let slot = usize::try_from(self.slot).ok()?;
        (slot < self.touches.maxtouches).then_some(slot)
    }

    fn update_abs_state(&mut self, axis: u16, value: i32, time: u64) {
        match axis {
            codes::ABS_MT_SLOT => self.slot = value,
            codes::ABS_MT_POSITION_X => {
                if let Some(index) = self.current_touch_index() {
                    let t = self.touches.get_mut(index);
                    t.x = value;
                    t.dirty = true;
                    self.queued |= QueuedEvents::MOTION;
                }
            }
            codes::ABS_MT_POSITION_Y => {
                if let Some(index) = self.current_touch_index() {
                    let t = self.touches.get_mut(index);
                    t.y = value;
                    t.dirty = true;
                    self.queued |= QueuedEvents::MOTION;
                }
            }
            codes::ABS_MT_TRACKING_ID => {
                if let Some(index) = self.current_touch_index() {
                    if value == -1 {
                        if self.touches.end(index) {
                            self.queued |= QueuedEvents::MOTION;
                        }
                    } else {
                        self.touches.begin(index, Some(value));
                        self.queued |= QueuedEvents::MOTION;
                    }
                }
            }
            _ => {}
        }

        if let Some(index) = self.current_touch_index() {
            self.touches.get_mut(index).millis = time;
        }
    }

    fn update_key_state(&mut self, code: u16, pressed: bool) {
        if (codes::BTN_LEFT..=codes::BTN_TASK).contains(&code) {
            let mask = 0x1u32 << (code - codes::BTN_LEFT);
            if pressed {
                self.buttons.state |= mask;
                self.queued |= QueuedEvents::BUTTON_PRESS;
            } else {
                self.buttons.state &= !mask;
                self.queued |= QueuedEvents::BUTTON_RELEASE;
            }
        }

        if (codes::BTN_TOOL_DOUBLETAP..=codes::BTN_TOOL_QUADTAP).contains(&code) {
            let fingers = usize::from(code - codes::BTN_TOOL_DOUBLETAP) + 2;
            let changed = if pressed {
                self.touches.begin_fake(fingers)
            } else {
                self.touches.end_fake(fingers)
            };
            if changed {
                self.queued |= QueuedEvents::MOTION;
            }
        }
    }

    fn pre_process_touches(&mut self) {
        self.select_pointer_touch();

        for t in self.touches.iter_mut() {
            if t.state == TouchState::Begin {
                let (x, y, millis) = (t.x, t.y, t.millis);
                t.history.push(x, y, millis);
            }
            if t.state != TouchState::None && t.dirty {
                t.dejitter();
            }
        }

        if self.queued.contains(QueuedEvents::BUTTON_PRESS) {
            self.touches.pin_finger();
        }
    }

    fn select_pointer_touch(&mut self) {
        if self.touches.pointer().is_some() {
            return;
        }

        let buttons = &self.buttons;
        for i in 0..self.touches.ntouches() {
            if buttons.select_pointer_touch(self.touches.get(i)) {
                self.touches.get_mut(i).pointer = true;
                break;
            }
        }
    }

    fn post_events<H: TouchpadHandler>(&mut self, handler: &mut H) {
        self.buttons.handle_state(
            &mut self.touches,
            self.queued,
            self.ms,
            &mut self.timers,
            handler,
        );
        self.tap
            .handle_state(&self.touches, self.queued, self.ms, &mut self.timers, handler);

        let consumed = self
            .scroll
            .handle_state(&self.touches, self.buttons.state, handler);
        if !consumed {
            self.post_motion_events(handler);
        }
    }

    fn post_motion_events<H: TouchpadHandler>(&self, handler: &mut H) {
        if !self.queued.contains(QueuedEvents::MOTION) {
            return;
        }

        let Some(t) = self.touches.pointer() else {
            return;
        };

        let (dx, dy) = t.motion_to_delta();
        if dx != 0 || dy != 0 {
            handler.motion(dx, dy);
        }
    }

    fn post_process_touches(&mut self) {
        let history_size = self.config.motion_history_size;
        let mut ended = 0;

        for t in self.touches.iter_mut() {
            if t.state == TouchState::None {
                continue;
            }

            let (x, y, millis) = (t.x, t.y, t.millis);
            t.history.push(x, y, millis);

            match t.state {
                TouchState::End => {
                    ended += 1;
                    t.reset(history_size);
                }
                TouchState::Begin => t.state = TouchState::Update,
                _ => {}
            }
            t.dirty = false;
        }

        if self.queued.contains(QueuedEvents::BUTTON_RELEASE) {
            self.touches.unpin_finger();
        }

        self.queued = QueuedEvents::empty();
        self.touches.renumber(ended);
        self.touches.update_pointer_touch();
    }
}
