//! Raw event vocabulary and the high-level callback contract.
//!
//! A touchpad device produces a stream of [`InputEvent`]s terminated by
//! [`EventKind::Sync`] frame markers. Everything between two sync markers
//! belongs to one coherent device snapshot. The library consumes this stream
//! via [`Touchpad::handle_event`](crate::Touchpad::handle_event) and reports
//! back through the [`TouchpadHandler`] trait.

/// Event codes of the Linux input ABI recognized by the library.
///
/// Only the subset a touchpad can produce is listed; everything else is
/// ignored by the event dispatch.
pub mod codes {
    /// Multi-touch slot selector.
    pub const ABS_MT_SLOT: u16 = 0x2f;
    /// Absolute x position of the touch in the current slot.
    pub const ABS_MT_POSITION_X: u16 = 0x35;
    /// Absolute y position of the touch in the current slot.
    pub const ABS_MT_POSITION_Y: u16 = 0x36;
    /// Tracking id of the contact in the current slot, `-1` once it ended.
    pub const ABS_MT_TRACKING_ID: u16 = 0x39;

    /// Left physical button.
    pub const BTN_LEFT: u16 = 0x110;
    /// Right physical button.
    pub const BTN_RIGHT: u16 = 0x111;
    /// Middle physical button.
    pub const BTN_MIDDLE: u16 = 0x112;
    /// Last button code tracked in the physical button bitmask.
    pub const BTN_TASK: u16 = 0x117;

    /// Tool bit reporting two fingers without per-slot coordinates.
    pub const BTN_TOOL_DOUBLETAP: u16 = 0x14d;
    /// Tool bit reporting three fingers without per-slot coordinates.
    pub const BTN_TOOL_TRIPLETAP: u16 = 0x14e;
    /// Tool bit reporting four fingers without per-slot coordinates.
    pub const BTN_TOOL_QUADTAP: u16 = 0x14f;
}

/// Payload of a raw device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An absolute axis changed, e.g. a per-slot coordinate or the slot
    /// selector itself.
    Absolute {
        /// Axis code, see [`codes`].
        axis: u16,
        /// New axis value in device units.
        value: i32,
    },
    /// A key or button changed state.
    Key {
        /// Key code, see [`codes`].
        code: u16,
        /// `true` on press, `false` on release.
        pressed: bool,
    },
    /// Frame terminator. Commits everything since the previous sync marker
    /// as one report.
    Sync,
}

/// One raw event as read from the device.
///
/// Timestamps must come from a monotonic millisecond clock; a timestamp
/// going backwards is treated as equal to the previous report's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    /// Event time in milliseconds.
    pub time: u64,
    /// What happened.
    pub kind: EventKind,
}

impl InputEvent {
    /// An absolute axis event.
    pub fn absolute(time: u64, axis: u16, value: i32) -> Self {
        InputEvent {
            time,
            kind: EventKind::Absolute { axis, value },
        }
    }

    /// A key event.
    pub fn key(time: u64, code: u16, pressed: bool) -> Self {
        InputEvent {
            time,
            kind: EventKind::Key { code, pressed },
        }
    }

    /// A sync-report frame terminator.
    pub fn sync(time: u64) -> Self {
        InputEvent {
            time,
            kind: EventKind::Sync,
        }
    }
}

/// Direction of a scroll gesture.
///
/// The direction is locked when the gesture starts and does not change until
/// the gesture terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Scrolling along the x axis.
    Horizontal,
    /// Scrolling along the y axis.
    Vertical,
}

/// Receiver for the high-level events produced by a [`Touchpad`].
///
/// A `&mut` handler is passed into every entry point of the library; the
/// library never retains it beyond the duration of a single call. Callbacks
/// fire in a fixed order within one report: button, tap, scroll, then
/// motion.
///
/// [`Touchpad`]: crate::Touchpad
pub trait TouchpadHandler {
    /// Relative motion of the pointer in device units.
    ///
    /// Deltas are dejittered and low-pass filtered but not accelerated.
    /// Either component may be negative.
    fn motion(&mut self, dx: i32, dy: i32);

    /// A physical button event.
    ///
    /// `button` is the button code as observed on the wire. On clickpads the
    /// soft-button emulation maps a [`BTN_LEFT`](codes::BTN_LEFT) wire press
    /// to [`BTN_LEFT`](codes::BTN_LEFT) or [`BTN_RIGHT`](codes::BTN_RIGHT)
    /// at emission time. Every press is eventually followed by a release
    /// with the same code.
    fn button(&mut self, button: u32, is_press: bool);

    /// A tap event with the number of fingers that caused it.
    ///
    /// `fingers` is 1, 2 or 3. A tap-and-drag appears as a single press held
    /// across the drag and released when the last finger leaves the pad.
    fn tap(&mut self, fingers: u32, is_press: bool);

    /// A scroll event.
    ///
    /// The first event of a gesture carries at least one unit; later events
    /// may be fractional. `units == 0.0` terminates the gesture.
    fn scroll(&mut self, direction: ScrollDirection, units: f64);

    /// A rotate gesture, in degrees clockwise. Reserved, never invoked.
    fn rotate(&mut self, degrees: i32) {
        let _ = degrees;
    }

    /// A pinch gesture, in percent relative to the previous distance.
    /// Reserved, never invoked.
    fn pinch(&mut self, scale: i32) {
        let _ = scale;
    }

    /// Request to wake the library `ms` milliseconds after `now` by calling
    /// [`Touchpad::handle_timeouts`](crate::Touchpad::handle_timeouts).
    ///
    /// `ms == 0` cancels any previously requested wake-up.
    fn register_timer(&mut self, now: u64, ms: u64);
}
