//! Event-loop integration for evdev devices.
//!
//! [`TouchpadBackend`] wraps an [`evdev::Device`] together with a
//! [`Touchpad`] and a timerfd, and implements [`calloop::EventSource`] so
//! the whole pipeline can be inserted straight into a calloop event loop.
//! Raw device events are drained whenever the fd turns readable, fed
//! through the core, and the resulting high-level events are handed to the
//! loop callback. Timer requests from the core arm the timerfd, and its
//! expiry drives [`Touchpad::handle_timeouts`].

use std::io;
use std::os::unix::io::OwnedFd;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use calloop::generic::Generic;
use calloop::{EventSource, Interest, Mode, Poll, PostAction, Readiness, Token, TokenFactory};
use evdev::{AbsoluteAxisCode, EventSummary, KeyCode, SynchronizationCode};
use rustix::time::{
    timerfd_create, timerfd_settime, Itimerspec, TimerfdClockId, TimerfdFlags, TimerfdTimerFlags,
    Timespec,
};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::event::{InputEvent, ScrollDirection, TouchpadHandler};
use crate::touchpad::{AxisRange, DeviceCapabilities, Error, Touchpad};

/// High-level event produced by a [`TouchpadBackend`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchpadEvent {
    /// Relative pointer motion in device units.
    Motion {
        /// Delta along the x axis.
        dx: i32,
        /// Delta along the y axis.
        dy: i32,
    },
    /// A physical or emulated button changed state.
    Button {
        /// Button code as emitted on the wire.
        button: u32,
        /// `true` on press.
        is_press: bool,
    },
    /// A tap registered.
    Tap {
        /// Number of fingers, 1 to 3.
        fingers: u32,
        /// `true` on press.
        is_press: bool,
    },
    /// Scroll motion; `units == 0.0` terminates the gesture.
    Scroll {
        /// Locked scroll direction.
        direction: ScrollDirection,
        /// Scroll units since the previous event of the gesture.
        units: f64,
    },
}

/// Handler used while feeding the core: events queue up, the last timer
/// request wins.
struct QueueHandler<'a> {
    events: &'a mut SmallVec<[TouchpadEvent; 8]>,
    timer: &'a mut Option<u64>,
}

impl TouchpadHandler for QueueHandler<'_> {
    fn motion(&mut self, dx: i32, dy: i32) {
        self.events.push(TouchpadEvent::Motion { dx, dy });
    }

    fn button(&mut self, button: u32, is_press: bool) {
        self.events.push(TouchpadEvent::Button { button, is_press });
    }

    fn tap(&mut self, fingers: u32, is_press: bool) {
        self.events.push(TouchpadEvent::Tap { fingers, is_press });
    }

    fn scroll(&mut self, direction: ScrollDirection, units: f64) {
        self.events.push(TouchpadEvent::Scroll { direction, units });
    }

    fn register_timer(&mut self, _now: u64, ms: u64) {
        *self.timer = Some(ms);
    }
}

/// An evdev touchpad hooked up to the gesture core, usable as a calloop
/// event source.
pub struct TouchpadBackend {
    device: Generic<evdev::Device>,
    timer: Generic<OwnedFd>,
    /// Second handle to the timerfd for re-arming outside the source.
    arm: OwnedFd,
    touchpad: Touchpad,
    pending: SmallVec<[TouchpadEvent; 8]>,
}

impl std::fmt::Debug for TouchpadBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchpadBackend")
            .field("touchpad", &self.touchpad)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl TouchpadBackend {
    /// Open the device at `path` and probe its capabilities.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        let device = evdev::Device::open(path)?;
        Self::with_device(device)
    }

    /// Take over an already opened device.
    pub fn with_device(device: evdev::Device) -> Result<Self, Error> {
        let caps = probe_capabilities(&device)?;
        let touchpad = Touchpad::new(caps)?;
        debug!(name = device.name().unwrap_or("unknown"), "opened touchpad device");

        let flags = rustix::fs::fcntl_getfl(&device).map_err(io::Error::from)?;
        rustix::fs::fcntl_setfl(&device, flags | rustix::fs::OFlags::NONBLOCK)
            .map_err(io::Error::from)?;

        let timer_fd = timerfd_create(
            TimerfdClockId::Monotonic,
            TimerfdFlags::NONBLOCK | TimerfdFlags::CLOEXEC,
        )
        .map_err(io::Error::from)?;
        let arm = timer_fd.try_clone().map_err(io::Error::from)?;

        Ok(TouchpadBackend {
            device: Generic::new(device, Interest::READ, Mode::Level),
            timer: Generic::new(timer_fd, Interest::READ, Mode::Level),
            arm,
            touchpad,
            pending: SmallVec::new(),
        })
    }

    /// The gesture core, for configuration.
    pub fn touchpad(&self) -> &Touchpad {
        &self.touchpad
    }

    /// Mutable access to the gesture core, for configuration.
    pub fn touchpad_mut(&mut self) -> &mut Touchpad {
        &mut self.touchpad
    }

    fn arm_timer(&self, ms: u64) -> io::Result<()> {
        trace!(ms, "arming wake-up timer");
        let timer = Itimerspec {
            it_interval: Timespec {
                tv_sec: 0,
                tv_nsec: 0,
            },
            it_value: Timespec {
                tv_sec: (ms / 1000) as _,
                tv_nsec: ((ms % 1000) * 1_000_000) as _,
            },
        };
        timerfd_settime(&self.arm, TimerfdTimerFlags::empty(), &timer).map_err(io::Error::from)?;
        Ok(())
    }
}

impl EventSource for TouchpadBackend {
    type Event = TouchpadEvent;
    type Metadata = ();
    type Ret = ();
    type Error = io::Error;

    fn process_events<F>(
        &mut self,
        readiness: Readiness,
        token: Token,
        mut callback: F,
    ) -> io::Result<PostAction>
    where
        F: FnMut(Self::Event, &mut ()),
    {
        let touchpad = &mut self.touchpad;
        let pending = &mut self.pending;
        let mut timer_request: Option<u64> = None;

        self.device.process_events(readiness, token, |_, device| {
            // SAFETY: we only call `fetch_events`, which does not drop the
            // device's I/O source.
            let device = unsafe { device.get_mut() };
            let events = match device.fetch_events() {
                Ok(events) => events,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(PostAction::Continue)
                }
                Err(err) => return Err(err),
            };

            let mut handler = QueueHandler {
                events: pending,
                timer: &mut timer_request,
            };
            for event in events {
                if let Some(raw) = translate_event(&event) {
                    touchpad.handle_event(&mut handler, &raw);
                }
            }

            Ok(PostAction::Continue)
        })?;

        self.timer.process_events(readiness, token, |_, fd| {
            // consume the expiration count
            let mut buf = [0u8; 8];
            let _ = rustix::io::read(&*fd, &mut buf);

            let mut handler = QueueHandler {
                events: pending,
                timer: &mut timer_request,
            };
            touchpad.handle_timeouts(&mut handler, now_millis());

            Ok(PostAction::Continue)
        })?;

        if let Some(ms) = timer_request {
            self.arm_timer(ms)?;
        }

        for event in self.pending.drain(..) {
            callback(event, &mut ());
        }

        Ok(PostAction::Continue)
    }

    fn register(&mut self, poll: &mut Poll, token_factory: &mut TokenFactory) -> calloop::Result<()> {
        self.device.register(poll, token_factory)?;
        self.timer.register(poll, token_factory)
    }

    fn reregister(
        &mut self,
        poll: &mut Poll,
        token_factory: &mut TokenFactory,
    ) -> calloop::Result<()> {
        self.device.reregister(poll, token_factory)?;
        self.timer.reregister(poll, token_factory)
    }

    fn unregister(&mut self, poll: &mut Poll) -> calloop::Result<()> {
        self.timer.unregister(poll)?;
        self.device.unregister(poll)
    }
}

/// Device timestamps are on the realtime clock unless `EVIOCSCLOCK`
/// changed them; use the same clock for the timer path.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn translate_event(event: &evdev::InputEvent) -> Option<InputEvent> {
    let time = event
        .timestamp()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    match event.destructure() {
        EventSummary::AbsoluteAxis(_, axis, value) => Some(InputEvent::absolute(time, axis.0, value)),
        EventSummary::Key(_, key, value) => Some(InputEvent::key(time, key.0, value != 0)),
        EventSummary::Synchronization(_, SynchronizationCode::SYN_REPORT, _) => {
            Some(InputEvent::sync(time))
        }
        _ => None,
    }
}

fn probe_capabilities(device: &evdev::Device) -> Result<DeviceCapabilities, Error> {
    let mut x = None;
    let mut y = None;
    let mut slots = 0u32;

    for (axis, info) in device.get_absinfo()? {
        let range = AxisRange {
            minimum: info.minimum(),
            maximum: info.maximum(),
            resolution: info.resolution(),
        };
        match axis {
            AbsoluteAxisCode::ABS_MT_POSITION_X => x = Some(range),
            AbsoluteAxisCode::ABS_MT_POSITION_Y => y = Some(range),
            AbsoluteAxisCode::ABS_MT_SLOT => {
                slots = (i64::from(info.maximum()) - i64::from(info.minimum()) + 1).max(0) as u32;
            }
            _ => {}
        }
    }

    let keys = device.supported_keys();
    let has_key = |key: KeyCode| keys.map_or(false, |set| set.contains(key));

    Ok(DeviceCapabilities {
        x: x.ok_or(Error::NoAbsoluteAxes)?,
        y: y.ok_or(Error::NoAbsoluteAxes)?,
        slots,
        has_right_button: has_key(KeyCode::BTN_RIGHT),
        has_tool_doubletap: has_key(KeyCode::BTN_TOOL_DOUBLETAP),
        has_tool_tripletap: has_key(KeyCode::BTN_TOOL_TRIPLETAP),
        has_tool_quadtap: has_key(KeyCode::BTN_TOOL_QUADTAP),
    })
}
