#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! # touchpad: multi-touch gesture processing
//!
//! This crate turns the raw event stream of a multi-touch touchpad into
//! high-level pointer events: relative motion, button presses (physical or
//! emulated), taps with finger counts, and two-finger scrolling. It sits
//! between the kernel's evdev interface and whatever consumes pointer
//! input, and is deliberately backend-agnostic: the core never touches a
//! file descriptor or a clock.
//!
//! ## Structure of the crate
//!
//! The core is the [`Touchpad`] type. The caller feeds it raw
//! [`InputEvent`]s (per-slot absolute coordinates, tracking ids, button
//! and tool-bit key events, sync markers) and passes a [`TouchpadHandler`]
//! into each call to receive the resulting events. Time is driven entirely
//! by event timestamps; when the core needs a future wake-up it says so
//! through [`TouchpadHandler::register_timer`] and expects
//! [`Touchpad::handle_timeouts`] once the moment passed.
//!
//! With the `backend_evdev` feature (on by default), the [`backend`]
//! module provides [`TouchpadBackend`](backend::TouchpadBackend), a
//! [`calloop`] event source that wires an [`evdev`] device and a timerfd
//! to the core, so the whole pipeline can be dropped into an existing
//! event loop.
//!
//! ## Tap-to-click
//!
//! A short press and release of one to three fingers produces a pair of
//! tap events, provided the fingers release within the tap timeout and
//! move less than the move threshold. The finger count of the last finger
//! down wins: one finger resting and a second finger tapping is a
//! two-finger tap. A tap followed by a touch-and-hold within the
//! double-tap window presses the button once and holds it until the last
//! finger leaves the pad, so items can be dragged.
//!
//! ## Scrolling
//!
//! With exactly two fingers down, movement beyond the configured delta
//! produces scroll events; moving both fingers or holding one and moving
//! the other both work. The direction is locked for the duration of the
//! gesture: sideways drift during a vertical scroll does not scroll
//! horizontally. A gesture terminates when the finger count changes, with
//! a final zero-unit event.
//!
//! ## Soft buttons
//!
//! Clickpads have a single physical button under the pad. A press is
//! reinterpreted based on finger location: within a configurable
//! right-edge area it becomes a right click, anywhere else a left click.
//!
//! ```text
//! +------------------------+
//! |                        |
//! |                        |
//! |                        |
//! +------------+-----------+
//! |    LEFT    |   RIGHT   |
//! +------------+-----------+
//! ```
//!
//! A finger clicking on the right area only right-clicks if it was
//! already resting there; a finger that slid into the area just before
//! the click still left-clicks. Entering and leaving the areas is
//! debounced with timers so a finger wobbling across the boundary does
//! not flip the active button, and the release always carries the code
//! that was emitted at press time.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]: state-machine transitions at trace
//! level, lifecycle at debug level, and internal inconsistencies (events
//! that a state machine cannot accept) at error level.

pub mod config;
pub mod event;

mod button;
mod filter;
mod scroll;
mod tap;
mod touch;
mod touchpad;

#[cfg(feature = "backend_evdev")]
pub mod backend;

pub use crate::event::{codes, EventKind, InputEvent, ScrollDirection, TouchpadHandler};
pub use crate::scroll::ScrollMethods;
pub use crate::touchpad::{AxisRange, DeviceCapabilities, Error, Touchpad};
