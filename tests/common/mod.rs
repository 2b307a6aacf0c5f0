//! Shared harness: a virtual touchpad device and a recording handler.
#![allow(dead_code)]

use touchpad::codes;
use touchpad::{
    AxisRange, DeviceCapabilities, InputEvent, ScrollDirection, Touchpad, TouchpadHandler,
};

/// Milliseconds between two synthesized reports, roughly a 166 Hz device.
pub const REPORT_SPACING: u64 = 6;

/// Route crate logs into the test captures; `RUST_LOG=touchpad=trace`
/// shows the state machines at work.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Motion { dx: i32, dy: i32 },
    Button { button: u32, is_press: bool },
    Tap { fingers: u32, is_press: bool },
    Scroll { direction: ScrollDirection, units: f64 },
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub timer_requests: Vec<(u64, u64)>,
}

impl TouchpadHandler for Recorder {
    fn motion(&mut self, dx: i32, dy: i32) {
        self.events.push(Event::Motion { dx, dy });
    }

    fn button(&mut self, button: u32, is_press: bool) {
        self.events.push(Event::Button { button, is_press });
    }

    fn tap(&mut self, fingers: u32, is_press: bool) {
        self.events.push(Event::Tap { fingers, is_press });
    }

    fn scroll(&mut self, direction: ScrollDirection, units: f64) {
        self.events.push(Event::Scroll { direction, units });
    }

    fn register_timer(&mut self, now: u64, ms: u64) {
        self.timer_requests.push((now, ms));
    }
}

impl Recorder {
    pub fn taps(&self) -> Vec<(u32, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Tap { fingers, is_press } => Some((*fingers, *is_press)),
                _ => None,
            })
            .collect()
    }

    pub fn buttons(&self) -> Vec<(u32, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Button { button, is_press } => Some((*button, *is_press)),
                _ => None,
            })
            .collect()
    }

    pub fn scrolls(&self) -> Vec<(ScrollDirection, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Scroll { direction, units } => Some((*direction, *units)),
                _ => None,
            })
            .collect()
    }

    pub fn motions(&self) -> Vec<(i32, i32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Motion { dx, dy } => Some((*dx, *dy)),
                _ => None,
            })
            .collect()
    }
}

/// A touchpad with a virtual clock, driven by synthesized reports.
pub struct TestPad {
    pub touchpad: Touchpad,
    pub time: u64,
}

fn axis() -> AxisRange {
    AxisRange {
        minimum: 0,
        maximum: 5000,
        resolution: 40,
    }
}

impl TestPad {
    /// Clickpad: five slots, axes `[0, 5000]`, no right button. The
    /// default soft-button region sits at x 50..100 %, y 82..100 %.
    pub fn clickpad() -> Self {
        let touchpad = Touchpad::new(DeviceCapabilities {
            x: axis(),
            y: axis(),
            slots: 5,
            has_right_button: false,
            has_tool_doubletap: false,
            has_tool_tripletap: false,
            has_tool_quadtap: false,
        })
        .expect("valid capabilities");
        init_logging();
        TestPad {
            touchpad,
            time: 1000,
        }
    }

    /// Traditional touchpad with real buttons.
    pub fn traditional() -> Self {
        let touchpad = Touchpad::new(DeviceCapabilities {
            x: axis(),
            y: axis(),
            slots: 5,
            has_right_button: true,
            has_tool_doubletap: false,
            has_tool_tripletap: false,
            has_tool_quadtap: false,
        })
        .expect("valid capabilities");
        init_logging();
        TestPad {
            touchpad,
            time: 1000,
        }
    }

    /// Semi-multitouch clickpad: two slots, finger counts above two only
    /// reported through tool bits.
    pub fn semi_mt_clickpad() -> Self {
        let touchpad = Touchpad::new(DeviceCapabilities {
            x: axis(),
            y: axis(),
            slots: 2,
            has_right_button: false,
            has_tool_doubletap: true,
            has_tool_tripletap: true,
            has_tool_quadtap: true,
        })
        .expect("valid capabilities");
        init_logging();
        TestPad {
            touchpad,
            time: 1000,
        }
    }

    fn send(&mut self, recorder: &mut Recorder, events: &[InputEvent]) {
        for event in events {
            self.touchpad.handle_event(recorder, event);
        }
        self.time += REPORT_SPACING;
    }

    pub fn touch_down(&mut self, recorder: &mut Recorder, slot: i32, id: i32, x: i32, y: i32) {
        let t = self.time;
        self.send(
            recorder,
            &[
                InputEvent::absolute(t, codes::ABS_MT_SLOT, slot),
                InputEvent::absolute(t, codes::ABS_MT_TRACKING_ID, id),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_X, x),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_Y, y),
                InputEvent::sync(t),
            ],
        );
    }

    pub fn touch_move(&mut self, recorder: &mut Recorder, slot: i32, x: i32, y: i32) {
        let t = self.time;
        self.send(
            recorder,
            &[
                InputEvent::absolute(t, codes::ABS_MT_SLOT, slot),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_X, x),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_Y, y),
                InputEvent::sync(t),
            ],
        );
    }

    /// Move both touches of a two-finger gesture within single reports.
    pub fn two_finger_move(
        &mut self,
        recorder: &mut Recorder,
        first: (i32, i32),
        second: (i32, i32),
    ) {
        let t = self.time;
        self.send(
            recorder,
            &[
                InputEvent::absolute(t, codes::ABS_MT_SLOT, 0),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_X, first.0),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_Y, first.1),
                InputEvent::absolute(t, codes::ABS_MT_SLOT, 1),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_X, second.0),
                InputEvent::absolute(t, codes::ABS_MT_POSITION_Y, second.1),
                InputEvent::sync(t),
            ],
        );
    }

    pub fn touch_up(&mut self, recorder: &mut Recorder, slot: i32) {
        let t = self.time;
        self.send(
            recorder,
            &[
                InputEvent::absolute(t, codes::ABS_MT_SLOT, slot),
                InputEvent::absolute(t, codes::ABS_MT_TRACKING_ID, -1),
                InputEvent::sync(t),
            ],
        );
    }

    /// Move a touch in evenly spaced steps, one report per step.
    pub fn move_to(
        &mut self,
        recorder: &mut Recorder,
        slot: i32,
        from: (i32, i32),
        to: (i32, i32),
        steps: i32,
    ) {
        for i in 1..=steps {
            let x = from.0 + (to.0 - from.0) * i / steps;
            let y = from.1 + (to.1 - from.1) * i / steps;
            self.touch_move(recorder, slot, x, y);
        }
    }

    pub fn key(&mut self, recorder: &mut Recorder, code: u16, pressed: bool) {
        let t = self.time;
        self.send(
            recorder,
            &[InputEvent::key(t, code, pressed), InputEvent::sync(t)],
        );
    }

    pub fn button_press(&mut self, recorder: &mut Recorder) {
        self.key(recorder, codes::BTN_LEFT, true);
    }

    pub fn button_release(&mut self, recorder: &mut Recorder) {
        self.key(recorder, codes::BTN_LEFT, false);
    }

    /// Let `ms` pass and deliver any expired timers.
    pub fn wait(&mut self, recorder: &mut Recorder, ms: u64) {
        self.time += ms;
        self.touchpad.handle_timeouts(recorder, self.time);
    }

    pub fn tap_timeout(&self) -> u64 {
        self.touchpad.get_config(touchpad::config::Parameter::TapTimeout) as u64
    }
}
