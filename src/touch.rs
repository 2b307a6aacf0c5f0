//! Touch slot arena and the touch lifecycle.
//!
//! The arena holds a fixed number of slots: up to [`MAX_TOUCHPOINTS`] real
//! slots addressed by the device's MT slot index, plus up to
//! [`MAX_FAKE_TOUCHES`] synthetic slots used when the device can only report
//! finger counts through `BTN_TOOL_*TAP` bits. Touches move through
//! `None → Begin → Update → End → None`; the `End → None` edge and the
//! `Begin → Update` promotion happen during report post-processing.

use crate::button::ButtonState;
use crate::filter::MotionHistory;

/// Maximum number of real touchpoints tracked per device.
pub(crate) const MAX_TOUCHPOINTS: usize = 10;
/// Synthetic slots for two-, three- and four-finger tool bits.
pub(crate) const MAX_FAKE_TOUCHES: usize = 4;

/// Tracking ids below this value are real ids assigned by the device.
const FAKE_TRACKING_ID_BASE: i32 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TouchState {
    None,
    Begin,
    Update,
    End,
}

/// One finger contact.
#[derive(Debug, Clone)]
pub(crate) struct Touch {
    pub state: TouchState,
    /// Modified by the current report.
    pub dirty: bool,
    /// This touch moves the pointer.
    pub pointer: bool,
    /// Pinned by a physical button press, movement is ignored.
    pub pinned: bool,
    /// Synthesized from a `BTN_TOOL_*TAP` bit.
    pub fake: bool,

    /// Dense per-arena ordinal, assigned at begin and renumbered when a
    /// sibling ends.
    pub number: u32,
    /// Device tracking id, or a synthetic one for fake touches.
    pub tracking_id: i32,

    pub x: i32,
    pub y: i32,
    /// Time of the last update, in milliseconds.
    pub millis: u64,

    pub history: MotionHistory,

    pub button_state: ButtonState,
    /// Absolute expiry of the soft-button debounce timer, 0 when unarmed.
    pub button_timeout: u64,
}

impl Touch {
    fn new(history_size: usize) -> Self {
        Touch {
            state: TouchState::None,
            dirty: false,
            pointer: false,
            pinned: false,
            fake: false,
            number: 0,
            tracking_id: -1,
            x: 0,
            y: 0,
            millis: 0,
            history: MotionHistory::new(history_size),
            button_state: ButtonState::None,
            button_timeout: 0,
        }
    }

    /// Begin or Update.
    pub fn is_active(&self) -> bool {
        matches!(self.state, TouchState::Begin | TouchState::Update)
    }

    /// Relative delta of this touch based on its history ring.
    pub fn motion_to_delta(&self) -> (i32, i32) {
        self.history.delta_from(self.x, self.y)
    }

    /// Pin the current position against the last history sample.
    pub fn dejitter(&mut self) {
        let (x, y) = self.history.dejitter(self.x, self.y);
        self.x = x;
        self.y = y;
    }

    /// Back to `None`, with no roles and an empty history.
    pub fn reset(&mut self, history_size: usize) {
        self.state = TouchState::None;
        self.pointer = false;
        self.pinned = false;
        self.fake = false;
        self.button_state = ButtonState::None;
        self.button_timeout = 0;
        self.history.reset(history_size);
    }
}

/// The slot arena.
#[derive(Debug)]
pub(crate) struct Touches {
    slots: Vec<Touch>,
    /// Count of touches whose state is not `None`.
    pub fingers_down: u32,
    /// Real slots reported by the device.
    pub maxtouches: usize,
    /// Real slots plus the fake slots this device can need.
    ntouches: usize,
    next_fake_id: i32,
}

impl Touches {
    /// `maxtouches` real slots plus one fake slot per tool bit the device
    /// can raise beyond its slot count. The fake slot for an N-finger tool
    /// bit lives at index `maxtouches + (N - 2)`.
    pub fn new(maxtouches: usize, highest_tool_fingers: usize, history_size: usize) -> Self {
        let maxtouches = maxtouches.min(MAX_TOUCHPOINTS);
        let ntouches = if highest_tool_fingers > maxtouches {
            maxtouches + highest_tool_fingers - 1
        } else {
            maxtouches
        }
        .min(MAX_TOUCHPOINTS + MAX_FAKE_TOUCHES);

        Touches {
            slots: (0..ntouches).map(|_| Touch::new(history_size)).collect(),
            fingers_down: 0,
            maxtouches,
            ntouches,
            next_fake_id: FAKE_TRACKING_ID_BASE,
        }
    }

    pub fn ntouches(&self) -> usize {
        self.ntouches
    }

    pub fn get(&self, index: usize) -> &Touch {
        &self.slots[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Touch {
        &mut self.slots[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Touch> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Touch> {
        self.slots.iter_mut()
    }

    /// The touch currently owning the pointer role.
    pub fn pointer(&self) -> Option<&Touch> {
        self.slots.iter().find(|t| t.pointer)
    }

    pub fn pinned_index(&self) -> Option<usize> {
        self.slots.iter().position(|t| t.pinned)
    }

    /// Begin a contact in `index`. `tracking_id == None` synthesizes a fake
    /// touch with a monotonic id distinguishable from real ones.
    ///
    /// A slot still in `End` may be re-begun; it keeps counting as one
    /// finger from the device's point of view, so `fingers_down` is bumped
    /// again to undo the decrement of the end.
    pub fn begin(&mut self, index: usize, tracking_id: Option<i32>) {
        let number = self.fingers_down;
        let fake_id = self.next_fake_id;

        let t = &mut self.slots[index];
        if matches!(t.state, TouchState::None | TouchState::End) {
            self.fingers_down += 1;
        }
        if t.state == TouchState::None {
            t.number = number;
        }
        if t.state != TouchState::Update {
            t.state = TouchState::Begin;
        }

        match tracking_id {
            Some(id) => {
                t.tracking_id = id;
                t.fake = false;
            }
            None => {
                t.tracking_id = fake_id;
                t.fake = true;
                self.next_fake_id += 1;
            }
        }

        self.slots[index].dirty = true;
    }

    /// End the contact in `index`, if there is one.
    pub fn end(&mut self, index: usize) -> bool {
        let t = &mut self.slots[index];
        if t.state == TouchState::None {
            return false;
        }

        t.state = TouchState::End;
        t.dirty = true;
        self.fingers_down = self.fingers_down.saturating_sub(1);
        true
    }

    /// Raise the fake touches needed for an N-finger tool bit.
    ///
    /// A fake slot still in `End` is re-activated in place; the tool bits
    /// flicker when the finger count changes and the touch never really
    /// ended.
    pub fn begin_fake(&mut self, fingers: usize) -> bool {
        if self.maxtouches >= fingers {
            return false;
        }

        let mut changed = false;
        for n in 2..=fingers {
            if self.maxtouches >= n {
                continue;
            }
            let index = self.maxtouches + (n - 2);
            match self.slots[index].state {
                TouchState::End => {
                    self.begin(index, None);
                    self.slots[index].state = TouchState::Update;
                    changed = true;
                }
                TouchState::None => {
                    self.begin(index, None);
                    changed = true;
                }
                TouchState::Begin | TouchState::Update => {}
            }
        }

        changed
    }

    /// Lower every fake touch still alive.
    pub fn end_fake(&mut self, fingers: usize) -> bool {
        if self.maxtouches >= fingers {
            return false;
        }

        let mut changed = false;
        for index in self.maxtouches..self.ntouches {
            if self.slots[index].fake && self.slots[index].is_active() {
                changed |= self.end(index);
            }
        }

        changed
    }

    /// Pin the finger pressing the physical button.
    ///
    /// The touch lowest on the pad (greatest y) is the one pushing the
    /// button down. It loses the pointer role; with more than one finger
    /// down another active touch takes the pointer over so motion keeps
    /// flowing.
    pub fn pin_finger(&mut self) {
        if self.pinned_index().is_some() {
            return;
        }

        let pinned = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_active())
            .max_by_key(|(_, t)| t.y)
            .map(|(i, _)| i);

        let Some(pinned) = pinned else {
            return;
        };

        self.slots[pinned].pinned = true;
        self.slots[pinned].pointer = false;

        if self.fingers_down > 1 && self.pointer().is_none() {
            if let Some(t) = self
                .slots
                .iter_mut()
                .enumerate()
                .find(|(i, t)| *i != pinned && t.is_active())
                .map(|(_, t)| t)
            {
                t.pointer = true;
            }
        }
    }

    /// Undo [`pin_finger`](Self::pin_finger) on button release.
    pub fn unpin_finger(&mut self) {
        let fingers_down = self.fingers_down;
        if let Some(index) = self.pinned_index() {
            let t = &mut self.slots[index];
            t.pinned = false;
            if fingers_down == 1 {
                t.pointer = true;
            }
        }
    }

    /// Drop the pointer role if its touch ended.
    pub fn update_pointer_touch(&mut self) {
        if let Some(t) = self.slots.iter_mut().find(|t| t.pointer) {
            if t.state == TouchState::End {
                t.pointer = false;
            }
        }
    }

    /// Keep touch numbers a dense prefix after `ended` siblings went away.
    pub fn renumber(&mut self, ended: u32) {
        if ended == 0 {
            return;
        }
        for t in self.slots.iter_mut() {
            if t.state != TouchState::None {
                t.number = t.number.saturating_sub(ended);
            }
        }
    }
}
