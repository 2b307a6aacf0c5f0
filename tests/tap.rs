mod common;

use common::{Recorder, TestPad};
use touchpad::codes;
use touchpad::config::Parameter;

#[test]
fn single_finger_tap() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_up(&mut rec, 0);
    assert_eq!(rec.taps(), vec![(1, true)]);

    pad.wait(&mut rec, pad.tap_timeout() * 2);
    assert_eq!(rec.taps(), vec![(1, true), (1, false)]);
    assert!(rec.buttons().is_empty());
    assert!(rec.scrolls().is_empty());
}

#[test]
fn moving_finger_does_not_tap() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.move_to(&mut rec, 0, (3000, 3000), (3600, 3000), 6);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert!(rec.taps().is_empty());
}

#[test]
fn held_finger_does_not_tap() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.wait(&mut rec, pad.tap_timeout() * 2);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert!(rec.taps().is_empty());
}

#[test]
fn double_tap_is_two_full_taps() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_up(&mut rec, 0);
    pad.touch_down(&mut rec, 0, 2, 3000, 3000);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert_eq!(
        rec.taps(),
        vec![(1, true), (1, false), (1, true), (1, false)]
    );
}

#[test]
fn two_finger_tap() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_down(&mut rec, 1, 2, 4000, 4000);
    pad.touch_up(&mut rec, 0);
    pad.touch_up(&mut rec, 1);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert_eq!(rec.taps(), vec![(2, true), (2, false)]);
}

#[test]
fn two_finger_tap_release_order_does_not_matter() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_down(&mut rec, 1, 2, 4000, 4000);
    pad.touch_up(&mut rec, 1);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert_eq!(rec.taps(), vec![(2, true), (2, false)]);
}

#[test]
fn two_fingers_moving_do_not_tap() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 2000, 2000);
    pad.touch_down(&mut rec, 1, 2, 3000, 2000);
    pad.move_to(&mut rec, 0, (2000, 2000), (2600, 2000), 6);
    pad.touch_up(&mut rec, 0);
    pad.touch_up(&mut rec, 1);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert!(rec.taps().is_empty());
}

#[test]
fn three_finger_tap() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 2000, 2000);
    pad.touch_down(&mut rec, 1, 2, 3000, 2000);
    pad.touch_down(&mut rec, 2, 3, 4000, 2000);
    pad.touch_up(&mut rec, 0);
    pad.touch_up(&mut rec, 1);
    pad.touch_up(&mut rec, 2);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert_eq!(rec.taps(), vec![(3, true), (3, false)]);
}

#[test]
fn tap_and_drag() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_up(&mut rec, 0);
    pad.touch_down(&mut rec, 0, 2, 3000, 3000);
    pad.move_to(&mut rec, 0, (3000, 3000), (4000, 3000), 12);

    // the press from the tap is held across the drag
    assert_eq!(rec.taps(), vec![(1, true)]);
    assert!(!rec.motions().is_empty());

    pad.touch_up(&mut rec, 0);
    assert_eq!(rec.taps(), vec![(1, true), (1, false)]);
}

#[test]
fn physical_button_kills_the_tap() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.button_press(&mut rec);
    pad.button_release(&mut rec);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert!(rec.taps().is_empty());
    assert_eq!(
        rec.buttons(),
        vec![(codes::BTN_LEFT as u32, true), (codes::BTN_LEFT as u32, false)]
    );
}

#[test]
fn disabled_tapping_stays_silent() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touchpad
        .set_config(&[(Parameter::TapEnable, 0)])
        .unwrap();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert!(rec.taps().is_empty());
}

#[test]
fn every_tap_press_is_matched_by_a_release() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    // a handful of mixed gestures
    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_up(&mut rec, 0);
    pad.touch_down(&mut rec, 0, 2, 3000, 3000);
    pad.touch_down(&mut rec, 1, 3, 4000, 3000);
    pad.touch_up(&mut rec, 0);
    pad.touch_up(&mut rec, 1);
    pad.wait(&mut rec, pad.tap_timeout() * 2);
    pad.touch_down(&mut rec, 0, 4, 1000, 1000);
    pad.move_to(&mut rec, 0, (1000, 1000), (2000, 2000), 10);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    let mut down: Vec<u32> = Vec::new();
    for (fingers, is_press) in rec.taps() {
        if is_press {
            down.push(fingers);
        } else {
            assert_eq!(down.pop(), Some(fingers), "unbalanced tap release");
        }
    }
    assert!(down.is_empty(), "unreleased tap presses: {down:?}");
}
