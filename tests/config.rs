mod common;

use common::{Recorder, TestPad};
use touchpad::config::{ConfigErrorKind, Parameter, USE_DEFAULT};
use touchpad::ScrollMethods;

#[test]
fn shorter_tap_timeout_changes_behavior() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touchpad
        .set_config(&[(Parameter::TapTimeout, 10)])
        .unwrap();

    // 6 ms between reports, so two idle reports push past the timeout
    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.wait(&mut rec, 50);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, 100);

    assert!(rec.taps().is_empty());
}

#[test]
fn raised_move_threshold_lets_a_sloppy_tap_through() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touchpad
        .set_config(&[(Parameter::TapMoveThreshold, 500)])
        .unwrap();

    pad.touch_down(&mut rec, 0, 1, 3000, 3000);
    pad.touch_move(&mut rec, 0, 3100, 3000);
    pad.touch_up(&mut rec, 0);
    pad.wait(&mut rec, pad.tap_timeout() * 2);

    assert_eq!(rec.taps(), vec![(1, true), (1, false)]);
}

#[test]
fn scroll_method_none_disables_scrolling() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touchpad
        .set_config(&[(Parameter::ScrollMethods, ScrollMethods::empty().bits() as i32)])
        .unwrap();

    pad.touch_down(&mut rec, 0, 1, 2000, 2000);
    pad.touch_down(&mut rec, 1, 2, 3000, 2000);
    for i in 1..=14 {
        let y = 2000 + i * 150;
        pad.two_finger_move(&mut rec, (2000, y), (3000, y));
    }
    pad.touch_up(&mut rec, 0);
    pad.touch_up(&mut rec, 1);

    assert!(rec.scrolls().is_empty());
}

#[test]
fn smaller_history_reacts_faster() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    pad.touchpad
        .set_config(&[(Parameter::MotionHistorySize, 4)])
        .unwrap();

    // with a 4-deep ring the delta filter fills after a few reports and
    // a short swipe already scrolls
    pad.touch_down(&mut rec, 0, 1, 2000, 2000);
    pad.touch_down(&mut rec, 1, 2, 3000, 2000);
    for i in 1..=6 {
        let y = 2000 + i * 200;
        pad.two_finger_move(&mut rec, (2000, y), (3000, y));
    }
    pad.touch_up(&mut rec, 0);
    pad.touch_up(&mut rec, 1);

    assert!(!rec.scrolls().is_empty());
}

#[test]
fn softbutton_region_can_be_moved() {
    let mut pad = TestPad::clickpad();
    let mut rec = Recorder::default();

    // right button on the left half instead
    pad.touchpad
        .set_config(&[
            (Parameter::SoftButtonRightEdgeLeft, 0),
            (Parameter::SoftButtonRightEdgeRight, 50),
        ])
        .unwrap();

    pad.touch_down(&mut rec, 0, 1, 1000, 4500);
    pad.wait(&mut rec, 150);
    pad.button_press(&mut rec);
    pad.button_release(&mut rec);
    pad.touch_up(&mut rec, 0);

    assert_eq!(
        rec.buttons(),
        vec![
            (touchpad::codes::BTN_RIGHT as u32, true),
            (touchpad::codes::BTN_RIGHT as u32, false)
        ]
    );
}

#[test]
fn rejected_batches_leave_prior_state_alone() {
    let mut pad = TestPad::clickpad();

    let err = pad
        .touchpad
        .set_config(&[
            (Parameter::TapTimeout, 240),
            (Parameter::TapTimeout, -5),
        ])
        .unwrap_err();
    assert_eq!(err.position, 2);
    assert_eq!(err.kind, ConfigErrorKind::ValueTooLow);
    assert_eq!(pad.touchpad.get_config(Parameter::TapTimeout), 240);

    pad.touchpad
        .set_config(&[(Parameter::TapTimeout, USE_DEFAULT)])
        .unwrap();
    assert_eq!(pad.touchpad.get_config(Parameter::TapTimeout), 180);
}
