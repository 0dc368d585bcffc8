//! Debounce and single-press arbitration tests

mod common;

use awning_link::buttons::{
    classify, Arbitration, ButtonArbiter, ButtonMask, Classification, InputDebouncer,
};
use awning_link::hal::Clock;
use common::MockBoard;

// ============================================================================
// InputDebouncer
// ============================================================================

#[test]
fn test_debounce_accepts_stable_press() {
    let mut board = MockBoard::new();
    board.press(0, 0, 1_000);

    let mask = InputDebouncer::new(50).sample(&mut board);
    assert_eq!(mask, ButtonMask::single(0));
    // One asserted line costs one debounce interval
    assert_eq!(board.now_ms(), 50);
}

#[test]
fn test_debounce_rejects_glitch() {
    let mut board = MockBoard::new();
    board.press(2, 0, 20); // shorter than the interval

    let mask = InputDebouncer::new(50).sample(&mut board);
    assert!(mask.is_empty());
}

#[test]
fn test_debounce_idle_costs_nothing() {
    let mut board = MockBoard::new();
    let mask = InputDebouncer::new(50).sample(&mut board);
    assert!(mask.is_empty());
    assert_eq!(board.now_ms(), 0);
}

#[test]
fn test_debounce_worst_case_latency() {
    let mut board = MockBoard::new();
    for line in 0..6 {
        board.hold(line, 0);
    }

    let mask = InputDebouncer::new(50).sample(&mut board);
    assert_eq!(mask, ButtonMask::ALL);
    assert_eq!(board.now_ms(), 6 * 50);
}

#[test]
fn test_debounce_line_released_while_confirming_another() {
    let mut board = MockBoard::new();
    board.hold(0, 0);
    board.press(3, 0, 40); // gone by the time line 3 is read at t=50

    let mask = InputDebouncer::new(50).sample(&mut board);
    assert_eq!(mask, ButtonMask::single(0));
}

#[test]
fn test_debounce_reports_real_multi_press() {
    let mut board = MockBoard::new();
    board.hold(0, 0);
    board.hold(1, 0);

    let mask = InputDebouncer::new(50).sample(&mut board);
    assert_eq!(mask.bits(), 0b0000_0011);
    assert_eq!(mask.count(), 2);
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_classify_never_single_unless_one_bit() {
    for bits in 0u8..64 {
        let mask = ButtonMask::from_bits(bits);
        match classify(mask) {
            Classification::Single(cmd) => {
                assert_eq!(bits.count_ones(), 1, "mask 0b{:06b}", bits);
                assert_eq!(cmd.mask(), mask);
            }
            Classification::NoneActive => assert_eq!(bits, 0),
            Classification::MultipleActive(n) => {
                assert!(n >= 2);
                assert_eq!(n, bits.count_ones());
            }
        }
    }
}

#[test]
fn test_classify_single_index() {
    for index in 0..6 {
        match classify(ButtonMask::single(index)) {
            Classification::Single(cmd) => {
                assert_eq!(cmd.index(), index);
                assert_eq!(cmd.number(), index + 1);
            }
            other => panic!("expected Single, got {:?}", other),
        }
    }
}

// ============================================================================
// ButtonArbiter
// ============================================================================

#[test]
fn test_arbiter_multi_press_never_transmits() {
    for bits in 0u8..64 {
        let mut arbiter = ButtonArbiter::new(5_000);
        let result = arbiter.arbitrate(ButtonMask::from_bits(bits), 0);
        match bits.count_ones() {
            0 => assert_eq!(result, Arbitration::Idle),
            1 => assert!(matches!(result, Arbitration::Transmit(_))),
            n => assert_eq!(result, Arbitration::Rejected { count: n }),
        }
    }
}

#[test]
fn test_arbiter_suppresses_held_button() {
    let mut arbiter = ButtonArbiter::new(5_000);
    let button = ButtonMask::single(2);

    let first = arbiter.arbitrate(button, 0);
    let cmd = match first {
        Arbitration::Transmit(cmd) => cmd,
        other => panic!("expected Transmit, got {:?}", other),
    };

    assert_eq!(arbiter.arbitrate(button, 100), Arbitration::Held(cmd));
    assert_eq!(arbiter.arbitrate(button, 4_999), Arbitration::Held(cmd));
    assert_eq!(arbiter.held(), Some(cmd));
}

#[test]
fn test_arbiter_release_rearms() {
    let mut arbiter = ButtonArbiter::new(5_000);
    let button = ButtonMask::single(4);

    assert!(matches!(arbiter.arbitrate(button, 0), Arbitration::Transmit(_)));
    assert_eq!(arbiter.arbitrate(ButtonMask::NONE, 200), Arbitration::Idle);
    assert_eq!(arbiter.held(), None);
    assert!(matches!(arbiter.arbitrate(button, 300), Arbitration::Transmit(_)));
}

#[test]
fn test_arbiter_force_release_after_hold_timeout() {
    let mut arbiter = ButtonArbiter::new(5_000);
    let button = ButtonMask::single(1);

    assert!(matches!(arbiter.arbitrate(button, 1_000), Arbitration::Transmit(_)));
    assert!(matches!(arbiter.arbitrate(button, 5_999), Arbitration::Held(_)));

    // 5 s after the transmit the hold is dropped and the still-pressed button fires again
    assert!(matches!(arbiter.arbitrate(button, 6_000), Arbitration::Transmit(_)));
    assert!(matches!(arbiter.arbitrate(button, 6_100), Arbitration::Held(_)));
}

#[test]
fn test_arbiter_other_button_while_held_is_rejected() {
    let mut arbiter = ButtonArbiter::new(5_000);

    assert!(matches!(
        arbiter.arbitrate(ButtonMask::single(0), 0),
        Arbitration::Transmit(_)
    ));
    // Second button joins the held one
    let both = ButtonMask::single(0).with(1);
    assert_eq!(arbiter.arbitrate(both, 100), Arbitration::Rejected { count: 2 });

    // Extra button let go: still the same hold, nothing re-sent
    match arbiter.arbitrate(ButtonMask::single(0), 200) {
        Arbitration::Held(cmd) => assert_eq!(cmd.index(), 0),
        other => panic!("expected Held, got {:?}", other),
    }
    assert_eq!(arbiter.held().map(|c| c.index()), Some(0));
}

#[test]
fn test_arbiter_switch_buttons() {
    let mut arbiter = ButtonArbiter::new(5_000);

    assert!(matches!(
        arbiter.arbitrate(ButtonMask::single(0), 0),
        Arbitration::Transmit(_)
    ));
    match arbiter.arbitrate(ButtonMask::single(3), 100) {
        Arbitration::Transmit(cmd) => assert_eq!(cmd.index(), 3),
        other => panic!("expected Transmit, got {:?}", other),
    }
}

#[test]
fn test_arbiter_activity() {
    let mut arbiter = ButtonArbiter::new(5_000);
    assert!(!arbiter.arbitrate(ButtonMask::NONE, 0).is_activity());
    assert!(arbiter.arbitrate(ButtonMask::from_bits(0b11), 0).is_activity());
    assert!(arbiter.arbitrate(ButtonMask::single(5), 0).is_activity());
    assert!(arbiter.arbitrate(ButtonMask::single(5), 10).is_activity());
}

#[test]
fn test_arbiter_reset_forgets_hold() {
    let mut arbiter = ButtonArbiter::new(5_000);
    let button = ButtonMask::single(2);
    assert!(matches!(arbiter.arbitrate(button, 0), Arbitration::Transmit(_)));
    arbiter.reset();
    assert!(matches!(arbiter.arbitrate(button, 10), Arbitration::Transmit(_)));
}
