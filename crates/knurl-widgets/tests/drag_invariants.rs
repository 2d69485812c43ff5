//! Property tests for the drag engines.
//!
//! The useful invariants here are reversibility (returning the pointer to
//! its origin restores the original value), range safety under arbitrary
//! travel, and terminality of the multi-drag decision.

use proptest::prelude::*;

use knurl_core::config::InteractionConfig;
use knurl_core::event::Modifiers;
use knurl_core::geometry::Point;
use knurl_widgets::text_edit::TextEditState;
use knurl_widgets::value_drag::{DragEdit, step_value};
use knurl_widgets::widget::{NumberField, auto_precision};
use knurl_widgets::multi_drag::{MultiDragInit, MultiDragState};

fn arb_point() -> impl Strategy<Value = Point> {
    (-500i32..500, -500i32..500).prop_map(|(x, y)| Point::new(x, y))
}

fn arb_bounded_field() -> impl Strategy<Value = NumberField> {
    (
        -100.0f64..100.0,
        0.0f64..100.0,
        prop_oneof![Just(0.01), Just(0.1), Just(1.0)],
    )
        .prop_map(|(min, span, step)| {
            let max = min + span + step;
            NumberField::new((min + max) / 2.0)
                .with_range(min, max)
                .with_step(step)
        })
}

fn arb_mods() -> impl Strategy<Value = Modifiers> {
    prop_oneof![
        Just(Modifiers::NONE),
        Just(Modifiers::SHIFT),
        Just(Modifiers::CTRL),
        Just(Modifiers::CTRL | Modifiers::SHIFT),
    ]
}

proptest! {
    #[test]
    fn drag_output_stays_in_hard_range(
        field in arb_bounded_field(),
        path in prop::collection::vec(arb_point(), 1..40),
        mods in arb_mods(),
    ) {
        let cfg = InteractionConfig::default();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        for p in path {
            let v = drag.update(p, mods, &field, &cfg);
            prop_assert!(v >= field.hard_min - 1e-9);
            prop_assert!(v <= field.hard_max + 1e-9);
        }
    }

    #[test]
    fn returning_to_origin_restores_start_value(
        field in arb_bounded_field(),
        path in prop::collection::vec(arb_point(), 1..40),
    ) {
        // Unmodified travel out and back cancels exactly; overshoot past
        // the hard range only clamps the output, not the accumulator.
        let cfg = InteractionConfig::default();
        let origin = Point::new(0, 0);
        let mut drag = DragEdit::begin(origin, &field, &cfg);
        for p in path {
            drag.update(p, Modifiers::NONE, &field, &cfg);
        }
        let back = drag.update(origin, Modifiers::NONE, &field, &cfg);
        prop_assert!((back - drag.start_value()).abs() < 1e-6);
    }

    #[test]
    fn drag_is_monotone_in_rightward_travel(
        field in arb_bounded_field(),
        steps in prop::collection::vec(1i32..20, 1..20),
    ) {
        let cfg = InteractionConfig::default();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        let mut x = 0;
        let mut prev = field.value;
        for dx in steps {
            x += dx;
            let v = drag.update(Point::new(x, 0), Modifiers::NONE, &field, &cfg);
            prop_assert!(v >= prev - 1e-9);
            prev = v;
        }
    }

    #[test]
    fn step_value_stays_in_hard_range(
        field in arb_bounded_field(),
        steps in -1000i32..1000,
        mods in arb_mods(),
    ) {
        let cfg = InteractionConfig::default();
        let v = step_value(&field, steps, mods, &cfg);
        prop_assert!(v >= field.hard_min && v <= field.hard_max);
    }

    #[test]
    fn precision_is_always_displayable(
        step in prop_oneof![Just(0.0), Just(0.001), Just(0.01), Just(0.1), Just(1.0), Just(10.0)],
        value in -1e6f64..1e6,
    ) {
        prop_assert!(auto_precision(step, value) <= 6);
    }

    #[test]
    fn multi_drag_decision_is_terminal(
        first in prop::collection::vec(arb_point(), 1..10),
        rest in prop::collection::vec(arb_point(), 1..10),
    ) {
        let cfg = InteractionConfig::default();
        let mut state = MultiDragState::new(Point::new(0, 0));
        for p in first {
            state.feed(p, &cfg);
        }
        let decided = state.init();
        if decided == MultiDragInit::Disabled {
            for p in rest {
                state.feed(p, &cfg);
                prop_assert_eq!(state.init(), MultiDragInit::Disabled);
            }
        }
    }

    #[test]
    fn text_cursor_stays_on_boundary(
        chars in prop::collection::vec(any::<char>(), 0..20),
    ) {
        use knurl_core::event::{KeyCode, KeyEvent};
        let mut edit = TextEditState::new("seed", None, 32);
        for c in chars {
            if c.is_control() {
                continue;
            }
            edit.handle_key(&KeyEvent::new(KeyCode::Char(c)));
            edit.handle_key(&KeyEvent::new(KeyCode::Left));
        }
        prop_assert!(edit.text().is_char_boundary(edit.cursor()));
    }
}
