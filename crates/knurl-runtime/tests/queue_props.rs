#![forbid(unsafe_code)]

//! Property checks for deferred-action ordering.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use knurl_core::event::Modifiers;
use knurl_core::geometry::Point;
use knurl_runtime::{AfterAction, AfterQueue, UndoJournal};
use knurl_widgets::binding::{OpContext, OpResult, Operator};

struct TaggedOp {
    tag: usize,
    log: Rc<RefCell<Vec<usize>>>,
    willing: bool,
}

impl Operator for TaggedOp {
    fn poll(&self, _ctx: &OpContext) -> bool {
        self.willing
    }

    fn invoke(&self, _ctx: &OpContext) -> OpResult {
        self.log.borrow_mut().push(self.tag);
        OpResult::Finished
    }
}

proptest! {
    /// Draining runs operators in insertion order and records exactly one
    /// undo step per finished action that asked for one, in that same
    /// order, for any queue length and any pattern of refusals.
    #[test]
    fn flush_preserves_insertion_order(
        willing in prop::collection::vec(any::<bool>(), 0..32),
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = AfterQueue::new();
        let mut journal = UndoJournal::default();

        for (tag, &willing) in willing.iter().enumerate() {
            queue.push(AfterAction {
                op: Some(Rc::new(TaggedOp {
                    tag,
                    log: log.clone(),
                    willing,
                })),
                ctx: OpContext::new(Point::new(0, 0), Modifiers::NONE),
                undo: Some(format!("step {tag}")),
                notify: None,
            });
        }

        for action in queue.drain() {
            if action.run() == OpResult::Finished
                && let Some(label) = action.undo
            {
                journal.push(label);
            }
        }

        let ran: Vec<usize> = log.borrow().clone();
        let expected: Vec<usize> = willing
            .iter()
            .enumerate()
            .filter_map(|(tag, &w)| w.then_some(tag))
            .collect();
        prop_assert_eq!(&ran, &expected);
        let labels: Vec<String> = expected.iter().map(|tag| format!("step {tag}")).collect();
        prop_assert_eq!(journal.steps(), &labels[..]);
        prop_assert!(queue.is_empty());
    }
}
