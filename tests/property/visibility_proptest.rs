//! Visibility state machine properties

use proptest::prelude::*;

use chatline::shared::models::{Side, Visibility, VisibilityFlags};

#[derive(Debug, Clone, Copy)]
enum Transition {
    Hide(Side),
    DeleteForAll,
}

fn transition() -> impl Strategy<Value = Transition> {
    prop_oneof![
        Just(Transition::Hide(Side::Sender)),
        Just(Transition::Hide(Side::Receiver)),
        Just(Transition::DeleteForAll),
    ]
}

fn apply(visibility: &mut Visibility, step: Transition) {
    match step {
        Transition::Hide(side) => visibility.hide_for(side),
        Transition::DeleteForAll => visibility.delete_for_all(),
    }
}

const SENDER: i64 = 1;
const RECEIVER: i64 = 2;

proptest! {
    #[test]
    fn flags_never_unset(steps in prop::collection::vec(transition(), 0..12)) {
        let mut visibility = Visibility::active();
        let mut previous = visibility.flags();
        for step in steps {
            apply(&mut visibility, step);
            let current = visibility.flags();
            prop_assert!(!previous.deleted_by_sender || current.deleted_by_sender);
            prop_assert!(!previous.deleted_by_receiver || current.deleted_by_receiver);
            prop_assert!(!previous.deleted_for_all || current.deleted_for_all);
            previous = current;
        }
    }

    #[test]
    fn delete_for_all_hides_from_everyone(steps in prop::collection::vec(transition(), 0..12)) {
        let mut visibility = Visibility::active();
        for step in steps {
            apply(&mut visibility, step);
        }
        visibility.delete_for_all();
        prop_assert!(!visibility.visible_to(SENDER, SENDER));
        prop_assert!(!visibility.visible_to(RECEIVER, SENDER));
    }

    #[test]
    fn hiding_one_side_leaves_the_other(hide_sender in any::<bool>()) {
        let side = if hide_sender { Side::Sender } else { Side::Receiver };
        let mut visibility = Visibility::active();
        visibility.hide_for(side);

        prop_assert_eq!(visibility.visible_to(SENDER, SENDER), !hide_sender);
        prop_assert_eq!(visibility.visible_to(RECEIVER, SENDER), hide_sender);
    }

    #[test]
    fn wire_flags_match_predicate(
        deleted_by_sender in any::<bool>(),
        deleted_by_receiver in any::<bool>(),
        deleted_for_all in any::<bool>(),
    ) {
        let flags = VisibilityFlags { deleted_by_sender, deleted_by_receiver, deleted_for_all };
        let json = serde_json::to_value(flags).unwrap();
        let visibility: Visibility = serde_json::from_value(json).unwrap();

        prop_assert_eq!(visibility.flags(), flags);
        prop_assert_eq!(
            visibility.visible_to(SENDER, SENDER),
            !deleted_for_all && !deleted_by_sender
        );
        prop_assert_eq!(
            visibility.visible_to(RECEIVER, SENDER),
            !deleted_for_all && !deleted_by_receiver
        );
    }
}
