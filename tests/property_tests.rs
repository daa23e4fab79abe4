//! # Property-Based Tests
//!
//! Every deduction the engine makes must agree with a hidden assignment that
//! is consistent with all of the constraints it was given.

use count_solver::knowledge::{Agent, FirstChooser, KnowledgeBase, RandomChooser};
use count_solver::minesweeper::{Minesweeper, Outcome, play};
use proptest::collection::vec;
use proptest::prelude::*;

/// A hidden assignment of 12 variables and a list of variable subsets.
fn hidden_and_subsets() -> impl Strategy<Value = (Vec<bool>, Vec<Vec<usize>>)> {
    (
        vec(any::<bool>(), 12),
        vec(vec(0usize..12, 1..6), 1..15),
    )
}

proptest! {
    /// Constraints drawn from a real assignment never contradict, and every
    /// classified variable has its hidden value.
    #[test]
    fn deductions_agree_with_hidden_assignment((hidden, subsets) in hidden_and_subsets()) {
        let mut kb = KnowledgeBase::new();
        for subset in subsets {
            let mut subset = subset;
            subset.sort_unstable();
            subset.dedup();
            let count = subset.iter().filter(|&&v| hidden[v]).count();
            kb.add(subset, count).expect("consistent input never contradicts");
        }

        for &v in kb.known_true() {
            prop_assert!(hidden[v]);
        }
        for &v in kb.known_false() {
            prop_assert!(!hidden[v]);
        }
        prop_assert!(kb.is_consistent());
    }

    /// Classified sets never shrink while consistent constraints are added.
    #[test]
    fn knowledge_is_monotonic((hidden, subsets) in hidden_and_subsets()) {
        let mut kb = KnowledgeBase::new();
        let mut sizes = (0, 0);
        for subset in subsets {
            let count = subset.iter().copied().collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .filter(|&v| hidden[v])
                .count();
            kb.add(subset, count).expect("consistent input never contradicts");
            let now = (kb.known_true().len(), kb.known_false().len());
            prop_assert!(now.0 >= sizes.0);
            prop_assert!(now.1 >= sizes.1);
            sizes = now;
        }
    }

    /// Adding the same constraint twice never stores it twice.
    #[test]
    fn duplicates_are_not_stored(vars in vec(0u8..20, 2..8), seed in any::<u64>()) {
        let mut rng = fastrand::Rng::with_seed(seed);
        let distinct = vars.iter().copied().collect::<std::collections::BTreeSet<_>>();
        let count = rng.usize(1..distinct.len().max(2)).min(distinct.len() - 1);

        let mut kb = KnowledgeBase::new();
        kb.add(vars.clone(), count).expect("valid");
        let before = kb.constraints().len();
        kb.add(vars.into_iter().rev(), count).expect("valid");
        prop_assert_eq!(kb.constraints().len(), before);
    }

    /// Agents never flag a safe cell or mark a mine safe, whatever the board.
    #[test]
    fn games_are_sound(
        height in 2usize..9,
        width in 2usize..9,
        density in 0usize..30,
        seed in any::<u64>(),
    ) {
        let mines = height * width * density / 100;
        let mut rng = fastrand::Rng::with_seed(seed);
        let board = Minesweeper::new(height, width, mines, &mut rng).expect("mines fit");

        let mut agent = Agent::new(RandomChooser::with_seed(seed));
        let report = play(&board, &mut agent).expect("boards are consistent");

        prop_assert!(agent.known_true().iter().all(|&c| board.is_mine(c)));
        prop_assert!(agent.known_false().iter().all(|&c| !board.is_mine(c)));
        prop_assert!(agent.knowledge().is_consistent());
        prop_assert_eq!(report.moves, report.informed_moves + report.blind_moves);
        match report.outcome {
            Outcome::Won => prop_assert!(agent.visited().iter().all(|&c| !board.is_mine(c))),
            Outcome::Lost(cell) => prop_assert!(board.is_mine(cell)),
        }
    }

    /// A game on a board without mines is always won.
    #[test]
    fn mine_free_boards_are_won(height in 1usize..8, width in 1usize..8) {
        let board = Minesweeper::with_mines(height, width, []).expect("valid");
        let mut agent = Agent::new(FirstChooser);
        let report = play(&board, &mut agent).expect("consistent");
        prop_assert!(report.won());
        prop_assert_eq!(agent.visited().len(), height * width);
    }
}
