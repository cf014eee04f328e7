use std::{sync::Arc, thread};

use lcauto::{Action, LookaheadStrategy, StateSet, state_set_for};
use lcgrammar::{
    Grammar,
    def::{GrammarDef, concat, lit, longest, nt, pat, priority, slist, star},
};

fn calc() -> Arc<Grammar> {
    Arc::new(
        Grammar::new(
            &GrammarDef::new("calc")
                .rule(
                    "Expr",
                    longest(vec![vec![nt("Expr"), lit("+"), nt("Term")], vec![nt("Term")]]),
                )
                .rule(
                    "Term",
                    longest(vec![vec![nt("Term"), lit("*"), nt("Factor")], vec![nt("Factor")]]),
                )
                .rule(
                    "Factor",
                    priority(vec![
                        vec![lit("("), nt("Expr"), lit(")")],
                        vec![nt("Call")],
                        vec![nt("INT")],
                    ]),
                )
                .rule("Call", concat(vec![nt("ID"), lit("("), nt("Args"), lit(")")]))
                .rule("Args", slist(0, None, nt("Expr"), lit(",")))
                .rule("Stmts", star(nt("Expr")))
                .leaf("INT", pat("[0-9]+"))
                .leaf("ID", pat("[a-z]+"))
                .skip("WS", pat("[ \\t]+")),
        )
        .unwrap(),
    )
}

#[test]
fn lazy_matches_eager() {
    let grm = calc();
    for goal in ["Expr", "Factor", "Stmts"] {
        let goal = grm.rule_idx(goal).unwrap();
        for strategy in [LookaheadStrategy::None, LookaheadStrategy::Lc1] {
            let eager = StateSet::build_for(Arc::clone(&grm), goal, strategy).unwrap();
            let lazy = StateSet::new(Arc::clone(&grm), goal, strategy).unwrap();
            assert_eq!(lazy.states_len(), 1);
            lazy.width_transitions(lazy.start_state());
            assert!(lazy.is_consistent_with(&eager));
            assert!(lazy.matches(&eager));
            assert_eq!(lazy.states_len(), eager.states_len());
        }
    }
}

#[test]
fn every_state_is_reachable_and_guarded() {
    let grm = calc();
    let goal = grm.rule_idx("Expr").unwrap();
    let ss = StateSet::build_for(Arc::clone(&grm), goal, LookaheadStrategy::Lc1).unwrap();
    let mut goal_transitions = 0;
    for st in 0..ss.states_len() {
        let st = lcauto::StIdx::from(st);
        for c in grm.iter_rules() {
            for t in ss.complete_transitions(st, c).iter() {
                assert!(!t.guard.is_any());
                assert!(t.guard.iter().next().is_some());
                assert_eq!(t.context, Some(st));
                if t.action == Action::Goal {
                    goal_transitions += 1;
                    assert_eq!(st, ss.start_state());
                    assert!(t.guard.contains(grm.eot_ridx()));
                }
            }
        }
    }
    assert_eq!(goal_transitions, 1);
}

#[test]
fn concurrent_lazy_construction() {
    let grm = calc();
    let goal = grm.rule_idx("Expr").unwrap();
    let shared = state_set_for(&grm, goal, LookaheadStrategy::Lc1).unwrap();
    let handles = (0..4)
        .map(|_| {
            let ss = Arc::clone(&shared);
            thread::spawn(move || ss.build())
        })
        .collect::<Vec<_>>();
    for h in handles {
        h.join().unwrap();
    }
    let eager = StateSet::build_for(Arc::clone(&grm), goal, LookaheadStrategy::Lc1).unwrap();
    assert_eq!(shared.states_len(), eager.states_len());
    assert!(shared.matches(&eager));
}
