//! Randomised workloads over a small universe of values and keys.
//!
//! Value `i` always provides key `i` and only requires or needs keys below
//! `i`, so every workload is free of dependency cycles, including workloads
//! that switch a value between two descriptors.

use std::collections::{HashMap, HashSet};

use admit_queue::{DependencyQueue, Descriptor};
use proptest::prelude::*;

const VALUES: u8 = 6;

#[derive(Debug, Clone)]
struct Entry {
    provides: Vec<u8>,
    requires: Vec<u8>,
    needs: Vec<u8>,
}

fn entry_for(id: u8) -> impl Strategy<Value = Entry> {
    let extra = prop::collection::vec(id..VALUES, 0..2);
    let below = if id == 0 {
        Just(Vec::new()).boxed()
    } else {
        prop::collection::vec(0..id, 0..3).boxed()
    };
    (extra, below.clone(), below).prop_map(move |(mut provides, requires, needs)| {
        provides.push(id);
        Entry {
            provides,
            requires,
            needs,
        }
    })
}

/// One entry per value plus a script of `(value, is_offer)` operations.
fn workload() -> impl Strategy<Value = (Vec<Entry>, Vec<(u8, bool)>)> {
    let entries: Vec<_> = (0..VALUES).map(entry_for).collect();
    let ops = prop::collection::vec((0..VALUES, any::<bool>()), 1..40);
    (entries, ops)
}

#[derive(Debug, Clone, Copy)]
enum Action {
    /// Offer the value with the first or second of its descriptors.
    Offer(usize),
    Retract,
}

/// Two descriptors per value plus a script that may re-offer a registered
/// value with the other one.
fn changing_workload() -> impl Strategy<Value = (Vec<[Entry; 2]>, Vec<(u8, Action)>)> {
    let entries: Vec<_> = (0..VALUES)
        .map(|id| (entry_for(id), entry_for(id)).prop_map(|(a, b)| [a, b]))
        .collect();
    let action = prop_oneof![
        Just(Action::Offer(0)),
        Just(Action::Offer(1)),
        Just(Action::Retract),
    ];
    let ops = prop::collection::vec((0..VALUES, action), 1..60);
    (entries, ops)
}

fn descriptor(e: &Entry) -> Descriptor<u8> {
    Descriptor::new(
        e.provides.iter().copied(),
        e.requires.iter().copied(),
        e.needs.iter().copied(),
    )
}

/// Whether every accepted value has an accepted provider for each of its
/// constraints, given the descriptor each value is registered with.
fn closure_holds_with(q: &DependencyQueue<u8, u8>, registered: &HashMap<u8, Entry>) -> bool {
    let accepted: HashSet<u8> = q.accepted().into_iter().collect();
    accepted.iter().all(|v| {
        let e = &registered[v];
        e.requires.iter().chain(e.needs.iter()).all(|k| {
            accepted
                .iter()
                .any(|p| registered[p].provides.contains(k))
        })
    })
}

fn offer(q: &DependencyQueue<u8, u8>, entries: &[Entry], id: u8) -> Vec<u8> {
    let e = &entries[id as usize];
    q.offer(
        id,
        e.provides.iter().copied(),
        e.requires.iter().copied(),
        e.needs.iter().copied(),
    )
}

fn provides(entries: &[Entry], value: u8, key: u8) -> bool {
    entries[value as usize].provides.contains(&key)
}

fn constraints(entries: &[Entry], value: u8) -> impl Iterator<Item = u8> + '_ {
    let e = &entries[value as usize];
    e.requires.iter().chain(e.needs.iter()).copied()
}

fn closure_holds(q: &DependencyQueue<u8, u8>, entries: &[Entry]) -> bool {
    let accepted: HashSet<u8> = q.accepted().into_iter().collect();
    accepted.iter().all(|&v| {
        constraints(entries, v).all(|k| accepted.iter().any(|&p| provides(entries, p, k)))
    })
}

proptest! {
    #[test]
    fn accepted_values_keep_accepted_providers((entries, ops) in workload()) {
        let q = DependencyQueue::new();
        for (id, is_offer) in ops {
            if is_offer {
                offer(&q, &entries, id);
            } else {
                q.retract(&id);
            }
            prop_assert!(closure_holds(&q, &entries));
        }
    }

    #[test]
    fn offer_lists_providers_before_requirers((entries, ops) in workload()) {
        let q = DependencyQueue::new();
        for (id, is_offer) in ops {
            if !is_offer {
                q.retract(&id);
                continue;
            }
            let before: HashSet<u8> = q.accepted().into_iter().collect();
            let newly = offer(&q, &entries, id);

            if !before.contains(&id) && !newly.is_empty() {
                prop_assert_eq!(newly.iter().filter(|&&v| v == id).count(), 1);
            }
            for (i, &v) in newly.iter().enumerate() {
                prop_assert!(!before.contains(&v));
                for &k in &entries[v as usize].requires {
                    let satisfied = before.iter().any(|&p| provides(&entries, p, k))
                        || newly[..i].iter().any(|&p| provides(&entries, p, k));
                    prop_assert!(satisfied, "{} listed before a provider of {}", v, k);
                }
            }
        }
    }

    #[test]
    fn retract_lists_dependents_before_providers((entries, ops) in workload()) {
        let q = DependencyQueue::new();
        for (id, is_offer) in ops {
            if is_offer {
                offer(&q, &entries, id);
                continue;
            }
            let before: HashSet<u8> = q.accepted().into_iter().collect();
            let retracted = q.retract(&id);
            if retracted.is_empty() {
                continue;
            }
            prop_assert_eq!(*retracted.last().unwrap(), id);
            for (i, &v) in retracted.iter().enumerate().take(retracted.len() - 1) {
                // Some key of `v` lost every provider that was accepted, and
                // each of those providers is listed after `v`.
                let lost = constraints(&entries, v).any(|k| {
                    before
                        .iter()
                        .filter(|&&p| provides(&entries, p, k))
                        .all(|p| retracted[i + 1..].contains(p))
                });
                prop_assert!(lost, "{} retracted without losing a provider", v);
            }
        }
    }

    #[test]
    fn retract_then_offer_restores_accepted_set((entries, ops) in workload()) {
        let q = DependencyQueue::new();
        for (id, _) in &ops {
            offer(&q, &entries, *id);
        }
        let before: HashSet<u8> = q.accepted().into_iter().collect();
        for &v in &before {
            q.retract(&v);
            offer(&q, &entries, v);
            let after: HashSet<u8> = q.accepted().into_iter().collect();
            prop_assert_eq!(&before, &after);
        }
    }

    #[test]
    fn updates_keep_accepted_providers((entries, ops) in changing_workload()) {
        let q = DependencyQueue::new();
        let mut registered = HashMap::new();
        for (id, action) in ops {
            match action {
                Action::Offer(variant) => {
                    let e = &entries[id as usize][variant];
                    let before: HashSet<u8> = q.accepted().into_iter().collect();
                    let outcome = q.update(id, descriptor(e));
                    registered.insert(id, e.clone());
                    let after: HashSet<u8> = q.accepted().into_iter().collect();

                    for v in &outcome.accepted {
                        prop_assert!(!before.contains(v) && after.contains(v));
                    }
                    for v in &outcome.retracted {
                        prop_assert!(before.contains(v) && !after.contains(v));
                    }
                    let changed = before.symmetric_difference(&after).count();
                    prop_assert_eq!(changed, outcome.accepted.len() + outcome.retracted.len());
                }
                Action::Retract => {
                    q.retract(&id);
                    registered.remove(&id);
                }
            }
            prop_assert!(closure_holds_with(&q, &registered));
        }
    }

    #[test]
    fn retract_after_updates_lists_dependents_first((entries, ops) in changing_workload()) {
        let q = DependencyQueue::new();
        let mut registered: HashMap<u8, Entry> = HashMap::new();
        for (id, action) in ops {
            if let Action::Offer(variant) = action {
                let e = &entries[id as usize][variant];
                q.update(id, descriptor(e));
                registered.insert(id, e.clone());
                continue;
            }
            let before: HashSet<u8> = q.accepted().into_iter().collect();
            let retracted = q.retract(&id);
            if !retracted.is_empty() {
                prop_assert_eq!(*retracted.last().unwrap(), id);
                for (i, v) in retracted.iter().enumerate().take(retracted.len() - 1) {
                    let e = &registered[v];
                    let lost = e.requires.iter().chain(e.needs.iter()).any(|k| {
                        before
                            .iter()
                            .filter(|p| registered[*p].provides.contains(k))
                            .all(|p| retracted[i + 1..].contains(p))
                    });
                    prop_assert!(lost, "{} retracted without losing a provider", v);
                }
            }
            registered.remove(&id);
        }
    }

    #[test]
    fn unconstrained_value_is_accepted_first(id in 0..VALUES) {
        let q = DependencyQueue::<u8, u8>::new();
        let newly = q.offer(id, [id], [], []);
        prop_assert_eq!(newly, vec![id]);
    }
}
