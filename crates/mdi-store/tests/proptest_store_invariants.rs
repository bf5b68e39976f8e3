//! Property-based invariant tests for the tab store.
//!
//! Random operation sequences are replayed against both strategies and a
//! plain reference model. The tests verify:
//!
//! 1. Keys stay unique and the active key always names an open tab.
//! 2. Store and model agree on order, data, active key and every result.
//! 3. Failed operations leave the state and revision untouched.
//! 4. Close observers fire exactly once per registration, update observers
//!    once per successful update.
//! 5. The two strategies produce identical histories.

use std::cell::RefCell;
use std::rc::Rc;

use mdi_store::{Dispatch, Local, TabKey, TabObservable, TabStore, TabStrategy};
use proptest::prelude::*;

// ── Operations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Open(u8, u32),
    SetActive(u8),
    Update(u8, u32, Option<u8>),
    UpdateActive(u32, Option<u8>),
    Close(u8, bool),
    CloseActive(bool),
    Reset,
}

fn key(k: u8) -> String {
    format!("doc/{k}")
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let k = 0u8..5;
    prop_oneof![
        4 => (k.clone(), any::<u32>()).prop_map(|(k, d)| Op::Open(k, d)),
        2 => k.clone().prop_map(Op::SetActive),
        2 => (k.clone(), any::<u32>(), proptest::option::of(0u8..5))
            .prop_map(|(k, d, n)| Op::Update(k, d, n)),
        2 => (any::<u32>(), proptest::option::of(0u8..5))
            .prop_map(|(d, n)| Op::UpdateActive(d, n)),
        2 => (k, any::<bool>()).prop_map(|(k, r)| Op::Close(k, r)),
        1 => any::<bool>().prop_map(Op::CloseActive),
        1 => Just(Op::Reset),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(op_strategy(), 1..=max_len)
}

// ── Reference model ───────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
struct Model {
    items: Vec<(String, u32)>,
    active: Option<String>,
}

impl Model {
    fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|(k, _)| k == key)
    }

    fn apply(&mut self, op: &Op) -> Result<(), &'static str> {
        match op {
            Op::Open(k, d) => {
                let k = key(*k);
                if self.position(&k).is_none() {
                    self.items.push((k.clone(), *d));
                }
                self.active = Some(k);
                Ok(())
            }
            Op::SetActive(k) => {
                let k = key(*k);
                if self.position(&k).is_none() {
                    return Err("invalid_key");
                }
                self.active = Some(k);
                Ok(())
            }
            Op::Update(k, d, n) => self.update(key(*k), *d, n.map(key)),
            Op::UpdateActive(d, n) => match self.active.clone() {
                Some(k) => self.update(k, *d, n.map(key)),
                None => Ok(()),
            },
            Op::Close(k, _) => {
                self.close(&key(*k));
                Ok(())
            }
            Op::CloseActive(_) => {
                if let Some(k) = self.active.clone() {
                    self.close(&k);
                }
                Ok(())
            }
            Op::Reset => {
                *self = Self::default();
                Ok(())
            }
        }
    }

    fn update(&mut self, k: String, d: u32, n: Option<String>) -> Result<(), &'static str> {
        let Some(index) = self.position(&k) else {
            return Err("not_found");
        };
        let rename = n.filter(|n| *n != k);
        if let Some(to) = &rename {
            if self.position(to).is_some() {
                return Err("key_conflict");
            }
        }
        self.items[index].1 = d;
        if let Some(to) = rename {
            self.items[index].0 = to.clone();
            if self.active.as_deref() == Some(k.as_str()) {
                self.active = Some(to);
            }
        }
        Ok(())
    }

    fn close(&mut self, k: &str) {
        if let Some(index) = self.position(k) {
            self.items.remove(index);
            if self.active.as_deref() == Some(k) {
                self.active = self.items.last().map(|(k, _)| k.clone());
            }
        }
    }
}

// ── Replay ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
struct Counters {
    updates: usize,
    closes: usize,
}

#[derive(Debug, PartialEq)]
struct Step {
    result: Result<(), &'static str>,
    items: Vec<(String, u32)>,
    active: Option<String>,
}

fn snapshot<S: TabStrategy<u32>>(store: &TabStore<u32, S>) -> (Vec<(String, u32)>, Option<String>) {
    let items = store
        .items()
        .into_iter()
        .map(|t| (t.key.into_string(), t.data))
        .collect();
    (items, store.active_key().map(TabKey::into_string))
}

fn submit<S: TabStrategy<u32>>(
    store: &TabStore<u32, S>,
    op: &Op,
    counters: &Rc<RefCell<Counters>>,
) -> Result<(), &'static str> {
    let result = match op {
        Op::Open(k, d) => {
            let on_update = Rc::clone(counters);
            let on_close = Rc::clone(counters);
            store.open_tab(
                TabObservable::new(key(*k), *d)
                    .on_update(move |_: &u32| on_update.borrow_mut().updates += 1)
                    .on_close(move |_: &u32, _| on_close.borrow_mut().closes += 1),
            )
        }
        Op::SetActive(k) => store.set_active_key(key(*k)),
        Op::Update(k, d, n) => store.update_tab(key(*k), *d, n.map(|n| TabKey::new(key(n)))),
        Op::UpdateActive(d, n) => store.update_active_tab(*d, n.map(|n| TabKey::new(key(n)))),
        Op::Close(k, r) => store.close_tab(key(*k), *r),
        Op::CloseActive(r) => store.close_active_tab(*r),
        Op::Reset => store.reset(),
    };
    result.map_err(|e| e.kind())
}

fn replay<S: TabStrategy<u32>>(ops: &[Op]) -> (Vec<Step>, Counters) {
    let store = TabStore::<u32, S>::new();
    let counters = Rc::new(RefCell::new(Counters::default()));
    let mut steps = Vec::with_capacity(ops.len());
    for op in ops {
        let result = submit(&store, op, &counters);
        let (items, active) = snapshot(&store);
        steps.push(Step {
            result,
            items,
            active,
        });
    }
    let counters = counters.borrow().clone();
    (steps, counters)
}

fn check_shape(step: &Step) -> Result<(), TestCaseError> {
    let mut seen = std::collections::HashSet::new();
    for (k, _) in &step.items {
        prop_assert!(seen.insert(k.clone()), "duplicate key {k}");
    }
    match &step.active {
        Some(a) => {
            prop_assert!(seen.contains(a), "dangling active key {a}");
        }
        None => {
            prop_assert!(step.items.is_empty(), "tabs open but none active");
        }
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Store matches the reference model
// ═════════════════════════════════════════════════════════════════════════

fn matches_model<S: TabStrategy<u32>>(ops: &[Op]) -> Result<(), TestCaseError> {
    let (steps, _) = replay::<S>(ops);
    let mut model = Model::default();
    for (i, (op, step)) in ops.iter().zip(&steps).enumerate() {
        let expected = model.apply(op);
        check_shape(step)?;
        prop_assert_eq!(step.result, expected, "step {} {:?}", i, op);
        prop_assert_eq!(&step.items, &model.items, "step {} {:?}", i, op);
        prop_assert_eq!(&step.active, &model.active, "step {} {:?}", i, op);
    }
    Ok(())
}

proptest! {
    #[test]
    fn local_store_matches_model(ops in ops_strategy(40)) {
        matches_model::<Local>(&ops)?;
    }

    #[test]
    fn dispatch_store_matches_model(ops in ops_strategy(40)) {
        matches_model::<Dispatch<u32>>(&ops)?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Failed operations are atomic
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn failed_ops_change_nothing(ops in ops_strategy(40)) {
        let store = TabStore::<u32, Local>::new();
        let counters = Rc::new(RefCell::new(Counters::default()));
        for op in &ops {
            let before = store.snapshot();
            let revision = store.revision();
            let observed = counters.borrow().clone();
            if submit(&store, op, &counters).is_err() {
                prop_assert_eq!(store.snapshot(), before);
                prop_assert_eq!(store.revision(), revision);
                let after = counters.borrow().clone();
                prop_assert_eq!(after, observed);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Observer accounting
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn observers_fire_as_often_as_the_model_says(ops in ops_strategy(40)) {
        let (_, counters) = replay::<Local>(&ops);

        // Each open registers one observer of each kind on its key; reopen
        // merges, so a key carries one registration per open since it was
        // last opened fresh. Updates fire all of them, a close fires and
        // drops all of them, a reset drops them silently.
        let mut model = Model::default();
        let mut registrations: Vec<(String, usize)> = Vec::new();
        let mut expected = Counters::default();
        for op in &ops {
            let before = model.clone();
            if model.apply(op).is_err() {
                continue;
            }
            match op {
                Op::Open(k, _) => {
                    let k = key(*k);
                    match registrations.iter_mut().find(|(r, _)| *r == k) {
                        Some((_, n)) => *n += 1,
                        None => registrations.push((k, 1)),
                    }
                }
                Op::Update(..) | Op::UpdateActive(..) => {
                    let target = match op {
                        Op::Update(k, _, _) => Some(key(*k)),
                        _ => before.active.clone(),
                    };
                    let Some(target) = target else { continue };
                    let renamed_to = match op {
                        Op::Update(_, _, n) | Op::UpdateActive(_, n) => n.map(key),
                        _ => None,
                    };
                    if let Some(entry) = registrations.iter_mut().find(|(r, _)| *r == target) {
                        expected.updates += entry.1;
                        if let Some(to) = renamed_to {
                            entry.0 = to;
                        }
                    }
                }
                Op::Close(..) | Op::CloseActive(_) => {
                    let target = match op {
                        Op::Close(k, _) => Some(key(*k)),
                        _ => before.active.clone(),
                    };
                    let Some(target) = target else { continue };
                    if let Some(pos) = registrations.iter().position(|(r, _)| *r == target) {
                        expected.closes += registrations.remove(pos).1;
                    }
                }
                Op::Reset => registrations.clear(),
                Op::SetActive(_) => {}
            }
        }
        prop_assert_eq!(counters, expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Strategies agree
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn strategies_produce_identical_histories(ops in ops_strategy(60)) {
        let (local, local_counters) = replay::<Local>(&ops);
        let (dispatch, dispatch_counters) = replay::<Dispatch<u32>>(&ops);
        prop_assert_eq!(local, dispatch);
        prop_assert_eq!(local_counters, dispatch_counters);
    }
}
