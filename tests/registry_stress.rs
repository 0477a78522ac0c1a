//! Registry consistency under concurrent create/delete and self-exit.

#[macro_use]
mod common;

use common::*;
use proptest::prelude::*;
use simrtos::time::sleep_ms;
use simrtos::{Error, RuntimeBuilder, TaskId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

fn init_test(test_name: &str) {
    init_test_logging();
    test_phase!(test_name);
}

#[test]
fn two_tasks_churn_unrelated_handles() {
    init_test("two_tasks_churn_unrelated_handles");
    const ITERATIONS: usize = 1_000;
    let runtime = RuntimeBuilder::new()
        .sleep_quantum(Duration::from_millis(1))
        .lock_poll_interval(Duration::from_millis(1))
        .build();
    let sentinel = Arc::new(());
    let misses = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    let churners: Vec<TaskId> = (0..2)
        .map(|_| {
            let rt = runtime.clone();
            let sentinel = Arc::clone(&sentinel);
            let misses = Arc::clone(&misses);
            let tx = tx.clone();
            runtime
                .create_task(move || {
                    let mut seen = HashSet::new();
                    for _ in 0..ITERATIONS {
                        let keep = Arc::clone(&sentinel);
                        let child = rt.create_task(move || {
                            let _keep = keep;
                            loop {
                                sleep_ms(1_000)?;
                            }
                        })?;
                        if !seen.insert(child) || !rt.contains(child) {
                            misses.fetch_add(1, Ordering::SeqCst);
                        }
                        if rt.delete_task(child).is_none() || rt.contains(child) {
                            misses.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    tx.send(seen.len()).map_err(|_| Error::user("collector gone"))?;
                    Ok(())
                })
                .expect("spawn churner")
        })
        .collect();
    drop(tx);

    let created: usize = rx.iter().take(2).sum();
    assert_eq!(created, 2 * ITERATIONS);
    for churner in churners {
        wait_until("churner exited", || !runtime.contains(churner));
    }

    assert_with_log!(
        misses.load(Ordering::SeqCst) == 0,
        "no lookup misses for live handles",
        0,
        misses.load(Ordering::SeqCst)
    );
    assert_eq!(runtime.task_count(), 0);
    // Every child's body, and with it its clone of the sentinel, is gone.
    assert_eq!(Arc::strong_count(&sentinel), 1);
    test_complete!("two_tasks_churn_unrelated_handles", created = created);
}

#[test]
fn self_exit_and_delete_race_without_leak_or_double_join() {
    init_test("self_exit_and_delete_race_without_leak_or_double_join");
    let runtime = test_runtime();
    let sentinel = Arc::new(());

    for round in 0..200 {
        let keep = Arc::clone(&sentinel);
        let id = runtime
            .create_task(move || {
                let _keep = keep;
                if round % 2 == 0 {
                    std::thread::yield_now();
                }
                Ok(())
            })
            .expect("spawn");
        // Races the task's own exit; either side may win the removal.
        let _ = runtime.delete_task(id);
        assert!(runtime.delete_task(id).is_none());
    }

    wait_until("all tasks gone", || runtime.task_count() == 0);
    wait_until("all bodies dropped", || Arc::strong_count(&sentinel) == 1);
    test_complete!("self_exit_and_delete_race_without_leak_or_double_join");
}

#[test]
fn runtimes_never_resolve_each_others_handles() {
    init_test("runtimes_never_resolve_each_others_handles");
    let a = test_runtime();
    let b = test_runtime();
    let sleeper = || -> simrtos::Result<()> {
        loop {
            sleep_ms(1_000)?;
        }
    };
    let ta = a.create_task(sleeper).expect("spawn in a");
    let tb = b.create_task(sleeper).expect("spawn in b");
    assert_ne!(ta, tb);

    assert!(a.delete_task(tb).is_none());
    assert!(!a.contains(tb));
    assert!(a.task_state(tb).is_none());
    assert!(!a.notify(tb, 1, simrtos::NotifyAction::SetBits));
    assert!(a.contains(ta), "a's own task must survive a foreign delete");
    assert!(b.contains(tb));

    let lb = b.create_lock();
    b.acquire(lb, 0).expect("acquire in b");
    a.release(lb);
    assert!(!a.delete_lock(lb));
    assert!(b.locks().get(lb).is_some_and(|lock| lock.is_locked()));
    b.release(lb);

    assert!(a.delete_task(ta).is_some_and(|exit| exit.is_cancelled()));
    assert!(b.delete_task(tb).is_some_and(|exit| exit.is_cancelled()));
    test_complete!("runtimes_never_resolve_each_others_handles");
}

#[derive(Debug, Clone)]
enum Op {
    SpawnSleeper,
    SpawnFinisher,
    DeleteOldest,
    DeleteStale,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::SpawnSleeper),
        2 => Just(Op::SpawnFinisher),
        3 => Just(Op::DeleteOldest),
        1 => Just(Op::DeleteStale),
    ]
}

proptest! {
    #![proptest_config(test_proptest_config(16))]

    #[test]
    fn handles_stay_consistent(ops in proptest::collection::vec(op_strategy(), 1..24)) {
        init_test_logging();
        let runtime = test_runtime();
        let mut sleepers = Vec::new();
        let mut stale = Vec::new();

        for op in ops {
            match op {
                Op::SpawnSleeper => {
                    let id = runtime
                        .create_task(|| loop {
                            sleep_ms(1_000)?;
                        })
                        .expect("spawn");
                    prop_assert!(!stale.contains(&id));
                    sleepers.push(id);
                }
                Op::SpawnFinisher => {
                    let id = runtime.create_task(|| Ok(())).expect("spawn");
                    stale.push(id);
                }
                Op::DeleteOldest => {
                    if !sleepers.is_empty() {
                        let id = sleepers.remove(0);
                        prop_assert!(runtime.delete_task(id).is_some());
                        stale.push(id);
                    }
                }
                Op::DeleteStale => {
                    if let Some(&id) = stale.first() {
                        wait_until("stale task gone", || !runtime.contains(id));
                        prop_assert!(runtime.delete_task(id).is_none());
                    }
                }
            }
            for id in &sleepers {
                prop_assert!(runtime.contains(*id));
            }
        }

        prop_assert_eq!(runtime.shutdown(), sleepers.len());
        prop_assert_eq!(runtime.task_count(), 0);
    }
}
