// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::InlineExecutor;
use std::sync::mpsc;

#[test]
fn timers_fire_in_deadline_order() {
    let delayer = Delayer::new();
    let (tx, rx) = mpsc::channel();

    for (label, delay_ms) in [("late", 60u64), ("early", 10), ("middle", 30)] {
        let tx = tx.clone();
        delayer.schedule(Duration::from_millis(delay_ms), move || {
            tx.send(label).unwrap();
        });
    }

    let order: Vec<_> = (0..3)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    assert_eq!(order, vec!["early", "middle", "late"]);
    assert_eq!(delayer.pending(), 0);
}

#[test]
fn timer_does_not_fire_before_delay() {
    let delayer = Delayer::new();
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();
    delayer.schedule(Duration::from_millis(40), move || {
        tx.send(Instant::now()).unwrap();
    });

    let fired_at = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(fired_at.duration_since(start) >= Duration::from_millis(40));
}

#[test]
fn cancelled_timer_never_fires() {
    let delayer = Delayer::new();
    let (tx, rx) = mpsc::channel::<&str>();
    let cancelled_tx = tx.clone();
    let handle = delayer.schedule(Duration::from_millis(20), move || {
        cancelled_tx.send("cancelled").unwrap();
    });
    handle.cancel();
    assert!(handle.is_cancelled());

    delayer.schedule(Duration::from_millis(40), move || {
        tx.send("kept").unwrap();
    });

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "kept");
    assert!(rx.try_recv().is_err());
}

#[test]
fn cancel_removes_timer_from_queue() {
    let delayer = Delayer::new();
    let handles: Vec<_> = (0..100)
        .map(|_| delayer.schedule(Duration::from_secs(3600), || {}))
        .collect();
    assert_eq!(delayer.pending(), 100);

    for handle in &handles {
        handle.cancel();
    }
    assert_eq!(delayer.pending(), 0);

    // second cancel is a no-op
    handles[0].cancel();
    assert_eq!(delayer.pending(), 0);
}

#[test]
fn cancel_drops_the_timer_action() {
    let delayer = Delayer::new();
    let payload = Arc::new(());
    let held = Arc::clone(&payload);
    let handle = delayer.schedule(Duration::from_secs(3600), move || drop(held));
    assert_eq!(Arc::strong_count(&payload), 2);

    handle.cancel();
    assert_eq!(Arc::strong_count(&payload), 1);
}

#[test]
fn delay_beyond_clock_range_is_never_scheduled() {
    let delayer = Delayer::new();
    let (tx, rx) = mpsc::channel::<()>();
    let handle = delayer.schedule(Duration::MAX, move || {
        let _ = tx.send(());
    });

    assert_eq!(delayer.pending(), 0);
    assert!(!handle.is_cancelled());
    handle.cancel();
    assert!(handle.is_cancelled());
    // the action was dropped without running
    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(20)),
        Err(mpsc::RecvTimeoutError::Disconnected)
    ));
}

#[test]
fn delayed_executor_with_unbounded_delay_drops_task() {
    let executor = delayed_executor(Duration::MAX, Arc::new(InlineExecutor));
    let (tx, rx) = mpsc::channel::<()>();
    executor.execute(Box::new(move || {
        let _ = tx.send(());
    }));
    assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
}

#[test]
fn panicking_timer_does_not_stop_the_thread() {
    let delayer = Delayer::new();
    delayer.schedule(Duration::from_millis(1), || panic!("timer blew up"));

    let (tx, rx) = mpsc::channel();
    delayer.schedule(Duration::from_millis(10), move || {
        tx.send(()).unwrap();
    });
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn delayed_executor_submits_after_delay() {
    let executor = delayed_executor(Duration::from_millis(30), Arc::new(InlineExecutor));
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();
    executor.execute(Box::new(move || {
        tx.send((Instant::now(), std::thread::current().name().map(str::to_string)))
            .unwrap();
    }));

    let (ran_at, thread) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(ran_at.duration_since(start) >= Duration::from_millis(30));
    // Inline executor runs the task on the timer thread itself
    assert_eq!(thread.as_deref(), Some(DELAYER_THREAD_NAME));
}
