//! Integration tests for the multi-way `select` operator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chansel::{bounded, rendezvous, select, select_timeout, try_select};

#[test]
fn fires_on_the_only_ready_candidate() {
    let (tx_a, rx_a) = bounded(1);
    let (_tx_b, rx_b) = bounded::<i32>(1);
    tx_a.send(7).unwrap();

    let mut got = None;
    let mut cases = [rx_a.select_recv(|v| got = Some(v)), rx_b.select_recv(|v| got = Some(v))];
    assert!(select(&mut cases));
    assert_eq!(got, Some(7));
}

#[test]
fn try_select_returns_false_when_nothing_is_ready() {
    let (_tx_a, rx_a) = bounded::<i32>(1);
    let (_tx_b, rx_b) = bounded::<i32>(1);

    let mut cases = [rx_a.select_recv(|_| panic!("nothing to receive")), rx_b.select_recv(|_| panic!("nothing to receive"))];
    assert!(!try_select(&mut cases));
}

#[test]
fn select_timeout_expires_when_nothing_arrives() {
    let (_tx, rx) = bounded::<i32>(1);
    let start = std::time::Instant::now();
    let mut cases = [rx.select_recv(|_| panic!("nothing to receive"))];
    assert!(!select_timeout(&mut cases, Duration::from_millis(30)));
    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn select_waits_for_a_candidate_to_become_ready() {
    let (tx, rx) = bounded(1);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(40));
        tx.send(99).unwrap();
    });

    let mut got = None;
    let mut cases = [rx.select_recv(|v| got = Some(v))];
    assert!(select(&mut cases));
    assert_eq!(got, Some(99));
    handle.join().unwrap();
}

#[test]
fn select_reports_false_when_the_only_candidate_closes() {
    let (tx, rx) = bounded::<i32>(1);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        tx.close();
    });

    let mut cases = [rx.select_recv(|_| panic!("nothing was sent"))];
    assert!(!select(&mut cases));
    handle.join().unwrap();
}

#[test]
fn select_is_fair_between_two_simultaneously_ready_candidates() {
    // When two candidates are ready at the same time, repeated selects should
    // pick each with roughly equal odds rather than always favoring list order.
    let mut first_wins = 0;
    let mut second_wins = 0;

    for _ in 0..200 {
        let (tx_a, rx_a) = bounded(1);
        let (tx_b, rx_b) = bounded(1);
        tx_a.send(1).unwrap();
        tx_b.send(1).unwrap();

        let mut which = 0;
        let mut cases = [rx_a.select_recv(|_| which = 1), rx_b.select_recv(|_| which = 2)];
        assert!(select(&mut cases));
        match which {
            1 => first_wins += 1,
            2 => second_wins += 1,
            _ => unreachable!(),
        }
    }

    let ratio = first_wins as f64 / (first_wins + second_wins) as f64;
    assert!((0.35..0.65).contains(&ratio), "first candidate won {first_wins}/200 trials");
}

#[test]
fn select_over_a_rendezvous_and_a_buffered_channel() {
    let (rz_tx, rz_rx) = rendezvous();
    let (buf_tx, buf_rx) = bounded(1);
    buf_tx.send("buffered").unwrap();

    let mut got = None;
    let mut cases = [
        rz_rx.select_recv(|v| got = Some(v)),
        buf_rx.select_recv(|v| got = Some(v)),
    ];
    assert!(select(&mut cases));
    assert_eq!(got, Some("buffered"));
    drop(rz_tx);
}

#[test]
fn select_send_fires_when_a_receiver_is_parked_on_a_rendezvous_channel() {
    let (tx, rx) = rendezvous();
    let handle = thread::spawn(move || rx.recv());

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    let mut sent = false;
    while std::time::Instant::now() < deadline && !sent {
        let mut cases = [tx.select_send(123, || {})];
        if try_select(&mut cases) {
            sent = true;
        } else {
            thread::sleep(Duration::from_millis(5));
        }
    }
    assert!(sent);
    assert_eq!(handle.join().unwrap(), Ok(123));
}

#[test]
fn balancer_routes_every_input_through_select_to_some_output() {
    // Two input channels feed two output channels via a single select loop;
    // four workers drain the outputs. Every doubled value must be accounted
    // for exactly once.
    let (in_a_tx, in_a_rx) = bounded(4);
    let (in_b_tx, in_b_rx) = bounded(4);
    let (out_a_tx, out_a_rx) = bounded(4);
    let (out_b_tx, out_b_rx) = bounded(4);

    let feeder_a = thread::spawn(move || {
        for i in (1..=100).step_by(2) {
            in_a_tx.send(i).unwrap();
        }
    });
    let feeder_b = thread::spawn(move || {
        for i in (2..=100).step_by(2) {
            in_b_tx.send(i).unwrap();
        }
    });

    let balancer = thread::spawn(move || {
        let mut routed = 0;
        while routed < 100 {
            let mut doubled = None;
            {
                let mut cases = [
                    in_a_rx.select_recv(|v| doubled = Some(v * 2)),
                    in_b_rx.select_recv(|v| doubled = Some(v * 2)),
                ];
                if !select(&mut cases) {
                    continue;
                }
            }
            let doubled = doubled.unwrap();
            let mut cases = [
                out_a_tx.select_send(doubled, || {}),
                out_b_tx.select_send(doubled, || {}),
            ];
            assert!(select(&mut cases));
            routed += 1;
        }
        out_a_tx.close();
        out_b_tx.close();
    });

    let counts: Arc<[AtomicUsize; 4]> = Arc::new(Default::default());
    let sum = Arc::new(AtomicUsize::new(0));
    let mut workers = Vec::new();
    for (i, rx) in [out_a_rx.clone(), out_a_rx, out_b_rx.clone(), out_b_rx].into_iter().enumerate() {
        let counts = counts.clone();
        let sum = sum.clone();
        workers.push(thread::spawn(move || {
            rx.for_each(|v| {
                counts[i].fetch_add(1, Ordering::Relaxed);
                sum.fetch_add(v as usize, Ordering::Relaxed);
            });
        }));
    }

    feeder_a.join().unwrap();
    feeder_b.join().unwrap();
    balancer.join().unwrap();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(sum.load(Ordering::Relaxed), 10_100);
    let total: usize = counts.iter().map(|c| c.load(Ordering::Relaxed)).sum();
    assert_eq!(total, 100);
}

#[test]
fn both_sides_of_an_asymmetric_select_make_progress() {
    // Two channels under asymmetric load, selected over together. Every
    // value arriving on either side must eventually be observed.
    let (fast_tx, fast_rx) = bounded(2);
    let (slow_tx, slow_rx) = bounded(2);

    let fast_feeder = thread::spawn(move || {
        for i in 0..50 {
            fast_tx.send(i).unwrap();
        }
        fast_tx.close();
    });
    let slow_feeder = thread::spawn(move || {
        for i in 0..5 {
            thread::sleep(Duration::from_millis(5));
            slow_tx.send(1000 + i).unwrap();
        }
        slow_tx.close();
    });

    let mut seen = HashMap::new();
    let mut fast_open = true;
    let mut slow_open = true;
    while fast_open || slow_open {
        let mut got = None;
        let mut closed_fast = false;
        let mut closed_slow = false;
        {
            let mut cases = Vec::new();
            if fast_open {
                cases.push(fast_rx.select_recv(|v| got = Some(v)));
            }
            if slow_open {
                cases.push(slow_rx.select_recv(|v| got = Some(v)));
            }
            if !select(&mut cases) {
                // One of the registered candidates closed; figure out which.
                if fast_open && fast_rx.is_closed() && fast_rx.try_recv().is_err() {
                    closed_fast = true;
                }
                if slow_open && slow_rx.is_closed() && slow_rx.try_recv().is_err() {
                    closed_slow = true;
                }
            }
        }
        if let Some(v) = got {
            *seen.entry(v).or_insert(0) += 1;
        }
        if closed_fast {
            fast_open = false;
        }
        if closed_slow {
            slow_open = false;
        }
    }

    fast_feeder.join().unwrap();
    slow_feeder.join().unwrap();

    assert_eq!(seen.len(), 55);
    for i in 0..50 {
        assert_eq!(seen.get(&i), Some(&1));
    }
    for i in 1000..1005 {
        assert_eq!(seen.get(&i), Some(&1));
    }
}

#[test]
fn many_sequential_selects_leave_no_waiter_behind() {
    // Repeatedly selecting over candidates that are never ready and then
    // satisfying one must not accumulate stale registrations: a channel that
    // outlives a select call should be immediately selectable again by a
    // fresh round with nobody else registered.
    let (tx, rx) = bounded::<i32>(1);
    for _ in 0..500 {
        let handle = {
            let tx = tx.clone();
            thread::spawn(move || tx.send(1).unwrap())
        };
        let mut got = None;
        let mut cases = [rx.select_recv(|v| got = Some(v))];
        assert!(select(&mut cases));
        assert_eq!(got, Some(1));
        handle.join().unwrap();
    }
}
