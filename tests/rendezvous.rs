//! Integration tests for the rendezvous (zero-capacity) channel flavor.

use std::thread;
use std::time::{Duration, Instant};

use chansel::{bounded, rendezvous, RecvError, TrySendError};

#[test]
fn try_send_without_a_receiver_fails() {
    // try_send on a rendezvous channel fails unless a receiver is already parked.
    let (tx, _rx) = rendezvous::<&str>();
    match tx.try_send("x") {
        Err(TrySendError::Full("x")) => {}
        _ => panic!("expected Full without a parked receiver"),
    }
}

#[test]
fn try_send_with_a_parked_receiver_succeeds() {
    let (tx, rx) = rendezvous();
    let handle = thread::spawn(move || rx.recv());

    // Poll until try_send succeeds: the receiver needs a moment to park.
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        match tx.try_send("x") {
            Ok(()) => break,
            Err(TrySendError::Full(_)) if Instant::now() < deadline => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(e) => panic!("unexpected failure: {}", e.is_closed()),
        }
    }
    assert_eq!(handle.join().unwrap(), Ok("x"));
}

#[test]
fn bounded_zero_capacity_is_a_rendezvous_channel() {
    let (tx, rx) = bounded(0);
    let handle = thread::spawn(move || rx.recv());
    thread::sleep(Duration::from_millis(20));
    tx.send(5).unwrap();
    assert_eq!(handle.join().unwrap(), Ok(5));
}

#[test]
fn three_way_rendezvous_with_a_closer() {
    // Three threads: one sleeps then recvs, one sends, one sleeps then closes.
    // The close must not return before the in-flight value is delivered, and
    // the value itself must come through intact.
    let (tx, rx) = rendezvous();
    let tx_b = tx.clone();

    let a = thread::spawn(move || {
        thread::sleep(Duration::from_millis(120));
        rx.recv()
    });
    let b = thread::spawn(move || tx_b.send(1));
    let c = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        tx.close();
        start.elapsed()
    });

    let recorded = a.join().unwrap();
    b.join().unwrap().unwrap();
    let elapsed_from_close_request = c.join().unwrap();

    assert_eq!(recorded, Ok(1));
    assert!(elapsed_from_close_request < Duration::from_secs(2));
}

#[test]
fn close_blocks_until_pending_send_is_consumed() {
    let (tx, rx) = rendezvous();
    let tx_for_send = tx.clone();

    let sender = thread::spawn(move || tx_for_send.send(99));

    // Give the sender a chance to park with no receiver present yet.
    thread::sleep(Duration::from_millis(30));

    let closer = thread::spawn(move || {
        let start = Instant::now();
        tx.close();
        start.elapsed()
    });

    // The receiver shows up after close() has already been requested; close()
    // must still wait for this value to be drained before returning.
    thread::sleep(Duration::from_millis(50));
    let received = rx.recv();

    sender.join().unwrap().unwrap();
    let elapsed = closer.join().unwrap();

    assert_eq!(received, Ok(99));
    assert!(elapsed >= Duration::from_millis(40));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn recv_after_close_and_drain_fails() {
    let (tx, rx) = rendezvous::<i32>();
    tx.close();
    assert_eq!(rx.recv(), Err(RecvError));
}
