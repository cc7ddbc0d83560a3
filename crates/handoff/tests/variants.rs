// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! End-to-end completion scenarios, one completer task per request unless
//! noted. Each test allocates, hands off, completes, observes and drops.

use std::sync::Arc;
use std::time::Duration;

use handoff::{
    exec, wait_all, wait_any, EventGroup, GuardedQueue, Message, MessageQueue, Request,
    RequestQueue, TaskConfig, Timeout,
};

const GENEROUS: Duration = Duration::from_secs(5);

fn complete_later(request: Request, result: i8) {
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        request.complete(result).unwrap();
    });
}

#[test]
fn semaphore_reports_exact_result() {
    let req = Request::semaphore(0).unwrap();
    complete_later(req.clone(), -7);
    assert!(req.wait(GENEROUS).unwrap());
    assert_eq!(req.result(), Some(-7));
}

#[test]
fn notify_reports_exact_result() {
    let req = Request::notify(0).unwrap();
    complete_later(req.clone(), 42);
    assert!(req.wait(GENEROUS).unwrap());
    assert_eq!(req.result(), Some(42));
}

#[test]
fn event_group_reports_exact_result() {
    let group = EventGroup::new();
    let req = Request::event_group(&group, 0x8, 0).unwrap();
    complete_later(req.clone(), 5);
    assert!(req.wait(GENEROUS).unwrap());
    assert_eq!(req.result(), Some(5));
}

#[test]
fn queue_reports_exact_result() {
    let queue: RequestQueue = MessageQueue::bounded(1);
    let req = Request::queue(&queue, 3u32, 0).unwrap();
    complete_later(req, -1);
    let msg = queue.recv(GENEROUS).unwrap();
    assert_eq!(msg.kind.0, 3);
    assert_eq!(msg.payload.result(), Some(-1));
}

#[test]
fn zero_timeout_waits_do_not_block() {
    let sem = Request::semaphore(0).unwrap();
    let note = Request::notify(0).unwrap();
    let group = EventGroup::new();
    let ev = Request::event_group(&group, 0x1, 0).unwrap();

    assert!(!sem.wait(Timeout::ZERO).unwrap());
    assert!(!note.wait(Timeout::ZERO).unwrap());
    assert!(!ev.wait(Timeout::ZERO).unwrap());
    assert!(!wait_all(&group, 0x1, Timeout::ZERO));
    assert!(!wait_any(&group, 0x1, Timeout::ZERO));

    assert_eq!(sem.result(), None);
    assert_eq!(note.result(), None);
    assert_eq!(ev.result(), None);
}

#[test]
fn wait_all_needs_both_bits_in_either_order() {
    for first_bit in [0x1, 0x2] {
        let group = EventGroup::new();
        let a = Request::event_group(&group, 0x1, 0).unwrap();
        let b = Request::event_group(&group, 0x2, 0).unwrap();
        let (first, second) = if first_bit == 0x1 { (a, b) } else { (b, a) };

        first.complete(0).unwrap();
        assert!(!wait_all(&group, 0x3, Duration::from_millis(20)));

        complete_later(second, 0);
        assert!(wait_all(&group, 0x3, GENEROUS));
        assert_eq!(group.bits(), 0);
    }
}

#[test]
fn wait_any_unblocks_on_first_bit() {
    for bit in [0x1, 0x2] {
        let group = EventGroup::new();
        let a = Request::event_group(&group, 0x1, 0).unwrap();
        let b = Request::event_group(&group, 0x2, 0).unwrap();
        let winner = if bit == 0x1 { a } else { b };
        complete_later(winner, 0);
        assert!(wait_any(&group, 0x3, GENEROUS));
        assert_eq!(group.bits(), 0);
    }
}

#[test]
fn event_group_scenario_any_then_all() {
    let group = EventGroup::new();
    let first = Request::event_group(&group, 0x1, 0).unwrap();
    let _second = Request::event_group(&group, 0x2, 0).unwrap();
    first.complete(0).unwrap();

    let short = Duration::from_millis(20);
    assert!(wait_any(&group, 0x3, short));
    assert!(!wait_all(&group, 0x3, short));
}

#[test]
fn semaphore_scenario_completed_from_second_unit() {
    let req = Request::semaphore(0).unwrap();
    exec(
        |r| r.complete(0).unwrap(),
        req.clone(),
        &TaskConfig::default().with_name("completer"),
    )
    .unwrap();
    assert!(req.wait(GENEROUS).unwrap());
    assert_eq!(req.result(), Some(0));
}

#[test]
fn guarded_queue_delivers_every_completion_in_order() {
    const COMPLETERS: u8 = 6;
    const PER_COMPLETER: u8 = 40;

    let guarded: Arc<GuardedQueue<Message>> =
        Arc::new(GuardedQueue::new(MessageQueue::bounded(4)));
    let mut handles = Vec::new();
    for completer in 0..COMPLETERS {
        let guarded = guarded.clone();
        handles.push(std::thread::spawn(move || {
            for seq in 0..PER_COMPLETER {
                let req = Request::queue(&guarded, u32::from(completer), 2).unwrap();
                req.with_payload_mut(|p| p.copy_from_slice(&[completer, seq]));
                req.complete(0).unwrap();
            }
        }));
    }

    let mut seen = vec![Vec::new(); usize::from(COMPLETERS)];
    for _ in 0..u32::from(COMPLETERS) * u32::from(PER_COMPLETER) {
        let Message { kind, payload } = guarded.queue().recv(GENEROUS).unwrap();
        let (completer, seq) = payload.with_payload(|p| (p[0], p[1]));
        assert_eq!(kind.0, u32::from(completer));
        seen[usize::from(completer)].push(seq);
    }
    for h in handles {
        h.join().unwrap();
    }

    assert!(guarded.queue().is_empty());
    for per_completer in seen {
        assert_eq!(per_completer, (0..PER_COMPLETER).collect::<Vec<_>>());
    }
}

#[test]
fn no_await_is_released_by_dispatch() {
    let req = Request::no_await(256).unwrap();
    let weak = req.downgrade();
    let worker = std::thread::spawn(move || req.complete(0).unwrap());
    worker.join().unwrap();
    assert!(weak.is_released());
}

#[test]
fn no_await_through_exec_is_released() {
    let req = Request::no_await(64).unwrap();
    let weak = req.downgrade();
    let finished: MessageQueue<()> = MessageQueue::bounded(1);
    let done = finished.clone();
    exec(
        move |r| {
            r.complete(0).unwrap();
            done.send_blocking(());
        },
        req,
        &TaskConfig::default(),
    )
    .unwrap();
    assert!(finished.recv(GENEROUS).is_some());
    assert!(weak.is_released());
}

#[test]
fn timed_out_request_stays_pending_and_valid() {
    let req = Request::semaphore(8).unwrap();
    assert!(!req.wait(Duration::from_millis(10)).unwrap());
    req.with_payload_mut(|p| p[0] = 1);
    complete_later(req.clone(), 0);
    assert!(req.wait(GENEROUS).unwrap());
    req.with_payload(|p| assert_eq!(p[0], 1));
}
