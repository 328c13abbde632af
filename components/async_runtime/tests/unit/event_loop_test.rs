//! Unit tests for EventLoop

use async_runtime::{EventLoop, EventLoopConfig, RunOutcome, Task, TaskError, Turn};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Host {
    log: Vec<String>,
}

fn record(entry: &'static str) -> Task<Host, String> {
    Task::new(move |host: &mut Host| {
        host.log.push(entry.to_string());
        Ok(())
    })
}

#[test]
fn task_queue_fifo_order() {
    let mut event_loop = EventLoop::new();
    event_loop.enqueue_task(record("first"));
    event_loop.enqueue_task(record("second"));

    let mut host = Host::default();
    event_loop.run_until_idle(&mut host).unwrap();
    assert_eq!(host.log, vec!["first", "second"]);
}

#[test]
fn tasks_can_enqueue_microtasks_through_host() {
    struct LoopHost {
        event_loop: EventLoop<LoopHost, String>,
        log: Vec<&'static str>,
    }

    let mut host = LoopHost {
        event_loop: EventLoop::new(),
        log: Vec::new(),
    };
    host.event_loop.enqueue_task(Task::new(|h: &mut LoopHost| {
        h.log.push("task");
        h.event_loop.enqueue_microtask(Task::new(|h: &mut LoopHost| {
            h.log.push("micro");
            Ok(())
        }));
        Ok(())
    }));
    host.event_loop.enqueue_task(Task::new(|h: &mut LoopHost| {
        h.log.push("task2");
        Ok(())
    }));

    loop {
        match host.event_loop.next_task() {
            Turn::Task(task) => task.run(&mut host).unwrap(),
            Turn::Idle => break,
            Turn::Interrupted => panic!("not interrupted"),
        }
    }
    assert_eq!(host.log, vec!["task", "micro", "task2"]);
}

#[test]
fn timers_fire_after_delay_in_order() {
    let mut event_loop = EventLoop::new();
    event_loop.set_timeout(Duration::from_millis(30), record("late"));
    event_loop.set_timeout(Duration::from_millis(5), record("early"));
    event_loop.enqueue_task(record("now"));

    let start = Instant::now();
    let mut host = Host::default();
    event_loop.run_until_idle(&mut host).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(30));
    assert_eq!(host.log, vec!["now", "early", "late"]);
}

#[test]
fn cleared_timer_never_runs() {
    let mut event_loop = EventLoop::new();
    let id = event_loop.set_timeout(Duration::from_millis(5), record("cancelled"));
    assert!(event_loop.clear_timeout(id));

    let mut host = Host::default();
    assert_eq!(event_loop.run_until_idle(&mut host), Ok(RunOutcome::Idle));
    assert!(host.log.is_empty());
}

#[test]
fn background_job_result_returns_to_loop_thread() {
    let mut event_loop: EventLoop<Host, String> = EventLoop::with_config(EventLoopConfig {
        worker_threads: 1,
        thread_name: "test-io".to_string(),
    });
    let loop_thread = thread::current().id();
    event_loop
        .submit(
            || thread::current().name().map(str::to_string),
            move |host: &mut Host, result: Result<Option<String>, TaskError>| {
                assert_eq!(thread::current().id(), loop_thread);
                let name = result.map_err(|e| e.to_string())?.unwrap_or_default();
                host.log.push(name);
                Ok(())
            },
        )
        .unwrap();
    assert_eq!(event_loop.pending_jobs(), 1);

    let mut host = Host::default();
    event_loop.run_until_idle(&mut host).unwrap();
    assert_eq!(host.log, vec!["test-io-0"]);
    assert_eq!(event_loop.pending_jobs(), 0);
}

#[test]
fn panicking_job_still_completes() {
    let mut event_loop: EventLoop<Host, String> = EventLoop::new();
    event_loop
        .submit(
            || -> u32 { panic!("disk on fire") },
            |host: &mut Host, result: Result<u32, TaskError>| {
                match result {
                    Err(TaskError::JobPanicked(message)) => host.log.push(message),
                    other => host.log.push(format!("unexpected {:?}", other)),
                }
                Ok(())
            },
        )
        .unwrap();

    let mut host = Host::default();
    event_loop.run_until_idle(&mut host).unwrap();
    assert_eq!(host.log, vec!["disk on fire"]);
}

#[test]
fn interrupt_from_another_thread_wakes_blocked_loop() {
    let mut event_loop: EventLoop<Host, String> = EventLoop::new();
    event_loop.set_timeout(Duration::from_secs(60), record("never"));
    let handle = event_loop.handle();

    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.interrupt();
    });

    let start = Instant::now();
    let mut host = Host::default();
    assert_eq!(event_loop.run_until_idle(&mut host), Ok(RunOutcome::Interrupted));
    assert!(start.elapsed() < Duration::from_secs(30));
    interrupter.join().unwrap();
}

#[test]
fn clear_discards_outstanding_work() {
    let mut event_loop: EventLoop<Host, String> = EventLoop::new();
    event_loop.enqueue_task(record("task"));
    event_loop.set_timeout(Duration::from_millis(1), record("timer"));
    event_loop.submit(|| 1u8, |_: &mut Host, _| Ok(())).unwrap();
    assert!(event_loop.has_pending_work());

    event_loop.clear();
    assert!(!event_loop.has_pending_work());
    assert!(matches!(event_loop.next_task(), Turn::Idle));
}

#[test]
fn shut_down_loop_rejects_new_jobs() {
    let mut event_loop: EventLoop<Host, String> = EventLoop::new();
    event_loop.start_workers().unwrap();
    event_loop.shutdown();
    assert_eq!(event_loop.start_workers(), Err(TaskError::ShutDown));
    assert!(event_loop.submit(|| 1u8, |_: &mut Host, _| Ok(())).is_err());
}
