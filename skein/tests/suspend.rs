use skein::task::{self, TaskState, Wakeup, suspend};
use skein::{Error, RuntimeBuilder};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[test]
fn test_suspend_woken_from_plain_thread() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let wakeup = rt.block_on(async {
        suspend("external event", |wake| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                assert!(wake.wake());
            });
        })
        .await
    });

    assert_eq!(wakeup, Wakeup::Woken);
}

#[test]
fn test_suspend_woken_during_registration() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let wakeup = rt.block_on(async {
        suspend("immediate", |wake| {
            assert!(wake.wake());
            assert!(!wake.wake(), "Only the first wake counts");
        })
        .await
    });

    assert_eq!(wakeup, Wakeup::Woken);
}

#[test]
fn test_suspend_abandoned_when_handle_dropped() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let wakeup = rt.block_on(async {
        suspend("dropped", |wake| {
            thread::spawn(move || drop(wake));
        })
        .await
    });

    assert_eq!(wakeup, Wakeup::Abandoned);
}

#[test]
fn test_suspended_task_frees_its_worker() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();
    let (sender, receiver) = mpsc::channel();

    let waiting = rt.spawn(async move {
        suspend("parked", move |wake| sender.send(wake).unwrap()).await
    });

    let wake = receiver.recv().unwrap();
    assert!(!wake.is_woken());

    // The only worker is free to run other work while the first task waits.
    assert_eq!(rt.async_call(|| 7).get().unwrap(), 7);

    wake.wake();
    assert_eq!(waiting.get().unwrap(), Wakeup::Woken);
}

#[test]
fn test_wake_handle_reports_task() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let (task_id, handle_task) = rt.block_on(async {
        let me = task::current().map(|info| info.id);
        let mut seen = None;

        suspend("identify", |wake| {
            seen = wake.task();
            wake.wake();
        })
        .await;

        (me, seen)
    });

    assert!(task_id.is_some());
    assert_eq!(task_id, handle_task);
}

#[test]
fn test_current_task_is_active() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let info = rt.block_on(async { task::current() }).unwrap();

    assert_eq!(info.state, TaskState::Active);
    assert_eq!(&*info.pool, skein::DEFAULT_POOL);
    assert!(task::current().is_none(), "No task outside the runtime");
}

#[test]
fn test_offload_runs_on_other_pool() {
    let rt = RuntimeBuilder::new()
        .worker_threads(1)
        .pool("io", 1)
        .build()
        .unwrap();
    let handle = rt.handle().clone();

    let (value, pool) = rt.block_on(async move {
        handle
            .offload("io", || {
                thread::sleep(Duration::from_millis(10));
                let pool = task::current().map(|info| info.pool.to_string());
                (5, pool)
            })
            .await
            .unwrap()
    });

    assert_eq!(value, 5);
    assert_eq!(pool.as_deref(), Some("io"));
}

#[test]
fn test_offload_errors() {
    let rt = RuntimeBuilder::new().worker_threads(1).pool("io", 1).build().unwrap();
    let handle = rt.handle().clone();

    let (unknown, panicked) = rt.block_on(async move {
        let unknown = handle.offload("gpu", || 1).await;
        let panicked = handle.offload("io", || -> i32 { panic!("device fault") }).await;
        (unknown, panicked)
    });

    assert!(matches!(unknown, Err(Error::UnknownPool(name)) if name == "gpu"));
    assert!(matches!(panicked, Err(Error::Panicked(_))));
}
