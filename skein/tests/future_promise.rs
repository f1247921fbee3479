use skein::{Error, Fulfill, Future, RuntimeBuilder, make_future_promise, task};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[test]
fn test_value_set_before_get() {
    let (future, promise) = make_future_promise();
    promise.set_value(7).unwrap();

    assert!(future.is_ready());
    assert_eq!(future.get().unwrap(), 7);
}

#[test]
fn test_value_set_from_another_thread() {
    let (future, promise) = make_future_promise();

    let setter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        promise.set_value(String::from("done")).unwrap();
    });

    assert_eq!(future.get().unwrap(), "done");
    setter.join().unwrap();
}

#[test]
fn test_second_set_is_rejected() {
    let (future, promise) = make_future_promise();

    promise.set_value(1).unwrap();
    let second = promise.set_value(2);
    let third = promise.set_error(Error::msg("late"));

    assert!(matches!(second, Err(Error::PromiseAlreadySatisfied)));
    assert!(matches!(third, Err(Error::PromiseAlreadySatisfied)));
    assert_eq!(future.get().unwrap(), 1, "First value must be kept");
}

#[test]
fn test_error_is_reraised_by_get() {
    let (future, promise) = make_future_promise::<i32>();
    promise.set_error(Error::msg("boom")).unwrap();

    let err = future.get().unwrap_err();
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn test_dropped_promise_breaks_future() {
    let (future, promise) = make_future_promise::<i32>();
    drop(promise);

    assert!(matches!(future.get(), Err(Error::BrokenPromise)));
}

#[test]
fn test_satisfied_promise_drop_keeps_value() {
    let (future, promise) = make_future_promise();
    promise.set_value(3).unwrap();
    assert!(promise.is_satisfied());
    drop(promise);

    assert_eq!(future.get().unwrap(), 3);
}

#[test]
fn test_wait_for_times_out() {
    let (future, promise) = make_future_promise::<i32>();

    assert!(!future.wait_for(Duration::from_millis(20)));
    assert!(!future.is_ready());

    promise.set_value(5).unwrap();
    assert!(future.wait_for(Duration::from_millis(20)));
}

#[test]
fn test_ready_and_failed_constructors() {
    assert_eq!(Future::ready(9).get().unwrap(), 9);
    assert!(matches!(
        Future::<i32>::failed(Error::Timeout).get(),
        Err(Error::Timeout)
    ));
}

#[test]
fn test_fulfill_trait_object() {
    let (future, promise) = make_future_promise();
    let sink: Box<dyn Fulfill<u8>> = Box::new(promise);

    sink.set_value(4).unwrap();
    assert!(sink.set_value(5).is_err());
    assert_eq!(future.get().unwrap(), 4);
}

#[test]
fn test_shared_future_readers_see_same_value() {
    let (future, promise) = make_future_promise();
    let shared = future.share();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || shared.get().unwrap())
        })
        .collect();

    promise.set_value(vec![1, 2, 3]).unwrap();

    for reader in readers {
        assert_eq!(reader.join().unwrap(), vec![1, 2, 3]);
    }
    assert_eq!(shared.get().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_shared_future_readers_see_same_error() {
    let (future, promise) = make_future_promise::<i32>();
    let shared = future.share();
    promise.set_error(Error::msg("shared failure")).unwrap();

    assert_eq!(shared.get().unwrap_err().to_string(), "shared failure");
    assert_eq!(shared.clone().get().unwrap_err().to_string(), "shared failure");
}

#[test]
fn test_get_inside_task_frees_the_worker() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    // The inner task needs the only worker while the outer one waits.
    let result = rt.block_on(async {
        let inner = task::async_call(|| 21);
        inner.get().unwrap() * 2
    });

    assert_eq!(result, 42);
}

#[test]
fn test_blocked_task_resumes_while_later_task_blocks() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();
    let (x, x_promise) = make_future_promise::<u32>();
    let (y, y_promise) = make_future_promise::<u32>();

    let first = rt.async_call(move || {
        let value = x.get().unwrap();
        y_promise.set_value(value + 1).unwrap();
        value
    });
    thread::sleep(Duration::from_millis(50));

    // Blocks on what `first` produces once it resumes.
    let second = rt.async_call(move || y.get().unwrap() * 10);
    thread::sleep(Duration::from_millis(50));

    x_promise.set_value(1).unwrap();

    assert!(first.wait_for(Duration::from_secs(5)), "first task stalled");
    assert!(second.wait_for(Duration::from_secs(5)), "second task stalled");
    assert_eq!(first.get().unwrap(), 1);
    assert_eq!(second.get().unwrap(), 20);
}

#[test]
fn test_thousands_of_tasks_block_on_one_worker() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();
    let (gate, opener) = make_future_promise::<u64>();
    let gate = gate.share();

    let futures: Vec<_> = (0..5_000)
        .map(|_| {
            let gate = gate.clone();
            rt.async_call(move || gate.get())
        })
        .collect();

    thread::sleep(Duration::from_millis(200));
    opener.set_value(3).unwrap();

    let total: u64 = futures
        .into_iter()
        .map(|future| future.get().unwrap().unwrap())
        .sum();
    assert_eq!(total, 15_000);
}

#[test]
fn test_blocked_tasks_past_the_replacement_cap() {
    let rt = RuntimeBuilder::new()
        .worker_threads(1)
        .max_blocking_threads(4)
        .build()
        .unwrap();
    let (gate, opener) = make_future_promise::<u64>();
    let gate = gate.share();

    let futures: Vec<_> = (0..100)
        .map(|_| {
            let gate = gate.clone();
            rt.async_call(move || gate.get())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    opener.set_value(1).unwrap();

    for future in futures {
        assert_eq!(future.get().unwrap().unwrap(), 1);
    }
}

#[test]
fn test_dropping_runtime_releases_blocked_task() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();
    let (pending, promise) = make_future_promise::<u32>();

    let blocked = rt.async_call(move || pending.get());
    thread::sleep(Duration::from_millis(50));

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        drop(rt);
        let _ = done_tx.send(());
    });

    assert!(
        done_rx.recv_timeout(Duration::from_secs(5)).is_ok(),
        "runtime drop hung on a blocked worker"
    );
    assert!(matches!(blocked.get(), Ok(Err(Error::Shutdown))));
    drop(promise);
}

#[test]
fn test_await_future_completed_by_thread() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();
    let (future, promise) = make_future_promise();

    let setter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        promise.set_value(11).unwrap();
    });

    let result = rt.block_on(async move { future.await });
    assert_eq!(result.unwrap(), 11);
    setter.join().unwrap();
}

#[test]
fn test_then_chains_on_pool() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let chained = rt
        .async_call(|| 10)
        .then_on(&rt.default_pool(), |value| value.unwrap() + 1);

    assert_eq!(chained.get().unwrap(), 11);
}

#[test]
fn test_shared_then_on_runs_on_named_pool() {
    let rt = RuntimeBuilder::new()
        .worker_threads(1)
        .pool("side", 1)
        .thread_name("chain")
        .build()
        .unwrap();
    let (future, promise) = make_future_promise();
    let shared = future.share();

    let chained = shared.then_on(&rt.pool("side").unwrap(), |value: skein::Result<i32>| {
        let name = thread::current().name().map(str::to_owned);
        (value.unwrap() + 1, name)
    });
    let plain = shared.then(|value| value.unwrap() * 2);

    promise.set_value(4).unwrap();

    let (value, name) = chained.get().unwrap();
    assert_eq!(value, 5);
    assert_eq!(name.as_deref(), Some("chain-side-0"));
    assert_eq!(plain.get().unwrap(), 8);
}

#[test]
fn test_then_outside_runtime_runs_inline() {
    let (future, promise) = make_future_promise();
    let calls = Arc::new(AtomicUsize::new(0));

    let chained = future.then({
        let calls = calls.clone();
        move |value: skein::Result<i32>| {
            calls.fetch_add(1, Ordering::SeqCst);
            value.map(|v| v * 3)
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    promise.set_value(2).unwrap();

    assert_eq!(chained.get().unwrap().unwrap(), 6);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_then_panic_becomes_error() {
    let chained = Future::ready(1).then(|_| -> i32 { panic!("continuation failed") });

    match chained.get() {
        Err(Error::Panicked(message)) => assert!(message.contains("continuation failed")),
        other => panic!("expected a panic error, got {other:?}"),
    }
}

#[test]
fn test_panicking_task_stores_error() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let future = rt.async_call(|| -> i32 { panic!("task exploded") });
    assert!(matches!(future.get(), Err(Error::Panicked(_))));

    // The worker survives the panic.
    assert_eq!(rt.async_call(|| 5).get().unwrap(), 5);
}
