use skein::{Error, Future, RuntimeBuilder, dataflow, make_future_promise, task, wait_all, when_all};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_dataflow_adds_two_async_values() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let sum = rt.block_on(async {
        let a = task::async_call(|| 2);
        let b = task::async_call(|| 3);
        dataflow(|(a, b)| a + b, (a, b)).await
    });

    assert_eq!(sum.unwrap(), 5);
}

#[test]
fn test_dataflow_from_outside_runtime() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let (a, pa) = make_future_promise();
    let (b, pb) = make_future_promise();
    let product = rt.dataflow(|(a, b): (i64, i64)| a * b, (a, b));

    assert!(!product.is_ready());
    pa.set_value(6).unwrap();
    pb.set_value(7).unwrap();

    assert_eq!(product.get().unwrap(), 42);
}

#[test]
fn test_dataflow_without_inputs_runs_once() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let result = rt.dataflow(
        {
            let calls = calls.clone();
            move |()| calls.fetch_add(1, Ordering::SeqCst) + 100
        },
        (),
    );

    assert_eq!(result.get().unwrap(), 100);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dataflow_runs_exactly_once_for_concurrent_inputs() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    for inputs in [1usize, 2, 16, 64] {
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(inputs));

        let (futures, promises): (Vec<_>, Vec<_>) =
            (0..inputs).map(|_| make_future_promise::<usize>()).unzip();

        let total = rt.dataflow(
            {
                let calls = calls.clone();
                move |values: Vec<usize>| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    values.iter().sum::<usize>()
                }
            },
            futures,
        );

        // Release every input at the same moment from its own thread.
        let setters: Vec<_> = promises
            .into_iter()
            .enumerate()
            .map(|(i, promise)| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    promise.set_value(i).unwrap();
                })
            })
            .collect();

        for setter in setters {
            setter.join().unwrap();
        }

        assert_eq!(total.get().unwrap(), inputs * (inputs - 1) / 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "{inputs} inputs");
    }
}

#[test]
fn test_dataflow_with_already_ready_inputs() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let joined = rt.dataflow(
        |(a, b, c): (&'static str, i32, bool)| format!("{a}-{b}-{c}"),
        (Future::ready("x"), Future::ready(1), Future::ready(true)),
    );

    assert_eq!(joined.get().unwrap(), "x-1-true");
}

#[test]
fn test_dataflow_skips_function_on_input_error() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let (a, pa) = make_future_promise::<i32>();
    let (b, pb) = make_future_promise::<i32>();

    let result = rt.dataflow(
        {
            let calls = calls.clone();
            move |(a, b)| {
                calls.fetch_add(1, Ordering::SeqCst);
                a + b
            }
        },
        (a, b),
    );

    pa.set_error(Error::msg("left failed")).unwrap();
    pb.set_value(1).unwrap();

    assert_eq!(result.get().unwrap_err().to_string(), "left failed");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_dataflow_concurrent_failures_report_one_error() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();
    let inputs = 8;
    let barrier = Arc::new(Barrier::new(inputs));

    let (futures, promises): (Vec<_>, Vec<_>) =
        (0..inputs).map(|_| make_future_promise::<u8>()).unzip();

    let result = rt.dataflow(|values: Vec<u8>| values.len(), futures);

    let setters: Vec<_> = promises
        .into_iter()
        .enumerate()
        .map(|(i, promise)| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                promise.set_error(Error::msg(format!("input {i}"))).unwrap();
            })
        })
        .collect();

    for setter in setters {
        setter.join().unwrap();
    }

    let message = result.get().unwrap_err().to_string();
    assert!(message.starts_with("input "), "unexpected error: {message}");
}

#[test]
fn test_dataflow_broken_input() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let (a, pa) = make_future_promise::<i32>();
    let result = rt.dataflow(|(a,)| a, (a,));
    drop(pa);

    assert!(matches!(result.get(), Err(Error::BrokenPromise)));
}

#[test]
fn test_dataflow_function_panic() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let result = rt.dataflow(|(a,): (i32,)| -> i32 { panic!("bad input {a}") }, (Future::ready(3),));

    match result.get() {
        Err(Error::Panicked(message)) => assert!(message.contains("bad input 3")),
        other => panic!("expected a panic error, got {other:?}"),
    }
}

#[test]
fn test_dataflow_graph_of_dependent_nodes() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let result = rt.block_on(async {
        let source = task::async_call(|| 1u64).share();

        let left = dataflow(|(x,)| x + 1, (source.clone(),));
        let right = dataflow(|(x,)| x * 10, (source.clone(),));
        let both = dataflow(|(l, r, s)| l + r + s, (left, right, source));

        both.await
    });

    assert_eq!(result.unwrap(), 2 + 10 + 1);
}

#[test]
fn test_when_all_keeps_input_order() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let values = rt.block_on(async {
        let futures: Vec<_> = (0..10u64)
            .map(|i| {
                task::async_call(move || {
                    thread::sleep(Duration::from_millis(10 - i));
                    i
                })
            })
            .collect();

        when_all(futures).await
    });

    assert_eq!(values.unwrap(), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_wait_all_thousand_tasks() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let futures: Vec<_> = (0..1000)
        .map(|_| {
            let counter = counter.clone();
            rt.async_call(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    wait_all(futures);
    assert_eq!(counter.load(Ordering::SeqCst), 1000);
}

#[test]
fn test_wait_all_inside_task() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let total = rt.block_on(async {
        let counter = Arc::new(AtomicUsize::new(0));
        let futures: Vec<_> = (0..50)
            .map(|_| {
                let counter = counter.clone();
                task::async_call(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        wait_all(futures);
        counter.load(Ordering::SeqCst)
    });

    assert_eq!(total, 50);
}

#[test]
fn test_pool_dataflow_runs_on_that_pool() {
    let rt = RuntimeBuilder::new()
        .worker_threads(1)
        .pool("compute", 2)
        .build()
        .unwrap();
    let compute = rt.pool("compute").unwrap();

    let pool_name = compute.dataflow(
        |()| task::current().map(|info| info.pool.to_string()),
        (),
    );

    assert_eq!(pool_name.get().unwrap().as_deref(), Some("compute"));
}
