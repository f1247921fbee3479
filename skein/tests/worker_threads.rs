use skein::task::spawn;
use skein::{Error, RuntimeBuilder, wait_all};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_single_worker_thread() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let result = rt.block_on(async { 42 });
    assert_eq!(result, 42);
}

#[test]
fn test_worker_threads_parallel_execution() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let counter = Arc::new(Mutex::new(0));
    let results = Arc::new(Mutex::new(Vec::new()));

    let counter_clone = counter.clone();
    let results_clone = results.clone();

    rt.block_on(async move {
        let futures: Vec<_> = (0..10)
            .map(|i| {
                let counter = counter_clone.clone();
                let results = results_clone.clone();

                spawn(async move {
                    *counter.lock().unwrap() += 1;
                    results.lock().unwrap().push(i);
                    i * 2
                })
            })
            .collect();

        for future in futures {
            future.await.unwrap();
        }
    });

    assert_eq!(*counter.lock().unwrap(), 10);
    assert_eq!(results.lock().unwrap().len(), 10);
}

#[test]
fn test_worker_threads_stress() {
    let rt = RuntimeBuilder::new().worker_threads(8).build().unwrap();

    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    rt.block_on(async move {
        let futures: Vec<_> = (0..1000)
            .map(|_| {
                let counter = counter_clone.clone();
                spawn(async move {
                    *counter.lock().unwrap() += 1;
                })
            })
            .collect();

        wait_all(futures);
    });

    assert_eq!(*counter.lock().unwrap(), 1000);
}

#[test]
fn test_worker_threads_spread_across_threads() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();
    let threads = Arc::new(Mutex::new(HashSet::new()));

    let futures: Vec<_> = (0..200)
        .map(|_| {
            let threads = threads.clone();
            rt.async_call(move || {
                thread::sleep(std::time::Duration::from_millis(1));
                threads.lock().unwrap().insert(thread::current().id());
            })
        })
        .collect();

    wait_all(futures);

    let used = threads.lock().unwrap().len();
    assert!((1..=4).contains(&used), "used {used} threads");
}

#[test]
fn test_worker_threads_chain_spawn() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let result = rt.block_on(async {
        let outer = spawn(async {
            let middle = spawn(async {
                let inner = spawn(async { 10 });
                inner.await.unwrap() + 20
            });
            middle.await.unwrap() + 30
        });
        outer.await.unwrap() + 40
    });

    assert_eq!(result, 100);
}

#[test]
fn test_worker_threads_zero_is_rejected() {
    let result = RuntimeBuilder::new().worker_threads(0).build();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_worker_threads_sequential_runtimes() {
    for n in 1..=4 {
        let rt = RuntimeBuilder::new().worker_threads(n).build().unwrap();
        let result = rt.block_on(async move { n * 10 });
        assert_eq!(result, n * 10);
        drop(rt);
    }
}

#[test]
fn test_worker_threads_nested_spawns() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let results = Arc::new(Mutex::new(Vec::new()));
    let results_clone = results.clone();

    rt.block_on(async move {
        let outer: Vec<_> = (0..4)
            .map(|i| {
                let results = results_clone.clone();
                spawn(async move {
                    let inner: Vec<_> = (0..5)
                        .map(|j| {
                            let results = results.clone();
                            spawn(async move {
                                results.lock().unwrap().push(i * 10 + j);
                            })
                        })
                        .collect();

                    for future in inner {
                        future.await.unwrap();
                    }
                })
            })
            .collect();

        for future in outer {
            future.await.unwrap();
        }
    });

    assert_eq!(results.lock().unwrap().len(), 20);
}

#[test]
fn test_queued_tasks_fail_after_shutdown() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();
    let handle = rt.handle().clone();
    drop(rt);

    assert!(handle.is_shutdown());
    assert!(matches!(handle.async_call(|| 1).get(), Err(Error::Shutdown)));
}
