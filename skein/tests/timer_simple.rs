use skein::time::sleep;
use std::time::{Duration, Instant};

#[skein::test]
async fn test_sleep_basic() {
    let start = Instant::now();
    sleep(Duration::from_millis(50)).await;

    assert!(
        start.elapsed() >= Duration::from_millis(50),
        "Sleep should wait at least the specified duration"
    );
}

#[skein::test]
async fn test_sleep_zero_duration() {
    let start = Instant::now();
    sleep(Duration::from_millis(0)).await;

    assert!(
        start.elapsed() < Duration::from_millis(50),
        "Zero duration sleep should be fast"
    );
}

#[skein::test]
async fn test_sleeps_wake_in_deadline_order() {
    let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));

    let futures: Vec<_> = [30u64, 10, 20]
        .into_iter()
        .map(|ms| {
            let order = order.clone();
            skein::task::spawn(async move {
                sleep(Duration::from_millis(ms)).await;
                order.lock().unwrap().push(ms);
            })
        })
        .collect();

    for future in futures {
        future.await.unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec![10, 20, 30]);
}

#[test]
fn test_handle_sleep_from_plain_thread() {
    let rt = skein::Runtime::new().unwrap();
    let start = Instant::now();

    rt.block_on(rt.sleep(Duration::from_millis(20)));
    assert!(start.elapsed() >= Duration::from_millis(20));
}
