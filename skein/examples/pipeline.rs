//! Builds a small dataflow graph: two independent loads feed a merge, and
//! a flaky scoring step is replayed until it succeeds.

use skein::replay::Attempt;
use skein::{Error, dataflow, dataflow_replay, task};

#[skein::main(worker_threads = 4)]
async fn main() {
    let left = task::async_call(|| (1..=100u64).sum::<u64>());
    let right = task::async_call(|| (1..=10u64).product::<u64>());

    let merged = dataflow(|(l, r)| l + r, (left, right)).share();

    let mut attempts = 0;
    let scored = dataflow_replay(
        3,
        move |(total,): &(u64,)| {
            attempts += 1;
            if attempts < 3 {
                Attempt::Retry(Error::msg(format!("scorer busy on attempt {attempts}")))
            } else {
                Attempt::Success(total % 97)
            }
        },
        (merged.clone(),),
    );

    println!("merged = {}", merged.await.unwrap());
    println!("score  = {}", scored.await.unwrap());
}
