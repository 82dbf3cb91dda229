//! Bounded worker pool for per-document tasks.
//!
//! Jobs are fed through a `crossbeam-channel` queue to at most `workers`
//! scoped threads. Results are reassembled in input order, so callers never
//! observe the scheduling order. A panicking job propagates to the caller
//! once every worker has stopped.

use crossbeam_channel::unbounded;
use tracing::trace;

/// Apply `f` to every item on up to `workers` threads; results keep input order.
pub fn map<T, U, F>(workers: usize, items: Vec<T>, f: F) -> Vec<U>
where
    T: Send,
    U: Send,
    F: Fn(T) -> U + Sync,
{
    let len = items.len();
    let workers = workers.clamp(1, len.max(1));
    if workers == 1 {
        return items.into_iter().map(f).collect();
    }

    let (job_tx, job_rx) = unbounded::<(usize, T)>();
    let (result_tx, result_rx) = unbounded::<(usize, U)>();
    for job in items.into_iter().enumerate() {
        // The receiver is alive until the scope below ends.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    trace!(workers, jobs = len, "starting worker pool");
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let f = &f;
            scope.spawn(move || {
                for (index, item) in job_rx.iter() {
                    if result_tx.send((index, f(item))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<U>> = std::iter::repeat_with(|| None).take(len).collect();
    for (index, result) in result_rx.try_iter() {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

/// Run `f` on every item on up to `workers` threads and wait for all of them.
pub fn for_each<T, F>(workers: usize, items: &[T], f: F)
where
    T: Sync,
    F: Fn(&T) + Sync,
{
    map(workers, items.iter().collect(), |item| f(item));
}
