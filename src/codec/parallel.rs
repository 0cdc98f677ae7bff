//! Ordered worker pool for chunk-parallel encoding and decoding.
//!
//! Architecture:
//! - Main thread: hand out chunk indices over a bounded job channel
//! - Worker pool: run the per-chunk work and send back (index, result)
//! - Main thread: buffer out-of-order results and emit them in chunk order

use std::collections::BTreeMap;

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::error::{Error, Result};

/// Result of processing a single chunk
struct Completed<R> {
    /// Chunk index, for ordering output
    id: usize,
    output: Result<R>,
}

/// Run `work` over every item on `num_threads` scoped workers
///
/// Results come back in item order. The first failure, in whatever order
/// workers report it, aborts the run and is returned.
pub fn map_ordered<T, R, F>(items: &[T], num_threads: usize, work: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync,
{
    // Channel capacity - enough to keep workers busy without excessive memory
    let channel_capacity = num_threads * 4;

    let (job_tx, job_rx): (Sender<usize>, Receiver<usize>) = bounded(channel_capacity);
    let (result_tx, result_rx): (Sender<Completed<R>>, Receiver<Completed<R>>) =
        bounded(channel_capacity);

    let work = &work;

    // Use crossbeam's scoped threads so workers can borrow the input
    let result = crossbeam::scope(|scope| {
        for _ in 0..num_threads {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();

            scope.spawn(move |_| {
                worker_thread(items, job_rx, result_tx, work);
            });
        }

        // Drop our copies of the channels that workers use
        drop(job_rx);
        drop(result_tx);

        dispatch_and_collect(items.len(), job_tx, result_rx)
    });

    result.map_err(|_| Error::Internal("Thread panicked".to_string()))?
}

fn dispatch_and_collect<R>(
    count: usize,
    job_tx: Sender<usize>,
    result_rx: Receiver<Completed<R>>,
) -> Result<Vec<R>> {
    let mut ordered: Vec<R> = Vec::with_capacity(count);
    let mut pending: BTreeMap<usize, R> = BTreeMap::new();
    let mut next_job = 0;

    // Send jobs, draining results as needed to prevent deadlock
    while next_job < count {
        crossbeam::channel::select! {
            send(job_tx, next_job) -> res => {
                if res.is_err() {
                    return Err(Error::Internal("Workers disconnected".to_string()));
                }
                next_job += 1;
            }
            recv(result_rx) -> res => {
                let done = res
                    .map_err(|_| Error::Internal("Result channel disconnected".to_string()))?;
                buffer_in_order(done, &mut ordered, &mut pending)?;
            }
        }
    }

    // Drop job_tx to signal workers we're done
    drop(job_tx);

    while ordered.len() < count {
        let done = result_rx
            .recv()
            .map_err(|_| Error::Internal("Result channel disconnected".to_string()))?;
        buffer_in_order(done, &mut ordered, &mut pending)?;
    }

    Ok(ordered)
}

fn buffer_in_order<R>(
    done: Completed<R>,
    ordered: &mut Vec<R>,
    pending: &mut BTreeMap<usize, R>,
) -> Result<()> {
    let output = done.output?;
    if done.id == ordered.len() {
        ordered.push(output);

        // Emit any consecutive buffered results
        while let Some(buffered) = pending.remove(&ordered.len()) {
            ordered.push(buffered);
        }
    } else {
        // Buffer out-of-order result
        pending.insert(done.id, output);
    }
    Ok(())
}

fn worker_thread<T, R, F>(
    items: &[T],
    job_rx: Receiver<usize>,
    result_tx: Sender<Completed<R>>,
    work: &F,
) where
    F: Fn(&T) -> Result<R>,
{
    while let Ok(id) = job_rx.recv() {
        let output = work(&items[id]);

        if result_tx.send(Completed { id, output }).is_err() {
            // Main thread has stopped, exit
            break;
        }
    }
}
