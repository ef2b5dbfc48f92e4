//! Background sensor acquisition.
//!
//! A dedicated thread owns the `SensorArray` and publishes into a
//! single-slot channel with latest-wins semantics: if the decision loop
//! has not consumed the previous frame yet, the slot is overwritten
//! rather than the publisher blocking on it. A control tick therefore
//! always sees the newest reading, and shutdown is never stuck behind a
//! full channel.
//!
//! Each `Sampler` owns exactly one thread, joined on Drop.
use crossbeam_channel as xch;
use follower_traits::clock::Clock;
use follower_traits::{RawFrame, SensorArray};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

pub struct Sampler {
    rx: xch::Receiver<RawFrame>,
    last_ok: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Rate-paced sampling at `hz`. Read errors are skipped; the runner's
    /// stall watchdog catches a sensor that stops delivering.
    pub fn spawn<A: SensorArray + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut array: A,
        hz: u32,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(1);
        // The publisher keeps its own receiver handle so it can evict an
        // unconsumed frame instead of waiting on the consumer.
        let slot = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            while !shutdown_clone.load(Ordering::Relaxed) {
                match array.read(timeout) {
                    Ok(frame) => {
                        publish(&tx, &slot, frame);
                        last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "sensor read failed; skipping frame");
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Most recent frame, draining anything stale in the channel.
    pub fn latest(&self) -> Option<RawFrame> {
        self.rx.try_iter().last()
    }

    /// Block up to `d` for the next frame. Used for the first frame of a
    /// run, before any frame has been published.
    pub fn recv_timeout(&self, d: Duration) -> Option<RawFrame> {
        self.rx.recv_timeout(d).ok()
    }

    /// Milliseconds since the last successful read, given `now_ms`
    /// measured against the same epoch the sampler was spawned with.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }
}

/// Publish without ever blocking. An unconsumed frame is stale the
/// moment a newer reading exists, so on a full slot the old frame is
/// evicted and the new one takes its place. Only this thread sends, so
/// the retry after eviction cannot find the slot full again.
fn publish(tx: &xch::Sender<RawFrame>, slot: &xch::Receiver<RawFrame>, frame: RawFrame) {
    if let Err(xch::TrySendError::Full(frame)) = tx.try_send(frame) {
        let _ = slot.try_recv();
        let _ = tx.try_send(frame);
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // The publisher never blocks on the channel, so the join is
        // bounded by one in-flight read plus one sleep period.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampler thread joined");
                }
                Err(e) => {
                    tracing::warn!(?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}
