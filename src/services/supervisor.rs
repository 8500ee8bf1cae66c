//! Supervisor service: the background governance loop.
//!
//! Each cycle scans the audit log into the inbox, then drains the inbox
//! through the policy router. Cycles fire either on a wake signal (the push
//! path telling us new work exists) or on the poll timeout; the wake carries
//! only a reason string, the work itself is always re-derived from the inbox.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapters::sqlite::SqliteInboxRepository;
use crate::domain::models::SupervisorConfig;
use crate::services::event_poller::EventPoller;
use crate::services::event_processor::EventProcessor;
use crate::services::policy_router::PolicyRouter;

/// Point-in-time counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub cycles: u64,
    pub events_inboxed: u64,
    pub events_completed: u64,
    pub events_failed: u64,
}

pub struct SupervisorService {
    poller: Arc<EventPoller>,
    processor: Arc<EventProcessor>,
    inbox: SqliteInboxRepository,
    config: SupervisorConfig,
    running: Arc<AtomicBool>,
    wake_tx: mpsc::UnboundedSender<String>,
    wake_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    cycles: Arc<AtomicU64>,
    events_inboxed: Arc<AtomicU64>,
    events_completed: Arc<AtomicU64>,
    events_failed: Arc<AtomicU64>,
}

impl SupervisorService {
    pub fn new(pool: SqlitePool, router: Arc<PolicyRouter>, config: SupervisorConfig) -> Self {
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        Self {
            poller: Arc::new(EventPoller::new(pool.clone(), config.poll_batch_size)),
            processor: Arc::new(EventProcessor::new(
                pool.clone(),
                router,
                config.process_batch_size,
            )),
            inbox: SqliteInboxRepository::new(pool),
            config,
            running: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx: std::sync::Mutex::new(Some(wake_rx)),
            cycles: Arc::new(AtomicU64::new(0)),
            events_inboxed: Arc::new(AtomicU64::new(0)),
            events_completed: Arc::new(AtomicU64::new(0)),
            events_failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Signal that new work may exist. Safe to call from any task; never
    /// blocks. Returns false once the loop receiver is gone.
    pub fn wake(&self, reason: &str) -> bool {
        self.wake_tx.send(reason.to_string()).is_ok()
    }

    /// Request a graceful stop: the in-flight cycle finishes, then the loop
    /// exits. A wake is sent so the loop notices promptly.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.wake_tx.send("shutdown".to_string());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SupervisorStats {
        SupervisorStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            events_inboxed: self.events_inboxed.load(Ordering::Relaxed),
            events_completed: self.events_completed.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
        }
    }

    /// Start the loop. Returns a JoinHandle for shutdown; `None` if already
    /// started (the wake receiver is single-consumer).
    pub fn start(&self) -> Option<tokio::task::JoinHandle<()>> {
        let mut rx_slot = match self.wake_rx.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(mut wake_rx) = rx_slot.take() else {
            warn!("Supervisor loop already started");
            return None;
        };
        drop(rx_slot);

        self.running.store(true, Ordering::SeqCst);

        let poller = self.poller.clone();
        let processor = self.processor.clone();
        let inbox = self.inbox.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        let cycles = self.cycles.clone();
        let events_inboxed = self.events_inboxed.clone();
        let events_completed = self.events_completed.clone();
        let events_failed = self.events_failed.clone();

        Some(tokio::spawn(async move {
            info!(
                poll_timeout_secs = config.poll_timeout_secs,
                "Supervisor loop started"
            );

            while running.load(Ordering::SeqCst) {
                tokio::select! {
                    reason = wake_rx.recv() => {
                        match reason {
                            Some(reason) => debug!(reason = %reason, "Supervisor woken"),
                            None => {
                                info!("Wake channel closed, stopping supervisor loop");
                                break;
                            }
                        }
                    }
                    () = tokio::time::sleep(Duration::from_secs(config.poll_timeout_secs)) => {
                        debug!("Poll timeout elapsed");
                    }
                }

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                // Drain queued wakes so a burst collapses into one cycle.
                while wake_rx.try_recv().is_ok() {}

                if config.retry_failed_on_cycle {
                    match inbox.reset_failed(config.max_retries).await {
                        Ok(0) => {}
                        Ok(requeued) => info!(requeued, "Re-queued failed inbox rows"),
                        Err(err) => warn!("Failed to re-queue inbox rows: {err}"),
                    }
                }

                match poller.scan().await {
                    Ok(inboxed) => {
                        events_inboxed.fetch_add(inboxed as u64, Ordering::Relaxed);
                    }
                    Err(err) => warn!("Poll cycle failed: {err}"),
                }

                match processor.process_pending_events().await {
                    Ok(report) => {
                        events_completed.fetch_add(report.completed as u64, Ordering::Relaxed);
                        events_failed.fetch_add(report.failed as u64, Ordering::Relaxed);
                    }
                    Err(err) => warn!("Processing cycle failed: {err}"),
                }

                cycles.fetch_add(1, Ordering::Relaxed);
            }

            info!("Supervisor loop stopped");
        }))
    }
}
