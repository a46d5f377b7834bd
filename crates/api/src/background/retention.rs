//! Periodic purge of dead refresh tokens and old login audits.
//!
//! [`RetentionCleanup::run_once`] is single-flight: a call that arrives while
//! another run is in progress returns [`CleanupOutcome::Skipped`] instead of
//! purging concurrently. The scheduled loop in [`run`] is the normal caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::auth::audit::LoginAuditLog;
use crate::auth::refresh::RefreshTokenStore;

/// Shortest interval the cleanup loop will tick at.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// What one cleanup invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Both purges were attempted. A purge that failed reports zero.
    Completed {
        tokens_purged: u64,
        audits_purged: u64,
    },
    /// Another run was already in progress.
    Skipped,
}

pub struct RetentionCleanup {
    refresh_tokens: Arc<RefreshTokenStore>,
    audit: Arc<LoginAuditLog>,
    audit_retention_days: i64,
    running: AtomicBool,
}

/// Clears the running flag when a run ends, including by panic.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RetentionCleanup {
    pub fn new(
        refresh_tokens: Arc<RefreshTokenStore>,
        audit: Arc<LoginAuditLog>,
        audit_retention_days: i64,
    ) -> Self {
        Self {
            refresh_tokens,
            audit,
            audit_retention_days,
            running: AtomicBool::new(false),
        }
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    /// Purge inactive refresh tokens and expired audit entries.
    ///
    /// The two purges are independent; a failure in one is logged and the
    /// other still runs.
    pub async fn run_once(&self) -> CleanupOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("Retention cleanup already running, skipping");
            return CleanupOutcome::Skipped;
        };

        let tokens_purged = match self.refresh_tokens.purge_inactive().await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Retention cleanup: refresh token purge failed");
                0
            }
        };
        let audits_purged = match self.audit.purge_older_than(self.audit_retention_days).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Retention cleanup: login audit purge failed");
                0
            }
        };

        if tokens_purged > 0 || audits_purged > 0 {
            tracing::info!(tokens_purged, audits_purged, "Retention cleanup: purged old rows");
        } else {
            tracing::debug!("Retention cleanup: no rows to purge");
        }

        CleanupOutcome::Completed {
            tokens_purged,
            audits_purged,
        }
    }
}

/// Run the retention cleanup loop every `interval` until `cancel` fires.
///
/// The first run happens immediately. Ticks missed while a run was slow are
/// delayed rather than replayed in a burst. A zero interval is raised to
/// [`MIN_INTERVAL`].
pub async fn run(cleanup: Arc<RetentionCleanup>, interval: Duration, cancel: CancellationToken) {
    let interval = interval.max(MIN_INTERVAL);
    tracing::info!(
        interval_secs = interval.as_secs(),
        retention_days = cleanup.audit_retention_days,
        "Retention cleanup job started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Retention cleanup job stopping");
                break;
            }
            _ = ticker.tick() => {
                cleanup.run_once().await;
            }
        }
    }
}
