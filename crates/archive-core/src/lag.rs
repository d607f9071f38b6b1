//! Lag Monitor (§4.9): queries replica status, blocks batch entry while
//! lag exceeds the configured threshold. Disabled mode (no replica
//! handle) makes every call a no-op that reports "acceptable, lag=0".

use connectors::SqlAdapter;
use model::ReplicationStatus;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct LagCheck {
    pub ok: bool,
    pub lag_seconds: Option<i64>,
    pub error: Option<String>,
}

pub struct LagMonitor<'a> {
    replica: Option<&'a dyn SqlAdapter>,
    threshold_seconds: i64,
    interval_seconds: u64,
}

impl<'a> LagMonitor<'a> {
    pub fn new(replica: Option<&'a dyn SqlAdapter>, threshold_seconds: i64, interval_seconds: u64) -> Self {
        LagMonitor {
            replica,
            threshold_seconds,
            interval_seconds: interval_seconds.max(1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.replica.is_some()
    }

    /// Issues `SHOW REPLICA STATUS`, falling back to the legacy `SHOW
    /// SLAVE STATUS` (handled inside the adapter itself). An empty result
    /// means "replication not configured."
    pub async fn get_status(&self) -> Result<ReplicationStatus, CoreError> {
        let Some(replica) = self.replica else {
            return Ok(ReplicationStatus {
                seconds_behind_primary: Some(0),
                io_thread_running: Some(true),
                sql_thread_running: Some(true),
                last_error: None,
            });
        };

        match replica.replication_status().await {
            Ok(status) => Ok(status),
            Err(connectors::DbError::Unsupported(_)) => Ok(ReplicationStatus::default()),
            Err(e) => Err(CoreError::Db(e)),
        }
    }

    /// Fails (ok=false) if either thread is not running, seconds-behind is
    /// null, or seconds-behind exceeds the configured threshold.
    pub async fn check_lag(&self) -> LagCheck {
        if !self.is_enabled() {
            return LagCheck {
                ok: true,
                lag_seconds: Some(0),
                error: None,
            };
        }

        let status = match self.get_status().await {
            Ok(status) => status,
            Err(e) => {
                return LagCheck {
                    ok: false,
                    lag_seconds: None,
                    error: Some(e.to_string()),
                }
            }
        };

        if status.is_unconfigured() {
            return LagCheck {
                ok: false,
                lag_seconds: None,
                error: Some("replication not configured".to_string()),
            };
        }

        if status.io_thread_running != Some(true) || status.sql_thread_running != Some(true) {
            return LagCheck {
                ok: false,
                lag_seconds: status.seconds_behind_primary,
                error: Some(format!(
                    "replication thread not running (io={:?}, sql={:?})",
                    status.io_thread_running, status.sql_thread_running
                )),
            };
        }

        match status.seconds_behind_primary {
            None => LagCheck {
                ok: false,
                lag_seconds: None,
                error: Some("seconds_behind_primary is unreadable".to_string()),
            },
            Some(lag) if lag > self.threshold_seconds => LagCheck {
                ok: false,
                lag_seconds: Some(lag),
                error: Some(format!("lag {lag}s exceeds threshold {}s", self.threshold_seconds)),
            },
            Some(lag) => LagCheck {
                ok: true,
                lag_seconds: Some(lag),
                error: None,
            },
        }
    }

    /// Blocks until `check_lag` reports ok=true, sleeping `interval` on
    /// every non-ok probe (cancellable). Returns immediately on
    /// cancellation.
    pub async fn wait_for_lag(&self, cancel: &CancellationToken) -> Result<(), CoreError> {
        loop {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled("lag_monitor.wait_for_lag".to_string()));
            }

            let check = self.check_lag().await;
            if check.ok {
                return Ok(());
            }

            if let Some(lag) = check.lag_seconds {
                warn!(lag_seconds = lag, "pausing due to high replication lag");
            } else {
                warn!(error = check.error.as_deref().unwrap_or("unknown"), "replication lag unreadable, retrying");
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("lag wait cancelled");
                    return Err(CoreError::Cancelled("lag_monitor.wait_for_lag".to_string()));
                }
                _ = sleep(std::time::Duration::from_secs(self.interval_seconds)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_monitor_is_always_acceptable() {
        let monitor = LagMonitor::new(None, 10, 5);
        let check = monitor.check_lag().await;
        assert!(check.ok);
        assert_eq!(check.lag_seconds, Some(0));
    }

    #[tokio::test]
    async fn disabled_monitor_wait_returns_immediately() {
        let monitor = LagMonitor::new(None, 10, 5);
        let cancel = CancellationToken::new();
        monitor.wait_for_lag(&cancel).await.unwrap();
    }
}
