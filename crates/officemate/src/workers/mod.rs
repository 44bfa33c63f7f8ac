//! Periodic cleanup tasks.
//!
//! Each task runs on its own interval until the shutdown signal fires. A
//! failed run is logged and the task waits for the next tick.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::state::AppState;

/// Starts every cleanup task.
pub fn spawn_all(state: &AppState, config: &Config) -> Vec<JoinHandle<()>> {
    let inactivity = chrono::Duration::days(config.session_inactivity_days);
    let retention = chrono::Duration::days(config.verification_retention_days);

    vec![
        spawn_periodic(
            "expired_sessions",
            Duration::from_secs(config.session_cleanup_interval_seconds),
            state.subscribe_shutdown(),
            {
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async move { close_expired_sessions(&state).await }
                }
            },
        ),
        spawn_periodic(
            "inactive_sessions",
            Duration::from_secs(config.inactive_cleanup_interval_seconds),
            state.subscribe_shutdown(),
            {
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async move { revoke_inactive_sessions(&state, inactivity).await }
                }
            },
        ),
        spawn_periodic(
            "expired_email_verifications",
            Duration::from_secs(config.email_cleanup_interval_seconds),
            state.subscribe_shutdown(),
            {
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async move { delete_expired_verifications(&state).await }
                }
            },
        ),
        spawn_periodic(
            "verified_email_verifications",
            Duration::from_secs(config.inactive_cleanup_interval_seconds),
            state.subscribe_shutdown(),
            {
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async move { purge_verified_verifications(&state, retention).await }
                }
            },
        ),
    ]
}

fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<u64>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
        // The first tick completes immediately.
        interval.tick().await;
        tracing::debug!(task = name, period_secs = period.as_secs(), "Cleanup task started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match job().await {
                        Ok(0) => tracing::debug!(task = name, "Nothing to clean up"),
                        Ok(count) => tracing::info!(task = name, count, "Cleanup finished"),
                        Err(e) => tracing::error!(task = name, error = %e, "Cleanup failed"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!(task = name, "Cleanup task shutting down");
                    break;
                }
            }
        }
    })
}

async fn close_expired_sessions(state: &AppState) -> anyhow::Result<u64> {
    let closed = state.auth.sessions.cleanup_expired_sessions(Utc::now()).await?;
    Ok(closed as u64)
}

async fn revoke_inactive_sessions(
    state: &AppState,
    inactivity: chrono::Duration,
) -> anyhow::Result<u64> {
    let revoked = state
        .auth
        .sessions
        .cleanup_inactive_sessions(Utc::now() - inactivity)
        .await?;
    Ok(revoked as u64)
}

async fn delete_expired_verifications(state: &AppState) -> anyhow::Result<u64> {
    Ok(state.verifications.delete_expired(Utc::now()).await?)
}

async fn purge_verified_verifications(
    state: &AppState,
    retention: chrono::Duration,
) -> anyhow::Result<u64> {
    Ok(state
        .verifications
        .delete_verified_before(Utc::now() - retention)
        .await?)
}
