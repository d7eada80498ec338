// Error sink - process-wide handlers for uncaught failures
//
// The equivalent of window `error` and `unhandledrejection` listeners that
// only log: a panic hook that logs through tracing, and a monitor that
// awaits component tasks and logs their failures instead of letting them
// vanish. Log-only is the whole contract; escalation (remote reporting etc.)
// would be additive and must not block.

use tokio::task::JoinHandle;

/// Install the global panic hook. Idempotent enough for one call at startup;
/// chains to the previous hook so default stderr output is preserved.
pub fn install() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!("Uncaught panic at {location}: {info}");
        previous(info);
    }));
}

/// Watch a spawned component task and log its failure modes: a panicking
/// task (join error) or a task that returned an error. The unhandled-
/// rejection analogue - observed, logged, never propagated.
pub fn monitor(name: &'static str, handle: JoinHandle<anyhow::Result<()>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match handle.await {
            Ok(Ok(())) => tracing::debug!("{name} task finished"),
            Ok(Err(e)) => tracing::error!("{name} task failed: {e:#}"),
            Err(e) => tracing::error!("{name} task panicked: {e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_monitor_logs_error_without_propagating() {
        let handle: JoinHandle<anyhow::Result<()>> =
            tokio::spawn(async { Err(anyhow::anyhow!("boom")) });
        // The monitor task itself must complete cleanly
        monitor("test", handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_monitor_survives_task_panic() {
        let handle: JoinHandle<anyhow::Result<()>> = tokio::spawn(async { panic!("boom") });
        monitor("test", handle).await.unwrap();
    }
}
