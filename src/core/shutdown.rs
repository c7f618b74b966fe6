//! # OS termination signals for the `*_and_exit` helpers.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT` (plus tokio's `ctrl_c`).
//! **Other platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

/// Waits for a termination signal and returns its name.
///
/// Each call registers independent listeners; `Err` if registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl_c")
}

/// Like [`wait_for_shutdown_signal`], but never completes if listeners cannot be registered.
pub(crate) async fn shutdown_signal() -> &'static str {
    match wait_for_shutdown_signal().await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for termination signals");
            std::future::pending().await
        }
    }
}
