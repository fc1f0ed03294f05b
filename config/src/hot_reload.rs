//! # Scope Hot Reload
//!
//! Watches the file behind a [`ConfigScope`] and re-reads it into the scope
//! whenever it changes on disk. Settings bound to the scope observe the new
//! values on their next `get`.

use crate::scope::ConfigScope;
use errors::ConfigError;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::{debug, error, info, warn};

/// Scope reload event.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeReloadEvent {
    Ready,

    /// File changed and the scope was re-read
    Reloaded(PathBuf),

    /// File was removed; the scope keeps its last contents
    Removed(PathBuf),

    Error {
        path: PathBuf,
        error: String,
    },
}

/// Watch the scope's file and reload the scope on every change.
///
/// ```rust,no_run
/// use config::{ConfigScope, ScopeReloadEvent, watch_scope};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let scope = ConfigScope::open("app.ini")?;
///     let (_tx, mut rx) = watch_scope(scope.clone()).await?;
///
///     while let Some(event) = rx.recv().await {
///         if let ScopeReloadEvent::Error { path, error } = event {
///             eprintln!("Error reloading {:?}: {}", path, error);
///         }
///     }
///     Ok(())
/// }
/// ```
///
/// The watcher stops once every receiver is dropped.
pub async fn watch_scope(
    scope: ConfigScope,
) -> Result<(Sender<ScopeReloadEvent>, Receiver<ScopeReloadEvent>), ConfigError> {
    let path = scope.path();

    if !path.exists() {
        return Err(ConfigError::Watch {
            path,
            reason: "file not found".to_string(),
        });
    }

    let (tx, rx) = tokio::sync::mpsc::channel(100);
    let tx_task = tx.clone();

    tokio::spawn(async move {
        let (event_tx, mut event_rx) = tokio::sync::mpsc::channel(100);
        let mut watcher = match RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            notify::Config::default(),
        ) {
            Ok(w) => w,
            Err(e) => {
                let error_msg = format!("Failed to create file watcher: {}", e);
                error!("{}", error_msg);
                let _ = tx_task
                    .send(ScopeReloadEvent::Error {
                        path,
                        error: error_msg,
                    })
                    .await;
                return;
            }
        };

        if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
            let error_msg = format!("Failed to watch config file: {}", e);
            error!("{}", error_msg);
            let _ = tx_task
                .send(ScopeReloadEvent::Error {
                    path,
                    error: error_msg,
                })
                .await;
            return;
        }

        info!(path = %path.display(), "Watching config scope");
        let _ = tx_task.send(ScopeReloadEvent::Ready).await;

        loop {
            tokio::select! {
                _ = tx_task.closed() => {
                    debug!(path = %path.display(), "Receiver dropped, stopping watcher");
                    break;
                }
                event_result = event_rx.recv() => {
                    let Some(event_result) = event_result else {
                        break;
                    };

                    let event = match event_result {
                        Ok(event) => event,
                        Err(e) => {
                            warn!("Watch error: {}", e);
                            continue;
                        }
                    };
                    let Some(changed) = event.paths.first().cloned() else {
                        continue;
                    };

                    let reload_event = match event.kind {
                        EventKind::Create(_) | EventKind::Modify(_) => match scope.reload() {
                            Ok(()) => {
                                info!(path = %changed.display(), "Config scope reloaded");
                                ScopeReloadEvent::Reloaded(changed)
                            }
                            Err(e) => {
                                warn!(path = %changed.display(), error = %e, "Config scope reload failed");
                                ScopeReloadEvent::Error {
                                    path: changed,
                                    error: e.to_string(),
                                }
                            }
                        },
                        EventKind::Remove(_) => {
                            warn!(path = %changed.display(), "Config file removed");
                            ScopeReloadEvent::Removed(changed)
                        }
                        _ => {
                            debug!("Ignoring event: {:?}", event.kind);
                            continue;
                        }
                    };

                    if let Err(e) = tx_task.send(reload_event).await {
                        error!("Failed to send scope reload event: {}", e);
                        break;
                    }
                }
            }
        }
    });

    Ok((tx, rx))
}
