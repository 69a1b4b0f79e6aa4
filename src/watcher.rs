//! Config file watcher for `taskcard --watch`.
//! Watches the config's directory (editors often replace files rather than write in place)
//! and calls back once per burst of changes to the config file.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use log::{debug, info, warn};
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::error::RenderError;

/// Quiet period that closes a burst of events.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Block the calling thread, calling `on_change` after each edit of `config_path`.
/// Returns when the underlying watcher disconnects or `on_change` returns `false`.
pub fn watch_config<F>(config_path: &Path, mut on_change: F) -> Result<(), RenderError>
where
    F: FnMut() -> bool,
{
    let target = config_path
        .canonicalize()
        .map_err(|e| RenderError::io(config_path, e))?;
    let dir = target.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
        Ok(event) => {
            let _ = tx.send(event);
        }
        Err(e) => warn!("Watch error: {e}"),
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!("Watching {} for changes", target.display());

    loop {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => return Err(RenderError::Watch(notify::Error::generic("watcher disconnected"))),
        };
        if !is_relevant(&event, &target) {
            continue;
        }
        // Swallow the rest of the burst
        loop {
            match rx.recv_timeout(DEBOUNCE) {
                Ok(event) => debug!("Coalesced {:?}", event.kind),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RenderError::Watch(notify::Error::generic("watcher disconnected")));
                }
            }
        }
        info!("{} changed", target.display());
        if !on_change() {
            return Ok(());
        }
    }
}

/// A create or modify event that touches `target`.
fn is_relevant(event: &Event, target: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p == target || p.file_name() == target.file_name())
}
