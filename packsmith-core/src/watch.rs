//! Watch controller
//!
//! Subscribes to filesystem events under the pack source root, coalesces
//! bursts of notifications into a single recompile through a debounce window,
//! and tears down cleanly on cancellation. Events arrive as discrete messages
//! on a single-consumer channel; the debounce stage is a small state machine
//! driven by those messages plus the cancellation signal.

use std::path::PathBuf;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cache::{BuildCache, ChangeKind};
use crate::compile::{compile_and_log, PackContext};
use crate::error::Result;
use crate::filter::PackFilter;

/// Quiet period after the last notification before a recompile fires.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// One filesystem notification for an included path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Map a notify event to pipeline change kinds.
///
/// Rename-style edits and editor save dances surface inconsistently across
/// platforms, so existence on disk decides between add and remove where the
/// reported kind is ambiguous.
fn map_event(event: &Event) -> Vec<WatchEvent> {
    event
        .paths
        .iter()
        .filter_map(|path| {
            let kind = match &event.kind {
                EventKind::Create(_) => path.exists().then_some(ChangeKind::Add),
                EventKind::Remove(_) => Some(ChangeKind::Remove),
                EventKind::Modify(modify) => match modify {
                    ModifyKind::Name(_) => Some(if path.exists() {
                        ChangeKind::Add
                    } else {
                        ChangeKind::Remove
                    }),
                    ModifyKind::Data(_) | ModifyKind::Any => Some(if path.exists() {
                        ChangeKind::Change
                    } else {
                        ChangeKind::Remove
                    }),
                    // Metadata-only changes never affect pack output.
                    _ => None,
                },
                _ => None,
            }?;
            Some(WatchEvent {
                kind,
                path: path.clone(),
            })
        })
        .collect()
}

/// Wait for the next debounced trigger.
///
/// Returns `true` when a quiet window has elapsed after at least one event.
/// Returns `false` on cancellation or channel close; a pending window is
/// abandoned in both cases, so no trailing recompile fires.
pub(crate) async fn next_trigger(
    rx: &mut mpsc::UnboundedReceiver<WatchEvent>,
    token: &CancellationToken,
    window: Duration,
) -> bool {
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = token.cancelled() => return false,
            event = rx.recv() => match event {
                Some(event) => {
                    tracing::debug!(
                        "Watch event: {:?} {}",
                        event.kind,
                        event.path.display()
                    );
                    // Each notification resets the window instead of queuing
                    // a second run.
                    deadline = Some(Instant::now() + window);
                }
                None => return false,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                if deadline.is_some() => return true,
        }
    }
}

/// Watch a pack's source tree and recompile on debounced changes.
///
/// Entered after the initial compile, whether or not it succeeded. Cycle
/// failures are logged and watching continues; only cancellation (or loss of
/// the subscription) ends the loop.
pub async fn watch_pack(ctx: &PackContext, mut cache: BuildCache) -> Result<BuildCache> {
    let name = ctx.pack.display_name().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<WatchEvent>();

    let filter: PackFilter = ctx.filter.clone();
    let event_name = name.clone();
    let mut watcher = RecommendedWatcher::new(
        move |result: std::result::Result<Event, notify::Error>| match result {
            Ok(event) => {
                for event in map_event(&event) {
                    // Noise from excluded trees never reaches the debounce.
                    if filter.is_included(&event.path) {
                        let _ = tx.send(event);
                    }
                }
            }
            Err(e) => tracing::error!("Error watching '{}': {}", event_name, e),
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(500)),
    )?;
    watcher.watch(&ctx.src_dir, RecursiveMode::Recursive)?;

    tracing::info!("Watching for file changes in '{}'...", name);

    while next_trigger(&mut rx, &ctx.token, DEBOUNCE_WINDOW).await {
        tracing::info!("File change(s) detected in '{}'. Recompiling...", name);
        cache = compile_and_log(ctx, cache).await;
    }

    // Releases the filesystem subscription.
    drop(watcher);
    tracing::info!("Stopped watching '{}'", name);

    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: ChangeKind) -> WatchEvent {
        WatchEvent {
            kind,
            path: PathBuf::from("/pack/src/a.json"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_events_coalesce_into_one_trigger() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        for _ in 0..5 {
            tx.send(event(ChangeKind::Change)).unwrap();
        }

        assert!(next_trigger(&mut rx, &token, DEBOUNCE_WINDOW).await);

        // All five notifications produced exactly one trigger; the next wait
        // pends until a new event arrives.
        let pending = tokio::time::timeout(
            Duration::from_secs(5),
            next_trigger(&mut rx, &token, DEBOUNCE_WINDOW),
        )
        .await;
        assert!(pending.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_event_resets_the_window() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        tx.send(event(ChangeKind::Add)).unwrap();

        let trigger = tokio::spawn({
            let token = token.clone();
            async move { next_trigger(&mut rx, &token, DEBOUNCE_WINDOW).await }
        });

        // Keep poking inside the window; the deadline must keep moving.
        for _ in 0..3 {
            tokio::time::sleep(DEBOUNCE_WINDOW / 2).await;
            tx.send(event(ChangeKind::Change)).unwrap();
        }
        assert!(trigger.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_abandons_pending_window() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        tx.send(event(ChangeKind::Change)).unwrap();
        token.cancel();

        // No trailing compile fires once cancelled.
        assert!(!next_trigger(&mut rx, &token, DEBOUNCE_WINDOW).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_close_ends_the_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel::<WatchEvent>();
        let token = CancellationToken::new();
        drop(tx);

        assert!(!next_trigger(&mut rx, &token, DEBOUNCE_WINDOW).await);
    }

    #[test]
    fn test_map_event_ignores_metadata_changes() {
        let event = Event::new(EventKind::Modify(ModifyKind::Metadata(
            notify::event::MetadataKind::Permissions,
        )))
        .add_path(PathBuf::from("/pack/src/a.json"));
        assert!(map_event(&event).is_empty());
    }

    #[test]
    fn test_map_event_remove() {
        let event = Event::new(EventKind::Remove(notify::event::RemoveKind::File))
            .add_path(PathBuf::from("/pack/src/gone.json"));
        let mapped = map_event(&event);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].kind, ChangeKind::Remove);
    }
}
