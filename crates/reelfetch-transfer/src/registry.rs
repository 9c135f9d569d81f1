//! In-memory transfer table.
//!
//! Entries keep submission order. Callers hold the engine's mutex for every
//! access; nothing here awaits.

use reelfetch_core::naming::format_bytes;
use reelfetch_core::{TransferProgress, TransferSnapshot, TransferState};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub(crate) const STARTING_STATUS: &str = "Starting...";
pub(crate) const CANCELLED_STATUS: &str = "Cancelled";

pub(crate) struct TransferEntry {
    pub(crate) snapshot: TransferSnapshot,
    pub(crate) token: CancellationToken,
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<TransferEntry>,
}

impl Registry {
    /// Entries still holding a concurrency slot.
    pub(crate) fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.snapshot.state.is_terminal())
            .count()
    }

    /// Whether an in-flight transfer already writes `filename`.
    pub(crate) fn is_reserved(&self, filename: &str) -> bool {
        self.entries.iter().any(|entry| {
            !entry.snapshot.state.is_terminal() && entry.snapshot.filename == filename
        })
    }

    pub(crate) fn insert(&mut self, entry: TransferEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn get(&self, id: Uuid) -> Option<&TransferEntry> {
        self.entries.iter().find(|entry| entry.snapshot.id == id)
    }

    pub(crate) fn snapshots(&self) -> Vec<TransferSnapshot> {
        self.entries
            .iter()
            .map(|entry| entry.snapshot.clone())
            .collect()
    }

    /// Apply `update` to the entry for `id`; returns false when it is gone.
    pub(crate) fn update(&mut self, id: Uuid, update: impl FnOnce(&mut TransferSnapshot)) -> bool {
        match self.entries.iter_mut().find(|entry| entry.snapshot.id == id) {
            Some(entry) => {
                update(&mut entry.snapshot);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: Uuid) -> Option<TransferEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.snapshot.id == id)?;
        Some(self.entries.remove(index))
    }
}

/// Record progress and refresh the status line.
pub(crate) fn apply_progress(snapshot: &mut TransferSnapshot, progress: TransferProgress) {
    snapshot.state = TransferState::Downloading;
    snapshot.downloaded_bytes = progress.downloaded;
    snapshot.total_bytes = progress.total;
    snapshot.percentage = progress.percentage();
    snapshot.status_text = downloading_status(progress);
}

pub(crate) fn downloading_status(progress: TransferProgress) -> String {
    match progress.total {
        Some(total) if total > 0 => format!(
            "Downloading... {}% ({}/{})",
            progress.percentage(),
            format_bytes(progress.downloaded),
            format_bytes(total)
        ),
        _ => format!("Downloading... {}", format_bytes(progress.downloaded)),
    }
}

pub(crate) fn completed_status(bytes: u64) -> String {
    format!("Completed ({})", format_bytes(bytes))
}

pub(crate) fn failed_status(detail: &str) -> String {
    format!("Failed: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(name: &str, state: TransferState) -> TransferEntry {
        TransferEntry {
            snapshot: TransferSnapshot {
                id: Uuid::new_v4(),
                url: format!("https://cdn.test/{name}"),
                filename: name.to_string(),
                state,
                status_text: STARTING_STATUS.to_string(),
                percentage: 0,
                downloaded_bytes: 0,
                total_bytes: None,
                error: None,
                started_at: Utc::now(),
            },
            token: CancellationToken::new(),
        }
    }

    #[test]
    fn terminal_entries_free_slots_and_names() {
        let mut registry = Registry::default();
        registry.insert(entry("a.mp4", TransferState::Downloading));
        registry.insert(entry("b.mp4", TransferState::Failed));
        registry.insert(entry("c.mp4", TransferState::Starting));

        assert_eq!(registry.active_count(), 2);
        assert!(registry.is_reserved("a.mp4"));
        assert!(!registry.is_reserved("b.mp4"));
    }

    #[test]
    fn update_and_remove_target_one_entry() {
        let mut registry = Registry::default();
        let first = entry("a.mp4", TransferState::Starting);
        let id = first.snapshot.id;
        registry.insert(first);
        registry.insert(entry("b.mp4", TransferState::Starting));

        assert!(registry.update(id, |snapshot| {
            apply_progress(
                snapshot,
                TransferProgress {
                    downloaded: 512,
                    total: Some(1024),
                },
            );
        }));
        let updated = registry.get(id).map(|entry| entry.snapshot.clone());
        let updated = updated.expect("entry present");
        assert_eq!(updated.percentage, 50);
        assert_eq!(updated.status_text, "Downloading... 50% (512 B/1 KB)");

        assert!(registry.remove(id).is_some());
        assert!(!registry.update(id, |_| {}));
        assert_eq!(registry.snapshots().len(), 1);
    }

    #[test]
    fn status_lines_cover_unknown_totals() {
        let unknown = TransferProgress {
            downloaded: 1536,
            total: None,
        };
        assert_eq!(downloading_status(unknown), "Downloading... 1.5 KB");
        assert_eq!(completed_status(2048), "Completed (2 KB)");
        assert_eq!(failed_status("HTTP 404: Not Found"), "Failed: HTTP 404: Not Found");
    }
}
