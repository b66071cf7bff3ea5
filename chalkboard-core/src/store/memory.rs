//! In-process event store, optionally snapshotted to a JSON file.

use std::path::{Path, PathBuf};

use chrono::Utc;
use chrono_tz::Tz;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::constants::EVENTS_TABLE;
use crate::error::{ChalkboardError, ChalkboardResult};
use crate::event::{Event, EventDraft};
use crate::notify::{Change, ChangeFeed, ChangeKind};
use crate::store::{EventStore, series_reaches};
use crate::window::Window;

/// Keeps rows in memory and announces every write on its [`ChangeFeed`].
///
/// When opened on a file, the full row set is rewritten there after each
/// write so offline runs survive restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<Event>>,
    feed: ChangeFeed,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(feed: ChangeFeed) -> Self {
        MemoryStore {
            feed,
            ..Self::default()
        }
    }

    /// Load rows from `path` if it exists; later writes are saved back to it.
    pub async fn open(path: &Path, feed: ChangeFeed) -> ChalkboardResult<Self> {
        let rows = match tokio::fs::read_to_string(path).await {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ChalkboardError::Serialization(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), count = rows.len(), "Opened event file");

        Ok(MemoryStore {
            rows: RwLock::new(rows),
            feed,
            snapshot: Some(path.to_path_buf()),
        })
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Load rows as they are, without notifications.
    pub async fn seed(&self, events: impl IntoIterator<Item = Event>) {
        self.rows.write().await.extend(events);
    }

    pub async fn get(&self, id: &str) -> Option<Event> {
        self.rows.read().await.iter().find(|e| e.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn save(&self, rows: &[Event]) -> ChalkboardResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(rows)
            .map_err(|e| ChalkboardError::Serialization(e.to_string()))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Save `next`, then make it the live row set. A failed save leaves
    /// `rows` untouched.
    async fn commit(&self, rows: &mut Vec<Event>, next: Vec<Event>) -> ChalkboardResult<()> {
        self.save(&next).await?;
        *rows = next;
        Ok(())
    }

    fn announce(&self, user_id: &str, kind: ChangeKind, record_id: &str) {
        self.feed.publish(Change {
            user_id: user_id.to_string(),
            table: EVENTS_TABLE.to_string(),
            kind,
            record_id: Some(record_id.to_string()),
        });
    }

    async fn select(&self, keep: impl Fn(&Event) -> bool) -> Vec<Event> {
        let mut rows: Vec<Event> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|e| keep(e))
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.start);
        rows
    }
}

impl EventStore for MemoryStore {
    async fn fetch_window(&self, user_id: &str, window: &Window) -> ChalkboardResult<Vec<Event>> {
        Ok(self
            .select(|e| e.user_id == user_id && window.contains(e.start))
            .await)
    }

    async fn fetch_series_before(
        &self,
        user_id: &str,
        window: &Window,
        tz: &Tz,
    ) -> ChalkboardResult<Vec<Event>> {
        Ok(self
            .select(|e| e.user_id == user_id && series_reaches(e, window, tz))
            .await)
    }

    async fn fetch_event(&self, id: &str) -> ChalkboardResult<Event> {
        self.get(id)
            .await
            .ok_or_else(|| ChalkboardError::EventNotFound(id.to_string()))
    }

    async fn insert(&self, draft: &EventDraft) -> ChalkboardResult<Event> {
        let event = Event::from_draft(Uuid::new_v4().to_string(), draft, Utc::now());
        {
            let mut rows = self.rows.write().await;
            let mut next = rows.clone();
            next.push(event.clone());
            self.commit(&mut rows, next).await?;
        }
        self.announce(&event.user_id, ChangeKind::Insert, &event.id);
        Ok(event)
    }

    async fn update(&self, id: &str, draft: &EventDraft) -> ChalkboardResult<Event> {
        let updated = {
            let mut rows = self.rows.write().await;
            let mut next = rows.clone();
            let row = next
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| ChalkboardError::EventNotFound(id.to_string()))?;
            row.apply(draft, Utc::now());
            let updated = row.clone();
            self.commit(&mut rows, next).await?;
            updated
        };
        self.announce(&updated.user_id, ChangeKind::Update, id);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> ChalkboardResult<()> {
        let removed = {
            let mut rows = self.rows.write().await;
            let mut next = rows.clone();
            let index = next
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| ChalkboardError::EventNotFound(id.to_string()))?;
            let removed = next.remove(index);
            self.commit(&mut rows, next).await?;
            removed
        };
        self.announce(&removed.user_id, ChangeKind::Delete, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone};

    use crate::event::Recurrence;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, 0, 0).unwrap()
    }

    fn draft(user: &str, title: &str, start: DateTime<Utc>) -> EventDraft {
        EventDraft::new(user, title, start, start + TimeDelta::hours(1))
    }

    #[tokio::test]
    async fn test_fetch_window_is_inclusive_ordered_and_per_user() {
        let store = MemoryStore::new();
        store.insert(&draft("alice", "late", at(20, 9))).await.unwrap();
        store.insert(&draft("alice", "edge-start", at(10, 0))).await.unwrap();
        store.insert(&draft("alice", "edge-end", at(15, 0))).await.unwrap();
        store.insert(&draft("alice", "early", at(9, 23))).await.unwrap();
        store.insert(&draft("bob", "other user", at(12, 9))).await.unwrap();
        store.insert(&draft("alice", "middle", at(12, 9))).await.unwrap();

        let window = Window::new(at(10, 0), at(15, 0)).unwrap();
        let rows = store.fetch_window("alice", &window).await.unwrap();

        let titles: Vec<_> = rows.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["edge-start", "middle", "edge-end"]);
    }

    #[tokio::test]
    async fn test_fetch_series_before_only_returns_reaching_series() {
        let store = MemoryStore::new();
        let mut weekly = draft("alice", "weekly", at(1, 9));
        weekly.recurrence = Some(Recurrence::Weekly);
        store.insert(&weekly).await.unwrap();
        store.insert(&draft("alice", "one-off", at(2, 9))).await.unwrap();

        let window = Window::new(at(20, 0), at(27, 0)).unwrap();
        let rows = store.fetch_series_before("alice", &window, &chrono_tz::UTC).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "weekly");
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let store = MemoryStore::new();
        let mut sub = store.feed().subscribe("alice", EVENTS_TABLE);

        let created = store.insert(&draft("alice", "demo", at(5, 9))).await.unwrap();
        let change = sub.next().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.record_id.as_deref(), Some(created.id.as_str()));

        let mut edit = draft("alice", "renamed", at(6, 9));
        edit.color = "#22c55e".to_string();
        let updated = store.update(&created.id, &edit).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(sub.next().await.unwrap().kind, ChangeKind::Update);

        store.delete(&created.id).await.unwrap();
        assert_eq!(sub.next().await.unwrap().kind, ChangeKind::Delete);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_file_snapshot_survives_reopen() {
        let path = std::env::temp_dir()
            .join(format!("chalkboard-{}", Uuid::new_v4()))
            .join("events.json");

        let store = MemoryStore::open(&path, ChangeFeed::new()).await.unwrap();
        assert!(store.is_empty().await);
        let kept = store.insert(&draft("alice", "kept", at(3, 9))).await.unwrap();
        let gone = store.insert(&draft("alice", "gone", at(4, 9))).await.unwrap();
        store.delete(&gone.id).await.unwrap();

        let reopened = MemoryStore::open(&path, ChangeFeed::new()).await.unwrap();
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.get(&kept.id).await.unwrap().title, "kept");

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn test_failed_save_leaves_rows_unchanged() {
        let dir = std::env::temp_dir().join(format!("chalkboard-{}", Uuid::new_v4()));
        let path = dir.join("events.json");
        let store = MemoryStore::open(&path, ChangeFeed::new()).await.unwrap();
        let kept = store.insert(&draft("alice", "kept", at(3, 9))).await.unwrap();

        // A regular file where the snapshot directory was makes every save fail.
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, "not a directory").unwrap();

        assert!(store.insert(&draft("alice", "lost", at(4, 9))).await.is_err());
        assert!(store.update(&kept.id, &draft("alice", "renamed", at(5, 9))).await.is_err());
        assert!(store.delete(&kept.id).await.is_err());

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&kept.id).await.unwrap(), kept);
        let window = Window::new(at(1, 0), at(31, 0)).unwrap();
        let titles: Vec<_> = store
            .fetch_window("alice", &window)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["kept"]);

        let _ = std::fs::remove_file(&dir);
    }

    #[tokio::test]
    async fn test_missing_rows_are_reported() {
        let store = MemoryStore::new();
        let edit = draft("alice", "ghost", at(5, 9));

        assert!(matches!(
            store.update("nope", &edit).await,
            Err(ChalkboardError::EventNotFound(_))
        ));
        assert!(matches!(
            store.fetch_event("nope").await,
            Err(ChalkboardError::EventNotFound(_))
        ));
        assert!(matches!(
            store.delete("nope").await,
            Err(ChalkboardError::EventNotFound(_))
        ));
    }
}
