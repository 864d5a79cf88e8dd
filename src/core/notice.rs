//! Transient, dismissable notices
//!
//! Degraded states (fallback data, unavailable location) are reported to the
//! user through notices rather than errors. Each notice expires after its
//! time-to-live; the error banner is keyed so a later success can clear it.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// Stable keys for notices that later events replace or clear
pub mod keys {
    pub const DATA_ERROR: &str = "data-error";
    pub const LOCATION: &str = "location";
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub key: Option<&'static str>,
    pub title: String,
    pub description: Option<String>,
    pub severity: NoticeSeverity,
    pub created_at: Instant,
    /// `None` keeps the notice until dismissed or cleared by key
    pub ttl: Option<Duration>,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.ttl
            .map(|ttl| now.saturating_duration_since(self.created_at) > ttl)
            .unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    next_id: u64,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a notice, replacing any existing one with the same key
    pub fn push(
        &mut self,
        key: Option<&'static str>,
        title: impl Into<String>,
        description: Option<String>,
        severity: NoticeSeverity,
        ttl: Option<Duration>,
    ) -> u64 {
        if let Some(key) = key {
            self.clear_key(key);
        }

        self.next_id += 1;
        let notice = Notice {
            id: self.next_id,
            key,
            title: title.into(),
            description,
            severity,
            created_at: Instant::now(),
            ttl,
        };
        self.notices.push(notice);
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    pub fn clear_key(&mut self, key: &str) {
        self.notices.retain(|n| n.key != Some(key));
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.notices.iter().any(|n| n.key == Some(key))
    }

    /// Drops expired notices
    pub fn prune(&mut self, now: Instant) {
        self.notices.retain(|n| !n.is_expired(now));
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_notice_replaces_previous() {
        let mut board = NoticeBoard::new();
        board.push(Some(keys::DATA_ERROR), "first", None, NoticeSeverity::Error, None);
        board.push(Some(keys::DATA_ERROR), "second", None, NoticeSeverity::Error, None);

        assert_eq!(board.len(), 1);
        assert_eq!(board.active()[0].title, "second");
    }

    #[test]
    fn test_dismiss_and_clear() {
        let mut board = NoticeBoard::new();
        let id = board.push(None, "toast", None, NoticeSeverity::Info, None);
        board.push(Some(keys::DATA_ERROR), "banner", None, NoticeSeverity::Error, None);

        assert!(board.dismiss(id));
        assert!(!board.dismiss(id));
        assert!(board.has_key(keys::DATA_ERROR));

        board.clear_key(keys::DATA_ERROR);
        assert!(board.is_empty());
    }

    #[test]
    fn test_prune_drops_expired() {
        let mut board = NoticeBoard::new();
        board.push(None, "short", None, NoticeSeverity::Info, Some(Duration::from_millis(10)));
        board.push(None, "sticky", None, NoticeSeverity::Warning, None);

        board.prune(Instant::now() + Duration::from_secs(1));
        assert_eq!(board.len(), 1);
        assert_eq!(board.active()[0].title, "sticky");
    }
}
