//! Loaded Collections
//!
//! Transient local copies of the remote tables plus the notices raised by
//! failed requests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::model::{Reading, Site, Threshold};
use crate::store::StoreError;

/// Notices kept; older ones are dropped first
pub const MAX_NOTICES: usize = 20;

/// Local copy of the remote data
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub sites: Vec<Site>,
    pub readings: Vec<Reading>,
    pub thresholds: Vec<Threshold>,
    pub notices: VecDeque<Notice>,
    pub loaded: LoadedTables,
    /// Latest successful fetch, set once every table has loaded
    pub last_loaded: Option<DateTime<Utc>>,
}

/// Tables fetched successfully at least once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadedTables {
    pub sites: bool,
    pub readings: bool,
    pub thresholds: bool,
}

impl LoadedTables {
    pub fn all(&self) -> bool {
        self.sites && self.readings && self.thresholds
    }
}

impl DashboardData {
    pub fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Store unreachable or answered with something unusable
    Transport,
    /// Store answered with a non-success status
    Rejected,
}

/// A non-fatal failure shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub at: DateTime<Utc>,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn from_error(action: &str, error: &StoreError) -> Self {
        let kind = if error.is_rejection() {
            NoticeKind::Rejected
        } else {
            NoticeKind::Transport
        };

        Self {
            at: Utc::now(),
            kind,
            message: format!("{} failed: {}", action, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_kind_from_error() {
        let rejected = Notice::from_error(
            "Saving thresholds",
            &StoreError::Rejected {
                status: 422,
                message: "bad field".into(),
            },
        );
        assert_eq!(rejected.kind, NoticeKind::Rejected);
        assert!(rejected.message.starts_with("Saving thresholds failed"));

        let transport = Notice::from_error("Loading sites", &StoreError::Timeout);
        assert_eq!(transport.kind, NoticeKind::Transport);
    }

    #[test]
    fn test_notices_are_bounded() {
        let mut data = DashboardData::default();
        for i in 0..(MAX_NOTICES + 5) {
            data.push_notice(Notice {
                at: Utc::now(),
                kind: NoticeKind::Transport,
                message: format!("n{}", i),
            });
        }
        assert_eq!(data.notices.len(), MAX_NOTICES);
        assert_eq!(data.notices.front().unwrap().message, "n5");
    }
}
