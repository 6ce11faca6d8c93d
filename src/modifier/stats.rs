use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::error::FrameError;

// 每个元素一份，多线程同时 push 也只是 Relaxed 计数
#[derive(Debug, Default)]
pub struct ModifierStats {
    passed: AtomicU64,
    dropped: AtomicU64,
    malformed: AtomicU64,
    clone_failed: AtomicU64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub passed: u64,
    pub dropped: u64,
    pub malformed: u64,
    pub clone_failed: u64,
}

impl ModifierStats {
    pub fn record_pass(&self) {
        self.passed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self, err: &FrameError) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        if err.is_malformed() {
            self.malformed.fetch_add(1, Ordering::Relaxed);
        }
        if let FrameError::CloneFailed { len } = err {
            warn!(len, "copy-on-write clone failed");
            self.clone_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            passed: self.passed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            clone_failed: self.clone_failed.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// 两次快照之间的增量
    pub fn since(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            passed: self.passed.saturating_sub(earlier.passed),
            dropped: self.dropped.saturating_sub(earlier.dropped),
            malformed: self.malformed.saturating_sub(earlier.malformed),
            clone_failed: self.clone_failed.saturating_sub(earlier.clone_failed),
        }
    }
}
