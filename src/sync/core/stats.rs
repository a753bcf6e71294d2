//! 同步统计信息
//!
//! 所有计数器使用原子操作，服务以共享引用更新，无需额外同步。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// 同步统计（线程安全版本）
#[derive(Debug, Default)]
pub struct SyncStats {
    /// 开始的同步轮次
    pub passes_started: AtomicUsize,
    /// 成功提交的同步轮次
    pub passes_committed: AtomicUsize,
    /// 因错误中止的同步轮次
    pub passes_aborted: AtomicUsize,
    /// 实际发出的翻译调用次数
    pub translate_calls: AtomicUsize,
    /// 发送给翻译能力的字符串数
    pub strings_sent: AtomicUsize,
    /// 从翻译能力收到的字符串数
    pub strings_received: AtomicUsize,
    /// 发送的字符总数
    pub chars_sent: AtomicUsize,
    /// 成功提交的字段编辑
    pub edits_committed: AtomicUsize,
    /// 失败的字段编辑提交
    pub edits_failed: AtomicUsize,
    /// 因互斥被拒绝的编辑请求
    pub conflicts_rejected: AtomicUsize,
    /// 翻译调用累计耗时（微秒）
    pub translate_time: AtomicU64,
}

impl SyncStats {
    pub fn inc_passes_started(&self) {
        self.passes_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_passes_committed(&self) {
        self.passes_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_passes_aborted(&self) {
        self.passes_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次翻译调用及其发送量
    pub fn record_call(&self, strings: usize, chars: usize) {
        self.translate_calls.fetch_add(1, Ordering::Relaxed);
        self.strings_sent.fetch_add(strings, Ordering::Relaxed);
        self.chars_sent.fetch_add(chars, Ordering::Relaxed);
    }

    pub fn add_strings_received(&self, count: usize) {
        self.strings_received.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_edits_committed(&self) {
        self.edits_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_edits_failed(&self) {
        self.edits_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_conflicts_rejected(&self) {
        self.conflicts_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// 累加翻译耗时，以微秒精度存储
    pub fn add_translate_time(&self, duration: Duration) {
        self.translate_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            passes_started: self.passes_started.load(Ordering::Relaxed),
            passes_committed: self.passes_committed.load(Ordering::Relaxed),
            passes_aborted: self.passes_aborted.load(Ordering::Relaxed),
            translate_calls: self.translate_calls.load(Ordering::Relaxed),
            strings_sent: self.strings_sent.load(Ordering::Relaxed),
            strings_received: self.strings_received.load(Ordering::Relaxed),
            chars_sent: self.chars_sent.load(Ordering::Relaxed),
            edits_committed: self.edits_committed.load(Ordering::Relaxed),
            edits_failed: self.edits_failed.load(Ordering::Relaxed),
            conflicts_rejected: self.conflicts_rejected.load(Ordering::Relaxed),
            translate_time: Duration::from_micros(self.translate_time.load(Ordering::Relaxed)),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        for counter in [
            &self.passes_started,
            &self.passes_committed,
            &self.passes_aborted,
            &self.translate_calls,
            &self.strings_sent,
            &self.strings_received,
            &self.chars_sent,
            &self.edits_committed,
            &self.edits_failed,
            &self.conflicts_rejected,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.translate_time.store(0, Ordering::Relaxed);
    }
}

/// 统计数据的不可变快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub passes_started: usize,
    pub passes_committed: usize,
    pub passes_aborted: usize,
    pub translate_calls: usize,
    pub strings_sent: usize,
    pub strings_received: usize,
    pub chars_sent: usize,
    pub edits_committed: usize,
    pub edits_failed: usize,
    pub conflicts_rejected: usize,
    pub translate_time: Duration,
}

impl StatsSnapshot {
    /// 平均每轮同步的翻译调用数
    pub fn calls_per_pass(&self) -> f64 {
        if self.passes_committed == 0 {
            0.0
        } else {
            self.translate_calls as f64 / self.passes_committed as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let stats = SyncStats::default();
        stats.inc_passes_started();
        stats.inc_passes_committed();
        stats.record_call(5, 40);
        stats.add_strings_received(5);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.translate_calls, 1);
        assert_eq!(snapshot.strings_sent, 5);
        assert_eq!(snapshot.calls_per_pass(), 1.0);

        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
