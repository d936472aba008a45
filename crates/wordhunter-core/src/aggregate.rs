//! 聚合器：扇出到 worker 池，等待全部完成后集中合并（扇入）
//!
//! 并发约束：
//! - worker 只产出不可变的单文件结果，经通道交出，从不接触聚合结构。
//! - 聚合结构只在“全部 worker 结束”之后由本线程单写者合并，无需加锁。
//! - 一个 Aggregator 实例只服务一次运行（`run` 消耗 self）。

use crossbeam_channel as channel;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{HuntError, Result};
use crate::keywords::KeywordSet;
use crate::options::Strategy;
use crate::types::AggregateResult;
use crate::worker::{ScanContext, WorkerReport};

/// 并发后端：负责启动 worker 并阻塞到全部完成
pub trait Backend {
    fn strategy(&self) -> Strategy;

    /// 对每个文件恰好执行一个 worker；返回时所有 worker 必须已结束
    fn fan_out(&self, files: &[PathBuf], ctx: &ScanContext, tx: &channel::Sender<WorkerReport>) -> Result<()>;
}

/// 聚合器所处阶段（只前进，不回退）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Spawning,
    Running(usize),
    Merging,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Spawning => write!(f, "spawning"),
            Phase::Running(n) => write!(f, "running({n})"),
            Phase::Merging => write!(f, "merging"),
            Phase::Done => write!(f, "done"),
        }
    }
}

pub struct Aggregator<B: Backend> {
    ctx: Arc<ScanContext>,
    backend: B,
    phase: Phase,
}

impl<B: Backend> Aggregator<B> {
    pub fn new(keywords: KeywordSet, backend: B) -> Result<Self> {
        let ctx = Arc::new(ScanContext::new(keywords)?);
        Ok(Self::with_context(ctx, backend))
    }

    /// 复用已构建的上下文（同一关键字集合跑多种策略时避免重复构建自动机）
    pub fn with_context(ctx: Arc<ScanContext>, backend: B) -> Self {
        Self { ctx, backend, phase: Phase::Idle }
    }

    fn advance(&mut self, next: Phase) {
        debug!(strategy = self.backend.strategy().label(), from = %self.phase, to = %next, "aggregator phase");
        self.phase = next;
    }

    /// 执行一次完整运行并返回冻结后的聚合结果
    pub fn run(mut self, files: &[PathBuf]) -> Result<AggregateResult> {
        let strategy = self.backend.strategy();
        info!(strategy = strategy.label(), files = files.len(), "starting run");

        // 结果在 join 之后才消费，必须用无界通道，否则 worker 会阻塞在 send 上
        let (tx, rx) = channel::unbounded::<WorkerReport>();

        self.advance(Phase::Spawning);
        self.advance(Phase::Running(files.len()));
        self.backend.fan_out(files, &self.ctx, &tx)?;
        drop(tx);

        self.advance(Phase::Merging);
        let mut aggregate = AggregateResult::empty(&self.ctx.keywords);
        let mut received = 0usize;
        for report in rx.try_iter() {
            received += 1;
            if let Some(failure) = report.failure {
                aggregate.record_failure(failure);
            }
            aggregate.merge(report.result);
        }
        if received != files.len() {
            return Err(HuntError::MissingReports { expected: files.len(), received });
        }

        self.advance(Phase::Done);
        let aggregate = aggregate.freeze();
        info!(
            strategy = strategy.label(),
            files_scanned = aggregate.files_scanned,
            failures = aggregate.failures.len(),
            "run finished"
        );
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend_thread::ThreadBackend;
    use crate::options::CaseMode;
    use std::fs;

    /// 故意少投递一个结果的后端
    struct LossyBackend;

    impl Backend for LossyBackend {
        fn strategy(&self) -> Strategy {
            Strategy::Thread
        }

        fn fan_out(&self, files: &[PathBuf], ctx: &ScanContext, tx: &channel::Sender<WorkerReport>) -> Result<()> {
            for path in files.iter().skip(1) {
                let _ = tx.send(ctx.scan(path));
            }
            Ok(())
        }
    }

    fn keywords() -> KeywordSet {
        KeywordSet::new(["error", "thread", "process"], CaseMode::Insensitive).unwrap()
    }

    #[test]
    fn empty_file_list_yields_every_keyword_at_zero() {
        let agg = Aggregator::new(keywords(), ThreadBackend::new(Some(2))).unwrap();
        let result = agg.run(&[]).unwrap();
        assert_eq!(result.keywords.len(), 3);
        for total in &result.keywords {
            assert_eq!(total.count, 0);
            assert!(total.files.is_empty());
        }
        assert_eq!(result.files_scanned, 0);
    }

    #[test]
    fn lost_report_is_a_run_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "error").unwrap();
        fs::write(&b, "thread").unwrap();

        let agg = Aggregator::new(keywords(), LossyBackend).unwrap();
        let err = agg.run(&[a, b]).unwrap_err();
        assert!(matches!(err, HuntError::MissingReports { expected: 2, received: 1 }));
    }

    #[test]
    fn failed_file_is_listed_separately() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let gone = dir.path().join("gone.txt");
        fs::write(&a, "process").unwrap();

        let agg = Aggregator::new(keywords(), ThreadBackend::new(Some(2))).unwrap();
        let result = agg.run(&[a.clone(), gone.clone()]).unwrap();
        assert_eq!(result.count("process"), 1);
        assert_eq!(result.files("process"), [a]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, gone);
        assert_eq!(result.files_scanned, 2);
    }
}
