//! worker：一个文件一次扫描，结果经通道交给聚合器
use crossbeam_channel::Sender;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::keywords::KeywordSet;
use crate::matcher::KeywordMatcher;
use crate::scanner::{scan, ScanOutcome};

/// worker 之间共享的只读上下文
#[derive(Debug)]
pub struct ScanContext {
    pub keywords: KeywordSet,
    pub matcher: KeywordMatcher,
}

impl ScanContext {
    pub fn new(keywords: KeywordSet) -> Result<Self> {
        let matcher = KeywordMatcher::new(&keywords)?;
        Ok(Self { keywords, matcher })
    }

    pub fn scan(&self, path: &Path) -> ScanOutcome {
        scan(path, &self.keywords, &self.matcher)
    }
}

/// worker 交给聚合器的消息
pub type WorkerReport = ScanOutcome;

/// 执行单个文件的任务并投递结果
/// - 成功或降级都恰好投递一次；只有运行级错误（如无法启动子进程）不投递，直接上抛
/// - worker 自己从不写聚合结构
pub(crate) fn run_worker<F>(path: &Path, tx: &Sender<WorkerReport>, job: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<WorkerReport>,
{
    let report = job(path)?;
    if tx.send(report).is_err() {
        // Receiver 已释放，说明聚合器已放弃本次运行
        debug!(path = %path.display(), "aggregator gone, dropping report");
    }
    Ok(())
}
