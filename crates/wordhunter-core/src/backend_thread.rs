//! 线程后端：进程内 Rayon 线程池，每个文件一个任务
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::aggregate::Backend;
use crate::error::{HuntError, Result};
use crate::options::{pool_size, Strategy};
use crate::worker::{run_worker, ScanContext, WorkerReport};

/// 共享内存的线程后端
#[derive(Debug, Clone, Default)]
pub struct ThreadBackend {
    /// 线程数：None 表示自动（等于 CPU 核数）
    pub workers: Option<usize>,
}

impl ThreadBackend {
    pub fn new(workers: Option<usize>) -> Self {
        Self { workers }
    }
}

impl Backend for ThreadBackend {
    fn strategy(&self) -> Strategy {
        Strategy::Thread
    }

    fn fan_out(&self, files: &[PathBuf], ctx: &ScanContext, tx: &Sender<WorkerReport>) -> Result<()> {
        let threads = pool_size(self.workers, files.len());
        let pool = build_pool(threads, "scan")?;
        debug!(threads, files = files.len(), "thread pool ready");

        // install 会阻塞到所有任务结束（等待全部完成）
        pool.install(|| {
            files
                .par_iter()
                .try_for_each(|path| run_worker(path, tx, |p| Ok(ctx.scan(p))))
        })
    }
}

/// 构建固定大小的 Rayon 线程池；失败视为无法启动 worker
pub(crate) fn build_pool(threads: usize, name: &'static str) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("wordhunter-{name}-{i}"))
        .build()
        .map_err(|e| pool_error(name, threads, e))
}

/// 保留 rayon 的原始错误作为 source
fn pool_error(name: &str, threads: usize, e: rayon::ThreadPoolBuildError) -> HuntError {
    HuntError::Spawn {
        target: format!("{name} pool ({threads} threads)"),
        source: io::Error::other(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_error_keeps_rayon_source() {
        // 全局池只能初始化一次，第二次必然失败
        let _ = rayon::ThreadPoolBuilder::new().build_global();
        let err = rayon::ThreadPoolBuilder::new().build_global().unwrap_err();

        match pool_error("scan", 2, err) {
            HuntError::Spawn { target, source } => {
                assert_eq!(target, "scan pool (2 threads)");
                assert!(source.get_ref().is_some_and(|e| e.is::<rayon::ThreadPoolBuildError>()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn build_pool_names_its_threads() {
        let pool = build_pool(2, "scan").unwrap();
        let name = pool.install(|| std::thread::current().name().map(str::to_string));
        assert_eq!(pool.current_num_threads(), 2);
        assert!(name.is_some_and(|n| n.starts_with("wordhunter-scan-")));
    }
}
