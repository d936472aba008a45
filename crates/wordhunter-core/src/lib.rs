//! 关键字统计核心库
//!
//! 设计要点：
//! - 扇出：每个文件一个 worker 任务，由固定大小的池调度（线程池或子进程池）。
//! - 扇入：worker 只通过通道交出单文件结果；全部结束后由聚合器单线程合并。
//! - 文件级错误就地降级为全零结果并单独记录；运行级错误（无法启动 worker）向上传播。
//! - 两种后端对同一输入给出完全相同的聚合结果。

mod aggregate;
mod backend_process;
mod backend_thread;
mod config;
mod discover;
mod error;
mod keywords;
mod matcher;
mod options;
mod scanner;
mod types;
mod worker;

pub use aggregate::{Aggregator, Backend};
pub use backend_process::{serve_worker, ProcessBackend, WorkerCommand, WorkerRequest, WorkerResponse};
pub use backend_thread::ThreadBackend;
pub use config::{load_config, HuntConfig, DEFAULT_KEYWORDS};
pub use discover::list_files;
pub use error::{HuntError, Result};
pub use keywords::KeywordSet;
pub use matcher::KeywordMatcher;
pub use options::{CaseMode, Strategy};
pub use scanner::{scan, ScanOutcome};
pub use types::{AggregateResult, FileFailure, KeywordCount, KeywordTotal, ScanResult};
pub use worker::{ScanContext, WorkerReport};
