//! 错误分类（运行级错误向上传播，文件级错误就地降级）
use std::path::PathBuf;
use thiserror::Error;

/// 运行级错误：出现任一项时，本次聚合结果不可信，直接返回给调用方
#[derive(Debug, Error)]
pub enum HuntError {
    /// 关键字集合为空
    #[error("keyword set is empty")]
    EmptyKeywords,

    /// 关键字为空字符串（空串在任何文本中都“命中”，没有意义）
    #[error("keyword #{index} is an empty string")]
    InvalidKeyword { index: usize },

    /// 配置文件读取或解析失败
    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// 关键字自动机构建失败
    #[error("cannot build keyword matcher: {0}")]
    Matcher(String),

    /// 无法枚举输入目录
    #[error("cannot list directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// 无法启动 worker（线程池或子进程）
    #[error("failed to spawn worker for {target}: {source}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// 汇总时发现有 worker 没有回报结果
    #[error("expected {expected} worker reports, received {received}")]
    MissingReports { expected: usize, received: usize },

    /// worker 子进程协议错误（仅在子进程一侧出现）
    #[error("worker protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, HuntError>;
