//! 匹配模式与运行选项（模块）
use serde::{Deserialize, Serialize};

/// 大小写匹配模式
/// - Sensitive：原样按子串计数。
/// - Insensitive：内容与关键字统一转小写后再计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMode {
    #[default]
    Sensitive,
    Insensitive,
}

impl CaseMode {
    /// 按当前模式归一化文本（敏感模式下不复制）
    pub(crate) fn normalize<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            CaseMode::Sensitive => std::borrow::Cow::Borrowed(text),
            CaseMode::Insensitive => std::borrow::Cow::Owned(text.to_lowercase()),
        }
    }
}

/// 执行策略：进程内线程池或多进程
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Thread,
    Process,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Thread => "threading",
            Strategy::Process => "multiprocessing",
        }
    }
}

/// worker 池大小：None 表示自动（等于 CPU 核数），且不超过文件数
pub(crate) fn pool_size(workers: Option<usize>, files: usize) -> usize {
    let wanted = workers.unwrap_or_else(num_cpus::get).max(1);
    wanted.min(files.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_is_capped_by_file_count() {
        assert_eq!(pool_size(Some(8), 3), 3);
        assert_eq!(pool_size(Some(2), 10), 2);
        assert_eq!(pool_size(Some(0), 10), 1);
        assert_eq!(pool_size(Some(4), 0), 1);
        assert!(pool_size(None, 1000) >= 1);
    }

    #[test]
    fn insensitive_lowercases_unicode() {
        assert_eq!(CaseMode::Insensitive.normalize("ÉRROR Thread"), "érror thread");
        assert_eq!(CaseMode::Sensitive.normalize("Error"), "Error");
    }
}
