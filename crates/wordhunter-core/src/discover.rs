//! 输入文件枚举（单层目录 + 扩展名过滤）
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{HuntError, Result};

/// 列出 `dir` 下一层中扩展名为 `extension` 的文件
/// 顺序即遍历顺序，不做排序；结果正确性不依赖顺序
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            // 根目录本身不可读：整个运行无法进行
            Err(e) if e.depth() == 0 => return Err(HuntError::ReadDir { path: dir.to_path_buf(), source: e }),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|s| s.to_str()) == Some(extension) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
