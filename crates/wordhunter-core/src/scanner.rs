//! 单文件扫描（UTF-8 整读 + 关键字计数）
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::warn;

use crate::keywords::KeywordSet;
use crate::matcher::KeywordMatcher;
use crate::types::{FileFailure, ScanResult};

/// 单文件扫描产出：结果总是存在；读取失败时额外附带失败原因
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub failure: Option<FileFailure>,
}

/// 扫描单个文件
/// - 读取失败（不存在、无权限、非 UTF-8）只记日志，返回全零结果，不向上传播
/// - 每个关键字都有一条计数，零次也保留
pub fn scan(path: &Path, keywords: &KeywordSet, matcher: &KeywordMatcher) -> ScanOutcome {
    match read_text(path) {
        Ok(text) => ScanOutcome {
            result: ScanResult::from_counts(path, keywords, matcher.count(&text)),
            failure: None,
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file");
            ScanOutcome {
                result: ScanResult::empty(path, keywords),
                failure: Some(FileFailure { path: path.to_path_buf(), reason: e.to_string() }),
            }
        }
    }
}

fn read_text(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    Ok(buf)
}
