//! 公共类型（对外暴露）：单文件结果与全局聚合结果
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::keywords::KeywordSet;

/// 单个关键字在单个文件中的计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

impl KeywordCount {
    pub fn matched(&self) -> bool {
        self.count > 0
    }
}

/// 单文件扫描结果：每个关键字恰好一条（零次也保留）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub path: PathBuf,
    pub counts: Vec<KeywordCount>,
}

impl ScanResult {
    /// 全零结果（读取失败的文件使用）
    pub fn empty(path: &Path, keywords: &KeywordSet) -> Self {
        Self::from_counts(path, keywords, std::iter::repeat(0))
    }

    pub(crate) fn from_counts<I>(path: &Path, keywords: &KeywordSet, counts: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let counts = keywords
            .iter()
            .zip(counts)
            .map(|(k, count)| KeywordCount { keyword: k.to_string(), count })
            .collect();
        Self { path: path.to_path_buf(), counts }
    }

    pub fn count(&self, keyword: &str) -> Option<u64> {
        self.counts.iter().find(|c| c.keyword == keyword).map(|c| c.count)
    }

    pub fn matched(&self, keyword: &str) -> bool {
        self.count(keyword).is_some_and(|c| c > 0)
    }

    /// 结果条目是否与关键字集合一一对应（子进程回传的结果需要校验）
    pub(crate) fn conforms_to(&self, keywords: &KeywordSet) -> bool {
        self.counts.len() == keywords.len()
            && self.counts.iter().zip(keywords.iter()).all(|(c, k)| c.keyword == k)
    }
}

/// 读取失败的文件（与“确实零命中”的文件区分开）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// 单个关键字的全局汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordTotal {
    pub keyword: String,
    /// 命中该关键字的文件（冻结时按路径排序）
    pub files: Vec<PathBuf>,
    /// 全部文件出现次数之和
    pub count: u64,
}

/// 全局聚合结果；只在所有 worker 结束后由合并步骤写入
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub keywords: Vec<KeywordTotal>,
    pub files_scanned: usize,
    pub failures: Vec<FileFailure>,
}

impl AggregateResult {
    /// 每个关键字都有条目：计数 0，文件列表为空
    pub(crate) fn empty(keywords: &KeywordSet) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| KeywordTotal { keyword: k.to_string(), files: Vec::new(), count: 0 })
                .collect(),
            files_scanned: 0,
            failures: Vec::new(),
        }
    }

    /// 合并单个文件的结果：追加命中文件并累加计数
    /// 加法与集合并满足交换律，到达顺序不影响最终结果
    pub(crate) fn merge(&mut self, partial: ScanResult) {
        self.files_scanned += 1;
        for (total, hit) in self.keywords.iter_mut().zip(partial.counts) {
            debug_assert_eq!(total.keyword, hit.keyword);
            if hit.count > 0 {
                total.files.push(partial.path.clone());
                total.count += hit.count;
            }
        }
    }

    pub(crate) fn record_failure(&mut self, failure: FileFailure) {
        self.failures.push(failure);
    }

    /// 冻结：排序并去重文件列表，使同一输入的多次运行可直接比较
    /// 输入里重复出现的路径只列一次，计数仍按出现次数累加
    pub(crate) fn freeze(mut self) -> Self {
        for total in &mut self.keywords {
            total.files.sort();
            total.files.dedup();
        }
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
        self
    }

    pub fn get(&self, keyword: &str) -> Option<&KeywordTotal> {
        self.keywords.iter().find(|t| t.keyword == keyword)
    }

    pub fn count(&self, keyword: &str) -> u64 {
        self.get(keyword).map_or(0, |t| t.count)
    }

    pub fn files(&self, keyword: &str) -> &[PathBuf] {
        self.get(keyword).map(|t| t.files.as_slice()).unwrap_or(&[])
    }
}
