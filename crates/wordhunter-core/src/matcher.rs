//! 关键字计数自动机（Aho-Corasick，一次扫描统计所有关键字）
//!
//! 计数口径：每个关键字独立统计“不重叠”出现次数，从左到右贪心，
//! 与逐个关键字做子串计数的结果一致（例如 "aa" 在 "aaaa" 中计 2 次）。
//! 不同关键字之间可以重叠（"error" 与 "err" 互不影响）。

use aho_corasick::{AhoCorasick, MatchKind};

use crate::error::{HuntError, Result};
use crate::keywords::KeywordSet;
use crate::options::CaseMode;

/// 关键字匹配器（线程安全，可跨线程共享）
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// 归一化后、去重的模式自动机
    ac: AhoCorasick,
    /// 关键字下标 -> 自动机模式下标（大小写归一化后可能多对一）
    keyword_to_pattern: Vec<usize>,
    case_mode: CaseMode,
}

impl KeywordMatcher {
    pub fn new(keywords: &KeywordSet) -> Result<Self> {
        let case_mode = keywords.case_mode();
        let mut patterns: Vec<String> = Vec::new();
        let mut keyword_to_pattern = Vec::with_capacity(keywords.len());
        for word in keywords.iter() {
            let norm = case_mode.normalize(word).into_owned();
            let id = match patterns.iter().position(|p| *p == norm) {
                Some(id) => id,
                None => {
                    patterns.push(norm);
                    patterns.len() - 1
                }
            };
            keyword_to_pattern.push(id);
        }

        // 重叠扫描要求 Standard 语义
        let ac = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| HuntError::Matcher(e.to_string()))?;

        Ok(Self { ac, keyword_to_pattern, case_mode })
    }

    /// 统计文本中每个关键字的出现次数（下标与关键字集合一致）
    pub fn count(&self, text: &str) -> Vec<u64> {
        let text = self.case_mode.normalize(text);
        let n = self.ac.patterns_len();
        let mut per_pattern = vec![0u64; n];
        // 每个模式上一次计数命中的结束位置，用于排除自身重叠
        let mut next_free = vec![0usize; n];

        // 重叠迭代按结束位置递增产出；同一模式长度固定，故起点也递增
        for m in self.ac.find_overlapping_iter(&*text) {
            let pid = m.pattern().as_usize();
            if m.start() >= next_free[pid] {
                per_pattern[pid] += 1;
                next_free[pid] = m.end();
            }
        }

        self.keyword_to_pattern.iter().map(|&pid| per_pattern[pid]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(words: &[&str], mode: CaseMode) -> KeywordMatcher {
        KeywordMatcher::new(&KeywordSet::new(words.iter().copied(), mode).unwrap()).unwrap()
    }

    #[test]
    fn counts_non_overlapping_per_keyword() {
        let m = matcher(&["aa", "a"], CaseMode::Sensitive);
        assert_eq!(m.count("aaaa"), vec![2, 4]);
        assert_eq!(m.count("aaa"), vec![1, 3]);
    }

    #[test]
    fn keywords_may_overlap_each_other() {
        let m = matcher(&["error", "err", "ror"], CaseMode::Sensitive);
        assert_eq!(m.count("error errors"), vec![2, 2, 2]);
    }

    #[test]
    fn sensitive_mode_respects_case() {
        let m = matcher(&["error", "Error"], CaseMode::Sensitive);
        assert_eq!(m.count("Error error ERROR"), vec![1, 1]);
    }

    #[test]
    fn insensitive_mode_folds_both_sides() {
        let m = matcher(&["Error", "error", "THREAD"], CaseMode::Insensitive);
        assert_eq!(m.count("ERROR error thread"), vec![2, 2, 1]);
    }

    #[test]
    fn missing_keyword_counts_zero() {
        let m = matcher(&["process"], CaseMode::Sensitive);
        assert_eq!(m.count(""), vec![0]);
        assert_eq!(m.count("nothing here"), vec![0]);
    }
}
