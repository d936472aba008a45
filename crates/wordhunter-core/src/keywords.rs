//! 关键字集合（整个运行期间只读）
use crate::error::{HuntError, Result};
use crate::options::CaseMode;

/// 待搜索的关键字集合
/// - 保持配置中的先后顺序（输出按此顺序）
/// - 重复项只保留第一次出现
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    words: Vec<String>,
    case_mode: CaseMode,
}

impl KeywordSet {
    pub fn new<I, S>(words: I, case_mode: CaseMode) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for (index, w) in words.into_iter().enumerate() {
            let w = w.into();
            if w.is_empty() {
                return Err(HuntError::InvalidKeyword { index });
            }
            if !out.contains(&w) {
                out.push(w);
            }
        }
        if out.is_empty() {
            return Err(HuntError::EmptyKeywords);
        }
        Ok(Self { words: out, case_mode })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn case_mode(&self) -> CaseMode {
        self.case_mode
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}
