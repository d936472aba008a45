//! 配置文件加载（TOML）
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{HuntError, Result};
use crate::keywords::KeywordSet;
use crate::options::CaseMode;

/// 默认关键字
pub const DEFAULT_KEYWORDS: [&str; 4] = ["Python", "error", "thread", "process"];

/// 运行配置；文件中缺省的字段取默认值，命令行参数可再覆盖
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HuntConfig {
    /// 待扫描目录
    pub folder: PathBuf,
    /// 文件扩展名（不含点）
    pub extension: String,
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
    /// worker 池大小；缺省为 CPU 核数
    pub workers: Option<usize>,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("text_files"),
            extension: "txt".to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            case_sensitive: true,
            workers: None,
        }
    }
}

impl HuntConfig {
    pub fn case_mode(&self) -> CaseMode {
        if self.case_sensitive { CaseMode::Sensitive } else { CaseMode::Insensitive }
    }

    pub fn keyword_set(&self) -> Result<KeywordSet> {
        KeywordSet::new(self.keywords.iter().cloned(), self.case_mode())
    }
}

/// 从 TOML 文件加载配置
pub fn load_config(path: &Path) -> Result<HuntConfig> {
    let txt = std::fs::read_to_string(path)
        .map_err(|e| HuntError::Config { path: path.to_path_buf(), reason: e.to_string() })?;
    parse_config(path, &txt)
}

fn parse_config(path: &Path, txt: &str) -> Result<HuntConfig> {
    toml::from_str(txt).map_err(|e| HuntError::Config { path: path.to_path_buf(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = parse_config(Path::new("t.toml"), "keywords = [\"alpha\"]\ncase_sensitive = false\n").unwrap();
        assert_eq!(cfg.keywords, vec!["alpha".to_string()]);
        assert_eq!(cfg.case_mode(), CaseMode::Insensitive);
        assert_eq!(cfg.folder, PathBuf::from("text_files"));
        assert_eq!(cfg.extension, "txt");
        assert_eq!(cfg.workers, None);
    }

    #[test]
    fn empty_file_is_the_default_config() {
        assert_eq!(parse_config(Path::new("t.toml"), "").unwrap(), HuntConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config(Path::new("t.toml"), "keyword = [\"typo\"]").unwrap_err();
        assert!(matches!(err, HuntError::Config { .. }));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("wordhunter.toml");
        std::fs::write(&p, "folder = \"/data\"\nworkers = 3\n").unwrap();
        let cfg = load_config(&p).unwrap();
        assert_eq!(cfg.folder, PathBuf::from("/data"));
        assert_eq!(cfg.workers, Some(3));
        assert_eq!(cfg.keyword_set().unwrap().len(), 4);

        let missing = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, HuntError::Config { .. }));
    }
}
