//! 正向提示词构建
//!
//! 正向提示词是由 `style`、`character`、`composition` 中特定字段拼接出的派生值，
//! 不是存储字段。构建规则属于外部协作者，这里提供默认实现。

use std::sync::OnceLock;

use regex::Regex;

use crate::sync::config::{constants, SyncConfig};
use crate::sync::model::{AnalysisRecord, SectionId};

/// 正向提示词构建器
pub trait PromptBuilder: Send + Sync {
    /// 由（源语言）记录构建正向提示词，必须是确定性的
    fn build_positive(&self, record: &AnalysisRecord) -> String;
}

/// 参与拼接的字段，按拼接顺序
pub const POSITIVE_PROMPT_FIELDS: &[(SectionId, &str)] = &[
    (SectionId::Style, "art_style"),
    (SectionId::Style, "technique"),
    (SectionId::Style, "color_palette"),
    (SectionId::Style, "lighting"),
    (SectionId::Style, "mood"),
    (SectionId::Character, "gender"),
    (SectionId::Character, "age_group"),
    (SectionId::Character, "hair_style"),
    (SectionId::Character, "hair_color"),
    (SectionId::Character, "eye_color"),
    (SectionId::Character, "outfit"),
    (SectionId::Character, "accessories"),
    (SectionId::Character, "pose"),
    (SectionId::Character, "expression"),
    (SectionId::Composition, "camera_angle"),
    (SectionId::Composition, "framing"),
    (SectionId::Composition, "background"),
];

/// 默认构建器：按固定字段顺序用分隔符拼接非空值
#[derive(Debug, Clone)]
pub struct DefaultPromptBuilder {
    separator: String,
}

struct RegexCache {
    whitespace: Option<Regex>,
    repeated_commas: Option<Regex>,
}

fn regex_cache() -> &'static RegexCache {
    static CACHE: OnceLock<RegexCache> = OnceLock::new();
    CACHE.get_or_init(|| RegexCache {
        whitespace: Regex::new(r"\s+").ok(),
        repeated_commas: Regex::new(r"\s*,(?:\s*,)+\s*").ok(),
    })
}

impl DefaultPromptBuilder {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.positive_prompt_separator.clone())
    }

    /// 折叠空白与重复逗号
    fn normalize(text: &str) -> String {
        let cache = regex_cache();

        let collapsed = match &cache.whitespace {
            Some(re) => re.replace_all(text.trim(), " ").into_owned(),
            None => text.split_whitespace().collect::<Vec<_>>().join(" "),
        };

        match &cache.repeated_commas {
            Some(re) => re.replace_all(&collapsed, ", ").into_owned(),
            None => collapsed,
        }
    }
}

impl Default for DefaultPromptBuilder {
    fn default() -> Self {
        Self::new(constants::DEFAULT_PROMPT_SEPARATOR)
    }
}

impl PromptBuilder for DefaultPromptBuilder {
    fn build_positive(&self, record: &AnalysisRecord) -> String {
        let parts: Vec<String> = POSITIVE_PROMPT_FIELDS
            .iter()
            .filter_map(|(section, field)| record.field_value(*section, field))
            .map(Self::normalize)
            .filter(|value| !value.is_empty())
            .collect();

        parts.join(&self.separator)
    }
}
