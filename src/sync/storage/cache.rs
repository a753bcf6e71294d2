//! 翻译缓存（缓存语言的影子记录）
//!
//! 缓存保存源字段的缓存语言值（部分或全部），另有三个独立标量：
//! `positivePrompt`、`negativePrompt` 以及 `customPromptEnglish`。
//! 缓存中缺失的字段表示“尚未翻译”，而不是“与源相同”。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sync::error::{helpers, SyncResult};
use crate::sync::model::{AnalysisRecord, FieldTarget, Section, SectionId};

// ============================================================================
// 核心类型
// ============================================================================

/// 翻译缓存
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationCache {
    /// 段落影子，序列化时平铺在顶层（`style`、`character` ...）
    #[serde(flatten)]
    sections: BTreeMap<SectionId, Section>,
    /// 正向提示词（派生值）的缓存语言形式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_prompt: Option<String>,
    /// 负向提示词的缓存语言形式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// 自定义提示词的英文形式；按内容命名，而非按缓存的主语言
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt_english: Option<String>,
}

// ============================================================================
// 实现
// ============================================================================

impl TranslationCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 从会话文件中的 JSON 解析
    ///
    /// 顶层只接受段落名和三个标量字段，其它键视为序列化错误。
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let cache: Self = serde_json::from_str(json)?;
        cache.validate_fields()?;
        Ok(cache)
    }

    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 获取段落影子
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(&id)
    }

    /// 写入段落影子
    ///
    /// `Prompts` 伪段落通过 `negative_prompt` 字段保存，不能作为映射段落写入。
    pub fn set_section(&mut self, id: SectionId, section: Section) -> SyncResult<()> {
        if id == SectionId::Prompts {
            return Err(helpers::schema_mismatch(id, "prompts 不是映射段落"));
        }
        self.sections.insert(id, section);
        Ok(())
    }

    pub fn remove_section(&mut self, id: SectionId) -> Option<Section> {
        self.sections.remove(&id)
    }

    /// 已缓存的段落标识
    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.keys().copied()
    }

    /// 读取目标的缓存值
    pub fn value_of(&self, target: &FieldTarget) -> Option<&str> {
        match target {
            FieldTarget::Field {
                section: SectionId::Prompts,
                ..
            } => self.negative_prompt.as_deref(),
            FieldTarget::Field { section, field } => self.sections.get(section)?.get(field),
            FieldTarget::CustomPrompt => self.custom_prompt_english.as_deref(),
        }
    }

    /// 写入目标的缓存值；段落不存在时新建（其余字段保持缺失）
    pub fn set_value(&mut self, target: &FieldTarget, value: String) {
        match target {
            FieldTarget::Field {
                section: SectionId::Prompts,
                ..
            } => self.negative_prompt = Some(value),
            FieldTarget::Field { section, field } => {
                self.sections.entry(*section).or_default().set(*field, value);
            }
            FieldTarget::CustomPrompt => self.custom_prompt_english = Some(value),
        }
    }

    /// 缓存中的每个字段都必须对应记录中存在的字段
    pub fn validate_against(&self, record: &AnalysisRecord) -> SyncResult<()> {
        for (id, section) in &self.sections {
            reject_prompts_map(*id)?;
            if !record.has_section(*id) {
                return Err(helpers::schema_mismatch(id, "缓存中存在记录没有的段落"));
            }
            section.validate_subset(*id)?;
        }

        Ok(())
    }

    /// 只校验字段名属于各自段落的模式
    ///
    /// 旧缓存可能仍带有记录切换变体前的段落，合并时会被丢弃，不视为错误。
    pub fn validate_fields(&self) -> SyncResult<()> {
        for (id, section) in &self.sections {
            reject_prompts_map(*id)?;
            section.validate_subset(*id)?;
        }

        Ok(())
    }

    /// 已缓存字段总数（不含独立标量）
    pub fn cached_field_count(&self) -> usize {
        self.sections.values().map(Section::len).sum()
    }
}

/// `prompts` 只能通过 `negative_prompt` 标量保存
fn reject_prompts_map(id: SectionId) -> SyncResult<()> {
    if id == SectionId::Prompts {
        return Err(helpers::schema_mismatch(id, "prompts 不是映射段落"));
    }
    Ok(())
}
