//! 分析记录（源语言表示）
//!
//! 记录由若干命名段落组成，每个段落是字段名到文本的扁平映射。
//! 变体专属段落用带标签的枚举表达，而不是可选字段。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sync::error::{helpers, SyncResult};
use crate::sync::model::schema::SectionId;

/// 扁平段落：字段名 → 文本
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(BTreeMap<String, String>);

impl Section {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 按模式创建所有字段为空字符串的段落
    pub fn empty_for(id: SectionId) -> Self {
        id.fields()
            .iter()
            .map(|f| (f.to_string(), String::new()))
            .collect()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// 按字段名排序迭代
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> + ExactSizeIterator {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 字段集合必须与模式完全一致
    pub fn validate_schema(&self, id: SectionId) -> SyncResult<()> {
        let schema = id.fields();

        if let Some(missing) = schema.iter().find(|f| !self.contains(f)) {
            return Err(helpers::schema_mismatch(id, format!("缺少字段 {}", missing)));
        }
        self.validate_subset(id)?;

        Ok(())
    }

    /// 字段集合必须是模式的子集（缓存段落允许缺项）
    pub fn validate_subset(&self, id: SectionId) -> SyncResult<()> {
        match self.0.keys().find(|k| id.field(k).is_none()) {
            Some(extra) => Err(helpers::schema_mismatch(id, format!("未知字段 {}", extra))),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// 记录变体
///
/// 不同类型的分析携带不同的专属段落。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "section", rename_all = "snake_case")]
pub enum RecordVariant {
    #[default]
    Standard,
    Ui(Section),
    Logo(Section),
    PixelArt(Section),
}

impl RecordVariant {
    /// 专属段落的标识
    pub fn section_id(&self) -> Option<SectionId> {
        match self {
            RecordVariant::Standard => None,
            RecordVariant::Ui(_) => Some(SectionId::UiSpecific),
            RecordVariant::Logo(_) => Some(SectionId::LogoSpecific),
            RecordVariant::PixelArt(_) => Some(SectionId::PixelartSpecific),
        }
    }

    pub fn section(&self) -> Option<&Section> {
        match self {
            RecordVariant::Standard => None,
            RecordVariant::Ui(s) | RecordVariant::Logo(s) | RecordVariant::PixelArt(s) => Some(s),
        }
    }

    fn section_mut(&mut self) -> Option<&mut Section> {
        match self {
            RecordVariant::Standard => None,
            RecordVariant::Ui(s) | RecordVariant::Logo(s) | RecordVariant::PixelArt(s) => Some(s),
        }
    }
}

/// 可编辑值的地址
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldTarget {
    /// 段落字段；`Prompts` 段落下的 `negative_prompt` 即负向提示词
    Field {
        section: SectionId,
        field: &'static str,
    },
    /// 用户自定义提示词（翻译方向相反）
    CustomPrompt,
}

impl FieldTarget {
    /// 校验字段是否属于段落模式
    pub fn new(section: SectionId, field: &str) -> SyncResult<Self> {
        let field = section.field(field).ok_or_else(|| {
            helpers::validation_error(format!("段落 {} 中没有字段 {}", section, field))
        })?;

        Ok(FieldTarget::Field { section, field })
    }

    pub fn negative_prompt() -> Self {
        FieldTarget::Field {
            section: SectionId::Prompts,
            field: "negative_prompt",
        }
    }

    pub fn section(&self) -> Option<SectionId> {
        match self {
            FieldTarget::Field { section, .. } => Some(*section),
            FieldTarget::CustomPrompt => None,
        }
    }
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTarget::Field { section, field } => write!(f, "{}.{}", section, field),
            FieldTarget::CustomPrompt => f.write_str("user_custom_prompt"),
        }
    }
}

/// 分析记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub style: Section,
    pub character: Section,
    pub composition: Section,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_custom_prompt: Option<String>,
    #[serde(default)]
    pub variant: RecordVariant,
}

impl AnalysisRecord {
    /// 创建所有字段为空的标准记录
    pub fn empty() -> Self {
        Self {
            style: Section::empty_for(SectionId::Style),
            character: Section::empty_for(SectionId::Character),
            composition: Section::empty_for(SectionId::Composition),
            negative_prompt: String::new(),
            user_custom_prompt: None,
            variant: RecordVariant::Standard,
        }
    }

    /// 获取映射段落；`Prompts` 不是映射段落，返回 `None`
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        match id {
            SectionId::Style => Some(&self.style),
            SectionId::Character => Some(&self.character),
            SectionId::Composition => Some(&self.composition),
            SectionId::Prompts => None,
            _ if self.variant.section_id() == Some(id) => self.variant.section(),
            _ => None,
        }
    }

    fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        match id {
            SectionId::Style => Some(&mut self.style),
            SectionId::Character => Some(&mut self.character),
            SectionId::Composition => Some(&mut self.composition),
            SectionId::Prompts => None,
            _ if self.variant.section_id() == Some(id) => self.variant.section_mut(),
            _ => None,
        }
    }

    /// 记录中结构上存在的段落（含 `Prompts`）
    pub fn present_sections(&self) -> Vec<SectionId> {
        SectionId::ALL
            .iter()
            .copied()
            .filter(|id| self.has_section(*id))
            .collect()
    }

    pub fn has_section(&self, id: SectionId) -> bool {
        id == SectionId::Prompts || self.section(id).is_some()
    }

    /// 读取字段值
    pub fn field_value(&self, section: SectionId, field: &str) -> Option<&str> {
        match section {
            SectionId::Prompts if field == "negative_prompt" => Some(&self.negative_prompt),
            SectionId::Prompts => None,
            _ => self.section(section)?.get(field),
        }
    }

    /// 读取目标值
    pub fn value_of(&self, target: &FieldTarget) -> Option<&str> {
        match target {
            FieldTarget::Field { section, field } => self.field_value(*section, field),
            FieldTarget::CustomPrompt => self.user_custom_prompt.as_deref(),
        }
    }

    /// 写入目标值
    pub fn set_value(&mut self, target: &FieldTarget, value: String) -> SyncResult<()> {
        match target {
            FieldTarget::Field {
                section: SectionId::Prompts,
                ..
            } => self.negative_prompt = value,
            FieldTarget::Field { section, field } => {
                let section_map = self.section_mut(*section).ok_or_else(|| {
                    helpers::schema_mismatch(section, "记录中不存在该段落")
                })?;
                section_map.set(*field, value);
            }
            FieldTarget::CustomPrompt => self.user_custom_prompt = Some(value),
        }

        Ok(())
    }

    /// 校验所有存在段落的字段集合
    pub fn validate_schema(&self) -> SyncResult<()> {
        for id in self.present_sections() {
            if let Some(section) = self.section(id) {
                section.validate_schema(id)?;
            }
        }

        Ok(())
    }
}
