//! 变更集合
//!
//! 一次比较的结果，立即被批次分发器消费，不做持久化。

use std::collections::BTreeSet;

use crate::sync::model::schema::SectionId;

/// 有序的变更段落集合
///
/// 自定义提示词的变化单独记录，不属于段落集合，因为它的翻译方向相反。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    sections: BTreeSet<SectionId>,
    custom_prompt_changed: bool,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由段落列表构建
    pub fn from_sections<I: IntoIterator<Item = SectionId>>(sections: I) -> Self {
        Self {
            sections: sections.into_iter().collect(),
            custom_prompt_changed: false,
        }
    }

    pub fn insert(&mut self, section: SectionId) -> bool {
        self.sections.insert(section)
    }

    pub fn contains(&self, section: SectionId) -> bool {
        self.sections.contains(&section)
    }

    /// 按规范顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// 没有段落变化（不考虑自定义提示词）
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// 段落和自定义提示词都没有变化
    pub fn is_noop(&self) -> bool {
        self.sections.is_empty() && !self.custom_prompt_changed
    }

    pub fn custom_prompt_changed(&self) -> bool {
        self.custom_prompt_changed
    }

    pub fn set_custom_prompt_changed(&mut self, changed: bool) {
        self.custom_prompt_changed = changed;
    }

    pub fn with_custom_prompt(mut self, changed: bool) -> Self {
        self.custom_prompt_changed = changed;
        self
    }

    /// 是否需要重新生成正向提示词
    pub fn affects_positive_prompt(&self) -> bool {
        self.sections.iter().any(|s| s.feeds_positive_prompt())
    }

    /// 段落名列表，用于日志
    pub fn names(&self) -> Vec<&'static str> {
        self.sections.iter().map(|s| s.as_str()).collect()
    }
}

impl FromIterator<SectionId> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = SectionId>>(iter: I) -> Self {
        Self::from_sections(iter)
    }
}
