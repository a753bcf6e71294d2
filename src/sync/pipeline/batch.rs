//! 批次分发模块
//!
//! 把所有变更段落中需要翻译的字段按方向收集到两个有序批次中：
//! 缓存语言 → 源语言、源语言 → 缓存语言。每轮同步每个方向最多一个批次，
//! API 往返次数与变更字段数量无关。

use crate::sync::error::{helpers, SyncResult};
use crate::sync::model::{AnalysisRecord, ChangeSet, FieldTarget, SectionId};
use crate::sync::pipeline::filters::LanguageClassifier;
use crate::sync::storage::TranslationCache;
use crate::sync::translator::Direction;

/// 批次中一个位置对应的目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTarget {
    /// 记录/缓存中的可编辑值
    Field(FieldTarget),
    /// 派生的正向提示词
    PositivePrompt,
}

/// 批次中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub target: SlotTarget,
    /// 发送给翻译能力的原文
    pub text: String,
}

impl FieldSlot {
    pub fn field(target: FieldTarget, text: impl Into<String>) -> Self {
        Self {
            target: SlotTarget::Field(target),
            text: text.into(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 单一方向的翻译批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationBatch {
    pub direction: Direction,
    pub slots: Vec<FieldSlot>,
}

impl TranslationBatch {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            slots: Vec::new(),
        }
    }

    pub fn push(&mut self, slot: FieldSlot) {
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 按批次顺序提取原文
    pub fn texts(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.text.clone()).collect()
    }

    pub fn total_chars(&self) -> usize {
        self.slots.iter().map(FieldSlot::char_count).sum()
    }

    /// 获取批次摘要
    pub fn summary(&self) -> String {
        format!(
            "Batch {}: {} items, {} chars",
            self.direction,
            self.len(),
            self.total_chars()
        )
    }
}

/// 一轮同步的分发计划
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    pub change_set: ChangeSet,
    /// 缓存语言 → 源语言
    pub to_source: TranslationBatch,
    /// 源语言 → 缓存语言
    pub to_cached: TranslationBatch,
    /// 无需翻译、原样写入缓存的值（空值、英文自定义提示词）
    pub verbatim: Vec<FieldSlot>,
}

impl DispatchPlan {
    fn new(change_set: ChangeSet) -> Self {
        Self {
            change_set,
            to_source: TranslationBatch::new(Direction::ToSource),
            to_cached: TranslationBatch::new(Direction::ToCached),
            verbatim: Vec::new(),
        }
    }

    /// 追加重新生成的正向提示词，作为源语言 → 缓存语言批次的最后一项
    pub fn queue_positive_prompt(&mut self, prompt: String, translate_empty: bool) {
        let slot = FieldSlot {
            target: SlotTarget::PositivePrompt,
            text: prompt,
        };

        if slot.text.trim().is_empty() && !translate_empty {
            self.verbatim.push(slot);
        } else {
            self.to_cached.push(slot);
        }
    }

    /// 需要发出的翻译调用数（0–2）
    pub fn call_count(&self) -> usize {
        usize::from(!self.to_source.is_empty()) + usize::from(!self.to_cached.is_empty())
    }
}

/// 批次分发器
pub struct BatchDispatcher<'a> {
    classifier: &'a dyn LanguageClassifier,
    translate_empty: bool,
}

impl<'a> BatchDispatcher<'a> {
    pub fn new(classifier: &'a dyn LanguageClassifier, translate_empty: bool) -> Self {
        Self {
            classifier,
            translate_empty,
        }
    }

    /// 生成分发计划
    ///
    /// 每个变更段落按模式顺序枚举字段：缓存语言的值进入 `to_source`，
    /// 其余进入 `to_cached`。整个段落都会重新翻译，而不仅是变化的字段。
    pub fn plan(
        &self,
        change_set: &ChangeSet,
        record: &AnalysisRecord,
        old_cache: Option<&TranslationCache>,
    ) -> SyncResult<DispatchPlan> {
        let mut plan = DispatchPlan::new(change_set.clone());

        for id in change_set.iter() {
            if !record.has_section(id) {
                tracing::debug!("跳过记录中不存在的段落: {}", id);
                continue;
            }
            self.collect_section(&mut plan, id, record)?;
        }

        self.collect_custom_prompt(&mut plan, record, old_cache);

        tracing::debug!(
            "分发计划: {} | {} | 原样 {} 项",
            plan.to_source.summary(),
            plan.to_cached.summary(),
            plan.verbatim.len()
        );

        Ok(plan)
    }

    fn collect_section(
        &self,
        plan: &mut DispatchPlan,
        id: SectionId,
        record: &AnalysisRecord,
    ) -> SyncResult<()> {
        for &field in id.fields() {
            let value = record
                .field_value(id, field)
                .ok_or_else(|| helpers::schema_mismatch(id, format!("缺少字段 {}", field)))?;

            let slot = FieldSlot::field(FieldTarget::Field { section: id, field }, value);

            if value.trim().is_empty() && !self.translate_empty {
                plan.verbatim.push(slot);
            } else if self.classifier.is_cached_language(value) {
                plan.to_source.push(slot);
            } else {
                plan.to_cached.push(slot);
            }
        }

        Ok(())
    }

    /// 自定义提示词：缓存中需要的是英文形式
    ///
    /// 仅在其变化或缓存缺失英文形式时处理；缓存语言的文本进入 `to_source`，
    /// 已经是源语言的文本原样保存。
    fn collect_custom_prompt(
        &self,
        plan: &mut DispatchPlan,
        record: &AnalysisRecord,
        old_cache: Option<&TranslationCache>,
    ) {
        let Some(text) = record.user_custom_prompt.as_deref() else {
            return;
        };

        let cached_missing = old_cache
            .map(|c| c.custom_prompt_english.is_none())
            .unwrap_or(true);
        if !plan.change_set.custom_prompt_changed() && !cached_missing {
            return;
        }

        let slot = FieldSlot::field(FieldTarget::CustomPrompt, text);
        if !text.trim().is_empty() && self.classifier.is_cached_language(text) {
            plan.to_source.push(slot);
        } else {
            plan.verbatim.push(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::pipeline::filters::HangulClassifier;

    fn filled_record() -> AnalysisRecord {
        let mut record = AnalysisRecord::empty();
        for id in [SectionId::Style, SectionId::Character, SectionId::Composition] {
            for &field in id.fields() {
                record
                    .set_value(
                        &FieldTarget::Field { section: id, field },
                        format!("{} value", field),
                    )
                    .unwrap();
            }
        }
        record.negative_prompt = "blurry".to_string();
        record
    }

    #[test]
    fn test_plan_uses_schema_order() {
        let classifier = HangulClassifier::default();
        let dispatcher = BatchDispatcher::new(&classifier, false);
        let record = filled_record();

        let plan = dispatcher
            .plan(&ChangeSet::from_sections([SectionId::Style]), &record, None)
            .unwrap();

        assert!(plan.to_source.is_empty());
        assert_eq!(
            plan.to_cached.texts(),
            vec![
                "art_style value",
                "technique value",
                "color_palette value",
                "lighting value",
                "mood value"
            ]
        );
        assert_eq!(plan.call_count(), 1);
    }

    #[test]
    fn test_hand_edited_field_goes_to_source() {
        let classifier = HangulClassifier::default();
        let dispatcher = BatchDispatcher::new(&classifier, false);
        let mut record = filled_record();
        record.style.set("mood", "슬픈");

        let plan = dispatcher
            .plan(&ChangeSet::from_sections([SectionId::Style]), &record, None)
            .unwrap();

        assert_eq!(plan.to_source.texts(), vec!["슬픈"]);
        assert_eq!(plan.to_cached.len(), 4);
    }

    #[test]
    fn test_empty_values_are_verbatim() {
        let classifier = HangulClassifier::default();
        let record = AnalysisRecord::empty();

        let plan = BatchDispatcher::new(&classifier, false)
            .plan(&ChangeSet::from_sections([SectionId::Composition]), &record, None)
            .unwrap();
        assert_eq!(plan.call_count(), 0);
        assert_eq!(plan.verbatim.len(), 4);

        let plan = BatchDispatcher::new(&classifier, true)
            .plan(&ChangeSet::from_sections([SectionId::Composition]), &record, None)
            .unwrap();
        assert_eq!(plan.to_cached.len(), 4);
    }

    #[test]
    fn test_custom_prompt_direction() {
        let classifier = HangulClassifier::default();
        let dispatcher = BatchDispatcher::new(&classifier, false);
        let mut record = filled_record();

        record.user_custom_prompt = Some("빨간 모자".to_string());
        let plan = dispatcher.plan(&ChangeSet::new(), &record, None).unwrap();
        assert_eq!(plan.to_source.slots[0].target, SlotTarget::Field(FieldTarget::CustomPrompt));

        record.user_custom_prompt = Some("a red hat".to_string());
        let plan = dispatcher.plan(&ChangeSet::new(), &record, None).unwrap();
        assert!(plan.to_source.is_empty());
        assert_eq!(plan.verbatim[0].text, "a red hat");
    }

    #[test]
    fn test_unchanged_custom_prompt_with_cache_is_skipped() {
        let classifier = HangulClassifier::default();
        let dispatcher = BatchDispatcher::new(&classifier, false);
        let mut record = filled_record();
        record.user_custom_prompt = Some("빨간 모자".to_string());

        let mut cache = TranslationCache::new();
        cache.custom_prompt_english = Some("a red hat".to_string());

        let plan = dispatcher.plan(&ChangeSet::new(), &record, Some(&cache)).unwrap();
        assert_eq!(plan.call_count(), 0);
        assert!(plan.verbatim.is_empty());
    }

    #[test]
    fn test_positive_prompt_is_last() {
        let classifier = HangulClassifier::default();
        let dispatcher = BatchDispatcher::new(&classifier, false);
        let record = filled_record();

        let mut plan = dispatcher
            .plan(&ChangeSet::from_sections([SectionId::Character]), &record, None)
            .unwrap();
        plan.queue_positive_prompt("anime, happy".to_string(), false);

        assert_eq!(plan.to_cached.len(), 12);
        assert_eq!(
            plan.to_cached.slots.last().map(|s| &s.target),
            Some(&SlotTarget::PositivePrompt)
        );
    }
}
