//! 缓存合并引擎
//!
//! 把本轮的翻译结果与旧缓存合并，得到新的 (记录, 缓存)。
//! 未变化的段落从旧缓存原样复制；变化的段落由本轮结果逐字段重建。
//! 输入从不被修改，失败时调用方手中的旧值依然有效。

use crate::sync::core::engine::TranslatedBatch;
use crate::sync::error::{helpers, SyncResult};
use crate::sync::model::{AnalysisRecord, ChangeSet, FieldTarget, SectionId};
use crate::sync::pipeline::batch::{FieldSlot, SlotTarget};
use crate::sync::storage::TranslationCache;
use crate::sync::translator::Direction;

/// 一轮同步（或一次编辑）的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub record: AnalysisRecord,
    pub cache: TranslationCache,
}

/// 一轮同步的全部翻译结果
#[derive(Debug, Clone)]
pub struct TranslationResults {
    pub change_set: ChangeSet,
    pub to_source: TranslatedBatch,
    pub to_cached: TranslatedBatch,
    /// 无需翻译、原样写入缓存的值
    pub verbatim: Vec<FieldSlot>,
}

/// 缓存合并引擎（无状态）
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine;

impl MergeEngine {
    pub fn new() -> Self {
        Self
    }

    /// 用缓存语言 → 源语言的结果修补记录
    ///
    /// 只有排入该方向的字段被替换；自定义提示词保持用户输入的原样。
    pub fn patch_record(
        &self,
        record: &AnalysisRecord,
        to_source: &TranslatedBatch,
    ) -> SyncResult<AnalysisRecord> {
        check_aligned(to_source)?;

        let mut patched = record.clone();
        for (slot, translated) in to_source.pairs() {
            match &slot.target {
                SlotTarget::Field(FieldTarget::CustomPrompt) => {}
                SlotTarget::Field(target) => patched.set_value(target, translated.to_string())?,
                SlotTarget::PositivePrompt => return Err(misplaced_positive_prompt()),
            }
        }

        Ok(patched)
    }

    /// 合并
    ///
    /// - 不在变更集合中的段落：从 `old_cache` 原样复制
    /// - 变更段落：排入缓存语言 → 源语言的字段，缓存保存用户写下的原文；
    ///   排入源语言 → 缓存语言的字段，缓存保存译文；原样值直接写入
    /// - 记录中已不存在的段落不会出现在新缓存中
    pub fn merge(
        &self,
        new_record: &AnalysisRecord,
        old_cache: Option<&TranslationCache>,
        results: &TranslationResults,
    ) -> SyncResult<SyncOutcome> {
        check_aligned(&results.to_cached)?;
        let record = self.patch_record(new_record, &results.to_source)?;
        let change_set = &results.change_set;

        let mut cache = TranslationCache::new();

        if let Some(old) = old_cache {
            for id in record.present_sections() {
                if id == SectionId::Prompts || change_set.contains(id) {
                    continue;
                }
                if let Some(section) = old.section(id) {
                    cache.set_section(id, section.clone())?;
                }
            }

            for id in old.section_ids().filter(|id| !record.has_section(*id)) {
                tracing::debug!("丢弃记录中已不存在的缓存段落: {}", id);
            }

            if !change_set.contains(SectionId::Prompts) {
                cache.negative_prompt = old.negative_prompt.clone();
            }
            if !change_set.affects_positive_prompt() {
                cache.positive_prompt = old.positive_prompt.clone();
            }
            if record.user_custom_prompt.is_some() {
                cache.custom_prompt_english = old.custom_prompt_english.clone();
            }
        }

        for (slot, translated) in results.to_source.pairs() {
            match &slot.target {
                SlotTarget::Field(FieldTarget::CustomPrompt) => {
                    cache.custom_prompt_english = Some(translated.to_string());
                }
                SlotTarget::Field(target) => cache.set_value(target, slot.text.clone()),
                SlotTarget::PositivePrompt => return Err(misplaced_positive_prompt()),
            }
        }

        for (slot, translated) in results.to_cached.pairs() {
            match &slot.target {
                SlotTarget::Field(FieldTarget::CustomPrompt) => {
                    return Err(helpers::validation_error(
                        "自定义提示词只能翻译为源语言",
                    ));
                }
                SlotTarget::Field(target) => cache.set_value(target, translated.to_string()),
                SlotTarget::PositivePrompt => cache.positive_prompt = Some(translated.to_string()),
            }
        }

        for slot in &results.verbatim {
            match &slot.target {
                SlotTarget::Field(target) => cache.set_value(target, slot.text.clone()),
                SlotTarget::PositivePrompt => cache.positive_prompt = Some(slot.text.clone()),
            }
        }

        cache.validate_against(&record)?;

        tracing::debug!(
            "合并完成: 变更段落 {:?}，缓存字段 {} 个",
            change_set.names(),
            cache.cached_field_count()
        );

        Ok(SyncOutcome { record, cache })
    }
}

fn check_aligned(batch: &TranslatedBatch) -> SyncResult<()> {
    if batch.slots.len() != batch.results.len() {
        return Err(helpers::translation_failure(
            batch.direction,
            format!(
                "批次项数量与翻译结果数量不匹配: {} vs {}",
                batch.slots.len(),
                batch.results.len()
            ),
        ));
    }
    Ok(())
}

fn misplaced_positive_prompt() -> crate::sync::error::SyncError {
    helpers::validation_error(format!(
        "正向提示词只能按 {} 方向翻译",
        Direction::ToCached
    ))
}
