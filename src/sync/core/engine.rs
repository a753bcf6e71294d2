//! 翻译引擎
//!
//! 负责把一个批次交给翻译能力执行，并校验结果与批次逐项对应。
//!
//! ## 工作流程
//! 1. 批次为空时直接返回，不发出调用
//! 2. 按批次顺序提取原文，发出一次批量调用
//! 3. 校验返回数量与输入一致，否则整轮失败
//!
//! 引擎从不重试：每个方向每轮最多一次调用，重试由调用方决定。

use std::sync::Arc;
use std::time::Instant;

use crate::sync::core::stats::SyncStats;
use crate::sync::error::{helpers, SyncError, SyncResult};
use crate::sync::pipeline::batch::{FieldSlot, TranslationBatch};
use crate::sync::translator::{Direction, Translator};

/// 已翻译的批次：`slots` 与 `results` 逐项对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedBatch {
    pub direction: Direction,
    pub slots: Vec<FieldSlot>,
    pub results: Vec<String>,
}

impl TranslatedBatch {
    /// 没有发出调用的空结果
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            slots: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 逐项迭代 (位置, 译文)
    pub fn pairs(&self) -> impl Iterator<Item = (&FieldSlot, &str)> {
        self.slots
            .iter()
            .zip(self.results.iter().map(String::as_str))
    }
}

/// 翻译引擎
pub struct TranslationEngine {
    /// 翻译能力，使用 Arc 在服务与编辑协调器之间共享
    translator: Arc<dyn Translator>,
    stats: Arc<SyncStats>,
}

impl TranslationEngine {
    pub fn new(translator: Arc<dyn Translator>, stats: Arc<SyncStats>) -> Self {
        Self { translator, stats }
    }

    /// 执行一个批次
    ///
    /// # 错误
    /// - `TranslationCallFailure`: 翻译能力失败，或返回数量与输入不一致
    pub async fn execute(&self, batch: &TranslationBatch) -> SyncResult<TranslatedBatch> {
        if batch.is_empty() {
            return Ok(TranslatedBatch::empty(batch.direction));
        }

        let direction = batch.direction;
        let texts = batch.texts();
        tracing::debug!("执行翻译{}", batch.summary());

        let results = self.translate_texts(&texts, direction).await?;

        Ok(TranslatedBatch {
            direction,
            slots: batch.slots.clone(),
            results,
        })
    }

    /// 翻译单个字符串（编辑协调器使用）
    pub async fn translate_one(&self, text: &str, direction: Direction) -> SyncResult<String> {
        let texts = [text.to_string()];
        let mut results = self.translate_texts(&texts, direction).await?;

        results
            .pop()
            .ok_or_else(|| helpers::translation_failure(direction, "翻译结果为空"))
    }

    async fn translate_texts(&self, texts: &[String], direction: Direction) -> SyncResult<Vec<String>> {
        let start_time = Instant::now();
        let chars: usize = texts.iter().map(|t| t.chars().count()).sum();
        self.stats.record_call(texts.len(), chars);

        let outcome = self.translator.translate_batch(texts, direction).await;
        self.stats.add_translate_time(start_time.elapsed());

        let results = outcome.map_err(|e| match e {
            SyncError::TranslationCallFailure { .. } => e,
            other => helpers::translation_failure(direction, other),
        })?;
        self.stats.add_strings_received(results.len());

        // 数量不一致时无法确定对应关系，整轮失败
        if results.len() != texts.len() {
            return Err(helpers::translation_failure(
                direction,
                format!(
                    "文本项数量与翻译结果数量不匹配: {} vs {}",
                    texts.len(),
                    results.len()
                ),
            ));
        }

        tracing::trace!(
            "翻译调用完成 ({}): {} 项，耗时 {:?}",
            direction,
            results.len(),
            start_time.elapsed()
        );

        Ok(results)
    }

    pub fn stats(&self) -> &Arc<SyncStats> {
        &self.stats
    }
}
