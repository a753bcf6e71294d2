//! 同步服务
//!
//! 对外的统一入口，协调变更检测、批次分发、翻译执行、合并和字段编辑。
//!
//! ## 一轮同步的顺序
//! 1. 校验记录模式
//! 2. 生成分发计划
//! 3. 执行缓存语言 → 源语言批次，修补记录
//! 4. 由修补后的记录重新生成正向提示词，追加到源语言 → 缓存语言批次
//! 5. 执行源语言 → 缓存语言批次
//! 6. 合并得到新的 (记录, 缓存)
//!
//! 两个方向依次执行，不并发：正向提示词依赖第一个方向的结果。

use std::sync::Arc;

use crate::sync::config::SyncConfig;
use crate::sync::core::editor::{EditContext, FieldEditCoordinator, FieldState};
use crate::sync::core::engine::TranslationEngine;
use crate::sync::core::merge::{MergeEngine, SyncOutcome, TranslationResults};
use crate::sync::core::stats::{StatsSnapshot, SyncStats};
use crate::sync::error::{helpers, SyncResult};
use crate::sync::model::{AnalysisRecord, ChangeSet, FieldTarget, SectionId};
use crate::sync::pipeline::batch::BatchDispatcher;
use crate::sync::pipeline::detector::ChangeDetector;
use crate::sync::pipeline::filters::{HangulClassifier, LanguageClassifier};
use crate::sync::pipeline::prompt::{DefaultPromptBuilder, PromptBuilder};
use crate::sync::storage::TranslationCache;
use crate::sync::translator::Translator;

/// 同步服务
pub struct SyncService {
    engine: TranslationEngine,
    classifier: Arc<dyn LanguageClassifier>,
    prompt_builder: Arc<dyn PromptBuilder>,
    config: SyncConfig,
    stats: Arc<SyncStats>,
    editor: FieldEditCoordinator,
    detector: ChangeDetector,
    merger: MergeEngine,
}

impl SyncService {
    /// 创建同步服务
    ///
    /// 语言判定器和提示词构建器按配置使用默认实现。
    pub fn new(translator: Arc<dyn Translator>, config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self::build(translator, config))
    }

    /// 使用默认配置创建
    pub fn with_defaults(translator: Arc<dyn Translator>) -> Self {
        Self::build(translator, SyncConfig::default())
    }

    fn build(translator: Arc<dyn Translator>, config: SyncConfig) -> Self {
        let stats = Arc::new(SyncStats::default());

        tracing::info!(
            "初始化同步服务: {} ⇄ {}",
            config.source_lang,
            config.cached_lang
        );

        Self {
            engine: TranslationEngine::new(translator, stats.clone()),
            classifier: Arc::new(HangulClassifier::from_config(&config)),
            prompt_builder: Arc::new(DefaultPromptBuilder::from_config(&config)),
            editor: FieldEditCoordinator::new(stats.clone()),
            detector: ChangeDetector::new(),
            merger: MergeEngine::new(),
            stats,
            config,
        }
    }

    /// 替换语言判定器
    pub fn with_classifier(mut self, classifier: Arc<dyn LanguageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// 替换正向提示词构建器
    pub fn with_prompt_builder(mut self, builder: Arc<dyn PromptBuilder>) -> Self {
        self.prompt_builder = builder;
        self
    }

    /// 比较两份记录，返回变化的段落
    pub fn detect_changed_sections(
        &self,
        old: Option<&AnalysisRecord>,
        new: &AnalysisRecord,
    ) -> ChangeSet {
        self.detector.detect(old, new)
    }

    /// 执行一轮同步
    ///
    /// 输入只读；成功时返回新的 (记录, 缓存)，失败时不产生任何部分结果。
    ///
    /// # 错误
    /// - `TranslationCallFailure`: 任一方向的调用失败或结果数量不符
    /// - `SchemaMismatch`: 记录或旧缓存与段落模式不一致
    pub async fn synchronize(
        &self,
        new: &AnalysisRecord,
        old_cache: Option<&TranslationCache>,
        change_set: &ChangeSet,
    ) -> SyncResult<SyncOutcome> {
        self.stats.inc_passes_started();

        match self.run_pass(new, old_cache, change_set).await {
            Ok(outcome) => {
                self.stats.inc_passes_committed();
                tracing::info!(
                    "同步完成: 变更段落 {:?}，累计翻译调用 {} 次",
                    change_set.names(),
                    self.stats.snapshot().translate_calls
                );
                Ok(outcome)
            }
            Err(e) => {
                self.stats.inc_passes_aborted();
                helpers::log_error(e)
            }
        }
    }

    async fn run_pass(
        &self,
        new: &AnalysisRecord,
        old_cache: Option<&TranslationCache>,
        change_set: &ChangeSet,
    ) -> SyncResult<SyncOutcome> {
        new.validate_schema()?;
        if let Some(cache) = old_cache {
            cache.validate_fields()?;
        }

        let translate_empty = self.config.translate_empty_fields;
        let dispatcher = BatchDispatcher::new(self.classifier.as_ref(), translate_empty);
        let mut plan = dispatcher.plan(change_set, new, old_cache)?;

        let to_source = self.engine.execute(&plan.to_source).await?;
        let patched = self.merger.patch_record(new, &to_source)?;

        let positive_missing = old_cache
            .and_then(|c| c.positive_prompt.as_ref())
            .is_none();
        if change_set.affects_positive_prompt() || positive_missing {
            let prompt = self.prompt_builder.build_positive(&patched);
            plan.queue_positive_prompt(prompt, translate_empty);
        }

        let to_cached = self.engine.execute(&plan.to_cached).await?;

        let results = TranslationResults {
            change_set: plan.change_set,
            to_source,
            to_cached,
            verbatim: plan.verbatim,
        };

        self.merger.merge(new, old_cache, &results)
    }

    fn edit_context(&self) -> EditContext<'_> {
        EditContext {
            engine: &self.engine,
            classifier: self.classifier.as_ref(),
            translate_empty: self.config.translate_empty_fields,
        }
    }

    /// 单字段编辑：判定语言，只按需要的方向翻译一次
    ///
    /// 编辑槽位按 `record_id` 区分，同一记录同一时刻只能编辑一个字段。
    pub async fn edit_field(
        &self,
        record_id: &str,
        section: SectionId,
        field: &str,
        edited_text: impl Into<String>,
        record: &AnalysisRecord,
        cache: Option<&TranslationCache>,
    ) -> SyncResult<SyncOutcome> {
        let target = FieldTarget::new(section, field)?;
        self.edit_target(record_id, &target, edited_text, record, cache)
            .await
    }

    /// 按目标编辑（含负向提示词与自定义提示词）
    pub async fn edit_target(
        &self,
        record_id: &str,
        target: &FieldTarget,
        edited_text: impl Into<String>,
        record: &AnalysisRecord,
        cache: Option<&TranslationCache>,
    ) -> SyncResult<SyncOutcome> {
        self.editor
            .edit_field(record_id, target, edited_text, self.edit_context(), record, cache)
            .await
    }

    /// 打开编辑，返回填充后的缓冲区
    pub fn begin_edit(
        &self,
        record_id: &str,
        target: &FieldTarget,
        record: &AnalysisRecord,
        cache: Option<&TranslationCache>,
    ) -> SyncResult<String> {
        self.editor.begin_edit(record_id, target, record, cache)
    }

    pub fn update_edit(
        &self,
        record_id: &str,
        target: &FieldTarget,
        text: impl Into<String>,
    ) -> SyncResult<()> {
        self.editor.update_buffer(record_id, target, text)
    }

    pub fn cancel_edit(&self, record_id: &str, target: &FieldTarget) -> bool {
        self.editor.cancel(record_id, target)
    }

    /// 提交当前缓冲区
    pub async fn commit_edit(
        &self,
        record_id: &str,
        target: &FieldTarget,
        record: &AnalysisRecord,
        cache: Option<&TranslationCache>,
    ) -> SyncResult<SyncOutcome> {
        self.editor
            .commit(record_id, target, self.edit_context(), record, cache)
            .await
    }

    pub fn field_state(&self, record_id: &str, target: &FieldTarget) -> FieldState {
        self.editor.state_of(record_id, target)
    }

    pub fn edit_buffer(&self, record_id: &str, target: &FieldTarget) -> Option<String> {
        self.editor.buffer(record_id, target)
    }

    /// 记录当前正在编辑的字段
    pub fn active_edit(&self, record_id: &str) -> Option<FieldTarget> {
        self.editor.active_target(record_id)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// 获取统计快照
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}
