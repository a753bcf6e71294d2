//! 字段编辑协调器
//!
//! 单字段编辑的状态机：`Viewing` → `Editing` → `Committing` → `Viewing`。
//! 同一份记录同一时刻只允许一个字段处于 `Editing` 或 `Committing`，
//! 第二个请求直接以 `ConcurrentEditConflict` 拒绝而不是排队。
//! 编辑槽位按记录 id 区分，不同记录（会话）之间互不影响。
//!
//! 状态锁从不跨越 await 持有；提交期间的状态由 [`CommitGuard`] 负责收尾，
//! 即使提交 future 被丢弃，字段也会回到 `Editing` 并保留用户输入。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sync::core::engine::TranslationEngine;
use crate::sync::core::merge::SyncOutcome;
use crate::sync::core::stats::SyncStats;
use crate::sync::error::{helpers, SyncError, SyncResult};
use crate::sync::model::{AnalysisRecord, FieldTarget};
use crate::sync::pipeline::filters::LanguageClassifier;
use crate::sync::pipeline::prompt::POSITIVE_PROMPT_FIELDS;
use crate::sync::storage::TranslationCache;
use crate::sync::translator::Direction;

/// 字段状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldState {
    /// 只读，显示缓存值
    Viewing,
    /// 编辑中，缓冲区已填充
    Editing,
    /// 翻译调用进行中
    Committing,
}

#[derive(Debug, Clone)]
struct ActiveEdit {
    target: FieldTarget,
    buffer: String,
    committing: bool,
}

/// 编辑上下文：一次提交所需的协作者
pub struct EditContext<'a> {
    pub engine: &'a TranslationEngine,
    pub classifier: &'a dyn LanguageClassifier,
    pub translate_empty: bool,
}

/// 字段编辑协调器
///
/// 每个记录 id 至多一个活动编辑。
pub struct FieldEditCoordinator {
    active: Mutex<HashMap<String, ActiveEdit>>,
    stats: Arc<SyncStats>,
}

impl FieldEditCoordinator {
    pub fn new(stats: Arc<SyncStats>) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            stats,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ActiveEdit>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn conflict(&self, record_id: &str, active: &FieldTarget, requested: &FieldTarget) -> SyncError {
        self.stats.inc_conflicts_rejected();
        tracing::warn!(
            "记录 {}: 拒绝编辑 {}，字段 {} 正在编辑",
            record_id,
            requested,
            active
        );
        SyncError::ConcurrentEditConflict {
            active: active.clone(),
            requested: requested.clone(),
        }
    }

    fn not_editing(record_id: &str, target: &FieldTarget) -> SyncError {
        helpers::validation_error(format!("记录 {} 的字段 {} 未处于编辑状态", record_id, target))
    }

    /// 查询字段状态
    pub fn state_of(&self, record_id: &str, target: &FieldTarget) -> FieldState {
        match self.lock().get(record_id) {
            Some(edit) if &edit.target == target && edit.committing => FieldState::Committing,
            Some(edit) if &edit.target == target => FieldState::Editing,
            _ => FieldState::Viewing,
        }
    }

    /// 记录当前处于编辑或提交中的字段
    pub fn active_target(&self, record_id: &str) -> Option<FieldTarget> {
        self.lock().get(record_id).map(|edit| edit.target.clone())
    }

    /// 有活动编辑的记录数
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// 编辑缓冲区内容
    pub fn buffer(&self, record_id: &str, target: &FieldTarget) -> Option<String> {
        self.lock()
            .get(record_id)
            .filter(|edit| &edit.target == target)
            .map(|edit| edit.buffer.clone())
    }

    /// Viewing → Editing
    ///
    /// 缓冲区用当前显示值填充：优先缓存值，缓存缺失时退回源值。
    /// 自定义提示词按用户输入的原样显示。对同一字段重复调用返回现有缓冲区。
    pub fn begin_edit(
        &self,
        record_id: &str,
        target: &FieldTarget,
        record: &AnalysisRecord,
        cache: Option<&TranslationCache>,
    ) -> SyncResult<String> {
        let seed = display_value(target, record, cache)?;

        let mut active = self.lock();
        match active.get(record_id) {
            None => {
                active.insert(
                    record_id.to_string(),
                    ActiveEdit {
                        target: target.clone(),
                        buffer: seed.clone(),
                        committing: false,
                    },
                );
                tracing::debug!("记录 {}: 开始编辑 {}", record_id, target);
                Ok(seed)
            }
            Some(edit) if &edit.target == target && !edit.committing => Ok(edit.buffer.clone()),
            Some(edit) => Err(self.conflict(record_id, &edit.target, target)),
        }
    }

    /// 更新编辑缓冲区
    pub fn update_buffer(
        &self,
        record_id: &str,
        target: &FieldTarget,
        text: impl Into<String>,
    ) -> SyncResult<()> {
        let mut active = self.lock();
        match active.get_mut(record_id) {
            Some(edit) if &edit.target == target && !edit.committing => {
                edit.buffer = text.into();
                Ok(())
            }
            Some(edit) => Err(self.conflict(record_id, &edit.target, target)),
            None => Err(Self::not_editing(record_id, target)),
        }
    }

    /// Editing → Viewing，丢弃缓冲区
    ///
    /// 提交中的字段不能取消；返回是否确实取消了编辑。
    pub fn cancel(&self, record_id: &str, target: &FieldTarget) -> bool {
        let mut active = self.lock();
        let cancellable = active
            .get(record_id)
            .is_some_and(|edit| &edit.target == target && !edit.committing);

        if cancellable {
            active.remove(record_id);
            tracing::debug!("记录 {}: 取消编辑 {}", record_id, target);
        }
        cancellable
    }

    /// Editing → Committing → Viewing
    ///
    /// 恰好发出一次翻译调用（空文本或英文自定义提示词不需要调用）。
    /// 失败时字段回到 `Editing`，缓冲区保持用户输入。
    pub async fn commit(
        &self,
        record_id: &str,
        target: &FieldTarget,
        ctx: EditContext<'_>,
        record: &AnalysisRecord,
        cache: Option<&TranslationCache>,
    ) -> SyncResult<SyncOutcome> {
        let text = {
            let mut active = self.lock();
            match active.get_mut(record_id) {
                Some(edit) if &edit.target == target && !edit.committing => {
                    edit.committing = true;
                    edit.buffer.clone()
                }
                Some(edit) => return Err(self.conflict(record_id, &edit.target, target)),
                None => return Err(Self::not_editing(record_id, target)),
            }
        };

        let mut guard = CommitGuard {
            coordinator: self,
            record_id: record_id.to_string(),
            target: target.clone(),
            succeeded: false,
        };

        match apply_edit(target, &text, &ctx, record, cache).await {
            Ok(outcome) => {
                guard.succeeded = true;
                self.stats.inc_edits_committed();
                tracing::info!("记录 {}: 字段 {} 编辑已提交", record_id, target);
                Ok(outcome)
            }
            Err(e) => {
                self.stats.inc_edits_failed();
                helpers::log_error(e.with_context(format!("{} / {}", record_id, target)))
            }
        }
    }

    /// 一次性编辑：以给定文本进入 `Editing` 并立即提交
    pub async fn edit_field(
        &self,
        record_id: &str,
        target: &FieldTarget,
        text: impl Into<String>,
        ctx: EditContext<'_>,
        record: &AnalysisRecord,
        cache: Option<&TranslationCache>,
    ) -> SyncResult<SyncOutcome> {
        // 先确认目标存在，避免为无效字段占用编辑槽位
        display_value(target, record, cache)?;

        {
            let mut active = self.lock();
            match active.get_mut(record_id) {
                None => {
                    active.insert(
                        record_id.to_string(),
                        ActiveEdit {
                            target: target.clone(),
                            buffer: text.into(),
                            committing: false,
                        },
                    );
                }
                Some(edit) if &edit.target == target && !edit.committing => {
                    edit.buffer = text.into();
                }
                Some(edit) => return Err(self.conflict(record_id, &edit.target, target)),
            }
        }

        self.commit(record_id, target, ctx, record, cache).await
    }
}

/// 提交收尾：成功时关闭编辑，否则回到 `Editing`
struct CommitGuard<'a> {
    coordinator: &'a FieldEditCoordinator,
    record_id: String,
    target: FieldTarget,
    succeeded: bool,
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        let mut active = self.coordinator.lock();
        let owned = active
            .get(&self.record_id)
            .is_some_and(|edit| edit.target == self.target);
        if !owned {
            return;
        }

        if self.succeeded {
            active.remove(&self.record_id);
        } else if let Some(edit) = active.get_mut(&self.record_id) {
            edit.committing = false;
        }
    }
}

/// 当前显示值
fn display_value(
    target: &FieldTarget,
    record: &AnalysisRecord,
    cache: Option<&TranslationCache>,
) -> SyncResult<String> {
    if let FieldTarget::CustomPrompt = target {
        return Ok(record.user_custom_prompt.clone().unwrap_or_default());
    }

    let source = record.value_of(target).ok_or_else(|| {
        helpers::schema_mismatch(
            target.section().map(|s| s.as_str()).unwrap_or("record"),
            format!("记录中不存在字段 {}", target),
        )
    })?;

    Ok(cache
        .and_then(|c| c.value_of(target))
        .unwrap_or(source)
        .to_string())
}

/// 判定语言、翻译并生成新的 (记录, 缓存)
async fn apply_edit(
    target: &FieldTarget,
    text: &str,
    ctx: &EditContext<'_>,
    record: &AnalysisRecord,
    cache: Option<&TranslationCache>,
) -> SyncResult<SyncOutcome> {
    let mut record = record.clone();
    let mut cache = cache.cloned().unwrap_or_default();

    let skip_call = text.trim().is_empty() && !ctx.translate_empty;
    let is_cached = !skip_call && ctx.classifier.is_cached_language(text);

    match target {
        FieldTarget::CustomPrompt => {
            let english = if is_cached {
                ctx.engine.translate_one(text, Direction::ToSource).await?
            } else {
                text.to_string()
            };
            record.user_custom_prompt = Some(text.to_string());
            cache.custom_prompt_english = Some(english);
        }
        FieldTarget::Field { .. } if skip_call => {
            record.set_value(target, text.to_string())?;
            cache.set_value(target, text.to_string());
        }
        FieldTarget::Field { .. } if is_cached => {
            let source = ctx.engine.translate_one(text, Direction::ToSource).await?;
            record.set_value(target, source)?;
            cache.set_value(target, text.to_string());
        }
        FieldTarget::Field { .. } => {
            let cached = ctx.engine.translate_one(text, Direction::ToCached).await?;
            record.set_value(target, text.to_string())?;
            cache.set_value(target, cached);
        }
    }

    // 正向提示词依赖该字段时标记为未翻译，下一轮同步会重新生成
    if feeds_positive_prompt(target) {
        cache.positive_prompt = None;
    }

    cache.validate_against(&record)?;

    Ok(SyncOutcome { record, cache })
}

fn feeds_positive_prompt(target: &FieldTarget) -> bool {
    match target {
        FieldTarget::Field { section, field } => POSITIVE_PROMPT_FIELDS
            .iter()
            .any(|(s, f)| s == section && f == field),
        FieldTarget::CustomPrompt => false,
    }
}
