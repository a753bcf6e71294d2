//! 会话层
//!
//! 会话持有成对的 (记录, 缓存)，同步结果整体替换，从不部分写入。
//! 保存防抖使用注册表实例自己的映射，不依赖进程级全局状态。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::sync::config::constants;
use crate::sync::core::{FieldState, SyncOutcome, SyncService};
use crate::sync::error::{helpers, SyncResult};
use crate::sync::model::{AnalysisRecord, ChangeSet, FieldTarget};
use crate::sync::storage::TranslationCache;

/// 分析会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    record: Option<AnalysisRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache: Option<TranslationCache>,
    #[serde(default)]
    revision: u64,
}

impl AnalysisSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record: None,
            cache: None,
            revision: 0,
        }
    }

    /// 由已保存的 (记录, 缓存) 恢复
    pub fn from_parts(
        id: impl Into<String>,
        record: AnalysisRecord,
        cache: Option<TranslationCache>,
    ) -> SyncResult<Self> {
        record.validate_schema()?;
        if let Some(cache) = &cache {
            cache.validate_against(&record)?;
        }

        Ok(Self {
            id: id.into(),
            record: Some(record),
            cache,
            revision: 0,
        })
    }

    /// 从会话文件恢复，并校验 (记录, 缓存) 的模式
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let session: Self = serde_json::from_str(json)?;

        if let Some(record) = &session.record {
            record.validate_schema()?;
        }
        match (&session.record, &session.cache) {
            (Some(record), Some(cache)) => cache.validate_against(record)?,
            (None, Some(cache)) => cache.validate_fields()?,
            _ => {}
        }

        Ok(session)
    }

    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record(&self) -> Option<&AnalysisRecord> {
        self.record.as_ref()
    }

    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_ref()
    }

    /// 每次提交结果后递增
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 应用一次新的分析结果：检测变更并同步
    ///
    /// 失败时会话保持原状。
    pub async fn apply_analysis(
        &mut self,
        service: &SyncService,
        new: AnalysisRecord,
    ) -> SyncResult<ChangeSet> {
        let change_set = service.detect_changed_sections(self.record.as_ref(), &new);
        let outcome = service
            .synchronize(&new, self.cache.as_ref(), &change_set)
            .await
            .map_err(|e| e.with_context(format!("会话 {}", self.id)))?;

        self.apply_outcome(outcome);
        Ok(change_set)
    }

    /// 编辑单个字段并提交结果
    ///
    /// 编辑槽位以会话 id 区分，共用同一个服务的其他会话不受影响。
    pub async fn edit(
        &mut self,
        service: &SyncService,
        target: &FieldTarget,
        edited_text: impl Into<String>,
    ) -> SyncResult<()> {
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| helpers::validation_error(format!("会话 {} 尚无分析记录", self.id)))?;

        let outcome = service
            .edit_target(&self.id, target, edited_text, record, self.cache.as_ref())
            .await?;

        self.apply_outcome(outcome);
        Ok(())
    }

    /// 放弃本会话中未提交的编辑
    pub fn cancel_edit(&self, service: &SyncService, target: &FieldTarget) -> bool {
        service.cancel_edit(&self.id, target)
    }

    pub fn edit_state(&self, service: &SyncService, target: &FieldTarget) -> FieldState {
        service.field_state(&self.id, target)
    }

    /// 整体替换 (记录, 缓存)
    pub fn apply_outcome(&mut self, outcome: SyncOutcome) {
        self.record = Some(outcome.record);
        self.cache = Some(outcome.cache);
        self.revision += 1;
        tracing::debug!("会话 {} 提交修订 {}", self.id, self.revision);
    }
}

/// 会话注册表
///
/// 按 id 持有会话，并维护保存防抖映射（id → 最早保存时间）。
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<String, AnalysisSession>,
    pending_saves: HashMap<String, Instant>,
    debounce: Duration,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_debounce(Duration::from_millis(constants::DEFAULT_SAVE_DEBOUNCE_MS))
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            pending_saves: HashMap::new(),
            debounce,
        }
    }

    /// 插入会话，返回被替换的旧会话
    pub fn insert(&mut self, session: AnalysisSession) -> Option<AnalysisSession> {
        self.sessions.insert(session.id().to_string(), session)
    }

    pub fn get(&self, id: &str) -> Option<&AnalysisSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut AnalysisSession> {
        self.sessions.get_mut(id)
    }

    /// 移除会话及其待保存记录
    pub fn remove(&mut self, id: &str) -> Option<AnalysisSession> {
        self.pending_saves.remove(id);
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 排序后的会话 id
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// 安排保存；重复安排会把保存时间向后推
    ///
    /// 未知会话返回 `false`。
    pub fn schedule_save(&mut self, id: &str, now: Instant) -> bool {
        if !self.sessions.contains_key(id) {
            tracing::warn!("忽略未知会话的保存请求: {}", id);
            return false;
        }

        self.pending_saves.insert(id.to_string(), now + self.debounce);
        true
    }

    /// 取出已到期的保存请求（按 id 排序）
    pub fn due_saves(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<String> = self
            .pending_saves
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        due.sort();

        for id in &due {
            self.pending_saves.remove(id);
        }

        due
    }

    pub fn pending_save_count(&self) -> usize {
        self.pending_saves.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
