//! # Analysis Sync Library
//!
//! 双语分析缓存同步引擎：检测分析记录的段落级变化，按方向批量翻译，
//! 并把结果合并回源语言记录与缓存语言影子。
//!
//! ## 模块组织
//!
//! - `sync` - 同步引擎（模型、管道、核心服务、会话）
//! - `env` - 类型安全的环境变量访问

pub mod env;
pub mod sync;

// Re-export commonly used items for convenience
pub use sync::{
    AnalysisRecord, AnalysisSession, ChangeSet, Direction, FieldTarget, SectionId, SessionRegistry,
    SyncConfig, SyncError, SyncOutcome, SyncResult, SyncService, TranslationCache, Translator,
};
