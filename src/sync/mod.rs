//! 双语分析缓存同步模块
//!
//! 让结构化的分析记录在两种语言表示之间保持一致：
//! 源语言（英文）表示供下游生成使用，缓存语言（韩文）表示供显示和编辑使用，
//! 同时尽量减少昂贵的翻译调用，并保留用户在任一语言中的编辑。
//!
//! - **model**: 分析记录、段落模式、变更集合
//! - **pipeline**: 指纹、变更检测、语言判定、批次分发、正向提示词
//! - **core**: 翻译引擎、合并、字段编辑、统一服务
//! - **storage**: 翻译缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//! - **session**: 会话与保存防抖
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use analysis_sync::sync::{AnalysisRecord, SyncService, Translator};
//!
//! # async fn example(translator: Arc<dyn Translator>) -> analysis_sync::sync::SyncResult<()> {
//! let service = SyncService::with_defaults(translator);
//!
//! let record = AnalysisRecord::empty();
//! let change_set = service.detect_changed_sections(None, &record);
//! let outcome = service.synchronize(&record, None, &change_set).await?;
//! println!("缓存字段: {}", outcome.cache.cached_field_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod session;
pub mod storage;
pub mod translator;

// ============================================================================
// 核心API导出
// ============================================================================

pub use self::core::{
    FieldEditCoordinator, FieldState, MergeEngine, StatsSnapshot, SyncOutcome, SyncService,
    SyncStats, TranslatedBatch, TranslationEngine, TranslationResults,
};

pub use config::{constants, ConfigManager, SyncConfig};

pub use error::{ErrorCategory, ErrorSeverity, SyncError, SyncResult};

pub use model::{AnalysisRecord, ChangeSet, FieldTarget, RecordVariant, Section, SectionId};

pub use pipeline::{
    detect_changed_sections, BatchDispatcher, ChangeDetector, DefaultPromptBuilder, DispatchPlan,
    FieldSlot, HangulClassifier, LanguageClassifier, PromptBuilder, SectionFingerprint, SlotTarget,
    TranslationBatch,
};

pub use session::{AnalysisSession, SessionRegistry};
pub use storage::TranslationCache;
pub use translator::{Direction, Translator};

/// 模块版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 初始化日志输出
///
/// 无法识别的级别回退到 `info`。已有全局订阅者时返回 `false`。
pub fn init_tracing(level: &str) -> bool {
    use crate::env::{sync::NoColor, EnvVar};

    let max_level = level.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!("未知日志级别 {}，使用 info", level);
        tracing::Level::INFO
    });

    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_ansi(!NoColor::get_or_default(false))
        .with_target(false)
        .try_init()
        .is_ok()
}

/// 加载配置并初始化日志
pub fn init() -> SyncConfig {
    let config = config::load_sync_config();
    if init_tracing(&config.log_level) {
        tracing::debug!("analysis-sync {} 已初始化", VERSION);
    }
    config
}
