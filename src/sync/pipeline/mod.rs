//! 同步管道模块
//!
//! 提供变更检测、语言判定、批次分发和正向提示词构建

pub mod batch;
pub mod detector;
pub mod filters;
pub mod fingerprint;
pub mod prompt;

// 重新导出主要类型
pub use batch::{BatchDispatcher, DispatchPlan, FieldSlot, SlotTarget, TranslationBatch};
pub use detector::{detect_changed_sections, ChangeDetector};
pub use filters::{HangulClassifier, LanguageClassifier, ScriptAnalysis};
pub use fingerprint::{sections_equal, SectionFingerprint};
pub use prompt::{DefaultPromptBuilder, PromptBuilder, POSITIVE_PROMPT_FIELDS};
