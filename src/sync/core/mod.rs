//! 同步核心模块
//!
//! ## 架构设计
//!
//! - **服务层** (`service.rs`): 统一入口，协调一轮同步和字段编辑
//! - **引擎层** (`engine.rs`): 执行批次并校验结果对应关系
//! - **合并层** (`merge.rs`): 把翻译结果合并进新的记录与缓存
//! - **编辑层** (`editor.rs`): 单字段编辑状态机与互斥
//!
//! ## 模块依赖关系
//!
//! ```text
//! SyncService (service.rs)
//!     ├── ChangeDetector (pipeline/detector.rs)
//!     ├── BatchDispatcher (pipeline/batch.rs)
//!     ├── TranslationEngine (engine.rs)
//!     ├── MergeEngine (merge.rs)
//!     └── FieldEditCoordinator (editor.rs)
//!             └── TranslationEngine (engine.rs)
//! ```

pub mod editor;
pub mod engine;
pub mod merge;
pub mod service;
pub mod stats;

// 重新导出核心类型
pub use editor::{EditContext, FieldEditCoordinator, FieldState};
pub use engine::{TranslatedBatch, TranslationEngine};
pub use merge::{MergeEngine, SyncOutcome, TranslationResults};
pub use service::SyncService;
pub use stats::{StatsSnapshot, SyncStats};
