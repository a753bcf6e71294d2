//! 数据模型
//!
//! 分析记录、段落模式、变更集合与字段地址。

pub mod change_set;
pub mod record;
pub mod schema;

pub use change_set::ChangeSet;
pub use record::{AnalysisRecord, FieldTarget, RecordVariant, Section};
pub use schema::SectionId;
