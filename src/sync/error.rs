//! 同步模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

use crate::sync::model::FieldTarget;
use crate::sync::translator::Direction;

/// 同步错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// 翻译能力调用失败，或返回的结果数量/顺序不正确
    #[error("翻译调用失败 ({direction}): {reason}")]
    TranslationCallFailure { direction: Direction, reason: String },

    /// 段落字段集合与固定模式不一致
    #[error("模式不匹配 [{section}]: {detail}")]
    SchemaMismatch { section: String, detail: String },

    /// 另一个字段正在编辑或提交中
    #[error("编辑冲突: 字段 {active} 正在编辑，拒绝 {requested}")]
    ConcurrentEditConflict {
        active: FieldTarget,
        requested: FieldTarget,
    },

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),
}

impl SyncError {
    /// 检查错误是否可由调用方重试
    ///
    /// 引擎自身从不重试：每一轮同步每个方向最多一次调用。
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::TranslationCallFailure { .. } => true,
            SyncError::ConcurrentEditConflict { .. } => true,
            SyncError::SchemaMismatch { .. } => false,
            SyncError::InvalidInput(_) => false,
            SyncError::ConfigError(_) => false,
            SyncError::SerializationError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::TranslationCallFailure { .. } => ErrorSeverity::Error,
            SyncError::SchemaMismatch { .. } => ErrorSeverity::Critical,
            SyncError::ConcurrentEditConflict { .. } => ErrorSeverity::Warning,
            SyncError::InvalidInput(_) => ErrorSeverity::Info,
            SyncError::ConfigError(_) => ErrorSeverity::Critical,
            SyncError::SerializationError(_) => ErrorSeverity::Error,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::TranslationCallFailure { .. } => ErrorCategory::Translation,
            SyncError::SchemaMismatch { .. } => ErrorCategory::Schema,
            SyncError::ConcurrentEditConflict { .. } => ErrorCategory::Concurrency,
            SyncError::InvalidInput(_) => ErrorCategory::Input,
            SyncError::ConfigError(_) => ErrorCategory::Configuration,
            SyncError::SerializationError(_) => ErrorCategory::Serialization,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let suffix = format!(" (上下文: {})", context);

        match &mut self {
            SyncError::TranslationCallFailure { reason, .. } => reason.push_str(&suffix),
            SyncError::SchemaMismatch { detail, .. } => detail.push_str(&suffix),
            SyncError::InvalidInput(msg)
            | SyncError::ConfigError(msg)
            | SyncError::SerializationError(msg) => msg.push_str(&suffix),
            SyncError::ConcurrentEditConflict { .. } => {}
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Translation,
    Schema,
    Concurrency,
    Input,
    Configuration,
    Serialization,
}

impl From<std::io::Error> for SyncError {
    fn from(error: std::io::Error) -> Self {
        SyncError::ConfigError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        SyncError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(error: toml::de::Error) -> Self {
        SyncError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(error: toml::ser::Error) -> Self {
        SyncError::SerializationError(format!("TOML序列化错误: {}", error))
    }
}

/// 错误结果类型别名
pub type SyncResult<T> = Result<T, SyncError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 记录并返回错误
    pub fn log_error<T>(error: SyncError) -> SyncResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("同步信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("同步警告: {}", error),
            ErrorSeverity::Error => tracing::error!("同步错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("同步严重错误: {}", error),
        }

        Err(error)
    }

    /// 创建翻译调用错误
    pub fn translation_failure<T: fmt::Display>(direction: Direction, msg: T) -> SyncError {
        SyncError::TranslationCallFailure {
            direction,
            reason: msg.to_string(),
        }
    }

    /// 创建模式不匹配错误
    pub fn schema_mismatch<S: fmt::Display, T: fmt::Display>(section: S, detail: T) -> SyncError {
        SyncError::SchemaMismatch {
            section: section.to_string(),
            detail: detail.to_string(),
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> SyncError {
        SyncError::ConfigError(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> SyncError {
        SyncError::InvalidInput(msg.to_string())
    }
}
