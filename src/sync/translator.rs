//! 翻译能力接口
//!
//! 引擎唯一的外部依赖：按批次翻译一组字符串。实际的网络客户端、
//! 厂商协议和提示词都在引擎之外实现。

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::sync::error::SyncResult;

/// 翻译方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// 缓存语言 → 源语言（如 韩文 → 英文）
    ToSource,
    /// 源语言 → 缓存语言（如 英文 → 韩文）
    ToCached,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToSource => "cached→source",
            Direction::ToCached => "source→cached",
        }
    }

    /// 按配置的语言对返回 (源语言, 目标语言)
    pub fn languages<'a>(&self, source_lang: &'a str, cached_lang: &'a str) -> (&'a str, &'a str) {
        match self {
            Direction::ToSource => (cached_lang, source_lang),
            Direction::ToCached => (source_lang, cached_lang),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 批量翻译能力
///
/// 实现方必须返回与输入等长、同序的结果；失败时整体返回错误，
/// 不允许部分结果。超时由实现方自行负责。
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_batch(&self, texts: &[String], direction: Direction) -> SyncResult<Vec<String>>;
}
