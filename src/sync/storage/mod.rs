//! 存储模块
//!
//! 提供翻译缓存的数据结构。

pub mod cache;

pub use cache::TranslationCache;
