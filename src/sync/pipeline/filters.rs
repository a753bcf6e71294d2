//! 语言判定模块
//!
//! 判断一段文本是否使用缓存语言的文字书写，用于决定每个字段的翻译方向

use crate::sync::config::{constants, SyncConfig};

/// 语言判定器
///
/// 纯函数、同步；对引擎而言与翻译能力一样是可替换的协作者。
pub trait LanguageClassifier: Send + Sync {
    /// 文本是否为缓存语言
    fn is_cached_language(&self, text: &str) -> bool;
}

/// 基于韩文字符比例的判定器
#[derive(Debug, Clone)]
pub struct HangulClassifier {
    threshold: f32,
}

/// 文字分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptAnalysis {
    pub hangul_chars: usize,
    pub latin_chars: usize,
    pub alphabetic_chars: usize,
    pub hangul_ratio: f32,
    pub is_cached_language: bool,
}

impl HangulClassifier {
    /// 创建判定器；比例严格大于阈值才判定为缓存语言
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.cached_script_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// 韩文音节、字母及兼容字母
    pub fn is_hangul(c: char) -> bool {
        ('\u{ac00}'..='\u{d7a3}').contains(&c)
            || ('\u{1100}'..='\u{11ff}').contains(&c)
            || ('\u{3130}'..='\u{318f}').contains(&c)
    }

    /// 分析文本的文字构成
    pub fn analyze(&self, text: &str) -> ScriptAnalysis {
        let mut hangul_chars = 0;
        let mut latin_chars = 0;
        let mut alphabetic_chars = 0;

        for c in text.chars().filter(|c| c.is_alphabetic()) {
            alphabetic_chars += 1;
            if Self::is_hangul(c) {
                hangul_chars += 1;
            } else if c.is_ascii_alphabetic() {
                latin_chars += 1;
            }
        }

        let hangul_ratio = if alphabetic_chars == 0 {
            0.0
        } else {
            hangul_chars as f32 / alphabetic_chars as f32
        };

        ScriptAnalysis {
            hangul_chars,
            latin_chars,
            alphabetic_chars,
            hangul_ratio,
            is_cached_language: hangul_chars > 0 && hangul_ratio > self.threshold,
        }
    }
}

impl Default for HangulClassifier {
    fn default() -> Self {
        Self::new(constants::HANGUL_CHAR_THRESHOLD)
    }
}

impl LanguageClassifier for HangulClassifier {
    fn is_cached_language(&self, text: &str) -> bool {
        self.analyze(text).is_cached_language
    }
}
