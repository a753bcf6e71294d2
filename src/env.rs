//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问

use std::env;
use std::fmt;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅当变量被显式设置时返回值，不回退到默认值
    fn get_explicit() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 同步引擎环境变量
pub mod sync {
    use super::*;

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "ANALYSIS_SYNC_SOURCE_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Authoritative source language (ISO 639-1 code)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME)
        }
    }

    /// 缓存语言
    pub struct CachedLang;
    impl EnvVar<String> for CachedLang {
        const NAME: &'static str = "ANALYSIS_SYNC_CACHED_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Display/cache language (ISO 639-1 code)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME)
        }
    }

    /// 语言判定阈值
    pub struct ScriptThreshold;
    impl EnvVar<f32> for ScriptThreshold {
        const NAME: &'static str = "ANALYSIS_SYNC_SCRIPT_THRESHOLD";
        const DEFAULT: Option<f32> = Some(0.3);
        const DESCRIPTION: &'static str =
            "Share of cached-language script among letters above which text counts as cached language";

        fn parse(value: &str) -> EnvResult<f32> {
            let threshold: f32 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number".to_string(),
            })?;

            if !(0.0..1.0).contains(&threshold) {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Value {} is outside [0, 1)", threshold),
                });
            }

            Ok(threshold)
        }
    }

    /// 是否翻译空字段
    pub struct TranslateEmpty;
    impl EnvVar<bool> for TranslateEmpty {
        const NAME: &'static str = "ANALYSIS_SYNC_TRANSLATE_EMPTY";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Send empty field values to the translator";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "ANALYSIS_SYNC_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid boolean '{}'. Use: true/false, 1/0, yes/no, on/off", value),
        }),
    }
}

fn parse_lang(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim().to_lowercase();
    if lang.len() != 2 || !lang.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Language code must be 2 letters (ISO 639-1)".to_string(),
        });
    }
    Ok(lang)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");
    docs.push_str("## Synchronization Engine\n\n");

    let entries: [(&str, &str, String); 6] = [
        (sync::SourceLang::NAME, sync::SourceLang::DESCRIPTION, "en".to_string()),
        (sync::CachedLang::NAME, sync::CachedLang::DESCRIPTION, "ko".to_string()),
        (
            sync::ScriptThreshold::NAME,
            sync::ScriptThreshold::DESCRIPTION,
            format!("{:?}", sync::ScriptThreshold::DEFAULT),
        ),
        (
            sync::TranslateEmpty::NAME,
            sync::TranslateEmpty::DESCRIPTION,
            format!("{:?}", sync::TranslateEmpty::DEFAULT),
        ),
        (sync::LogLevel::NAME, sync::LogLevel::DESCRIPTION, "info".to_string()),
        (
            sync::NoColor::NAME,
            sync::NoColor::DESCRIPTION,
            format!("{:?}", sync::NoColor::DEFAULT),
        ),
    ];

    for (name, description, default) in entries {
        docs.push_str(&format!("- `{}`: {} (default: {})\n", name, description, default));
    }

    docs
}
