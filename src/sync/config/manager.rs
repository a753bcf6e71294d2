//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::sync::error::{helpers, SyncResult};

/// 同步引擎配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    // 语言配置
    pub source_lang: String,
    pub cached_lang: String,

    // 语言判定
    pub cached_script_threshold: f32,

    // 分发配置：空字符串是否也发送给翻译能力
    pub translate_empty_fields: bool,

    // 正向提示词
    pub positive_prompt_separator: String,

    // 日志
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            cached_lang: constants::DEFAULT_CACHED_LANG.to_string(),
            cached_script_threshold: constants::HANGUL_CHAR_THRESHOLD,
            translate_empty_fields: false,
            positive_prompt_separator: constants::DEFAULT_PROMPT_SEPARATOR.to_string(),
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl SyncConfig {
    /// 验证配置
    pub fn validate(&self) -> SyncResult<()> {
        if self.source_lang.trim().is_empty() || self.cached_lang.trim().is_empty() {
            return Err(helpers::config_error("语言代码不能为空"));
        }

        if self.source_lang.eq_ignore_ascii_case(&self.cached_lang) {
            return Err(helpers::config_error("源语言与缓存语言不能相同"));
        }

        if !(0.0..1.0).contains(&self.cached_script_threshold) {
            return Err(helpers::config_error(format!(
                "语言判定阈值必须在 [0, 1) 内: {}",
                self.cached_script_threshold
            )));
        }

        if self.positive_prompt_separator.is_empty() {
            return Err(helpers::config_error("提示词分隔符不能为空"));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只有显式设置的变量才会覆盖，无法解析的值记录警告后忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{sync, EnvResult, EnvVar};

        fn take<T>(value: Option<EnvResult<T>>) -> Option<T> {
            match value? {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("忽略无效的环境变量: {}", e);
                    None
                }
            }
        }

        if let Some(lang) = take(sync::SourceLang::get_explicit()) {
            self.source_lang = lang;
        }

        if let Some(lang) = take(sync::CachedLang::get_explicit()) {
            self.cached_lang = lang;
        }

        if let Some(threshold) = take(sync::ScriptThreshold::get_explicit()) {
            self.cached_script_threshold = threshold;
        }

        if let Some(translate_empty) = take(sync::TranslateEmpty::get_explicit()) {
            self.translate_empty_fields = translate_empty;
        }

        if let Some(level) = take(sync::LogLevel::get_explicit()) {
            tracing::info!("环境变量覆盖日志级别: {}", level);
            self.log_level = level;
        }
    }
}

/// 简化的配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: SyncConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> SyncResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从 TOML 文本创建（不读取环境变量）
    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn into_config(self) -> SyncConfig {
        self.config
    }

    /// 从文件加载配置
    fn load_config() -> SyncResult<SyncConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::debug!("未找到配置文件，使用默认配置");
        Ok(SyncConfig::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &str) -> SyncResult<SyncConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| helpers::config_error(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| helpers::config_error(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| helpers::config_error(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> SyncResult<()> {
        let content = toml::to_string_pretty(&SyncConfig::default())?;

        std::fs::write(path, content)
            .map_err(|e| helpers::config_error(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.source_lang, "en");
        assert_eq!(config.cached_lang, "ko");
    }

    #[test]
    fn test_from_toml_partial() {
        let manager = ConfigManager::from_toml_str(
            r#"
            cached_lang = "ja"
            cached_script_threshold = 0.5
            "#,
        )
        .unwrap();

        let config = manager.get_config();
        assert_eq!(config.cached_lang, "ja");
        assert_eq!(config.source_lang, "en");
        assert_eq!(config.cached_script_threshold, 0.5);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(ConfigManager::from_toml_str(r#"cached_lang = "en""#).is_err());
        assert!(ConfigManager::from_toml_str("cached_script_threshold = 1.5").is_err());
        assert!(ConfigManager::from_toml_str("source_lang = 3").is_err());
    }

    #[test]
    fn test_example_config_round_trip() {
        let path = std::env::temp_dir().join(format!("analysis-sync-{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        ConfigManager::generate_example_config(&path).unwrap();
        let loaded = ConfigManager::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, SyncConfig::default());
    }
}
