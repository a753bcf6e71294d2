//! 同步配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, SyncConfig};

/// 配置常量
pub mod constants {
    // 语言设置
    pub const DEFAULT_SOURCE_LANG: &str = "en";
    pub const DEFAULT_CACHED_LANG: &str = "ko";

    // 语言判定：韩文字符占字母字符的比例阈值
    pub const HANGUL_CHAR_THRESHOLD: f32 = 0.3;

    // 正向提示词拼接
    pub const DEFAULT_PROMPT_SEPARATOR: &str = ", ";

    // 会话保存防抖（毫秒）
    pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 500;

    // 日志
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "analysis-sync.toml",
        ".analysis-sync.toml",
        "analysis-sync.json",
        "~/.config/analysis-sync/config.toml",
        "/etc/analysis-sync/config.toml",
    ];

    // .env 文件搜索顺序
    pub const ENV_FILES: &[&str] = &[".env.local", ".env.development", ".env.production", ".env"];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 加载配置，失败时回退到默认值
pub fn load_sync_config() -> SyncConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.get_config().clone(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            SyncConfig::default()
        }
    }
}
