//! 段落标识与固定字段模式
//!
//! 每种段落的字段集合是固定的，不依赖数据内容。字段顺序即模式顺序，
//! 批次分发按此顺序枚举字段。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sync::error::{helpers, SyncError};

/// 段落标识
///
/// 派生的 `Ord` 即规范顺序，`ChangeSet` 依此排序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Style,
    Character,
    Composition,
    /// 伪段落：只包含 `negative_prompt`
    Prompts,
    UiSpecific,
    LogoSpecific,
    PixelartSpecific,
}

pub const STYLE_FIELDS: &[&str] = &["art_style", "technique", "color_palette", "lighting", "mood"];

pub const CHARACTER_FIELDS: &[&str] = &[
    "gender",
    "age_group",
    "hair_style",
    "hair_color",
    "eye_color",
    "face_features",
    "outfit",
    "accessories",
    "body_proportions",
    "pose",
    "expression",
];

pub const COMPOSITION_FIELDS: &[&str] = &["camera_angle", "framing", "background", "depth_of_field"];

pub const PROMPTS_FIELDS: &[&str] = &["negative_prompt"];

pub const UI_FIELDS: &[&str] = &["platform_type", "visual_style", "key_elements", "color_theme"];

pub const LOGO_FIELDS: &[&str] = &[
    "logo_type",
    "typography_style",
    "text_elements",
    "icon_style",
    "color_scheme",
];

pub const PIXELART_FIELDS: &[&str] = &["resolution", "palette_limit", "outline_style", "dithering"];

impl SectionId {
    /// 所有段落，按规范顺序
    pub const ALL: [SectionId; 7] = [
        SectionId::Style,
        SectionId::Character,
        SectionId::Composition,
        SectionId::Prompts,
        SectionId::UiSpecific,
        SectionId::LogoSpecific,
        SectionId::PixelartSpecific,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Style => "style",
            SectionId::Character => "character",
            SectionId::Composition => "composition",
            SectionId::Prompts => "prompts",
            SectionId::UiSpecific => "ui_specific",
            SectionId::LogoSpecific => "logo_specific",
            SectionId::PixelartSpecific => "pixelart_specific",
        }
    }

    /// 段落的固定字段列表（模式顺序）
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            SectionId::Style => STYLE_FIELDS,
            SectionId::Character => CHARACTER_FIELDS,
            SectionId::Composition => COMPOSITION_FIELDS,
            SectionId::Prompts => PROMPTS_FIELDS,
            SectionId::UiSpecific => UI_FIELDS,
            SectionId::LogoSpecific => LOGO_FIELDS,
            SectionId::PixelartSpecific => PIXELART_FIELDS,
        }
    }

    /// 在模式中查找字段，返回其 `'static` 名称
    pub fn field(&self, name: &str) -> Option<&'static str> {
        self.fields().iter().copied().find(|f| *f == name)
    }

    /// 是否参与正向提示词的拼接
    pub fn feeds_positive_prompt(&self) -> bool {
        matches!(
            self,
            SectionId::Style | SectionId::Character | SectionId::Composition
        )
    }

    /// 变体专属段落
    pub fn is_variant(&self) -> bool {
        matches!(
            self,
            SectionId::UiSpecific | SectionId::LogoSpecific | SectionId::PixelartSpecific
        )
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| helpers::validation_error(format!("未知段落: {}", s)))
    }
}
