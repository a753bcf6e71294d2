// 集成测试公共模块
//
// 提供记录构建器和翻译能力的模拟实现

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use analysis_sync::sync::error::helpers;
use analysis_sync::sync::{
    AnalysisRecord, Direction, PromptBuilder, RecordVariant, Section, SectionId, SyncResult,
    SyncService, Translator,
};

/// 一次翻译调用的记录
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub direction: Direction,
    pub texts: Vec<String>,
}

/// 模拟翻译的行为
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockMode {
    /// 原样返回
    Identity,
    /// 加上方向前缀：`ko:` / `en:`
    Tagging,
    /// 少返回一项
    DropLast,
    /// 直接失败
    Failing,
}

/// 记录所有调用的模拟翻译能力
pub struct MockTranslator {
    mode: MockMode,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn identity() -> Arc<Self> {
        Self::new(MockMode::Identity)
    }

    pub fn tagging() -> Arc<Self> {
        Self::new(MockMode::Tagging)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// `Tagging` 模式下的译文
pub fn tagged(direction: Direction, text: &str) -> String {
    match direction {
        Direction::ToCached => format!("ko:{}", text),
        Direction::ToSource => format!("en:{}", text),
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(&self, texts: &[String], direction: Direction) -> SyncResult<Vec<String>> {
        self.calls.lock().unwrap().push(RecordedCall {
            direction,
            texts: texts.to_vec(),
        });

        match self.mode {
            MockMode::Identity => Ok(texts.to_vec()),
            MockMode::Tagging => Ok(texts.iter().map(|t| tagged(direction, t)).collect()),
            MockMode::DropLast => {
                let mut out: Vec<String> = texts.iter().map(|t| tagged(direction, t)).collect();
                out.pop();
                Ok(out)
            }
            MockMode::Failing => Err(helpers::translation_failure(direction, "service unavailable")),
        }
    }
}

/// 永远不会完成的翻译能力
#[derive(Default)]
pub struct PendingTranslator {
    started: AtomicUsize,
}

impl PendingTranslator {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for PendingTranslator {
    async fn translate_batch(&self, _texts: &[String], _direction: Direction) -> SyncResult<Vec<String>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        futures::future::pending::<()>().await;
        unreachable!("pending future never resolves")
    }
}

/// 确定性的提示词构建器：按模式顺序拼接三个段落的全部值
pub struct StubPromptBuilder;

impl PromptBuilder for StubPromptBuilder {
    fn build_positive(&self, record: &AnalysisRecord) -> String {
        [SectionId::Style, SectionId::Character, SectionId::Composition]
            .iter()
            .flat_map(|id| {
                id.fields()
                    .iter()
                    .filter_map(move |f| record.field_value(*id, f))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 创建服务
pub fn service_with(translator: Arc<dyn Translator>) -> SyncService {
    SyncService::with_defaults(translator)
}

/// 完整填写的英文记录
pub fn sample_record() -> AnalysisRecord {
    let mut record = AnalysisRecord::empty();

    record.style = Section::from_iter([
        ("art_style", "anime"),
        ("technique", "cel shading"),
        ("color_palette", "pastel"),
        ("lighting", "soft"),
        ("mood", "happy"),
    ]);
    record.character = Section::from_iter([
        ("gender", "female"),
        ("age_group", "young adult"),
        ("hair_style", "long"),
        ("hair_color", "silver"),
        ("eye_color", "blue"),
        ("face_features", "freckles"),
        ("outfit", "school uniform"),
        ("accessories", "red ribbon"),
        ("body_proportions", "slim"),
        ("pose", "standing"),
        ("expression", "smiling"),
    ]);
    record.composition = Section::from_iter([
        ("camera_angle", "eye level"),
        ("framing", "close-up"),
        ("background", "cherry blossoms"),
        ("depth_of_field", "shallow"),
    ]);
    record.negative_prompt = "blurry, lowres".to_string();

    record
}

/// 带 UI 专属段落的记录
pub fn ui_record() -> AnalysisRecord {
    let mut record = sample_record();
    record.variant = RecordVariant::Ui(Section::from_iter([
        ("platform_type", "mobile"),
        ("visual_style", "flat"),
        ("key_elements", "buttons"),
        ("color_theme", "dark"),
    ]));
    record
}

/// 带 Logo 专属段落的记录
pub fn logo_record() -> AnalysisRecord {
    let mut record = sample_record();
    record.variant = RecordVariant::Logo(Section::from_iter([
        ("logo_type", "wordmark"),
        ("typography_style", "serif"),
        ("text_elements", "ACME"),
        ("icon_style", "minimal"),
        ("color_scheme", "monochrome"),
    ]));
    record
}

/// 源语言字段总数（三个基础段落）
pub const BASE_FIELD_COUNT: usize = 5 + 11 + 4;
