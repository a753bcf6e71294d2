//! 变更检测器
//!
//! 逐段落比较新旧两份分析记录，返回发生变化的段落集合

use crate::sync::model::{AnalysisRecord, ChangeSet, SectionId};
use crate::sync::pipeline::fingerprint::SectionFingerprint;

/// 变更检测器（无状态、纯函数）
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// 比较两份记录
    ///
    /// - `old` 为 `None`（首次分析）时返回新记录中存在的全部段落
    /// - 映射段落按指纹逐对比较
    /// - `prompts` 仅在 `negative_prompt` 不同时加入
    /// - 变体段落两边都不存在时跳过；只在旧记录中存在时没有可翻译内容，同样跳过
    pub fn detect(&self, old: Option<&AnalysisRecord>, new: &AnalysisRecord) -> ChangeSet {
        let old = match old {
            Some(old) => old,
            None => {
                let set = ChangeSet::from_sections(new.present_sections())
                    .with_custom_prompt(has_custom_prompt(new));
                tracing::debug!("首次分析，全部段落需要翻译: {:?}", set.names());
                return set;
            }
        };

        let mut set = ChangeSet::new();

        for id in SectionId::ALL {
            if self.section_changed(id, old, new) {
                set.insert(id);
            }
        }

        set.set_custom_prompt_changed(old.user_custom_prompt != new.user_custom_prompt);

        tracing::debug!(
            "变更检测完成: {:?} (自定义提示词变化: {})",
            set.names(),
            set.custom_prompt_changed()
        );

        set
    }

    fn section_changed(&self, id: SectionId, old: &AnalysisRecord, new: &AnalysisRecord) -> bool {
        if id == SectionId::Prompts {
            return old.negative_prompt != new.negative_prompt;
        }

        match (old.section(id), new.section(id)) {
            (Some(a), Some(b)) => {
                let (fa, fb) = (SectionFingerprint::of(a), SectionFingerprint::of(b));
                let changed = fa != fb;
                if changed {
                    tracing::trace!("段落 {} 指纹变化: {} → {}", id, fa, fb);
                }
                changed
            }
            // 新出现的变体段落必须完整翻译一次
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }
}

fn has_custom_prompt(record: &AnalysisRecord) -> bool {
    record
        .user_custom_prompt
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty())
}

/// 便利函数
pub fn detect_changed_sections(old: Option<&AnalysisRecord>, new: &AnalysisRecord) -> ChangeSet {
    ChangeDetector::new().detect(old, new)
}
