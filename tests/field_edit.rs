//! 字段编辑集成测试
//!
//! 测试单字段编辑的状态机、翻译方向和互斥

use std::sync::Arc;

use analysis_sync::sync::{
    AnalysisSession, Direction, FieldState, FieldTarget, SectionId, SyncError,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{sample_record, service_with, MockMode, MockTranslator, PendingTranslator};

const RECORD: &str = "record-a";

fn mood() -> FieldTarget {
    FieldTarget::new(SectionId::Style, "mood").unwrap()
}

/// 身份翻译下编辑后重新读取字段
#[tokio::test]
async fn test_edit_round_trip_with_identity_translator() {
    let translator = MockTranslator::identity();
    let service = service_with(translator.clone());
    let record = sample_record();

    let outcome = service
        .edit_field(RECORD, SectionId::Style, "mood", "melancholic", &record, None)
        .await
        .unwrap();

    assert_eq!(outcome.record.style.get("mood"), Some("melancholic"));
    assert_eq!(
        outcome.cache.section(SectionId::Style).and_then(|s| s.get("mood")),
        Some("melancholic")
    );
    assert_eq!(translator.call_count(), 1);
    assert_eq!(service.field_state(RECORD, &mood()), FieldState::Viewing);
}

/// 英文编辑：源值为输入，缓存值为译文
#[tokio::test]
async fn test_source_language_edit_translates_to_cached() {
    let translator = MockTranslator::tagging();
    let service = service_with(translator.clone());
    let record = sample_record();

    let outcome = service
        .edit_field(RECORD, SectionId::Style, "mood", "melancholic", &record, None)
        .await
        .unwrap();

    let calls = translator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].direction, Direction::ToCached);
    assert_eq!(calls[0].texts, vec!["melancholic"]);

    assert_eq!(outcome.record.style.get("mood"), Some("melancholic"));
    assert_eq!(
        outcome.cache.section(SectionId::Style).and_then(|s| s.get("mood")),
        Some("ko:melancholic")
    );
    // 其它字段不受影响
    assert_eq!(outcome.record.style.get("lighting"), Some("soft"));
    assert_eq!(outcome.cache.section(SectionId::Style).unwrap().len(), 1);
}

/// 韩文编辑：缓存值为输入，源值为译文
#[tokio::test]
async fn test_cached_language_edit_translates_to_source() {
    let translator = MockTranslator::tagging();
    let service = service_with(translator.clone());
    let record = sample_record();

    let outcome = service
        .edit_field(RECORD, SectionId::Style, "mood", "우울한", &record, None)
        .await
        .unwrap();

    assert_eq!(translator.calls()[0].direction, Direction::ToSource);
    assert_eq!(outcome.record.style.get("mood"), Some("en:우울한"));
    assert_eq!(
        outcome.cache.section(SectionId::Style).and_then(|s| s.get("mood")),
        Some("우울한")
    );
}

/// 负向提示词与自定义提示词也可以编辑
#[tokio::test]
async fn test_prompt_targets() {
    let translator = MockTranslator::tagging();
    let service = service_with(translator.clone());
    let record = sample_record();

    let outcome = service
        .edit_target(RECORD, &FieldTarget::negative_prompt(), "워터마크", &record, None)
        .await
        .unwrap();
    assert_eq!(outcome.record.negative_prompt, "en:워터마크");
    assert_eq!(outcome.cache.negative_prompt.as_deref(), Some("워터마크"));

    translator.clear();
    let outcome = service
        .edit_target(RECORD, &FieldTarget::CustomPrompt, "a red hat", &record, None)
        .await
        .unwrap();
    assert_eq!(translator.call_count(), 0);
    assert_eq!(outcome.record.user_custom_prompt.as_deref(), Some("a red hat"));
    assert_eq!(outcome.cache.custom_prompt_english.as_deref(), Some("a red hat"));

    let outcome = service
        .edit_target(RECORD, &FieldTarget::CustomPrompt, "빨간 모자", &record, None)
        .await
        .unwrap();
    assert_eq!(translator.call_count(), 1);
    assert_eq!(outcome.record.user_custom_prompt.as_deref(), Some("빨간 모자"));
    assert_eq!(outcome.cache.custom_prompt_english.as_deref(), Some("en:빨간 모자"));
}

/// 提交进行中时编辑第二个字段立即被拒绝
#[tokio::test]
async fn test_second_edit_is_rejected_while_first_is_committing() {
    let translator = Arc::new(PendingTranslator::default());
    let service = service_with(translator.clone());
    let record = sample_record();

    let mut first = Box::pin(service.edit_field(
        RECORD,
        SectionId::Style,
        "mood",
        "melancholic",
        &record,
        None,
    ));
    assert!(futures::poll!(first.as_mut()).is_pending());
    assert_eq!(service.field_state(RECORD, &mood()), FieldState::Committing);
    assert_eq!(translator.started(), 1);

    let err = service
        .edit_field(RECORD, SectionId::Style, "lighting", "dim", &record, None)
        .await
        .unwrap_err();
    match err {
        SyncError::ConcurrentEditConflict { active, requested } => {
            assert_eq!(active, mood());
            assert_eq!(requested, FieldTarget::new(SectionId::Style, "lighting").unwrap());
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // 同一字段在提交中也不能再次提交或取消
    let lighting = FieldTarget::new(SectionId::Style, "lighting").unwrap();
    assert!(service.begin_edit(RECORD, &lighting, &record, None).is_err());
    assert!(service
        .edit_field(RECORD, SectionId::Style, "mood", "gloomy", &record, None)
        .await
        .is_err());
    assert!(!service.cancel_edit(RECORD, &mood()));

    assert_eq!(translator.started(), 1);
    assert_eq!(service.stats().conflicts_rejected, 3);

    // 丢弃进行中的提交后字段回到编辑状态，输入保留
    drop(first);
    assert_eq!(service.field_state(RECORD, &mood()), FieldState::Editing);
    assert_eq!(service.edit_buffer(RECORD, &mood()).as_deref(), Some("melancholic"));
}

/// 提交失败时保留编辑状态和缓冲区
#[tokio::test]
async fn test_failed_commit_keeps_buffer() {
    let translator = MockTranslator::new(MockMode::Failing);
    let service = service_with(translator.clone());
    let record = sample_record();

    let seed = service.begin_edit(RECORD, &mood(), &record, None).unwrap();
    assert_eq!(seed, "happy");
    service.update_edit(RECORD, &mood(), "sad").unwrap();

    let err = service.commit_edit(RECORD, &mood(), &record, None).await.unwrap_err();
    assert!(matches!(err, SyncError::TranslationCallFailure { .. }));

    assert_eq!(service.field_state(RECORD, &mood()), FieldState::Editing);
    assert_eq!(service.edit_buffer(RECORD, &mood()).as_deref(), Some("sad"));
    assert_eq!(service.stats().edits_failed, 1);

    // 可以继续修改后重试
    service.update_edit(RECORD, &mood(), "gloomy").unwrap();
    assert!(service.commit_edit(RECORD, &mood(), &record, None).await.is_err());
    assert_eq!(translator.calls()[1].texts, vec!["gloomy"]);
}

/// 取消编辑不发出调用
#[tokio::test]
async fn test_cancel_makes_no_call() {
    let translator = MockTranslator::tagging();
    let service = service_with(translator.clone());
    let record = sample_record();

    service.begin_edit(RECORD, &mood(), &record, None).unwrap();
    service.update_edit(RECORD, &mood(), "sad").unwrap();
    assert!(service.cancel_edit(RECORD, &mood()));

    assert_eq!(service.field_state(RECORD, &mood()), FieldState::Viewing);
    assert_eq!(translator.call_count(), 0);
    assert!(service.update_edit(RECORD, &mood(), "x").is_err());
}

/// 编辑缓冲区用缓存值填充
#[tokio::test]
async fn test_begin_edit_shows_cached_value() {
    let translator = MockTranslator::tagging();
    let service = service_with(translator.clone());
    let record = sample_record();

    let first = service
        .synchronize(&record, None, &service.detect_changed_sections(None, &record))
        .await
        .unwrap();

    let seed = service
        .begin_edit(RECORD, &mood(), &first.record, Some(&first.cache))
        .unwrap();
    assert_eq!(seed, "ko:happy");
}

/// 未知字段不占用编辑槽位
#[tokio::test]
async fn test_unknown_field_is_invalid_input() {
    let service = service_with(MockTranslator::tagging());
    let record = sample_record();

    let err = service
        .edit_field(RECORD, SectionId::Style, "vibe", "cozy", &record, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidInput(_)));

    let err = service
        .edit_field(RECORD, SectionId::UiSpecific, "color_theme", "dark", &record, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::SchemaMismatch { .. }));

    assert_eq!(service.field_state(RECORD, &mood()), FieldState::Viewing);
    assert!(service.begin_edit(RECORD, &mood(), &record, None).is_ok());
}

/// 编辑影响正向提示词时，下一轮同步重新生成
#[tokio::test]
async fn test_session_refreshes_positive_prompt_after_edit() {
    let translator = MockTranslator::tagging();
    let service = service_with(translator.clone());

    let mut session = AnalysisSession::new("s1");
    session.apply_analysis(&service, sample_record()).await.unwrap();
    let before = session.cache().unwrap().positive_prompt.clone();
    assert!(before.is_some());

    session.edit(&service, &mood(), "melancholic").await.unwrap();
    assert_eq!(session.cache().unwrap().positive_prompt, None);
    assert_eq!(session.revision(), 2);

    translator.clear();
    let current = session.record().unwrap().clone();
    let change_set = session.apply_analysis(&service, current).await.unwrap();
    assert!(change_set.is_noop());

    let calls = translator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].texts.len(), 1);
    let positive = session.cache().unwrap().positive_prompt.clone().unwrap();
    assert!(positive.contains("melancholic"));
    assert_ne!(Some(positive), before);
}

/// 共用一个服务的两个会话各自持有编辑槽位
#[tokio::test]
async fn test_sessions_sharing_a_service_edit_independently() {
    let translator = MockTranslator::tagging();
    let service = service_with(translator.clone());

    let mut grim = sample_record();
    grim.style.set("mood", "grim");
    let a = AnalysisSession::from_parts("a", sample_record(), None).unwrap();
    let mut b = AnalysisSession::from_parts("b", grim, None).unwrap();

    let seed_a = service.begin_edit(a.id(), &mood(), a.record().unwrap(), None).unwrap();
    assert_eq!(seed_a, "happy");
    service.update_edit(a.id(), &mood(), "sad").unwrap();

    // 第二个会话看到的是自己的值，而不是另一个会话的缓冲区
    let seed_b = service.begin_edit(b.id(), &mood(), b.record().unwrap(), None).unwrap();
    assert_eq!(seed_b, "grim");
    assert_eq!(b.edit_state(&service, &mood()), FieldState::Editing);

    b.edit(&service, &mood(), "gloomy").await.unwrap();
    assert_eq!(b.record().unwrap().style.get("mood"), Some("gloomy"));
    assert_eq!(
        b.cache().unwrap().section(SectionId::Style).and_then(|s| s.get("mood")),
        Some("ko:gloomy")
    );
    assert_eq!(translator.calls()[0].texts, vec!["gloomy"]);

    // 第一个会话的编辑不受影响
    assert_eq!(service.edit_buffer(a.id(), &mood()).as_deref(), Some("sad"));
    assert_eq!(a.edit_state(&service, &mood()), FieldState::Editing);
    assert_eq!(b.edit_state(&service, &mood()), FieldState::Viewing);
    assert_eq!(service.stats().conflicts_rejected, 0);
}

/// 一个会话的失败编辑不阻塞其他会话，取消后槽位释放
#[tokio::test]
async fn test_failed_session_edit_does_not_block_other_sessions() {
    let translator = MockTranslator::new(MockMode::Failing);
    let service = service_with(translator.clone());

    let mut first = AnalysisSession::from_parts("first", sample_record(), None).unwrap();
    let mut second = AnalysisSession::from_parts("second", sample_record(), None).unwrap();

    let err = first.edit(&service, &mood(), "sad").await.unwrap_err();
    assert!(matches!(err, SyncError::TranslationCallFailure { .. }));
    assert_eq!(first.edit_state(&service, &mood()), FieldState::Editing);

    let lighting = FieldTarget::new(SectionId::Style, "lighting").unwrap();
    let err = second.edit(&service, &lighting, "dim").await.unwrap_err();
    assert!(matches!(err, SyncError::TranslationCallFailure { .. }));
    assert_eq!(translator.call_count(), 2);

    // 同一会话内切换字段仍然冲突
    let err = first.edit(&service, &lighting, "dim").await.unwrap_err();
    assert!(matches!(err, SyncError::ConcurrentEditConflict { .. }));
    assert_eq!(translator.call_count(), 2);

    assert!(first.cancel_edit(&service, &mood()));
    assert!(!first.cancel_edit(&service, &mood()));
    assert_eq!(first.edit_state(&service, &mood()), FieldState::Viewing);
    assert_eq!(service.active_edit(first.id()), None);
    assert_eq!(service.active_edit(second.id()), Some(lighting.clone()));
    assert_eq!(first.revision(), 0);
    assert_eq!(second.revision(), 0);
}
