//! Bulk chapter runs: retries, warnings, failures and resumption.

mod test_utils;

use futures::StreamExt;
use scrivener_core::{BulkEvent, ProgressEvent, ProgressStatus, StageOptions, WorkflowStep};
use scrivener_error::WorkflowErrorKind;
use scrivener_workflow::{BulkOptions, EngineConfig, EngineConfigBuilder, prompts};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{
    FailingValidator, FixedValidator, ScriptedGenerator, SequenceValidator, engine_with, outlined,
};

fn progress(events: &[BulkEvent]) -> Vec<&ProgressEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            BulkEvent::Progress(p) => Some(p),
            _ => None,
        })
        .collect()
}

fn statuses_for(events: &[BulkEvent], chapter_number: u32) -> Vec<ProgressStatus> {
    progress(events)
        .into_iter()
        .filter(|p| p.chapter_number == chapter_number)
        .map(|p| p.status)
        .collect()
}

#[tokio::test]
async fn chapters_clearing_threshold_complete_first_time() {
    let generator = Arc::new(ScriptedGenerator::new(3));
    let validator = Arc::new(FixedValidator::new(0.9));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 3).await;

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::with_threshold(0.7))
        .await
        .unwrap()
        .collect()
        .await;

    for n in 1..=3 {
        assert_eq!(
            statuses_for(&events, n),
            vec![
                ProgressStatus::Generating,
                ProgressStatus::Validating,
                ProgressStatus::Completed
            ]
        );
    }
    let done: Vec<_> = progress(&events)
        .into_iter()
        .filter(|p| p.status == ProgressStatus::Completed)
        .collect();
    assert_eq!(
        done.iter().map(|p| (p.current, p.total)).collect::<Vec<_>>(),
        vec![(1, 3), (2, 3), (3, 3)]
    );
    assert!(done.iter().all(|p| p.validation_score == Some(0.9)));
    assert!(done.iter().all(|p| p.chapter.is_some() && p.word_count == Some(6)));
    assert!(done.iter().all(|p| p.estimated_time_remaining.is_some()));

    match events.last() {
        Some(BulkEvent::Complete(complete)) => {
            assert_eq!(*complete.workflow.current_step(), WorkflowStep::Completed);
            assert_eq!(complete.workflow.chapters().len(), 3);
            assert!(complete.avg_time_per_chapter <= complete.total_time);
        }
        other => panic!("expected complete event, got {:?}", other),
    }
    assert_eq!(generator.stream_calls(), 3);
}

#[tokio::test]
async fn low_scores_exhaust_attempts_with_warning() {
    let generator = Arc::new(ScriptedGenerator::new(3));
    let validator = Arc::new(FixedValidator::new(0.5));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 3).await;

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::with_threshold(0.9))
        .await
        .unwrap()
        .collect()
        .await;

    for n in 1..=3 {
        let statuses = statuses_for(&events, n);
        assert_eq!(statuses.first(), Some(&ProgressStatus::Generating));
        assert_eq!(statuses.last(), Some(&ProgressStatus::CompletedWithWarning));
        assert_eq!(
            statuses
                .iter()
                .filter(|s| **s == ProgressStatus::Regenerating)
                .count(),
            2
        );
    }

    let regenerating: Vec<_> = progress(&events)
        .into_iter()
        .filter(|p| p.status == ProgressStatus::Regenerating && p.chapter_number == 1)
        .collect();
    assert_eq!(regenerating[0].attempt, Some(2));
    assert_eq!(regenerating[1].attempt, Some(3));
    assert_eq!(regenerating[0].validation_score, Some(0.5));
    assert_eq!(regenerating[0].validation_threshold, Some(0.9));

    let workflow = engine.get(id).await.unwrap();
    for chapter in workflow.chapters().values() {
        assert_eq!(chapter.attempts, 3);
        assert_eq!(chapter.validation_score, Some(0.5));
    }
    assert_eq!(*workflow.current_step(), WorkflowStep::Completed);
    assert_eq!(generator.stream_calls(), 9);
    assert_eq!(validator.call_count(), 9);

    let retries = generator.requests_for(prompts::CHAPTER_SYSTEM);
    assert!(!retries[0].prompt.contains("Raise the stakes."));
    assert!(retries[1].prompt.contains("Raise the stakes."));
}

#[tokio::test]
async fn retry_stops_once_threshold_is_cleared() {
    let generator = Arc::new(ScriptedGenerator::new(1));
    let validator = Arc::new(SequenceValidator::new(vec![0.4, 0.8]));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 1).await;

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::with_threshold(0.7))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        statuses_for(&events, 1),
        vec![
            ProgressStatus::Generating,
            ProgressStatus::Validating,
            ProgressStatus::Regenerating,
            ProgressStatus::Validating,
            ProgressStatus::Completed
        ]
    );
    let story = engine.get(id).await.unwrap();
    let chapter = &story.chapters()[&1];
    assert_eq!(chapter.attempts, 2);
    assert_eq!(chapter.validation_score, Some(0.8));
    assert_eq!(chapter.validation_feedback.as_deref(), Some("Attempt 2 notes"));
}

#[tokio::test]
async fn transport_error_halts_run_and_keeps_earlier_chapters() {
    let generator = Arc::new(ScriptedGenerator::new(3).failing_stream_on(2));
    let validator = Arc::new(FixedValidator::new(0.9));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 3).await;

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::default())
        .await
        .unwrap()
        .collect()
        .await;

    match events.last() {
        Some(BulkEvent::Error(error)) => {
            assert_eq!(error.chapter_number, Some(2));
            assert!(error.message.contains("connection reset"));
        }
        other => panic!("expected error event, got {:?}", other),
    }
    assert!(statuses_for(&events, 3).is_empty());
    assert!(!events.iter().any(|e| matches!(e, BulkEvent::Complete(_))));

    let workflow = engine.get(id).await.unwrap();
    assert_eq!(*workflow.current_step(), WorkflowStep::ChapterGeneration);
    assert_eq!(workflow.chapters().keys().copied().collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn rerun_resumes_at_first_missing_chapter() {
    let generator = Arc::new(ScriptedGenerator::new(3).failing_stream_on(2));
    let validator = Arc::new(FixedValidator::new(0.9));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 3).await;

    let _: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::default())
        .await
        .unwrap()
        .collect()
        .await;
    let first_chapter = engine.get(id).await.unwrap().chapters()[&1].clone();

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::with_threshold(1.0))
        .await
        .unwrap()
        .collect()
        .await;

    let first = progress(&events)[0];
    assert_eq!((first.chapter_number, first.current, first.total), (2, 1, 2));
    assert!(matches!(events.last(), Some(BulkEvent::Complete(_))));

    let workflow = engine.get(id).await.unwrap();
    assert_eq!(workflow.chapters()[&1], first_chapter);
    assert_eq!(*workflow.current_step(), WorkflowStep::Completed);
}

#[tokio::test]
async fn nothing_pending_completes_immediately() {
    let generator = Arc::new(ScriptedGenerator::new(1));
    let validator = Arc::new(FixedValidator::new(0.9));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 1).await;
    engine.generate_chapter(id, 1, StageOptions::default()).await.unwrap();

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::default())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        BulkEvent::Complete(complete) => {
            assert_eq!(complete.avg_time_per_chapter, 0.0);
            assert_eq!(*complete.workflow.current_step(), WorkflowStep::Completed);
        }
        other => panic!("expected complete event, got {:?}", other),
    }
    assert_eq!(generator.stream_calls(), 1);
}

#[tokio::test]
async fn unavailable_validator_accepts_without_score() {
    let generator = Arc::new(ScriptedGenerator::new(2));
    let validator = Arc::new(FailingValidator::default());
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 2).await;

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::with_threshold(0.9))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(statuses_for(&events, 2).last(), Some(&ProgressStatus::Completed));
    let workflow = engine.get(id).await.unwrap();
    assert!(workflow.chapters().values().all(|c| c.validation_score.is_none() && c.attempts == 1));
    assert_eq!(generator.stream_calls(), 2);
}

#[tokio::test]
async fn preconditions_fail_before_streaming() {
    let generator = Arc::new(ScriptedGenerator::new(2));
    let validator = Arc::new(FixedValidator::new(0.9));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 2).await;

    let err = engine
        .generate_all_chapters(id, BulkOptions::with_threshold(1.5))
        .await
        .err()
        .unwrap();
    assert!(matches!(err.workflow_kind(), Some(WorkflowErrorKind::InvalidInput(_))));

    let fresh = engine
        .create("Another keeper", Default::default())
        .await
        .unwrap();
    let err = engine
        .generate_all_chapters(*fresh.id(), BulkOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err.workflow_kind(), Some(WorkflowErrorKind::StepPrecondition { .. })));
    assert_eq!(generator.stream_calls(), 0);
}

#[tokio::test]
async fn dropping_the_stream_releases_the_workflow() {
    let generator = Arc::new(ScriptedGenerator::new(2));
    let validator = Arc::new(FixedValidator::new(0.9));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let id = outlined(&engine, 2).await;

    let mut events = engine
        .generate_all_chapters(id, BulkOptions::default())
        .await
        .unwrap();
    let first = events.next().await.unwrap();
    assert!(matches!(first, BulkEvent::Progress(ref p) if p.status == ProgressStatus::Generating));
    drop(events);

    assert!(engine.get(id).await.unwrap().chapters().is_empty());
    let workflow = tokio::time::timeout(
        Duration::from_secs(5),
        engine.generate_chapter(id, 1, StageOptions::default()),
    )
    .await
    .expect("workflow lock was released")
    .unwrap();
    assert_eq!(workflow.chapters().len(), 1);
}

#[tokio::test]
async fn open_stream_blocks_other_writers_of_the_same_workflow_only() {
    let generator = Arc::new(ScriptedGenerator::new(2));
    let validator = Arc::new(FixedValidator::new(0.9));
    let engine = engine_with(&generator, &validator, EngineConfig::default());
    let busy = outlined(&engine, 2).await;
    let other = outlined(&engine, 1).await;

    let mut events = engine
        .generate_all_chapters(busy, BulkOptions::default())
        .await
        .unwrap();
    assert!(matches!(events.next().await, Some(BulkEvent::Progress(_))));

    let blocked = tokio::time::timeout(
        Duration::from_millis(100),
        engine.generate_chapter(busy, 1, StageOptions::default()),
    )
    .await;
    assert!(blocked.is_err(), "writer ran while the bulk stream held the workflow");

    let elsewhere = tokio::time::timeout(
        Duration::from_secs(5),
        engine.generate_chapter(other, 1, StageOptions::default()),
    )
    .await
    .expect("a different workflow is not blocked")
    .unwrap();
    assert_eq!(elsewhere.chapters().len(), 1);

    drop(events);
    let workflow = tokio::time::timeout(
        Duration::from_secs(5),
        engine.generate_chapter(busy, 1, StageOptions::default()),
    )
    .await
    .expect("workflow is free once the stream is dropped")
    .unwrap();
    assert_eq!(workflow.chapters().len(), 1);
}

#[tokio::test]
async fn configured_attempt_cap_is_honoured() {
    let generator = Arc::new(ScriptedGenerator::new(1));
    let validator = Arc::new(FixedValidator::new(0.1));
    let config = EngineConfigBuilder::default().max_attempts(1u32).build().unwrap();
    let engine = engine_with(&generator, &validator, config);
    let id = outlined(&engine, 1).await;

    let events: Vec<BulkEvent> = engine
        .generate_all_chapters(id, BulkOptions::default())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        statuses_for(&events, 1),
        vec![
            ProgressStatus::Generating,
            ProgressStatus::Validating,
            ProgressStatus::CompletedWithWarning
        ]
    );
    assert_eq!(engine.get(id).await.unwrap().chapters()[&1].attempts, 1);
}
