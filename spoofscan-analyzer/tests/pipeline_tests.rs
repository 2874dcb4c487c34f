//! Pipeline Integration Tests
//!
//! Runs whole requests through gateway, normalizer, segmenter, frame cache,
//! dispatcher and aggregator with in-memory collaborators.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::*;
use spoofscan_analyzer::cache::MemoryKvStore;
use spoofscan_analyzer::scoring::EnergyScorer;
use spoofscan_analyzer::types::AnalysisRequest;
use spoofscan_analyzer::AnalysisError;

fn tone(duration_seconds: f64) -> Vec<u8> {
    generate_wav_bytes(&WavConfig {
        duration_seconds,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_ten_seconds_yields_three_sorted_predictions() {
    let store = store_with(&[("clip.wav", tone(10.0))]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(EnergyScorer::default()),
        PipelineOptions::default(),
    );

    let response = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await
        .unwrap();

    let bounds: Vec<(f64, f64)> = response
        .predictions
        .iter()
        .map(|p| (p.start_time, p.end_time))
        .collect();
    assert_eq!(bounds, vec![(0.0, 4.0), (4.0, 8.0), (8.0, 12.0)]);

    let ids: Vec<&str> = response.predictions.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["chunk_0", "chunk_1", "chunk_2"]);

    for prediction in &response.predictions {
        assert!((0.0..=1.0).contains(&prediction.score));
        // Four decimal places at most
        let scaled = prediction.score * 10_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }
    assert!(response.error_summary.is_empty());
}

#[tokio::test]
async fn test_stereo_44k_is_resampled_before_segmenting() {
    let bytes = generate_wav_bytes(&WavConfig {
        duration_seconds: 10.0,
        sample_rate: 44_100,
        channels: 2,
        amplitude: 0.3,
    })
    .unwrap();
    let store = store_with(&[("stereo.wav", bytes)]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    let response = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "stereo.wav"))
        .await
        .unwrap();

    assert_eq!(response.predictions.len(), 3);
    assert_eq!(response.predictions[0].score, 0.7322);
}

#[tokio::test]
async fn test_missing_object_is_not_found_without_cache_writes() {
    let store = store_with(&[]).await;
    let kv = Arc::new(CountingKvStore::new());
    let pipeline = build_pipeline(
        store,
        kv.clone(),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    let result = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "missing.wav"))
        .await;

    assert!(matches!(result, Err(AnalysisError::NotFound(_))));
    assert_eq!(kv.set_count(), 0);
}

#[tokio::test]
async fn test_missing_bucket_is_not_found() {
    let store = store_with(&[("clip.wav", tone(1.0))]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    match pipeline
        .analyze(AnalysisRequest::new("other-bucket", "clip.wav"))
        .await
    {
        Err(AnalysisError::NotFound(detail)) => assert!(detail.contains("other-bucket")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_store_is_unavailable() {
    let store = store_with(&[("clip.wav", tone(1.0))]).await;
    store.set_unavailable(true);
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    let result = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await;
    assert!(matches!(result, Err(AnalysisError::Unavailable(_))));
}

#[tokio::test]
async fn test_empty_object_is_internal() {
    let store = store_with(&[("empty.wav", Vec::new())]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    let result = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "empty.wav"))
        .await;
    assert!(matches!(result, Err(AnalysisError::Internal(_))));
}

#[tokio::test]
async fn test_undecodable_bytes_list_every_hint() {
    let store = store_with(&[("noise.bin", b"definitely not audio at all".repeat(64))]).await;
    let kv = Arc::new(CountingKvStore::new());
    let pipeline = build_pipeline(
        store,
        kv.clone(),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    match pipeline
        .analyze(AnalysisRequest::new(BUCKET, "noise.bin"))
        .await
    {
        Err(AnalysisError::UnsupportedFormat(detail)) => {
            for hint in ["wav", "flac", "mp3", "ogg", "mp4", "mkv", "aac"] {
                assert!(detail.contains(&format!("{}:", hint)), "{} missing from {}", hint, detail);
            }
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(kv.set_count(), 0);
}

#[tokio::test]
async fn test_silent_audio_is_empty_audio() {
    let silent = generate_wav_bytes(&WavConfig {
        duration_seconds: 2.0,
        amplitude: 0.0,
        ..Default::default()
    })
    .unwrap();
    let store = store_with(&[("silent.wav", silent)]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    let result = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "silent.wav"))
        .await;
    assert!(matches!(result, Err(AnalysisError::EmptyAudio(_))));
}

#[tokio::test]
async fn test_cache_unreachable_fails_before_scoring() {
    let store = store_with(&[("clip.wav", tone(10.0))]).await;
    let scorer = Arc::new(TallyScorer::default());
    let pipeline = build_pipeline(
        store,
        Arc::new(FailingKvStore::unreachable()),
        scorer.clone(),
        PipelineOptions::default(),
    );

    match pipeline
        .analyze(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await
    {
        Err(AnalysisError::Internal(detail)) => {
            assert!(detail.contains("Error for chunk_0"));
            assert!(detail.contains("Error for chunk_2"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(scorer.call_count(), 0);
}

#[tokio::test]
async fn test_partial_staging_failure_is_reported() {
    let store = store_with(&[("clip.wav", tone(10.0))]).await;
    let scorer = Arc::new(TallyScorer::default());
    let pipeline = build_pipeline(
        store,
        Arc::new(FailingKvStore::failing_frames(&[1])),
        scorer.clone(),
        PipelineOptions::default(),
    );

    let response = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await
        .unwrap();

    let indices: Vec<usize> = response.predictions.iter().map(|p| p.frame_index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(
        response.error_summary,
        "Error for chunk_1: Cache unavailable: connection refused"
    );
    assert_eq!(scorer.call_count(), 2);
}

#[tokio::test]
async fn test_partial_scoring_failure_keeps_survivors() {
    let store = store_with(&[("clip.wav", tone(10.0))]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(PaddingFailScorer),
        PipelineOptions::default(),
    );

    let response = pipeline
        .analyze(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await
        .unwrap();

    let indices: Vec<usize> = response.predictions.iter().map(|p| p.frame_index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(
        response.error_summary,
        "Error for chunk_2: Scoring error: frame is padded"
    );
}

#[tokio::test]
async fn test_every_frame_failing_scoring_is_fatal() {
    // 2 s of audio gives one frame, half of it padding
    let store = store_with(&[("short.wav", tone(2.0))]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(PaddingFailScorer),
        PipelineOptions::default(),
    );

    match pipeline
        .analyze(AnalysisRequest::new(BUCKET, "short.wav"))
        .await
    {
        Err(AnalysisError::Internal(detail)) => {
            assert_eq!(detail, "Error for chunk_0: Scoring error: frame is padded");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_staged_frames_kept_until_ttl_by_default() {
    let store = store_with(&[("clip.wav", tone(10.0))]).await;
    let kv = Arc::new(MemoryKvStore::new());
    let pipeline = build_pipeline(
        store,
        kv.clone(),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    pipeline
        .analyze(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await
        .unwrap();
    assert_eq!(kv.len().await, 3);
}

#[tokio::test]
async fn test_evict_after_scoring_clears_staged_frames() {
    let store = store_with(&[("clip.wav", tone(10.0))]).await;
    let kv = Arc::new(MemoryKvStore::new());
    let pipeline = build_pipeline(
        store,
        kv.clone(),
        Arc::new(TallyScorer::default()),
        PipelineOptions {
            evict_after_scoring: true,
            ..Default::default()
        },
    );

    pipeline
        .analyze(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await
        .unwrap();
    assert!(kv.is_empty().await);
}

#[tokio::test]
async fn test_concurrent_requests_use_separate_keys() {
    let store = store_with(&[("a.wav", tone(10.0)), ("b.wav", tone(6.0))]).await;
    let kv = Arc::new(CountingKvStore::new());
    let pipeline = build_pipeline(
        store,
        kv.clone(),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    let (a, b) = tokio::join!(
        pipeline.analyze(AnalysisRequest::new(BUCKET, "a.wav")),
        pipeline.analyze(AnalysisRequest::new(BUCKET, "b.wav")),
    );

    assert_eq!(a.unwrap().predictions.len(), 3);
    assert_eq!(b.unwrap().predictions.len(), 2);
    assert_eq!(kv.set_count(), 5);
    assert_eq!(kv.inner.len().await, 5);
}

#[tokio::test]
async fn test_request_deadline_is_enforced() {
    let store = store_with(&[("clip.wav", tone(10.0))]).await;
    let pipeline = build_pipeline(
        store,
        Arc::new(MemoryKvStore::new()),
        Arc::new(SleepyScorer {
            delay: Duration::from_millis(800),
        }),
        PipelineOptions {
            request_timeout: Duration::from_millis(200),
            ..Default::default()
        },
    );

    let result = pipeline
        .analyze_with_deadline(AnalysisRequest::new(BUCKET, "clip.wav"))
        .await;
    assert!(matches!(result, Err(AnalysisError::DeadlineExceeded(_))));
}

#[tokio::test]
async fn test_missing_fields_are_invalid_argument() {
    let store = store_with(&[]).await;
    let kv = Arc::new(CountingKvStore::new());
    let pipeline = build_pipeline(
        store,
        kv.clone(),
        Arc::new(TallyScorer::default()),
        PipelineOptions::default(),
    );

    let result = pipeline.analyze(AnalysisRequest::default()).await;
    assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    assert_eq!(kv.set_count(), 0);
}
