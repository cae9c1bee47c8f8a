//! Integration tests for the runtime.
//!
//! These exercise bootstrap-shaped wiring: options file, voice assets on
//! disk, the mock engine, resolution and post-processing together.

use std::sync::Arc;

use runtime::{MockEngine, SynthesisService, trim_len};
use tts_core::{
    Lang, SUPPORTED_VOICES, ServiceConfig, SynthesisParams, TtsError, VoiceTable,
};

fn style_doc(seed: f32) -> String {
    serde_json::json!({
        "style_ttl": {"dims": [1, 2, 2], "data": [[[seed, 0.1], [0.2, 0.3]]]},
        "style_dp": {"dims": [1, 3], "data": [[seed, -seed, 0.5]]}
    })
    .to_string()
}

fn service_with_voices(ids: &[&str], options: &str) -> Arc<SynthesisService> {
    let dir = tempfile::tempdir().unwrap();
    for (i, id) in ids.iter().enumerate() {
        std::fs::write(dir.path().join(format!("{id}.json")), style_doc(i as f32)).unwrap();
    }
    let options_path = dir.path().join("options.json");
    std::fs::write(&options_path, options).unwrap();

    let config = ServiceConfig::load(&options_path).unwrap();
    let voices = VoiceTable::load(dir.path(), SUPPORTED_VOICES);

    Arc::new(SynthesisService::new(
        config,
        voices,
        Arc::new(MockEngine::new(22_050)),
    ))
}

#[tokio::test]
async fn test_end_to_end_defaults() {
    let service = service_with_voices(&["M4", "F1"], r#"{"default_language": "fr"}"#);
    assert_eq!(service.voices().ids(), vec!["F1", "M4"]);

    let request = service
        .resolver()
        .resolve(SynthesisParams::with_text("Bonjour tout le monde"))
        .unwrap();
    assert_eq!(request.lang, Lang::Fr);
    assert_eq!(request.voice, "M4");

    let result = service.synthesize(request).await.unwrap();
    assert_eq!(result.sample_rate, 22_050);
    assert_eq!(result.num_samples(), trim_len(22_050, result.duration_secs));
    assert!(result.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
}

#[tokio::test]
async fn test_streaming_resolution_with_missing_voice_asset() {
    // M2 is a supported id but has no asset on disk.
    let service = service_with_voices(&["M4"], "{}");

    let request = service
        .resolver()
        .resolve_voice_token(Some("Hello".into()), Some("en_M2"))
        .unwrap();
    assert_eq!(request.lang, Lang::En);
    assert_eq!(request.voice, "M4");

    let err = service
        .resolver()
        .resolve(SynthesisParams {
            voice: Some("M2".into()),
            ..SynthesisParams::with_text("Hello")
        })
        .unwrap_err();
    assert!(matches!(err, TtsError::UnsupportedVoice(_)));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let service = service_with_voices(&["M4", "F1"], "{}");

    let tasks: Vec<_> = ["Un", "Deux trois", "Quatre cinq six"]
        .into_iter()
        .map(|text| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let request = service
                    .resolver()
                    .resolve(SynthesisParams::with_text(text))
                    .unwrap();
                service.synthesize(request).await.unwrap().num_samples()
            })
        })
        .collect();

    let mut lengths = Vec::new();
    for task in tasks {
        lengths.push(task.await.unwrap());
    }
    assert!(lengths[0] < lengths[1] && lengths[1] < lengths[2]);
}
