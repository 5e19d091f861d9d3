use insight_types::voice::{VoiceModel, VoiceProfile};
use insight_voice::{SpeechSynthesizer, TtsService, VoiceError};

fn piper_profile(language: &str, model_path: &str, speed: f32) -> VoiceProfile {
    VoiceProfile {
        language: language.to_string(),
        model: VoiceModel::Piper,
        model_path: model_path.to_string(),
        config_path: None,
        speed,
        speaker_id: None,
        sample_rate: 22_050,
    }
}

#[tokio::test]
async fn profiles_are_keyed_by_language() {
    let service = TtsService::new("assets/voices", "piper");

    let english = piper_profile("en", "en.onnx", 1.0);
    service.add_profile(english.clone()).await;
    service.add_profile(VoiceProfile::system("ja")).await;

    assert_eq!(service.get_profile("en").await, Some(english.clone()));
    // Regional tags fall back to the base language.
    assert_eq!(service.get_profile("en-GB").await, Some(english));
    assert_eq!(
        service.get_profile("ja_JP").await.map(|p| p.model),
        Some(VoiceModel::System)
    );
    assert!(service.get_profile("fr").await.is_none());
}

#[tokio::test]
async fn unknown_language_is_reported() {
    let service = TtsService::new("assets/voices", "piper");

    let result = service.synthesize("Hello", "fr").await;
    match result {
        Err(VoiceError::ProfileNotFound(language)) => assert_eq!(language, "fr"),
        _ => panic!("Expected ProfileNotFound error, got {:?}", result),
    }
}

#[tokio::test]
async fn blank_and_oversized_text_are_rejected() {
    let service = TtsService::new("assets/voices", "piper");
    service.add_profile(VoiceProfile::system("en")).await;

    assert!(matches!(
        service.synthesize("   ", "en").await,
        Err(VoiceError::Tts(_))
    ));

    let long = "a".repeat(insight_voice::tts::MAX_TTS_INPUT_BYTES + 1);
    match service.synthesize(&long, "en").await {
        Err(VoiceError::Tts(msg)) => assert!(msg.contains("exceeds maximum size")),
        other => panic!("Expected size error, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_model_file_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    let service = TtsService::new(temp_dir.path(), "piper");
    service
        .add_profile(piper_profile("en", "missing.onnx", 1.0))
        .await;

    let result = service.synthesize("Hello", "en").await;
    match result {
        Err(VoiceError::Tts(msg)) => assert!(msg.contains("Model file not found")),
        _ => panic!("Expected Tts error about missing model, got {:?}", result),
    }
}

#[tokio::test]
async fn out_of_range_speed_is_a_config_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::File::create(temp_dir.path().join("test.onnx")).unwrap();
    let service = TtsService::new(temp_dir.path(), "piper");

    for speed in [0.0, 0.001, 100.0] {
        service
            .add_profile(piper_profile("en", "test.onnx", speed))
            .await;
        match service.synthesize("Hello", "en").await {
            Err(VoiceError::Config(msg)) => {
                assert!(msg.contains("between 0.1 and 10.0"), "got: {}", msg)
            }
            other => panic!("Expected Config error for speed {speed}, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn missing_espeak_binary_is_a_tts_error() {
    let service =
        TtsService::new("assets/voices", "piper").with_espeak_binary("/nonexistent/espeak-ng");
    service.add_profile(VoiceProfile::system("en")).await;

    match service.synthesize("Hello", "en").await {
        Err(VoiceError::Tts(msg)) => assert!(msg.contains("Failed to spawn espeak-ng")),
        other => panic!("Expected spawn failure, got {:?}", other),
    }
}
