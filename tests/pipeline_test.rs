// tests/pipeline_test.rs
//
// End-to-end tests of the detection pipeline on synthetic clips:
// base64 WAV in, verdict and confidence out.

mod test_utils;

use test_utils::*;
use voicecheckr::core::decoder::decode_payload;
use voicecheckr::testgen::{self, SignalKind};
use voicecheckr::{
    Classification, ConfigBuilder, DecodeError, DetectError, DetectorConfig, FeatureExtractionError,
    FeatureFamily, Preset, VoiceAnalyzer,
};

fn analyzer() -> VoiceAnalyzer {
    VoiceAnalyzer::new().expect("default configuration is valid")
}

#[test]
fn test_steady_tone_is_ai_generated() {
    let result = analyzer().detect(&base64_wav(&steady_tone(3.0))).unwrap();

    assert_eq!(result.classification, Classification::AiGenerated);
    assert!(result.confidence >= 0.8, "confidence {}", result.confidence);
}

#[test]
fn test_varied_segments_are_human() {
    let report = analyzer().detect_base64(&base64_wav(&varied_voice())).unwrap();

    assert_eq!(report.classification(), Classification::Human);
    assert!(report.confidence() >= 0.6, "confidence {}", report.confidence());

    // Pitch and loudness changes must show up where expected
    for family in [
        FeatureFamily::SpectralCentroid,
        FeatureFamily::RmsEnergy,
        FeatureFamily::ZeroCrossingRate,
    ] {
        let score = report.scores.get(family).unwrap();
        assert!(score.score < 0.1, "{} scored {}", family, score.score);
    }
}

#[test]
fn test_steady_tone_from_mp3_is_ai_generated() {
    // LAME adds priming silence and a pre-echo ramp ahead of the tone
    for rate in [RATE, 44100] {
        let bytes = mp3(&sine(440.0, 0.5, 3.0, rate), rate);
        let report = analyzer()
            .detect_base64(&testgen::encode_base64(&bytes))
            .unwrap();

        assert_eq!(report.audio.as_ref().unwrap().codec, "mp3");
        assert_eq!(report.classification(), Classification::AiGenerated, "{} Hz", rate);
        assert!(
            report.confidence() >= 0.8,
            "{} Hz: confidence {} (mfcc {:?})",
            rate,
            report.confidence(),
            report.scores.get(FeatureFamily::Mfcc)
        );
    }
}

#[test]
fn test_report_contents() {
    let report = analyzer().detect_base64(&base64_wav(&steady_tone(2.0))).unwrap();

    let audio = report.audio.as_ref().unwrap();
    assert_eq!(audio.source_sample_rate, RATE);
    assert_eq!(audio.source_channels, 1);
    assert_eq!(audio.analysis_sample_rate, RATE);
    assert!((audio.duration_secs - 2.0).abs() < 0.01);

    assert_eq!(report.scores.len(), 7);
    assert!(report.scores.get(FeatureFamily::SpectralRolloff).is_none());
    assert!((0.0..=1.0).contains(&report.aggregate_score));
    assert_eq!(report.threshold, 0.5);
    assert_eq!(report.features.frame_count, (44100 - 2048) / 512 + 1);
}

#[test]
fn test_detection_is_deterministic() {
    let payload = base64_of(SignalKind::Varied, 4.0);
    let analyzer = analyzer();

    let first = analyzer.detect_base64(&payload).unwrap();
    let second = analyzer.detect_base64(&payload).unwrap();

    assert_eq!(first.result, second.result);
    assert_eq!(first.aggregate_score, second.aggregate_score);
    assert_eq!(first.features, second.features);
}

#[test]
fn test_decoding_is_idempotent() {
    let payload = base64_wav(&varied_voice());
    let params = DetectorConfig::default().analysis;

    let a = decode_payload(&payload, &params).unwrap();
    let b = decode_payload(&payload, &params).unwrap();
    assert_eq!(a.waveform, b.waveform);
}

#[test]
fn test_garbage_payload_is_decode_error() {
    let err = analyzer().detect("not-base64!!").unwrap_err();
    assert!(matches!(err, DetectError::Decode(DecodeError::InvalidBase64(_))));
    assert!(err.is_client_fault());
}

#[test]
fn test_valid_base64_of_non_audio_is_decode_error() {
    let payload = testgen::encode_base64(b"definitely not an audio container");
    let err = analyzer().detect(&payload).unwrap_err();
    assert!(matches!(err, DetectError::Decode(_)));
}

#[test]
fn test_very_short_clip_is_extraction_error() {
    let err = analyzer()
        .detect(&base64_wav(&steady_tone(0.05)))
        .unwrap_err();
    assert!(matches!(
        err,
        DetectError::FeatureExtraction(FeatureExtractionError::TooShort { .. })
    ));
    assert!(err.is_client_fault());
}

#[test]
fn test_silence_is_rejected() {
    let err = analyzer()
        .detect(&base64_of(SignalKind::Silence, 2.0))
        .unwrap_err();
    assert!(matches!(
        err,
        DetectError::FeatureExtraction(FeatureExtractionError::Silent { .. })
    ));
}

#[test]
fn test_stereo_is_downmixed() {
    let mono = varied_voice();
    let analyzer = analyzer();

    let from_mono = analyzer.detect_bytes(wav(&mono, RATE, 1)).unwrap();
    let from_stereo = analyzer.detect_bytes(wav(&mono, RATE, 2)).unwrap();

    assert_eq!(from_stereo.audio.as_ref().unwrap().source_channels, 2);
    assert_eq!(from_mono.result, from_stereo.result);
    assert_eq!(from_mono.aggregate_score, from_stereo.aggregate_score);
}

#[test]
fn test_other_sample_rates_are_resampled() {
    let tone = testgen::periodic_tone(44100, 1024, 20, 0.5, 2.0);
    let report = analyzer().detect_bytes(wav(&tone, 44100, 1)).unwrap();

    let audio = report.audio.as_ref().unwrap();
    assert_eq!(audio.source_sample_rate, 44100);
    assert_eq!(audio.analysis_sample_rate, RATE);
    assert!((audio.duration_secs - 2.0).abs() < 0.01);
}

#[test]
fn test_clip_longer_than_limit_is_rejected() {
    let long = testgen::periodic_tone(8000, 512, 10, 0.5, 61.0);
    let err = analyzer().detect_bytes(wav(&long, 8000, 1)).unwrap_err();
    assert!(matches!(err, DetectError::Decode(DecodeError::TooLong { .. })));

    let unlimited = ConfigBuilder::new().max_duration(None).build().unwrap();
    let analyzer = VoiceAnalyzer::with_config(unlimited).unwrap();
    assert!(analyzer.detect_bytes(wav(&long, 8000, 1)).is_ok());
}

#[test]
fn test_presets_only_move_the_threshold() {
    let payload = base64_wav(&steady_tone(2.0));

    for preset in Preset::all() {
        let analyzer = VoiceAnalyzer::builder().preset(preset).build().unwrap();
        let report = analyzer.detect_base64(&payload).unwrap();
        assert_eq!(report.classification(), Classification::AiGenerated, "{:?}", preset);
        assert!((report.aggregate_score - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_analyzer_can_be_shared_across_threads() {
    let analyzer = std::sync::Arc::new(analyzer());
    let payload = std::sync::Arc::new(base64_wav(&steady_tone(2.0)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let analyzer = std::sync::Arc::clone(&analyzer);
            let payload = std::sync::Arc::clone(&payload);
            std::thread::spawn(move || analyzer.detect(&payload).unwrap())
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
