//! Decoding real WAV assets through the null sink

mod helpers;

use helpers::audio_generator::{
    generate_sine_wav, write_silent_asset, write_tone_asset, TEST_SAMPLE_RATE,
};
use helpers::settle;
use hush_ap::audio::track::SILENCE_DB;
use hush_ap::audio::{
    AssetLoader, AudioSource, OutputSink, Resampler, SimpleDecoder, SourceLoader,
};
use hush_ap::playback::{EngineOptions, PlaybackEngine};
use hush_ap::Error;
use hush_common::{Category, EventBus, PlaybackState};
use std::sync::Arc;
use std::time::Duration;

fn null_loader(dir: &std::path::Path) -> AssetLoader {
    let sink = Arc::new(OutputSink::null(TEST_SAMPLE_RATE).unwrap());
    AssetLoader::new(dir, sink)
}

#[tokio::test]
async fn test_tone_asset_meters_expected_power() {
    let dir = tempfile::tempdir().unwrap();
    write_tone_asset(dir.path(), Category::WhiteNoise, 0.5);
    let loader = null_loader(dir.path());

    let source = loader.open(Category::WhiteNoise).unwrap();
    assert_eq!(source.category(), Category::WhiteNoise);
    assert_eq!(source.average_power_db(), None);

    source.play();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Sine of amplitude 0.5: mean square 0.125 → about -9 dBFS
    let db = source.average_power_db().unwrap();
    assert!((db - (-9.03)).abs() < 1.0, "power {} dB", db);

    source.pause();
    assert_eq!(source.average_power_db(), None);
}

#[tokio::test]
async fn test_silent_asset_reads_silence() {
    let dir = tempfile::tempdir().unwrap();
    write_silent_asset(dir.path(), Category::Nature);
    let loader = null_loader(dir.path());

    let source = loader.open(Category::Nature).unwrap();
    source.play();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(source.average_power_db(), Some(SILENCE_DB));
}

#[test]
fn test_missing_asset_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let loader = null_loader(dir.path());

    match loader.open(Category::Rhythm) {
        Err(Error::SourceUnavailable { category, reason }) => {
            assert_eq!(category, Category::Rhythm);
            assert!(reason.contains("rhythm_beat"), "reason: {}", reason);
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("expected failure"),
    }
}

#[test]
fn test_undecodable_asset_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("rhythm_beat.mp3"), b"not an mp3").unwrap();
    let loader = null_loader(dir.path());

    assert!(matches!(
        loader.open(Category::Rhythm),
        Err(Error::SourceUnavailable { .. })
    ));
}

#[test]
fn test_mono_asset_at_other_rate_is_resampled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nature_sounds.wav");
    generate_sine_wav(&path, 22050, 1, 500, 220.0, 0.25).unwrap();

    let decoded = SimpleDecoder::decode_file(&path).unwrap();
    assert_eq!(decoded.sample_rate, 22050);
    assert_eq!(decoded.frame_count(), 11025);
    // Mono duplicated to both channels
    let frame = decoded.frame(100).unwrap();
    assert_eq!(frame.left, frame.right);

    let resampled = Resampler::resample(decoded, TEST_SAMPLE_RATE).unwrap();
    assert_eq!(resampled.sample_rate, TEST_SAMPLE_RATE);
    let frames = resampled.frame_count() as i64;
    assert!((frames - 22050).abs() < 100, "frames {}", frames);

    let loader = null_loader(dir.path());
    assert!(loader.open(Category::Nature).is_ok());
}

#[tokio::test]
async fn test_engine_plays_real_assets() {
    let dir = tempfile::tempdir().unwrap();
    write_tone_asset(dir.path(), Category::WhiteNoise, 0.5);
    write_silent_asset(dir.path(), Category::Rhythm);

    let loader = Arc::new(null_loader(dir.path()));
    let engine = PlaybackEngine::new(
        loader,
        Arc::new(EventBus::new()),
        EngineOptions {
            refresh_hz: 100,
            ..Default::default()
        },
    );

    assert_eq!(engine.toggle_playback().await, PlaybackState::Playing);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let loudness = engine.loudness();
    assert!(loudness > 0.8 && loudness < 0.9, "loudness {}", loudness);

    engine.select_category(Category::Rhythm).await;
    assert!(engine.is_playing());
    settle().await;
    assert_eq!(engine.loudness(), 0.0);

    engine.toggle_playback().await;
    assert_eq!(engine.loudness(), 0.0);
}
