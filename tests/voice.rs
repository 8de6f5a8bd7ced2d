//! Voice pipeline integration tests
//!
//! Tests segmentation and PCM plumbing without requiring audio hardware

use herald_gateway::voice::{
    pcm_f32le_to_samples, samples_to_wav, VadState, VoiceActivityDetector, SAMPLE_RATE,
};
use std::io::Cursor;

mod common;

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed samples to the detector in 0.1s chunks, returning the first segment
fn push_chunked(vad: &mut VoiceActivityDetector, samples: &[f32]) -> Option<Vec<f32>> {
    for chunk in samples.chunks(SAMPLE_RATE as usize / 10) {
        if let Some(utterance) = vad.push(chunk) {
            return Some(utterance);
        }
    }
    None
}

#[test]
fn detector_starts_idle() {
    let vad = VoiceActivityDetector::new();
    assert_eq!(vad.state(), VadState::Idle);
    assert_eq!(vad.buffered(), 0);
}

#[test]
fn silence_never_segments() {
    let mut vad = VoiceActivityDetector::new();
    let silence = generate_silence(3.0);

    assert!(push_chunked(&mut vad, &silence).is_none());
    assert_eq!(vad.state(), VadState::Idle);
}

#[test]
fn speech_followed_by_silence_segments() {
    let mut vad = VoiceActivityDetector::new();

    let mut audio = generate_sine_samples(440.0, 0.5, 0.3);
    audio.extend(generate_silence(0.6));

    let utterance = push_chunked(&mut vad, &audio).expect("utterance should complete");

    // The segment carries the speech plus the trailing hangover
    assert!(utterance.len() >= SAMPLE_RATE as usize / 2);
    assert_eq!(vad.state(), VadState::Idle);
    assert_eq!(vad.buffered(), 0);
}

#[test]
fn short_blip_does_not_segment() {
    let mut vad = VoiceActivityDetector::new();

    // 0.1s of speech is below the minimum voiced length
    let mut audio = generate_sine_samples(440.0, 0.1, 0.3);
    audio.extend(generate_silence(1.5));

    assert!(push_chunked(&mut vad, &audio).is_none());
    assert_eq!(vad.state(), VadState::Idle);
}

#[test]
fn detector_recovers_for_the_next_utterance() {
    let mut vad = VoiceActivityDetector::new();

    let mut first = generate_sine_samples(440.0, 0.5, 0.3);
    first.extend(generate_silence(0.6));
    let first_segment = push_chunked(&mut vad, &first).expect("first utterance");

    let mut second = generate_sine_samples(300.0, 0.4, 0.3);
    second.extend(generate_silence(0.6));
    let second_segment = push_chunked(&mut vad, &second).expect("second utterance");

    // Segments are independent buffers, not accumulations
    assert!(second_segment.len() <= second.len());
    assert!(first_segment.len() <= first.len());
}

#[test]
fn reset_drops_partial_segments() {
    let mut vad = VoiceActivityDetector::new();

    let speech = generate_sine_samples(440.0, 0.2, 0.3);
    vad.push(&speech);
    assert_eq!(vad.state(), VadState::Speech);
    assert!(vad.buffered() > 0);

    vad.reset();
    assert_eq!(vad.state(), VadState::Idle);
    assert_eq!(vad.buffered(), 0);
}

#[test]
fn samples_encode_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
    assert!(wav_data.len() > 44);
}

#[test]
fn wav_round_trip_preserves_shape() {
    let original: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original, SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(read_samples.len(), original.len());
}

#[test]
fn pcm_f32le_decodes_synthesized_audio() {
    let samples = [0.1f32, -0.25, 0.75];
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    let decoded = pcm_f32le_to_samples(&bytes);
    assert_eq!(decoded, samples);
}
