use audioshift::analysis::{
    compute_magnitude_spectrum, detect_frequency, is_frequency, rms_energy, validate_pitch_shift,
};
use audioshift::SineGenerator;
use proptest::prelude::*;

const SAMPLE_RATE: u32 = 48000;
const N: usize = 8192;

fn tone(freq_hz: f64, frames: usize) -> Vec<f32> {
    SineGenerator::new(freq_hz, SAMPLE_RATE, 1, 0.5)
        .unwrap()
        .generate_float(frames)
}

#[test]
fn detects_reference_tones_within_one_hz() {
    for &f in &[220.0, 432.0, 440.0, 1000.0] {
        let detected = detect_frequency(&tone(f, N), SAMPLE_RATE);
        assert!((detected - f).abs() <= 1.0, "{f} Hz detected as {detected:.3} Hz");
    }
}

#[test]
fn degenerate_signals_detect_nothing() {
    assert_eq!(detect_frequency(&[], SAMPLE_RATE), 0.0);
    assert_eq!(detect_frequency(&[0.5, -0.5, 0.5], SAMPLE_RATE), 0.0);
    assert_eq!(detect_frequency(&vec![0.0; N], SAMPLE_RATE), 0.0);
    assert_eq!(detect_frequency(&tone(440.0, 1024), 0), 0.0);
    assert!(compute_magnitude_spectrum(&[1.0, 0.0, -1.0]).is_empty());
}

#[test]
fn spectrum_has_half_length_plus_one_bins() {
    assert_eq!(compute_magnitude_spectrum(&tone(440.0, 1024)).len(), 513);
    assert_eq!(compute_magnitude_spectrum(&tone(440.0, 1023)).len(), 512);
}

#[test]
fn frequency_checks_use_tolerance() {
    let a4 = tone(440.0, N);
    let a432 = tone(432.0, N);
    assert!(is_frequency(&a4, SAMPLE_RATE, 440.0, 1.0));
    assert!(!is_frequency(&a4, SAMPLE_RATE, 432.0, 3.0));
    assert!(!is_frequency(&vec![0.0; N], SAMPLE_RATE, 0.0, 1.0));
    assert!(validate_pitch_shift(&a4, &a432, SAMPLE_RATE, 440.0, 432.0, 1.0));
    assert!(!validate_pitch_shift(&a4, &a4, SAMPLE_RATE, 440.0, 432.0, 3.0));
}

#[test]
fn rms_of_sine_is_amplitude_over_root_two() {
    let rms = rms_energy(&tone(1000.0, 48000));
    assert!((rms - 0.5 / 2f64.sqrt()).abs() < 1e-3);
    assert_eq!(rms_energy(&[]), 0.0);
}

#[test]
fn generator_rejects_bad_settings() {
    assert!(SineGenerator::new(0.0, SAMPLE_RATE, 1, 0.5).is_err());
    assert!(SineGenerator::new(24000.0, SAMPLE_RATE, 1, 0.5).is_err());
    assert!(SineGenerator::new(440.0, 0, 1, 0.5).is_err());
    assert!(SineGenerator::new(440.0, SAMPLE_RATE, 0, 0.5).is_err());
    assert!(SineGenerator::new(440.0, SAMPLE_RATE, 9, 0.5).is_err());
    assert!(SineGenerator::new(440.0, SAMPLE_RATE, 2, 1.5).is_err());
    assert!(SineGenerator::new(440.0, SAMPLE_RATE, 8, 1.0).is_ok());
}

proptest! {
    #[test]
    fn split_generation_matches_single_call(
        freq in 20.0f64..20000.0,
        half in 1usize..2048,
        channels in 1u16..=8,
    ) {
        let mut whole = SineGenerator::new(freq, SAMPLE_RATE, channels, 0.8).unwrap();
        let mut split = whole.clone();
        let expected = whole.generate_float(2 * half);
        let mut got = split.generate_float(half);
        got.extend(split.generate_float(half));
        prop_assert_eq!(expected, got);
    }

    #[test]
    fn every_channel_carries_the_same_sample(
        freq in 20.0f64..20000.0,
        frames in 1usize..1024,
        channels in 1u16..=8,
    ) {
        let mut gen = SineGenerator::new(freq, SAMPLE_RATE, channels, 0.8).unwrap();
        let out = gen.generate_float(frames);
        prop_assert_eq!(out.len(), frames * channels as usize);
        for frame in out.chunks(channels as usize) {
            prop_assert!(frame.iter().all(|&s| s == frame[0]));
            prop_assert!(frame[0].abs() <= 0.8);
        }
    }
}
