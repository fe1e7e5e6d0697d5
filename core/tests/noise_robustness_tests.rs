use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tonewire_core::{
    BfskEncoder, DecodedFrame, Detection, FrameDetector, MessageQueue, ModemConfig,
    StreamingDecoder,
};

const MESSAGE: &str = "Hello, Audio Modem!";

fn setup() -> (BfskEncoder, FrameDetector) {
    let config = ModemConfig::default();
    let encoder = BfskEncoder::new(config.clone()).expect("Failed to create encoder");
    let detector = FrameDetector::new(&config).expect("Failed to create detector");
    (encoder, detector)
}

/// Add gaussian noise with standard deviation `sigma`, saturating at the i8
/// range like a real 8-bit capture would
fn add_noise(samples: &[i8], sigma: f64, seed: u64) -> Vec<i8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).expect("valid sigma");
    samples
        .iter()
        .map(|&s| (f64::from(s) + normal.sample(&mut rng)).round().clamp(-128.0, 127.0) as i8)
        .collect()
}

fn frame_of(detection: Detection) -> Option<DecodedFrame> {
    match detection {
        Detection::Frame(frame) => Some(frame),
        _ => None,
    }
}

#[test]
fn test_decodes_with_light_noise_everywhere() {
    let (encoder, detector) = setup();
    let mut rng = StdRng::seed_from_u64(7);

    for seed in 0..10u64 {
        let lead = rng.gen_range(0..2000);
        let mut samples = vec![0i8; lead];
        samples.extend(encoder.encode(MESSAGE));
        samples.extend(vec![0i8; 2000]);
        let noisy = add_noise(&samples, 8.0, seed);

        let frame = frame_of(detector.detect(&noisy))
            .unwrap_or_else(|| panic!("no frame with seed {} lead {}", seed, lead));
        assert_eq!(frame.text, MESSAGE, "seed {} lead {}", seed, lead);
        assert_eq!(frame.start, lead, "phase lock drifted, seed {}", seed);
    }
}

#[test]
fn test_streaming_decoder_with_noise() {
    let config = ModemConfig::default();
    let encoder = BfskEncoder::new(config.clone()).expect("Failed to create encoder");
    let mut samples = vec![0i8; 12345];
    samples.extend(encoder.encode(MESSAGE));
    samples.extend(vec![0i8; 4000]);
    let noisy = add_noise(&samples, 8.0, 42);

    let decoder =
        StreamingDecoder::new(config, MessageQueue::new()).expect("Failed to create decoder");
    assert!(decoder.feed_audio_data(&noisy));
    assert_eq!(decoder.sink().drain(), vec![MESSAGE]);
}

#[test]
fn test_attenuated_noisy_signal_is_never_misread() {
    let (encoder, detector) = setup();
    let mut samples = vec![0i8; 500];
    samples.extend(encoder.encode("HELLO"));
    samples.extend(vec![0i8; 500]);

    for seed in 0..5u64 {
        let quiet: Vec<i8> = samples.iter().map(|&s| s / 2).collect();
        let noisy = add_noise(&quiet, 10.0, seed);
        assert_eq!(
            detector.detect(&noisy),
            Detection::NoStartMarker,
            "seed {}",
            seed
        );
    }
}

#[test]
fn test_heavy_noise_gives_silence_not_wrong_text() {
    let (encoder, detector) = setup();
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut decoded = 0;

    for sigma in [20.0, 40.0, 60.0, 80.0] {
        for seed in 0..25u64 {
            let lead = rng.gen_range(0..1000);
            let mut samples = vec![0i8; lead];
            samples.extend(encoder.encode(MESSAGE));
            samples.extend(vec![0i8; 1000]);
            let noisy = add_noise(&samples, sigma, seed);

            if let Detection::Frame(frame) = detector.detect(&noisy) {
                assert_eq!(frame.text, MESSAGE, "sigma {} seed {}", sigma, seed);
                decoded += 1;
            }
        }
    }
    assert!(decoded > 0);
}

#[test]
fn test_pure_noise_is_not_a_frame() {
    let (_, detector) = setup();
    let mut rng = StdRng::seed_from_u64(0xBADC0DE);
    let noise: Vec<i8> = (0..48000).map(|_| rng.gen_range(-100..=100)).collect();
    assert_eq!(detector.detect(&noise), Detection::NoStartMarker);

    let decoder = StreamingDecoder::new(ModemConfig::default(), MessageQueue::new())
        .expect("Failed to create decoder");
    assert!(!decoder.feed_audio_data(&noise));
    assert_eq!(decoder.buffered_len(), noise.len());
}

#[test]
fn test_noise_before_frame() {
    let (encoder, detector) = setup();
    let mut rng = StdRng::seed_from_u64(99);
    let mut samples: Vec<i8> = (0..3000).map(|_| rng.gen_range(-20..=20)).collect();
    samples.extend(encoder.encode("after noise"));

    let frame = frame_of(detector.detect(&samples)).expect("frame after noise");
    assert_eq!(frame.text, "after noise");
    assert_eq!(frame.start, 3000);
}

#[test]
fn test_detection_is_deterministic() {
    let (encoder, detector) = setup();
    let noisy = add_noise(&encoder.encode("same every time"), 8.0, 3);

    let first = detector.detect(&noisy);
    for _ in 0..3 {
        assert_eq!(detector.detect(&noisy), first);
    }
    assert!(matches!(first, Detection::Frame(_)));
}
