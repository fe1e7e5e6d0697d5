use std::time::Duration;
use tonewire_core::pcm::{f32_to_i8, i8_to_f32};
use tonewire_core::{BfskEncoder, Clock, MessageQueue, ModemConfig, StreamingDecoder};
use wasm_bindgen::prelude::*;

fn modem_config(sample_rate: u32, baud_rate: u32, freq_zero: f64, freq_one: f64) -> ModemConfig {
    ModemConfig::default()
        .with_sample_rate(sample_rate)
        .with_baud_rate(baud_rate)
        .with_tones(freq_zero, freq_one)
        .with_buffer_capacity(sample_rate as usize * 10)
}

fn to_js(e: impl ToString) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Milliseconds from `Date.now()`; `Instant` is unavailable in the browser
struct DateClock {
    origin_ms: f64,
}

impl DateClock {
    fn new() -> Self {
        Self {
            origin_ms: js_sys::Date::now(),
        }
    }
}

impl Clock for DateClock {
    fn now(&self) -> Duration {
        let elapsed_ms = (js_sys::Date::now() - self.origin_ms).max(0.0);
        Duration::from_secs_f64(elapsed_ms / 1000.0)
    }
}

#[wasm_bindgen]
pub struct WasmEncoder {
    inner: BfskEncoder,
}

#[wasm_bindgen]
impl WasmEncoder {
    #[wasm_bindgen(constructor)]
    pub fn new(
        sample_rate: u32,
        baud_rate: u32,
        freq_zero: f64,
        freq_one: f64,
    ) -> Result<WasmEncoder, JsValue> {
        BfskEncoder::new(modem_config(sample_rate, baud_rate, freq_zero, freq_one))
            .map(|inner| WasmEncoder { inner })
            .map_err(to_js)
    }

    /// Encode text into signed 8-bit samples (Int8Array)
    #[wasm_bindgen]
    pub fn encode(&self, text: &str) -> Vec<i8> {
        self.inner.encode(text)
    }

    /// Encode text into `[-1, 1]` samples for Web Audio (Float32Array)
    #[wasm_bindgen(js_name = encodeF32)]
    pub fn encode_f32(&self, text: &str) -> Vec<f32> {
        self.inner.encode(text).into_iter().map(i8_to_f32).collect()
    }
}

/// Streaming decoder for microphone input; poll `nextMessage` after feeding
#[wasm_bindgen]
pub struct WasmDecoder {
    inner: StreamingDecoder<MessageQueue, DateClock>,
}

#[wasm_bindgen]
impl WasmDecoder {
    #[wasm_bindgen(constructor)]
    pub fn new(
        sample_rate: u32,
        baud_rate: u32,
        freq_zero: f64,
        freq_one: f64,
    ) -> Result<WasmDecoder, JsValue> {
        let config = modem_config(sample_rate, baud_rate, freq_zero, freq_one);
        StreamingDecoder::with_clock(config, MessageQueue::new(), DateClock::new())
            .map(|inner| WasmDecoder { inner })
            .map_err(to_js)
    }

    /// Feed signed 8-bit samples; returns true when a message was decoded
    #[wasm_bindgen]
    pub fn feed(&self, samples: &[i8]) -> bool {
        self.inner.feed_audio_data(samples)
    }

    /// Feed Web Audio samples in `[-1, 1]`
    #[wasm_bindgen(js_name = feedF32)]
    pub fn feed_f32(&self, samples: &[f32]) -> bool {
        let samples: Vec<i8> = samples.iter().copied().map(f32_to_i8).collect();
        self.inner.feed_audio_data(&samples)
    }

    /// Run a pass now regardless of the rate limit
    #[wasm_bindgen(js_name = decodeNow)]
    pub fn decode_now(&self) -> bool {
        self.inner.decode_now()
    }

    /// Oldest undelivered message, if any
    #[wasm_bindgen(js_name = nextMessage)]
    pub fn next_message(&self) -> Option<String> {
        self.inner.sink().pop()
    }

    #[wasm_bindgen(js_name = bufferedLen)]
    pub fn buffered_len(&self) -> usize {
        self.inner.buffered_len()
    }
}
