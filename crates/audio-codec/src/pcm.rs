//! Float to signed 16-bit little-endian PCM conversion and chunking.

/// Samples per streamed audio chunk.
pub const CHUNK_SAMPLES: usize = 1024;

/// Bytes per sample of the streamed PCM.
pub const SAMPLE_WIDTH: u16 = 2;

/// Streamed audio is always mono.
pub const CHANNELS: u16 = 1;

/// Scale by `i16::MAX` and truncate toward zero.
///
/// Out-of-range input saturates at the i16 bounds.
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample * i16::MAX as f32) as i16
}

/// Convert samples to little-endian signed 16-bit bytes.
pub fn to_pcm16_le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * SAMPLE_WIDTH as usize);
    for &sample in samples {
        bytes.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    bytes
}

/// Split samples into consecutive PCM payloads of `chunk_samples` samples.
///
/// Order is preserved and the last payload may be shorter.
pub fn pcm16_chunks(samples: &[f32], chunk_samples: usize) -> impl Iterator<Item = Vec<u8>> + '_ {
    samples.chunks(chunk_samples.max(1)).map(to_pcm16_le)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_conversion_truncates() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(-1.0), -i16::MAX);
        // 0.5 * 32767 = 16383.5 → 16383
        assert_eq!(sample_to_i16(0.5), 16383);
        assert_eq!(sample_to_i16(-0.5), -16383);
        assert_eq!(sample_to_i16(3.0), i16::MAX);
    }

    #[test]
    fn test_little_endian_layout() {
        let bytes = to_pcm16_le(&[1.0, -1.0]);
        assert_eq!(bytes, vec![0xff, 0x7f, 0x01, 0x80]);
    }

    #[test]
    fn test_chunk_sizes() {
        let samples = vec![0.1f32; 2500];
        let chunks: Vec<_> = pcm16_chunks(&samples, CHUNK_SAMPLES).collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 2048);
        assert_eq!(chunks[1].len(), 2048);
        assert_eq!(chunks[2].len(), (2500 - 2048) * 2);
    }

    #[test]
    fn test_exact_multiple_has_no_short_chunk() {
        let samples = vec![0.0f32; 2048];
        let chunks: Vec<_> = pcm16_chunks(&samples, CHUNK_SAMPLES).collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 2048));
    }

    #[test]
    fn test_chunks_preserve_order() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32 / 100.0).collect();
        let joined: Vec<u8> = pcm16_chunks(&samples, 3).flatten().collect();
        assert_eq!(joined, to_pcm16_le(&samples));
    }

    #[test]
    fn test_empty_input_has_no_chunks() {
        assert_eq!(pcm16_chunks(&[], CHUNK_SAMPLES).count(), 0);
    }
}
