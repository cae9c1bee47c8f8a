//! WAV container encoding and decoding.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{self, Cursor};
use tts_core::{TtsError, TtsResult};

use crate::pcm::{CHANNELS, sample_to_i16};

fn wav_error(e: hound::Error) -> TtsError {
    TtsError::Io(io::Error::other(e.to_string()))
}

/// Mono 16-bit PCM spec at the given rate.
pub fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Encode float samples as a complete 16-bit PCM WAV file held in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> TtsResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));

    let mut writer = WavWriter::new(&mut buffer, pcm16_spec(sample_rate)).map_err(wav_error)?;
    for &sample in samples {
        writer
            .write_sample(sample_to_i16(sample))
            .map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;

    Ok(buffer.into_inner())
}

/// Decode a 16-bit PCM WAV file into its spec and samples.
pub fn decode_wav(bytes: &[u8]) -> TtsResult<(WavSpec, Vec<i16>)> {
    let mut reader = WavReader::new(Cursor::new(bytes)).map_err(wav_error)?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(TtsError::Serialization(format!(
            "expected 16-bit PCM, found {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(wav_error)?;

    Ok((spec, samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_header_and_length() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let bytes = encode_wav(&samples, 44_100).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert!(bytes.len() >= 44 + samples.len() * 2);
    }

    #[test]
    fn test_encode_decode_preserves_spec_and_values() {
        let samples = vec![0.0f32, 0.25, -1.0, 1.0];
        let bytes = encode_wav(&samples, 24_000).unwrap();
        let (spec, decoded) = decode_wav(&bytes).unwrap();

        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.channels, 1);
        assert_eq!(decoded, vec![0, 8191, -32767, 32767]);
    }

    #[test]
    fn test_empty_audio_is_valid_wav() {
        let bytes = encode_wav(&[], 16_000).unwrap();
        let (_, decoded) = decode_wav(&bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_wav(b"not a wav file").is_err());
    }
}
