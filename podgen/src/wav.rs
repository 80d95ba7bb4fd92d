//! Minimal RIFF/WAVE handling for joining speech segments
//!
//! Le service de synthèse renvoie un fichier WAV complet par réplique. Pour
//! produire l'épisode, on relit le chunk `fmt ` de chaque segment, on garde
//! les échantillons du chunk `data` et on réécrit un en-tête unique.
//!
//! Les flux produits en streaming annoncent parfois une taille de `data`
//! de `0xFFFFFFFF` : dans ce cas on prend tout ce qui reste du fichier.

use thiserror::Error;
use tracing::warn;

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const FMT_CHUNK_LEN: u32 = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("not a RIFF/WAVE file")]
    NotWave,

    #[error("missing '{0}' chunk")]
    MissingChunk(&'static str),

    #[error("unsupported sample format (byte rate 0)")]
    UnsupportedFormat,

    #[error("no usable audio segment")]
    NoSegments,
}

/// Contents of the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

/// A parsed WAV file borrowing its samples from the input buffer
#[derive(Debug, Clone, Copy)]
pub struct WavSegment<'a> {
    pub format: WavFormat,
    pub data: &'a [u8],
}

impl WavSegment<'_> {
    pub fn duration_secs(&self) -> f64 {
        self.data.len() as f64 / self.format.byte_rate as f64
    }
}

/// The joined episode
#[derive(Debug, Clone)]
pub struct MergedAudio {
    pub bytes: Vec<u8>,
    /// Durée mesurée, arrondie à la seconde
    pub duration_secs: u64,
    /// Nombre de segments effectivement inclus
    pub segments: usize,
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Parses the `fmt ` and `data` chunks of a WAV file
pub fn parse_wav(bytes: &[u8]) -> Result<WavSegment<'_>, WavError> {
    if bytes.len() < RIFF_HEADER_LEN || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(WavError::NotWave);
    }

    let mut format = None;
    let mut pos = RIFF_HEADER_LEN;

    while pos + CHUNK_HEADER_LEN <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let declared = u32_at(bytes, pos + 4) as usize;
        let body = pos + CHUNK_HEADER_LEN;
        let available = bytes.len() - body;

        match id {
            b"fmt " => {
                if declared < FMT_CHUNK_LEN as usize || available < FMT_CHUNK_LEN as usize {
                    return Err(WavError::MissingChunk("fmt "));
                }
                format = Some(WavFormat {
                    audio_format: u16_at(bytes, body),
                    channels: u16_at(bytes, body + 2),
                    sample_rate: u32_at(bytes, body + 4),
                    byte_rate: u32_at(bytes, body + 8),
                    block_align: u16_at(bytes, body + 12),
                    bits_per_sample: u16_at(bytes, body + 14),
                });
            }
            b"data" => {
                let format = format.ok_or(WavError::MissingChunk("fmt "))?;
                if format.byte_rate == 0 {
                    return Err(WavError::UnsupportedFormat);
                }
                let mut len = declared.min(available);
                if format.block_align > 0 {
                    len -= len % format.block_align as usize;
                }
                return Ok(WavSegment {
                    format,
                    data: &bytes[body..body + len],
                });
            }
            _ => {}
        }

        // Les chunks sont alignés sur 2 octets
        pos = body.saturating_add(declared).saturating_add(declared % 2);
    }

    Err(WavError::MissingChunk("data"))
}

fn write_header(out: &mut Vec<u8>, format: &WavFormat, data_len: u32) {
    out.extend_from_slice(b"RIFF");
    let riff_len = 4 + 2 * CHUNK_HEADER_LEN as u32 + FMT_CHUNK_LEN + data_len;
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&format.audio_format.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate.to_le_bytes());
    out.extend_from_slice(&format.block_align.to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
}

/// Joins WAV segments into one file
///
/// The first readable segment fixes the output format. Segments that cannot
/// be parsed, are empty, or use a different format are skipped.
pub fn concat_wav<B: AsRef<[u8]>>(segments: &[B]) -> Result<MergedAudio, WavError> {
    let mut format: Option<WavFormat> = None;
    let mut samples: Vec<u8> = Vec::new();
    let mut included = 0usize;

    for (index, raw) in segments.iter().enumerate() {
        let segment = match parse_wav(raw.as_ref()) {
            Ok(segment) => segment,
            Err(e) => {
                warn!("Skipping audio segment {}: {}", index, e);
                continue;
            }
        };
        if segment.data.is_empty() {
            warn!("Skipping empty audio segment {}", index);
            continue;
        }

        match format {
            None => format = Some(segment.format),
            Some(expected) if expected != segment.format => {
                warn!(
                    "Skipping audio segment {}: format {:?} differs from {:?}",
                    index, segment.format, expected
                );
                continue;
            }
            Some(_) => {}
        }

        samples.extend_from_slice(segment.data);
        included += 1;
    }

    let format = format.ok_or(WavError::NoSegments)?;
    let data_len = u32::try_from(samples.len()).map_err(|_| WavError::UnsupportedFormat)?;

    let mut bytes = Vec::with_capacity(samples.len() + 44);
    write_header(&mut bytes, &format, data_len);
    bytes.extend_from_slice(&samples);

    let duration_secs = (samples.len() as f64 / format.byte_rate as f64).round() as u64;

    Ok(MergedAudio {
        bytes,
        duration_secs,
        segments: included,
    })
}

/// Builds a 16-bit PCM mono WAV file of `samples` zero samples
#[cfg(test)]
pub(crate) fn silent_wav(sample_rate: u32, samples: usize) -> Vec<u8> {
    let format = WavFormat {
        audio_format: 1,
        channels: 1,
        sample_rate,
        byte_rate: sample_rate * 2,
        block_align: 2,
        bits_per_sample: 16,
    };
    let mut out = Vec::new();
    write_header(&mut out, &format, (samples * 2) as u32);
    out.resize(out.len() + samples * 2, 0);
    out
}
