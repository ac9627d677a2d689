//! PCM helpers for the capture path

use rubato::{FftFixedIn, Resampler};

/// Input frames per resampler chunk
const CHUNK_FRAMES: usize = 1024;

/// Average interleaved frames down to one channel
pub fn downmix(interleaved: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Resample mono audio from `from_rate` to `to_rate`.
///
/// The resampler's startup delay is trimmed so the output lines up with
/// the input and has `ceil(len * to / from)` frames.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Result<Vec<i16>, String> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let input: Vec<f32> = samples.iter().copied().map(i16_to_f32).collect();
    let expected = (input.len() as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_FRAMES, 2, 1)
            .map_err(|e| format!("Resampler init failed: {}", e))?;
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected + delay);
    let mut pos = 0;
    while output.len() < expected + delay {
        let needed = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; needed];
        if pos < input.len() {
            let end = (pos + needed).min(input.len());
            chunk[..end - pos].copy_from_slice(&input[pos..end]);
            pos = end;
        }
        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| format!("Resampling failed: {}", e))?;
        output.extend_from_slice(&resampled[0]);
    }

    Ok(output
        .into_iter()
        .skip(delay)
        .take(expected)
        .map(f32_to_i16)
        .collect())
}
