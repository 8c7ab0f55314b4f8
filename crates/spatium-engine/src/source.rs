//! PCM input for the engine.

/// A pull-based source of planar PCM.
///
/// `read` runs on the render thread and must not block or allocate.
pub trait PcmSource: Send {
    /// 1 for mono, 2 for stereo. Mono sources only fill `left`.
    fn channels(&self) -> usize;

    /// Fills up to `left.len()` frames and returns how many were written.
    ///
    /// Frames past the returned count are treated as silence.
    fn read(&mut self, left: &mut [f32], right: &mut [f32]) -> usize;
}

/// Plays an owned planar buffer, optionally looping.
///
/// ```rust
/// use spatium_engine::{BufferSource, PcmSource};
///
/// let mut src = BufferSource::mono(vec![0.1, 0.2, 0.3]);
/// let mut l = [0.0; 4];
/// let mut r = [0.0; 4];
/// assert_eq!(src.read(&mut l, &mut r), 3);
/// assert_eq!(src.read(&mut l, &mut r), 0);
/// ```
#[derive(Debug, Clone)]
pub struct BufferSource {
    left: Vec<f32>,
    right: Option<Vec<f32>>,
    position: usize,
    looping: bool,
}

impl BufferSource {
    /// Mono buffer, played once.
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            left: samples,
            right: None,
            position: 0,
            looping: false,
        }
    }

    /// Stereo buffer, played once. The longer channel is truncated.
    pub fn stereo(mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self {
            left,
            right: Some(right),
            position: 0,
            looping: false,
        }
    }

    /// Restart from the beginning when the end is reached.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Frames in the buffer.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True for an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Next frame to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    fn copy_run(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        let n = left
            .len()
            .min(right.len())
            .min(self.left.len() - self.position);
        let range = self.position..self.position + n;
        left[..n].copy_from_slice(&self.left[range.clone()]);
        if let Some(src_r) = &self.right {
            right[..n].copy_from_slice(&src_r[range]);
        }
        self.position += n;
        n
    }
}

impl PcmSource for BufferSource {
    fn channels(&self) -> usize {
        if self.right.is_some() { 2 } else { 1 }
    }

    fn read(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        if self.is_empty() {
            return 0;
        }
        let frames = left.len().min(right.len());
        let mut filled = 0;
        while filled < frames {
            if self.position >= self.left.len() {
                if !self.looping {
                    break;
                }
                self.position = 0;
            }
            filled += self.copy_run(&mut left[filled..frames], &mut right[filled..frames]);
        }
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_copies_both_channels() {
        let mut src = BufferSource::stereo(vec![1.0, 2.0], vec![-1.0, -2.0, -3.0]);
        assert_eq!(src.len(), 2);
        assert_eq!(src.channels(), 2);
        let mut l = [0.0; 2];
        let mut r = [0.0; 2];
        assert_eq!(src.read(&mut l, &mut r), 2);
        assert_eq!(l, [1.0, 2.0]);
        assert_eq!(r, [-1.0, -2.0]);
    }

    #[test]
    fn looping_wraps_across_reads() {
        let mut src = BufferSource::mono(vec![1.0, 2.0, 3.0]).looping(true);
        let mut l = [0.0; 7];
        let mut r = [0.0; 7];
        assert_eq!(src.read(&mut l, &mut r), 7);
        assert_eq!(l, [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
        assert_eq!(src.position(), 1);
    }

    #[test]
    fn one_shot_stops_at_the_end() {
        let mut src = BufferSource::mono(vec![0.5; 10]);
        let mut l = [0.0; 8];
        let mut r = [0.0; 8];
        assert_eq!(src.read(&mut l, &mut r), 8);
        assert_eq!(src.read(&mut l, &mut r), 2);
        assert_eq!(src.read(&mut l, &mut r), 0);
    }

    #[test]
    fn empty_looping_buffer_reads_nothing() {
        let mut src = BufferSource::mono(Vec::new()).looping(true);
        let mut l = [0.0; 4];
        let mut r = [0.0; 4];
        assert_eq!(src.read(&mut l, &mut r), 0);
    }
}
