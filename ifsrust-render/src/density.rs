/// Per-pixel hit counts for a rasterized point cloud.
///
/// This is the raw output of the rasterizer before shading. Keeping counts
/// separate from colored pixels lets the same cloud be re-shaded with a
/// different ink or mode without re-sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major hit counts, one per pixel.
    pub counts: Vec<u32>,
}

impl DensityBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            counts: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn increment(&mut self, x: u32, y: u32) {
        let idx = y as usize * self.width as usize + x as usize;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.counts[y as usize * self.width as usize + x as usize]
    }

    /// Add every count in `other` into `self`. Both buffers must share dimensions.
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            *dst = dst.saturating_add(*src);
        }
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Number of pixels hit at least once.
    pub fn covered_pixels(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Total hits across all pixels.
    pub fn total_hits(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}
