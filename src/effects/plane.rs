//! Single-channel float image used as the working buffer of the kernels.

use crate::video::types::Frame;

/// A row-major `f32` image plane
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    /// A plane filled with `value`
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap existing samples; `None` if the length does not match
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Element-wise product with another plane of the same size
    pub fn multiplied(&self, other: &Plane) -> Plane {
        debug_assert_eq!(self.data.len(), other.data.len());
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a * b).collect();
        Plane { width: self.width, height: self.height, data }
    }

    /// Separable Gaussian blur with mirrored (reflect-101) borders
    ///
    /// The kernel spans about four sigmas on each side. A sigma so small
    /// that the kernel collapses to a single tap returns a copy.
    pub fn gaussian_blur(&self, sigma: f32) -> Plane {
        let kernel = gaussian_kernel(sigma);
        if kernel.len() == 1 || self.data.is_empty() {
            return self.clone();
        }
        let radius = (kernel.len() / 2) as isize;
        let (w, h) = (self.width, self.height);

        // Horizontal pass over a padded copy of each row.
        let mut horizontal = vec![0.0f32; w * h];
        let mut padded = vec![0.0f32; w + kernel.len() - 1];
        for y in 0..h {
            let row = self.row(y);
            for (i, slot) in padded.iter_mut().enumerate() {
                *slot = row[reflect_101(i as isize - radius, w)];
            }
            let out = &mut horizontal[y * w..(y + 1) * w];
            for (x, o) in out.iter_mut().enumerate() {
                *o = kernel
                    .iter()
                    .zip(&padded[x..x + kernel.len()])
                    .map(|(k, v)| k * v)
                    .sum();
            }
        }

        // Vertical pass accumulates whole rows.
        let mut data = vec![0.0f32; w * h];
        for y in 0..h {
            let out = &mut data[y * w..(y + 1) * w];
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - radius, h);
                let src = &horizontal[sy * w..(sy + 1) * w];
                for (o, s) in out.iter_mut().zip(src) {
                    *o += weight * s;
                }
            }
        }

        Plane { width: w, height: h, data }
    }

    /// Downscale by averaging the source area each output pixel covers
    pub fn resize_area(&self, width: usize, height: usize) -> Plane {
        let xw = area_weights(self.width, width);
        let yw = area_weights(self.height, height);
        self.resample(width, height, &xw, &yw)
    }

    /// Bilinear resize with pixel-centre alignment and clamped edges
    pub fn resize_linear(&self, width: usize, height: usize) -> Plane {
        let xw = linear_weights(self.width, width);
        let yw = linear_weights(self.height, height);
        self.resample(width, height, &xw, &yw)
    }

    fn resample(
        &self,
        width: usize,
        height: usize,
        xw: &[Vec<(usize, f32)>],
        yw: &[Vec<(usize, f32)>],
    ) -> Plane {
        let mut horizontal = vec![0.0f32; width * self.height];
        for y in 0..self.height {
            let row = self.row(y);
            for (x, taps) in xw.iter().enumerate() {
                horizontal[y * width + x] = taps.iter().map(|&(sx, w)| row[sx] * w).sum();
            }
        }

        let mut data = vec![0.0f32; width * height];
        for (y, taps) in yw.iter().enumerate() {
            let out = &mut data[y * width..(y + 1) * width];
            for &(sy, w) in taps {
                let src = &horizontal[sy * width..(sy + 1) * width];
                for (o, s) in out.iter_mut().zip(src) {
                    *o += w * s;
                }
            }
        }

        Plane { width, height, data }
    }
}

/// Normalized Gaussian taps, odd length, about `8 * sigma + 1` wide
pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let sigma = sigma.max(1e-6);
    let size = ((sigma * 8.0 + 1.0).round() as usize) | 1;
    let radius = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;

    let mut taps: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - radius;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();
    for t in &mut taps {
        *t /= sum;
    }
    taps
}

/// Mirror an index into `0..n` without repeating the edge sample
/// (`gfedcb|abcdefgh|gfedcba`)
pub(crate) fn reflect_101(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Mirror an index into `0..n`, repeating the edge sample
/// (`fedcba|abcdefgh|hgfedcb`)
pub(crate) fn reflect(i: isize, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

fn area_weights(src: usize, dst: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (start + scale).min(src as f64);
            let mut taps = Vec::new();
            let mut s = start.floor() as usize;
            while (s as f64) < end && s < src {
                let lo = start.max(s as f64);
                let hi = end.min(s as f64 + 1.0);
                if hi > lo {
                    taps.push((s, ((hi - lo) / (end - start)) as f32));
                }
                s += 1;
            }
            taps
        })
        .collect()
}

fn linear_weights(src: usize, dst: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let f = (d as f64 + 0.5) * scale - 0.5;
            let mut x0 = f.floor();
            let mut a = f - x0;
            if x0 < 0.0 {
                x0 = 0.0;
                a = 0.0;
            }
            let x0 = x0 as usize;
            if x0 + 1 >= src {
                vec![(src - 1, 1.0)]
            } else {
                vec![(x0, (1.0 - a) as f32), (x0 + 1, a as f32)]
            }
        })
        .collect()
}

/// Split a frame into R, G, B planes normalized to `[0, 1]`
pub(crate) fn split_normalized(frame: &Frame) -> [Plane; 3] {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let mut planes = [
        Plane::filled(w, h, 0.0),
        Plane::filled(w, h, 0.0),
        Plane::filled(w, h, 0.0),
    ];
    for (i, px) in frame.as_raw().chunks_exact(3).enumerate() {
        for c in 0..3 {
            planes[c].data[i] = px[c] as f32 / 255.0;
        }
    }
    planes
}

/// Clamp normalized planes to `[0, 1]` and requantize to 8 bits (truncating)
pub(crate) fn merge_quantized(planes: &[Plane; 3]) -> Frame {
    let (w, h) = (planes[0].width, planes[0].height);
    let mut raw = Vec::with_capacity(w * h * 3);
    for i in 0..w * h {
        for plane in planes {
            raw.push(quantize(plane.data[i]));
        }
    }
    Frame::from_rgb_bytes(w as u32, h as u32, raw)
        .unwrap_or_else(|| Frame::new_black(w as u32, h as u32))
}

#[inline]
pub(crate) fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

/// Rec.709 luma of normalized RGB planes
pub(crate) fn luma(planes: &[Plane; 3]) -> Plane {
    let [r, g, b] = planes;
    let data = r
        .data
        .iter()
        .zip(&g.data)
        .zip(&b.data)
        .map(|((r, g), b)| 0.2126 * r + 0.7152 * g + 0.0722 * b)
        .collect();
    Plane {
        width: r.width,
        height: r.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_101() {
        let n = 5;
        let got: Vec<usize> = (-3..8).map(|i| reflect_101(i, n)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1]);
        assert_eq!(reflect_101(-7, 1), 0);
    }

    #[test]
    fn test_reflect_repeats_edge() {
        let n = 4;
        let got: Vec<usize> = (-3..7).map(|i| reflect(i, n)).collect();
        assert_eq!(got, vec![2, 1, 0, 0, 1, 2, 3, 3, 2, 1]);
    }

    #[test]
    fn test_kernel_is_normalized_and_odd() {
        for sigma in [0.6, 3.0, 8.0] {
            let k = gaussian_kernel(sigma);
            assert_eq!(k.len() % 2, 1);
            let sum: f32 = k.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
        assert_eq!(gaussian_kernel(0.6).len(), 7);
        assert_eq!(gaussian_kernel(1e-6).len(), 1);
    }

    #[test]
    fn test_blur_preserves_constant_plane() {
        let plane = Plane::filled(9, 7, 0.25);
        let blurred = plane.gaussian_blur(2.0);
        assert!(blurred.data().iter().all(|v| (v - 0.25).abs() < 1e-5));
    }

    #[test]
    fn test_blur_spreads_impulse_symmetrically() {
        let mut plane = Plane::filled(11, 11, 0.0);
        plane.data_mut()[5 * 11 + 5] = 1.0;
        let blurred = plane.gaussian_blur(1.5);

        assert!(blurred.get(5, 5) < 1.0);
        assert!((blurred.get(4, 5) - blurred.get(6, 5)).abs() < 1e-6);
        assert!((blurred.get(5, 3) - blurred.get(3, 5)).abs() < 1e-6);
        let total: f32 = blurred.data().iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_area_resize_averages_blocks() {
        let plane = Plane::from_vec(4, 2, vec![1.0, 3.0, 5.0, 7.0, 1.0, 3.0, 5.0, 7.0]).unwrap();
        let small = plane.resize_area(2, 1);
        assert_eq!(small.data(), &[2.0, 6.0]);
    }

    #[test]
    fn test_area_resize_fractional_scale_keeps_mean() {
        let data: Vec<f32> = (0..100).map(|i| (i % 7) as f32).collect();
        let plane = Plane::from_vec(10, 10, data).unwrap();
        let small = plane.resize_area(8, 8);

        let mean = |p: &Plane| p.data().iter().sum::<f32>() / p.data().len() as f32;
        assert!((mean(&plane) - mean(&small)).abs() < 1e-3);
    }

    #[test]
    fn test_linear_resize_interpolates() {
        let plane = Plane::from_vec(2, 1, vec![0.0, 1.0]).unwrap();
        let big = plane.resize_linear(4, 1);
        assert_eq!(big.data(), &[0.0, 0.25, 0.75, 1.0]);
    }

    #[test]
    fn test_split_merge_is_lossless_for_bytes() {
        let frame = Frame::from_fn(5, 3, |x, y| [(x * 50) as u8, (y * 80) as u8, 255]);
        let planes = split_normalized(&frame);
        let back = merge_quantized(&planes);
        for y in 0..3 {
            for x in 0..5 {
                let a = frame.get_pixel(x, y);
                let b = back.get_pixel(x, y);
                for c in 0..3 {
                    assert!(a[c] as i16 - b[c] as i16 <= 1);
                }
            }
        }
    }
}
