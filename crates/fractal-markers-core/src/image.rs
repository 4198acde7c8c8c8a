#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

#[inline]
pub(crate) fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
pub(crate) fn get_gray_clamped(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, src.width as i32 - 1);
    let y = y.clamp(0, src.height as i32 - 1);
    src.data[y as usize * src.width + x as usize]
}

/// Floor-anchored bilinear sample. Out-of-range taps read as 0.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// Bilinear sample with the anchor snapped toward the nearest cell centre.
///
/// The top-left tap is `floor(p)` when the fractional part exceeds 0.5 and
/// `floor(p) - 1` otherwise, so the four taps straddle the cell-centre grid
/// rather than the pixel grid. The bit-sampling stage of the detector relies
/// on this exact behaviour; use [`sample_bilinear`] everywhere else.
pub fn sample_subpixel(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let fx = x - x.trunc();
    let fy = y - y.trunc();

    let tx = if fx > 0.5 { x.trunc() as i32 } else { x.trunc() as i32 - 1 };
    let ty = if fy > 0.5 { y.trunc() as i32 } else { y.trunc() as i32 - 1 };
    let tx = tx.clamp(0, src.width as i32 - 1);
    let ty = ty.clamp(0, src.height as i32 - 1);

    let p00 = get_gray_clamped(src, tx, ty) as f32;
    let p10 = get_gray_clamped(src, tx + 1, ty) as f32;
    let p01 = get_gray_clamped(src, tx, ty + 1) as f32;
    let p11 = get_gray_clamped(src, tx + 1, ty + 1) as f32;

    (1.0 - fy) * (1.0 - fx) * p00
        + fx * (1.0 - fy) * p10
        + (1.0 - fx) * fy * p01
        + fx * fy * p11
}
