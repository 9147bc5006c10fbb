//! Grayscale image containers and pixel sampling.

/// Borrowed 8-bit grayscale image, row-major.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = w*h
}

/// Owned 8-bit grayscale image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Image filled with a constant value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
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

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer, checking that its length matches the dimensions.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Borrow an `image::GrayImage`.
    pub fn from_luma(img: &'a ::image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.as_raw(),
        }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Copy into an `image::GrayImage` for `imageproc` routines.
    pub fn to_luma(&self) -> ::image::GrayImage {
        ::image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            ::image::Luma([self.at(x as usize, y as usize)])
        })
    }
}

impl From<::image::GrayImage> for GrayImage {
    fn from(img: ::image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.into_raw(),
        }
    }
}

impl From<&::image::DynamicImage> for GrayImage {
    fn from(img: &::image::DynamicImage) -> Self {
        img.to_luma8().into()
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

/// Standard bilinear interpolation with pixel centres at integer coordinates.
/// Samples outside the image read as black.
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

/// Bilinear intensity used for bit sampling.
///
/// The top-left neighbour is `floor(v)` when the fractional part exceeds 0.5
/// and `floor(v) - 1` otherwise; the weights are the fractional parts. The
/// 2×2 support is clamped so it always lies inside the image.
pub fn sample_bit_intensity(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let ix = x.trunc();
    let iy = y.trunc();
    let fx = x - ix;
    let fy = y - iy;

    let max_x = src.width.saturating_sub(2) as i32;
    let max_y = src.height.saturating_sub(2) as i32;
    let tx = if fx > 0.5 { ix as i32 } else { ix as i32 - 1 };
    let ty = if fy > 0.5 { iy as i32 } else { iy as i32 - 1 };
    let tx = tx.clamp(0, max_x);
    let ty = ty.clamp(0, max_y);

    let p00 = get_gray(src, tx, ty) as f32;
    let p10 = get_gray(src, tx + 1, ty) as f32;
    let p01 = get_gray(src, tx, ty + 1) as f32;
    let p11 = get_gray(src, tx + 1, ty + 1) as f32;

    (1.0 - fy) * (1.0 - fx) * p00 + fx * (1.0 - fy) * p10 + (1.0 - fx) * fy * p01 + fx * fy * p11
}
