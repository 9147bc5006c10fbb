//! Adaptive binarization for border detection.

use crate::{GrayImage, GrayImageView};
use imageproc::filter::box_filter;

/// Odd adaptive-threshold window scaled with the image width:
/// `max(3, ref_window * width / ref_width)`, bumped to the next odd value.
pub fn adaptive_window_size(width: usize, ref_window: u32, ref_width: u32) -> u32 {
    let scaled = (ref_window as f32 * width as f32 / ref_width.max(1) as f32) as u32;
    let w = scaled.max(3);
    if w % 2 == 0 {
        w + 1
    } else {
        w
    }
}

/// Inverted mean-C threshold: a pixel is foreground (255) when it is not
/// brighter than `local_mean - offset`.
///
/// Dark marker borders become thin foreground rings along their edges, which
/// is what contour extraction expects.
pub fn adaptive_threshold_mean_inv(src: &GrayImageView<'_>, window: u32, offset: i32) -> GrayImage {
    let radius = window.max(1) / 2;
    let luma = src.to_luma();
    let mean = box_filter(&luma, radius, radius);

    let data = src
        .data
        .iter()
        .zip(mean.as_raw().iter())
        .map(|(&v, &m)| {
            if (v as i32) > (m as i32) - offset {
                0
            } else {
                255
            }
        })
        .collect();

    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}
