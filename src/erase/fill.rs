//! Mean-color fill eraser
//!
//! Replaces every region with the average color sampled from inside that
//! region, which flattens a speech bubble to its background color.
//!
//! Regions are processed in input order and the page is modified in place,
//! so when regions overlap a later region samples pixels already repainted
//! by an earlier one. `sample_from_source` samples from an untouched copy of
//! the page instead.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use tracing::trace;

use crate::detect::{RectRegion, Region};

/// Options for mean-color fill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillOptions {
    /// Sample every mean from the unmodified page
    pub sample_from_source: bool,
}

/// Pixel bounds clipped to the image, end-exclusive
#[derive(Debug, Clone, Copy)]
struct Bounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Bounds {
    fn clip(rect: RectRegion, width: u32, height: u32) -> Option<Self> {
        let x0 = rect.x.max(0) as i64;
        let y0 = rect.y.max(0) as i64;
        let x1 = (rect.x as i64 + rect.width as i64).min(width as i64);
        let y1 = (rect.y as i64 + rect.height as i64).min(height as i64);
        (x0 < x1 && y0 < y1).then_some(Self {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }

    fn pixels(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// Fill every region with its mean color, returning the modified page
pub fn erase_fill(mut image: RgbImage, regions: &[Region], options: &FillOptions) -> RgbImage {
    fill_in_place(&mut image, regions, options);
    image
}

/// Fill regions in place. Returns the number of regions painted.
pub fn fill_in_place(image: &mut RgbImage, regions: &[Region], options: &FillOptions) -> usize {
    if regions.is_empty() {
        return 0;
    }

    let (width, height) = image.dimensions();
    let source = options.sample_from_source.then(|| image.clone());
    let mut mask = GrayImage::new(width, height);
    let mut painted = 0;

    for region in regions {
        let outline = region.outline();
        if !is_drawable(&outline) {
            continue;
        }
        let Some(bounds) = region
            .bounding_box()
            .and_then(|rect| Bounds::clip(rect, width, height))
        else {
            continue;
        };

        draw_polygon_mut(&mut mask, &outline, Luma([255u8]));

        let mean = {
            let sampler = source.as_ref().unwrap_or(&*image);
            masked_mean(sampler, &mask, bounds)
        };
        if let Some(color) = mean {
            paint_masked(image, &mask, bounds, color);
            painted += 1;
            trace!(area = region.area(), ?color, "Region filled");
        }

        for (x, y) in bounds.pixels() {
            mask.put_pixel(x, y, Luma([0]));
        }
    }

    painted
}

/// imageproc rejects empty outlines and explicitly closed ones
fn is_drawable(outline: &[Point<i32>]) -> bool {
    outline.len() >= 3 && outline.first() != outline.last()
}

/// Mean color of the pixels selected by the mask, rounded per channel
fn masked_mean(image: &RgbImage, mask: &GrayImage, bounds: Bounds) -> Option<Rgb<u8>> {
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for (x, y) in bounds.pixels() {
        if mask.get_pixel(x, y).0[0] == 0 {
            continue;
        }
        let p = image.get_pixel(x, y);
        for (acc, v) in sum.iter_mut().zip(p.0) {
            *acc += v as u64;
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }
    let channel = |c: usize| (sum[c] as f64 / count as f64).round() as u8;
    Some(Rgb([channel(0), channel(1), channel(2)]))
}

fn paint_masked(image: &mut RgbImage, mask: &GrayImage, bounds: Bounds, color: Rgb<u8>) {
    for (x, y) in bounds.pixels() {
        if mask.get_pixel(x, y).0[0] != 0 {
            image.put_pixel(x, y, color);
        }
    }
}
