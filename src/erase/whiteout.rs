//! Whiteout eraser
//!
//! Paints every region pure white on a copy of the page. Suited to manga
//! pages where lettering sits on white; on colored panels the result shows.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;

use crate::detect::Region;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Paint white rectangles over a copy of the page.
///
/// Polygon regions are whited out over their bounding box.
pub fn erase_whiteout(image: &RgbImage, regions: &[Region]) -> RgbImage {
    let mut erased = image.clone();
    whiteout_in_place(&mut erased, regions);
    erased
}

/// Paint regions white in place. Returns the number of non-empty rectangles.
pub fn whiteout_in_place(image: &mut RgbImage, regions: &[Region]) -> usize {
    let mut painted = 0;
    for rect in regions
        .iter()
        .filter_map(|r| r.bounding_box())
        .filter_map(|r| r.to_rect())
    {
        draw_filled_rect_mut(image, rect, WHITE);
        painted += 1;
    }
    painted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{PolygonRegion, RectRegion};
    use imageproc::point::Point;

    fn noisy_page(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 200) as u8, (y * 11 % 200) as u8, ((x + y) % 200) as u8])
        })
    }

    // WHITE-001: inside every rectangle is white, outside is unchanged
    #[test]
    fn test_whiteout_exactness() {
        let page = noisy_page(80, 60);
        let rects = [RectRegion::new(5, 5, 10, 8), RectRegion::new(40, 30, 25, 12)];
        let regions: Vec<Region> = rects.iter().copied().map(Region::from).collect();
        let out = erase_whiteout(&page, &regions);

        for (x, y, p) in out.enumerate_pixels() {
            let (x, y) = (x as i32, y as i32);
            let inside = rects.iter().any(|r| {
                x >= r.x && y >= r.y && x < r.x + r.width as i32 && y < r.y + r.height as i32
            });
            let (x, y) = (x as u32, y as u32);
            if inside {
                assert_eq!(*p, WHITE, "({x}, {y}) not white");
            } else {
                assert_eq!(p, page.get_pixel(x, y), "({x}, {y}) changed");
            }
        }
    }

    #[test]
    fn test_whiteout_no_regions_identity() {
        let page = noisy_page(30, 30);
        let out = erase_whiteout(&page, &[]);
        assert_eq!(out.as_raw(), page.as_raw());
    }

    #[test]
    fn test_whiteout_source_untouched() {
        let page = noisy_page(30, 30);
        let copy = page.clone();
        let _ = erase_whiteout(&page, &[RectRegion::new(0, 0, 30, 30).into()]);
        assert_eq!(page.as_raw(), copy.as_raw());
    }

    #[test]
    fn test_whiteout_clips_and_skips_empty() {
        let mut page = noisy_page(20, 20);
        let regions: Vec<Region> = vec![
            RectRegion::new(-5, -5, 10, 10).into(),
            RectRegion::new(3, 3, 0, 4).into(),
        ];
        assert_eq!(whiteout_in_place(&mut page, &regions), 1);
        assert_eq!(*page.get_pixel(0, 0), WHITE);
        assert_eq!(*page.get_pixel(4, 4), WHITE);
        assert_ne!(*page.get_pixel(5, 5), WHITE);
    }

    #[test]
    fn test_whiteout_polygon_bounding_box() {
        let page = noisy_page(40, 40);
        let poly = PolygonRegion::new(
            vec![Point::new(10, 10), Point::new(20, 12), Point::new(12, 25)],
            100.0,
        );
        let out = erase_whiteout(&page, &[poly.into()]);
        assert_eq!(*out.get_pixel(10, 10), WHITE);
        assert_eq!(*out.get_pixel(20, 25), WHITE);
        assert_eq!(out.get_pixel(21, 25), page.get_pixel(21, 25));
    }
}
