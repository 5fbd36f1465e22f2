use crate::color::Color;
use crate::pixel_grid::PixelGrid;
use rayon::prelude::*;

/// One target cell and the average color of its source region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub color: Color,
}

/// Source pixel span `[start, end)` covered by target index `i`.
#[inline]
fn source_span(i: usize, scale: f64, limit: usize) -> (usize, usize) {
    let end = (((i + 1) as f64 * scale) as usize).min(limit);
    let start = ((i as f64 * scale) as usize).min(end);
    (start, end)
}

/// Mean color of the pixels in `[x0, x1) x [y0, y1)`, each channel truncated.
/// An empty region averages to white.
pub fn region_average(pixels: &PixelGrid, x0: usize, x1: usize, y0: usize, y1: usize) -> Color {
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    let mut count = 0u64;
    for y in y0..y1 {
        for c in &pixels.row(y)[x0..x1] {
            r += c.r as u64;
            g += c.g as u64;
            b += c.b as u64;
            count += 1;
        }
    }

    if count == 0 {
        return Color::WHITE;
    }
    Color::new((r / count) as u8, (g / count) as u8, (b / count) as u8)
}

/// Block-average `pixels` down onto a `target_width` x `target_height` grid.
///
/// Returns one cell per target position in row-major order. Zero-sized targets
/// are treated as 1. Rows are averaged in parallel into a pre-sized buffer so
/// the output order never depends on scheduling.
pub fn downsample(pixels: &PixelGrid, target_width: usize, target_height: usize) -> Vec<Cell> {
    let width = target_width.max(1);
    let height = target_height.max(1);
    let (orig_w, orig_h) = pixels.dimensions();
    let scale_x = orig_w as f64 / width as f64;
    let scale_y = orig_h as f64 / height as f64;

    let mut cells = vec![Cell::default(); width * height];
    cells
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let (y0, y1) = source_span(y, scale_y, orig_h);
            for (x, cell) in row.iter_mut().enumerate() {
                let (x0, x1) = source_span(x, scale_x, orig_w);
                *cell = Cell {
                    x,
                    y,
                    color: region_average(pixels, x0, x1, y0, y1),
                };
            }
        });
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize, f: impl Fn(usize, usize) -> Color) -> PixelGrid {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        PixelGrid::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_downsample_to_single_cell_is_truncated_mean() {
        let pixels = grid(3, 3, |x, y| Color::new((x * 10) as u8, (y * 7) as u8, 1));
        let cells = downsample(&pixels, 1, 1);
        assert_eq!(cells.len(), 1);
        // r: (0+10+20)*3/9 = 10, g: (0+7+14)*3/9 = 7, b: 1
        assert_eq!(cells[0].color, Color::new(10, 7, 1));

        let pixels = grid(2, 1, |x, _| Color::new(x as u8, 255 - x as u8, 0));
        // r: 1/2 truncates to 0, g: 509/2 truncates to 254
        assert_eq!(downsample(&pixels, 1, 1)[0].color, Color::new(0, 254, 0));
    }

    #[test]
    fn test_same_size_is_identity() {
        let pixels = grid(4, 3, |x, y| Color::new(x as u8, y as u8, (x * y) as u8));
        let cells = downsample(&pixels, 4, 3);
        assert_eq!(cells.len(), 12);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!((cell.x, cell.y), (i % 4, i / 4));
            assert_eq!(cell.color, pixels.get(cell.x, cell.y));
        }
    }

    #[test]
    fn test_zero_target_is_coerced() {
        let pixels = grid(2, 2, |_, _| Color::new(9, 9, 9));
        let cells = downsample(&pixels, 0, 0);
        assert_eq!(cells, vec![Cell { x: 0, y: 0, color: Color::new(9, 9, 9) }]);
        assert_eq!(downsample(&pixels, 0, 2).len(), 2);
    }

    #[test]
    fn test_upscaling_leaves_empty_regions_white() {
        let pixels = grid(1, 1, |_, _| Color::new(1, 2, 3));
        let cells = downsample(&pixels, 2, 1);
        assert_eq!(cells[0].color, Color::WHITE);
        assert_eq!(cells[1].color, Color::new(1, 2, 3));
    }

    #[test]
    fn test_red_over_blue_rows() {
        let pixels = PixelGrid::from_rows(vec![
            vec![Color::new(255, 0, 0), Color::new(255, 0, 0)],
            vec![Color::new(0, 0, 255), Color::new(0, 0, 255)],
        ])
        .unwrap();
        let cells = downsample(&pixels, 1, 2);
        assert_eq!(cells[0].color, Color::new(255, 0, 0));
        assert_eq!(cells[1].color, Color::new(0, 0, 255));
    }
}
