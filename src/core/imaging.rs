use crate::domain::ports::BackgroundRemover;
use crate::utils::error::Result;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::VecDeque;
use std::io::Cursor;

/// True when the encoded image carries an alpha channel that is actually
/// used somewhere. Anything that fails to decode counts as opaque.
pub fn has_transparency(bytes: &[u8]) -> bool {
    image::load_from_memory(bytes)
        .map(|img| uses_alpha(&img))
        .unwrap_or(false)
}

/// Palette or RGB PNGs with a `tRNS` chunk decode with an alpha channel and
/// count as transparent when any pixel is see-through.
fn uses_alpha(img: &DynamicImage) -> bool {
    img.color().has_alpha() && img.to_rgba8().pixels().any(|p| p[3] < u8::MAX)
}

pub fn encode_png(img: RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Re-encodes any supported image as an RGBA PNG.
pub fn to_rgba_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    encode_png(img)
}

/// Produces the cut-out PNG: images that already have transparency pass
/// through untouched, the rest are squared to `size` and stripped.
pub fn to_cutout_png(bytes: &[u8], size: u32, remover: &dyn BackgroundRemover) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?;
    let transparent = uses_alpha(&decoded);
    let img = decoded.to_rgba8();
    if transparent {
        return encode_png(img);
    }
    let resized = imageops::resize(&img, size, size, FilterType::CatmullRom);
    encode_png(remover.remove(resized))
}

/// Removes a flat studio background by flood-filling inward from the image
/// border through pixels close to the border colour.
#[derive(Debug, Clone)]
pub struct EdgeFloodRemover {
    tolerance: u8,
}

impl EdgeFloodRemover {
    pub fn new(tolerance: u8) -> Self {
        Self { tolerance }
    }

    fn distance(a: &Rgba<u8>, b: &[u8; 3]) -> u8 {
        (0..3).map(|i| a[i].abs_diff(b[i])).max().unwrap_or(0)
    }

    /// Per-channel median of the border pixels.
    fn background_color(img: &RgbaImage) -> [u8; 3] {
        let (w, h) = img.dimensions();
        let mut channels: [Vec<u8>; 3] = Default::default();
        for (x, y) in border_coords(w, h) {
            let p = img.get_pixel(x, y);
            for (c, values) in channels.iter_mut().enumerate() {
                values.push(p[c]);
            }
        }
        let mut color = [0u8; 3];
        for (c, values) in channels.iter_mut().enumerate() {
            if values.is_empty() {
                continue;
            }
            values.sort_unstable();
            color[c] = values[values.len() / 2];
        }
        color
    }
}

fn border_coords(w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    let top_bottom = (0..w).flat_map(move |x| [(x, 0), (x, h.saturating_sub(1))]);
    let left_right = (0..h).flat_map(move |y| [(0, y), (w.saturating_sub(1), y)]);
    top_bottom.chain(left_right).filter(move |_| w > 0 && h > 0)
}

impl BackgroundRemover for EdgeFloodRemover {
    fn remove(&self, mut img: RgbaImage) -> RgbaImage {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return img;
        }

        let bg = Self::background_color(&img);
        let tol = self.tolerance;
        let idx = |x: u32, y: u32| (y as usize) * (w as usize) + x as usize;
        let mut background = vec![false; (w as usize) * (h as usize)];
        let mut queue = VecDeque::new();

        for (x, y) in border_coords(w, h) {
            let i = idx(x, y);
            if !background[i] && Self::distance(img.get_pixel(x, y), &bg) <= tol {
                background[i] = true;
                queue.push_back((x, y));
            }
        }

        while let Some((x, y)) = queue.pop_front() {
            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= w || ny >= h {
                    continue;
                }
                let i = idx(nx, ny);
                if !background[i] && Self::distance(img.get_pixel(nx, ny), &bg) <= tol {
                    background[i] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        // 邊緣柔化：與背景相鄰、顏色接近背景的像素給予部分透明
        let ramp = tol.max(1) as u32;
        let mut alphas = Vec::new();
        for y in 0..h {
            for x in 0..w {
                if background[idx(x, y)] {
                    continue;
                }
                let touches_background = [
                    (x.wrapping_sub(1), y),
                    (x + 1, y),
                    (x, y.wrapping_sub(1)),
                    (x, y + 1),
                ]
                .iter()
                .any(|&(nx, ny)| nx < w && ny < h && background[idx(nx, ny)]);
                if !touches_background {
                    continue;
                }
                let d = Self::distance(img.get_pixel(x, y), &bg) as u32;
                if d < 2 * ramp {
                    let alpha = ((d.saturating_sub(ramp)) * 255 / ramp).min(255) as u8;
                    alphas.push((x, y, alpha.max(1)));
                }
            }
        }

        for (x, y) in (0..h).flat_map(|y| (0..w).map(move |x| (x, y))) {
            if background[idx(x, y)] {
                img.get_pixel_mut(x, y)[3] = 0;
            }
        }
        for (x, y, alpha) in alphas {
            let px = img.get_pixel_mut(x, y);
            px[3] = px[3].min(alpha);
        }

        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_shot(size: u32) -> RgbaImage {
        // white backdrop with a dark square in the middle
        RgbaImage::from_fn(size, size, |x, y| {
            let inside = x >= size / 4 && x < size * 3 / 4 && y >= size / 4 && y < size * 3 / 4;
            if inside {
                Rgba([20, 60, 120, 255])
            } else {
                Rgba([250, 250, 248, 255])
            }
        })
    }

    #[test]
    fn test_has_transparency() {
        let opaque = encode_png(product_shot(8)).unwrap();
        assert!(!has_transparency(&opaque));

        let mut img = product_shot(8);
        img.get_pixel_mut(0, 0)[3] = 10;
        let translucent = encode_png(img).unwrap();
        assert!(has_transparency(&translucent));

        assert!(!has_transparency(b"not an image"));
    }

    #[test]
    fn test_has_transparency_ignores_fully_opaque_alpha_channel() {
        // RGBA PNG whose alpha is 255 everywhere
        let png = encode_png(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]))).unwrap();
        assert!(!has_transparency(&png));
    }

    #[test]
    fn test_edge_flood_remover_clears_backdrop_only() {
        let out = EdgeFloodRemover::new(30).remove(product_shot(40));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(39, 20)[3], 0);
        assert_eq!(out.get_pixel(20, 20)[3], 255);
        assert_eq!(out.get_pixel(20, 20)[0], 20);
    }

    #[test]
    fn test_edge_flood_remover_keeps_enclosed_background_colour() {
        // a white hole inside the product is not reachable from the border
        let mut img = product_shot(40);
        img.put_pixel(20, 20, Rgba([250, 250, 248, 255]));
        let out = EdgeFloodRemover::new(30).remove(img);
        assert_eq!(out.get_pixel(20, 20)[3], 255);
    }

    #[test]
    fn test_cutout_resizes_opaque_images() {
        let png = encode_png(product_shot(20)).unwrap();
        let out = to_cutout_png(&png, 64, &EdgeFloodRemover::new(30)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (64, 64));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_cutout_passes_transparent_images_through() {
        let mut img = product_shot(20);
        img.get_pixel_mut(0, 0)[3] = 0;
        let png = encode_png(img).unwrap();
        let out = to_cutout_png(&png, 64, &EdgeFloodRemover::new(30)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (20, 20));
        assert_eq!(decoded.get_pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_cutout_strips_images_without_alpha_channel() {
        let rgb = DynamicImage::ImageRgba8(product_shot(16)).to_rgb8();
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        assert!(!has_transparency(&png));

        let out = to_cutout_png(&png, 32, &EdgeFloodRemover::new(30)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (32, 32));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        assert_eq!(decoded.get_pixel(16, 16)[3], 255);
    }

    #[test]
    fn test_cutout_rejects_undecodable_bytes() {
        assert!(to_cutout_png(b"<html>", 32, &EdgeFloodRemover::new(30)).is_err());
    }

    #[test]
    fn test_to_rgba_png_rejects_garbage() {
        assert!(to_rgba_png(b"<html>404</html>").is_err());
    }
}
