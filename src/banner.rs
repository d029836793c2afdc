//! Share banner images.
//!
//! Every rendered news page gets a `<news.asset_url>/<slug>.png` banner used
//! as its `og:image` and as the index thumbnail fallback. Drawing sits behind
//! the [`BannerRenderer`] trait so the pipeline only sees
//! `render(title, subtitle) → PNG bytes`.
//!
//! [`PlainBanner`] is the built-in renderer. It lays out a 1200×630 card: the
//! optional site logo top-left, the title as up to three word-wrapped lines of
//! accent-colored blocks, one subtitle line, and a divider rule near the bottom.
//! Output is deterministic for the same input, so rebuilds leave banners
//! byte-identical.

use crate::config::{BannerConfig, Site, parse_hex_color};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("cannot load banner logo {}: {source}", .path.display())]
    Logo {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("invalid banner color '{0}'")]
    Color(String),
}

/// Produces PNG bytes for a page banner.
pub trait BannerRenderer: Sync {
    fn render(&self, title: &str, subtitle: &str) -> Result<Vec<u8>, BannerError>;
}

const MARGIN: u32 = 80;
const LOGO_MAX: u32 = 120;
const TITLE_TOP: u32 = 220;
const TITLE_LINE_HEIGHT: u32 = 62;
const TITLE_GLYPH: (u32, u32) = (27, 40);
const TITLE_MAX_LINES: usize = 3;
const SUBTITLE_GLYPH: (u32, u32) = (14, 20);
const SUBTITLE_COLOR: [u8; 3] = [71, 85, 105];
const WORD_GAP_GLYPHS: u32 = 1;

/// The built-in renderer.
///
/// Title and subtitle words are drawn as solid blocks sized to their
/// character count; no font is rasterized.
pub struct PlainBanner {
    width: u32,
    height: u32,
    background: Rgba<u8>,
    accent: Rgba<u8>,
    rule: Rgba<u8>,
    logo: Option<RgbaImage>,
}

impl PlainBanner {
    pub fn new(config: &BannerConfig, logo: Option<DynamicImage>) -> Result<Self, BannerError> {
        let color = |value: &str| {
            parse_hex_color(value)
                .map(|[r, g, b]| Rgba([r, g, b, 255]))
                .ok_or_else(|| BannerError::Color(value.to_string()))
        };
        Ok(Self {
            width: config.width,
            height: config.height,
            background: color(&config.background)?,
            accent: color(&config.accent)?,
            rule: color(&config.rule)?,
            logo: logo.map(|img| img.resize(LOGO_MAX, LOGO_MAX, FilterType::Lanczos3).to_rgba8()),
        })
    }

    /// Build from the site's `[banner]` config, loading the logo if one is set.
    pub fn from_site(site: &Site) -> Result<Self, BannerError> {
        let logo = match &site.config.banner.logo {
            Some(rel) => {
                let path = site.output_root().join(rel);
                let img = image::open(&path).map_err(|source| BannerError::Logo { path, source })?;
                Some(img)
            }
            None => None,
        };
        Self::new(&site.config.banner, logo)
    }

    fn draw(&self, title: &str, subtitle: &str) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(self.width, self.height, self.background);
        let max_width = self.width.saturating_sub(2 * MARGIN);

        if let Some(logo) = &self.logo {
            imageops::overlay(&mut canvas, logo, i64::from(MARGIN), i64::from(MARGIN));
        }

        let lines = wrap_words(title, TITLE_GLYPH.0, max_width, TITLE_MAX_LINES);
        for (i, line) in lines.iter().enumerate() {
            let y = TITLE_TOP + i as u32 * TITLE_LINE_HEIGHT;
            for &(x, w) in line {
                fill_rect(&mut canvas, MARGIN + x, y, w, TITLE_GLYPH.1, self.accent);
            }
        }

        let sub_y = TITLE_TOP + lines.len() as u32 * TITLE_LINE_HEIGHT + 20;
        let [r, g, b] = SUBTITLE_COLOR;
        if let Some(line) = wrap_words(subtitle, SUBTITLE_GLYPH.0, max_width, 1).first() {
            for &(x, w) in line {
                fill_rect(&mut canvas, MARGIN + x, sub_y, w, SUBTITLE_GLYPH.1, Rgba([r, g, b, 255]));
            }
        }

        let rule_y = self.height.saturating_sub(120);
        fill_rect(&mut canvas, MARGIN, rule_y, max_width, 2, self.rule);
        canvas
    }
}

impl BannerRenderer for PlainBanner {
    fn render(&self, title: &str, subtitle: &str) -> Result<Vec<u8>, BannerError> {
        let canvas = self.draw(title, subtitle);
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .to_rgb8()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Greedy word wrap with fixed-width glyphs.
///
/// Returns, per line, the `(x, width)` span of each word relative to the left
/// margin. Words wider than a whole line are clipped to it.
pub fn wrap_words(text: &str, glyph: u32, max_width: u32, max_lines: usize) -> Vec<Vec<(u32, u32)>> {
    let gap = glyph * WORD_GAP_GLYPHS;
    let mut lines: Vec<Vec<(u32, u32)>> = Vec::new();
    let mut line: Vec<(u32, u32)> = Vec::new();
    let mut cursor = 0;

    for word in text.split_whitespace() {
        let width = (word.chars().count() as u32 * glyph).min(max_width);
        let x = if line.is_empty() { 0 } else { cursor + gap };
        if !line.is_empty() && x + width > max_width {
            lines.push(std::mem::take(&mut line));
            if lines.len() == max_lines {
                return lines;
            }
            line.push((0, width));
            cursor = width;
        } else {
            line.push((x, width));
            cursor = x + width;
        }
    }
    if !line.is_empty() && lines.len() < max_lines {
        lines.push(line);
    }
    lines
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y.min(y_end)..y_end {
        for px in x.min(x_end)..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

/// Render the banner for `slug` and write it to the URL's on-disk location.
pub fn write_banner(
    site: &Site,
    renderer: &dyn BannerRenderer,
    banner_url: &str,
    title: &str,
    subtitle: &str,
) -> Result<PathBuf, BannerError> {
    let path = site.url_to_path(banner_url);
    write_bytes(&path, &renderer.render(title, subtitle)?)?;
    tracing::info!(path = %path.display(), "wrote banner");
    Ok(path)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}
