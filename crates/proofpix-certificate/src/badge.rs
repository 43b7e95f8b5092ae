//! PNG score badges.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use proofpix_core::traits::BadgeRenderer;
use proofpix_core::CoreResult;

use crate::error::CertificateResult;

pub const BADGE_WIDTH: u32 = 250;
pub const BADGE_HEIGHT: u32 = 60;

const GREEN: [u8; 3] = [76, 175, 80];
const ORANGE: [u8; 3] = [255, 152, 0];
const RED: [u8; 3] = [244, 67, 54];

/// Progress bar geometry.
const BAR_MARGIN: u32 = 12;
const BAR_TOP: u32 = 40;
const BAR_HEIGHT: u32 = 8;

/// Fill colour for a score: green at 90+, orange at 70+, red below.
pub fn badge_color(score: u8) -> [u8; 3] {
    if score >= 90 {
        GREEN
    } else if score >= 70 {
        ORANGE
    } else {
        RED
    }
}

/// Renders a solid badge in the score colour with a lighter progress bar
/// whose length is proportional to the score.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngBadgeRenderer;

impl PngBadgeRenderer {
    pub fn new() -> Self {
        Self
    }

    /// The unencoded badge image.
    pub fn draw(&self, score: u8) -> RgbaImage {
        let score = score.min(100);
        let [r, g, b] = badge_color(score);
        let fill = Rgba([r, g, b, 255]);
        let track = Rgba([shade(r, 0.75), shade(g, 0.75), shade(b, 0.75), 255]);
        let bar = Rgba([tint(r), tint(g), tint(b), 255]);

        let bar_width = BADGE_WIDTH - 2 * BAR_MARGIN;
        let filled = bar_width * u32::from(score) / 100;

        RgbaImage::from_fn(BADGE_WIDTH, BADGE_HEIGHT, |x, y| {
            let in_bar_rows = (BAR_TOP..BAR_TOP + BAR_HEIGHT).contains(&y);
            let in_bar_cols = (BAR_MARGIN..BAR_MARGIN + bar_width).contains(&x);
            if in_bar_rows && in_bar_cols {
                if x < BAR_MARGIN + filled {
                    bar
                } else {
                    track
                }
            } else {
                fill
            }
        })
    }

    /// PNG bytes of the badge.
    pub fn render_png(&self, score: u8) -> CertificateResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.draw(score).write_to(&mut cursor, ImageFormat::Png)?;
        let bytes = cursor.into_inner();
        debug!(score, bytes = bytes.len(), "badge rendered");
        Ok(bytes)
    }
}

impl BadgeRenderer for PngBadgeRenderer {
    fn render(&self, score: u8) -> CoreResult<Vec<u8>> {
        Ok(self.render_png(score)?)
    }
}

/// Blend a channel halfway toward white.
fn tint(channel: u8) -> u8 {
    channel + (255 - channel) / 2
}

fn shade(channel: u8, factor: f32) -> u8 {
    (f32::from(channel) * factor) as u8
}
