use std::path::Path;

use eframe::egui::{
    self, pos2, Color32, ColorImage, CornerRadius, Painter, Rect, TextureHandle, TextureOptions,
    Vec2,
};

use crate::config::VideoConfig;

pub mod video;

use video::{FrameGeometry, VideoDecoder};

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mkv", "webm", "mov"];
const FALLBACK: Color32 = Color32::BLACK;
const FULL_UV: Rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundKind {
    Image,
    Video,
}

impl BackgroundKind {
    /// decided by extension only, anything that isn't a known video container is tried as an image
    #[must_use]
    pub fn of(path: &Path) -> Self {
        let is_video = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                VIDEO_EXTENSIONS
                    .iter()
                    .any(|video| video.eq_ignore_ascii_case(ext))
            });
        if is_video {
            Self::Video
        } else {
            Self::Image
        }
    }
}

pub struct VideoBackground {
    decoder: VideoDecoder,
    texture: Option<TextureHandle>,
}

pub enum Background {
    Solid(Color32),
    Image(TextureHandle),
    Video(VideoBackground),
}

/// largest rect with the image's aspect ratio that fits in `area`, centered
#[must_use]
pub fn contain_rect(image: Vec2, area: Rect) -> Rect {
    if image.x <= 0.0 || image.y <= 0.0 {
        return area;
    }
    let scale = (area.width() / image.x).min(area.height() / image.y);
    Rect::from_center_size(area.center(), image * scale)
}

/// shrinks `(width, height)` so neither side is over `max_side`, keeping the aspect ratio
#[must_use]
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side {
        return (width, height);
    }
    let scale = |side: u32| {
        let scaled = (u64::from(side) * u64::from(max_side) + u64::from(longest) / 2)
            / u64::from(longest);
        u32::try_from(scaled).unwrap_or(max_side).clamp(1, max_side)
    };
    (scale(width), scale(height))
}

fn load_image(ctx: &egui::Context, path: &Path) -> Result<TextureHandle, image::ImageError> {
    let mut image = image::open(path)?.to_rgba8();
    let max_side = u32::try_from(ctx.input(|i| i.max_texture_side)).unwrap_or(u32::MAX);
    let (width, height) = fit_within(image.width(), image.height(), max_side);
    if (width, height) != image.dimensions() {
        log::info!(
            "scaling background image {} from {}x{} to {width}x{height}",
            path.display(),
            image.width(),
            image.height()
        );
        image = image::imageops::thumbnail(&image, width, height);
    }
    let size = [image.width() as usize, image.height() as usize];
    let image = ColorImage::from_rgba_unmultiplied(size, &image.into_raw());
    Ok(ctx.load_texture("background.image", image, TextureOptions::LINEAR))
}

impl Background {
    /// never fails, anything that can't be shown ends up as a black background
    #[must_use]
    pub fn load(ctx: &egui::Context, path: Option<&Path>, video: &VideoConfig) -> Self {
        let Some(path) = path else {
            return Self::Solid(FALLBACK);
        };
        match BackgroundKind::of(path) {
            BackgroundKind::Image => match load_image(ctx, path) {
                Ok(texture) => Self::Image(texture),
                Err(e) => {
                    log::warn!("couldn't load background image {}: {e}", path.display());
                    Self::Solid(FALLBACK)
                }
            },
            BackgroundKind::Video => {
                let repaint = ctx.clone();
                let decoder = FrameGeometry::new(video.width, video.height).and_then(|geometry| {
                    VideoDecoder::spawn(&video.decoder, path, geometry, move || {
                        repaint.request_repaint();
                    })
                });
                match decoder {
                    Ok(decoder) => Self::Video(VideoBackground {
                        decoder,
                        texture: None,
                    }),
                    Err(e) => {
                        log::warn!("couldn't play background video {}: {e}", path.display());
                        Self::Solid(FALLBACK)
                    }
                }
            }
        }
    }

    /// uploads a new video frame if one arrived, then fills `rect`
    pub fn paint(&mut self, ctx: &egui::Context, painter: &Painter, rect: Rect) {
        match self {
            Self::Solid(color) => {
                painter.rect_filled(rect, CornerRadius::ZERO, *color);
            }
            Self::Image(texture) => {
                painter.rect_filled(rect, CornerRadius::ZERO, FALLBACK);
                let fit = contain_rect(texture.size_vec2(), rect);
                painter.image(texture.id(), fit, FULL_UV, Color32::WHITE);
            }
            Self::Video(video) => {
                video.upload_latest(ctx);
                match &video.texture {
                    // the last frame stays up after the decoder stops
                    Some(texture) => {
                        painter.image(texture.id(), rect, FULL_UV, Color32::WHITE);
                    }
                    None => {
                        painter.rect_filled(rect, CornerRadius::ZERO, FALLBACK);
                    }
                }
            }
        }
    }

    pub fn stop(&self) {
        if let Self::Video(video) = self {
            video.decoder.stop();
        }
    }
}

impl VideoBackground {
    fn upload_latest(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.decoder.take_frame() else {
            return;
        };
        let image = ColorImage::from_rgba_unmultiplied(self.decoder.geometry().size(), &frame);
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("background.video", image, TextureOptions::LINEAR));
            }
        }
        self.decoder.recycle(frame);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn kind_by_extension() {
        assert_eq!(BackgroundKind::of(Path::new("a.mp4")), BackgroundKind::Video);
        assert_eq!(BackgroundKind::of(Path::new("a.MKV")), BackgroundKind::Video);
        assert_eq!(BackgroundKind::of(Path::new("/x/y.webm")), BackgroundKind::Video);
        assert_eq!(BackgroundKind::of(Path::new("a.png")), BackgroundKind::Image);
        assert_eq!(BackgroundKind::of(Path::new("mp4")), BackgroundKind::Image);
        assert_eq!(BackgroundKind::of(Path::new("noext")), BackgroundKind::Image);
    }

    #[test]
    fn contain_letterboxes_wide_images() {
        let area = Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(1000.0, 1000.0));
        let fit = contain_rect(Vec2::new(200.0, 100.0), area);
        assert_eq!(fit.width(), 1000.0);
        assert_eq!(fit.height(), 500.0);
        assert_eq!(fit.center(), area.center());
    }

    #[test]
    fn contain_pillarboxes_tall_images() {
        let area = Rect::from_min_size(pos2(10.0, 10.0), Vec2::new(1600.0, 900.0));
        let fit = contain_rect(Vec2::new(100.0, 300.0), area);
        assert_eq!(fit.height(), 900.0);
        assert_eq!(fit.width(), 300.0);
        assert_eq!(fit.center(), area.center());
    }

    #[test]
    fn no_path_is_black() {
        let ctx = egui::Context::default();
        let background = Background::load(&ctx, None, &VideoConfig::default());
        assert!(matches!(background, Background::Solid(Color32::BLACK)));
    }

    #[test]
    fn unreadable_image_is_black() {
        let ctx = egui::Context::default();
        let background = Background::load(
            &ctx,
            Some(Path::new("/definitely/not/here.png")),
            &VideoConfig::default(),
        );
        assert!(matches!(background, Background::Solid(Color32::BLACK)));
    }

    #[test]
    fn image_is_loaded_into_a_texture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let ctx = egui::Context::default();
        let background = Background::load(&ctx, Some(&path), &VideoConfig::default());
        let Background::Image(texture) = background else {
            panic!("expected an image background");
        };
        assert_eq!(texture.size(), [4, 2]);
    }

    #[test]
    fn fit_within_keeps_aspect() {
        assert_eq!(fit_within(1920, 1080, 2048), (1920, 1080));
        assert_eq!(fit_within(4096, 2048, 2048), (2048, 1024));
        assert_eq!(fit_within(1000, 3000, 300), (100, 300));
        assert_eq!(fit_within(3000, 10, 2048), (2048, 7));
        assert_eq!(fit_within(100_000, 1, 2048), (2048, 1));
    }

    #[test]
    fn huge_image_is_scaled_to_texture_limit() {
        let ctx = egui::Context::default();
        let max_side = ctx.input(|i| i.max_texture_side);
        let width = u32::try_from(max_side * 2).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbaImage::from_pixel(width, 4, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();
        let background = Background::load(&ctx, Some(&path), &VideoConfig::default());
        let Background::Image(texture) = background else {
            panic!("expected an image background");
        };
        assert_eq!(texture.size(), [max_side, 2]);
    }

    #[cfg(unix)]
    #[test]
    fn last_video_frame_stays_uploaded() {
        use video::tests::{fake_decoder, wait_until_finished};

        let geometry = FrameGeometry::new(2, 2).unwrap();
        // two whole frames, only the second is still waiting when the reader stops
        let decoder = VideoDecoder::spawn_command(
            fake_decoder("2x2", 2 * geometry.frame_len()),
            geometry,
            video::NEGOTIATION_TIMEOUT,
            || {},
        )
        .unwrap();
        wait_until_finished(&decoder);
        assert_eq!(decoder.spare_len(), None);

        let ctx = egui::Context::default();
        let mut video = VideoBackground {
            decoder,
            texture: None,
        };
        video.upload_latest(&ctx);
        assert_eq!(video.texture.as_ref().map(TextureHandle::size), Some([2, 2]));
        assert_eq!(video.decoder.spare_len(), Some(geometry.frame_len()));

        // nothing new, the uploaded frame stays
        let id = video.texture.as_ref().map(TextureHandle::id);
        video.upload_latest(&ctx);
        assert_eq!(video.texture.as_ref().map(TextureHandle::id), id);
        assert_eq!(video.texture.as_ref().map(TextureHandle::size), Some([2, 2]));
        assert_eq!(video.decoder.take_frame(), None);
    }

    #[test]
    fn missing_decoder_is_black() {
        let video = VideoConfig {
            decoder: PathBuf::from("/definitely/not/ffmpeg"),
            ..VideoConfig::default()
        };
        let ctx = egui::Context::default();
        let background = Background::load(&ctx, Some(Path::new("bg.mp4")), &video);
        assert!(matches!(background, Background::Solid(Color32::BLACK)));
    }
}
