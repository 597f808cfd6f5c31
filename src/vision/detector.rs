//! Template matching by zero-mean normalized cross-correlation

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};

use crate::{Result, TrackerError};

/// Correlation score for every template placement, indexed by top-left corner
pub type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Best placement of the template in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Top-left corner of the best window
    pub location: (u32, u32),
    /// Correlation score in [-1, 1]
    pub confidence: f32,
}

impl MatchResult {
    /// Whether this match clears `threshold`
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

/// Immutable grayscale template
#[derive(Debug, Clone)]
pub struct Template {
    image: GrayImage,
}

impl Template {
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel offset of the template centre from its top-left corner
    pub fn center(&self) -> (u32, u32) {
        (self.width() / 2, self.height() / 2)
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

/// Matches one template against captured frames
///
/// Template statistics are computed once. Per-frame window sums come from
/// integral images and the cross term from `imageproc`'s unnormalized
/// cross-correlation, which are combined into the zero-mean score.
pub struct TemplateMatcher {
    template: Template,
    /// Pixel count of the template
    n: i64,
    sum: i64,
    /// `n * sum(t^2) - sum(t)^2`, zero for a flat template
    spread: i64,
}

impl TemplateMatcher {
    pub fn new(template: Template) -> Self {
        let n = i64::from(template.width()) * i64::from(template.height());
        let (sum, sum_sq) = template
            .image()
            .as_raw()
            .iter()
            .fold((0i64, 0i64), |(s, sq), &p| {
                let p = i64::from(p);
                (s + p, sq + p * p)
            });

        if n * sum_sq - sum * sum == 0 {
            log::warn!("Template has no contrast; every match will score 0");
        }

        Self {
            template,
            n,
            sum,
            spread: n * sum_sq - sum * sum,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Score every placement of the template inside `frame`
    pub fn score_map(&self, frame: &GrayImage) -> Result<ScoreMap> {
        let (fw, fh) = frame.dimensions();
        let (tw, th) = (self.template.width(), self.template.height());
        if tw == 0 || th == 0 || tw > fw || th > fh {
            return Err(TrackerError::TemplateTooLarge {
                template_width: tw,
                template_height: th,
                frame_width: fw,
                frame_height: fh,
            });
        }

        // Integral images are one pixel larger than the frame with a zero border
        let sums = integral_image::<_, u64>(frame);
        let squares = integral_squared_image::<_, u64>(frame);
        let window = |img: &ImageBuffer<Luma<u64>, Vec<u64>>, x: u32, y: u32| -> i64 {
            let at = |x: u32, y: u32| img.get_pixel(x, y)[0] as i64;
            at(x + tw, y + th) - at(x, y + th) - at(x + tw, y) + at(x, y)
        };

        // Raw sum(f * t) per placement; exact while it stays below 2^24
        let method = MatchTemplateMethod::CrossCorrelation;
        let cross = match_template(frame, self.template.image(), method);
        let mut scores = ScoreMap::new(cross.width(), cross.height());

        for (x, y, raw) in cross.enumerate_pixels() {
            let sum = window(&sums, x, y);
            let spread = self.n * window(&squares, x, y) - sum * sum;
            if spread <= 0 || self.spread <= 0 {
                continue;
            }

            let numerator = self.n as f64 * f64::from(raw[0]).round() - (sum * self.sum) as f64;
            let denominator = (spread as f64 * self.spread as f64).sqrt();
            let score = (numerator / denominator).clamp(-1.0, 1.0);
            scores.put_pixel(x, y, Luma([score as f32]));
        }

        Ok(scores)
    }

    /// Best match of the template in `frame`, returned whatever its score
    pub fn find(&self, frame: &GrayImage) -> Result<MatchResult> {
        let scores = self.score_map(frame)?;
        let extremes = find_extremes(&scores);
        Ok(MatchResult {
            location: extremes.max_value_location,
            confidence: extremes.max_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic textured frame
    fn noise_frame(width: u32, height: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104729) ^ seed).wrapping_mul(2654435761);
            Luma([(v >> 24) as u8])
        })
    }

    fn crop(frame: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
        image::imageops::crop_imm(frame, x, y, w, h).to_image()
    }

    #[test]
    fn test_exact_match_location() {
        let frame = noise_frame(64, 48, 1);
        let matcher = TemplateMatcher::new(Template::new(crop(&frame, 20, 13, 9, 7)));

        let result = matcher.find(&frame).unwrap();
        assert_eq!(result.location, (20, 13));
        assert!((result.confidence - 1.0).abs() < 1e-5);
        assert!(result.is_confident(0.8));
    }

    #[test]
    fn test_match_survives_brightness_shift() {
        let frame = noise_frame(40, 40, 3);
        let template = crop(&frame, 5, 25, 8, 8);
        let brighter = GrayImage::from_fn(40, 40, |x, y| {
            Luma([(frame.get_pixel(x, y)[0] / 2).saturating_add(60)])
        });

        let result = TemplateMatcher::new(Template::new(template)).find(&brighter).unwrap();
        assert_eq!(result.location, (5, 25));
        assert!(result.confidence > 0.99);
    }

    #[test]
    fn test_inverted_template_scores_minus_one() {
        let frame = noise_frame(16, 16, 9);
        let inverted = GrayImage::from_fn(16, 16, |x, y| Luma([255 - frame.get_pixel(x, y)[0]]));

        let scores = TemplateMatcher::new(Template::new(inverted))
            .score_map(&frame)
            .unwrap();
        assert_eq!(scores.dimensions(), (1, 1));
        assert!((scores.get_pixel(0, 0)[0] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_scores_within_bounds() {
        let frame = noise_frame(50, 30, 11);
        let template = noise_frame(12, 10, 77);
        let scores = TemplateMatcher::new(Template::new(template))
            .score_map(&frame)
            .unwrap();

        assert_eq!(scores.dimensions(), (39, 21));
        assert!(scores.pixels().all(|p| (-1.0..=1.0).contains(&p[0])));
    }

    #[test]
    fn test_flat_regions_score_zero() {
        let flat_frame = GrayImage::from_pixel(20, 20, Luma([128]));
        let matcher = TemplateMatcher::new(Template::new(noise_frame(5, 5, 2)));
        let result = matcher.find(&flat_frame).unwrap();
        assert_eq!(result.confidence, 0.0);

        let flat = GrayImage::from_pixel(4, 4, Luma([10]));
        let flat_template = TemplateMatcher::new(Template::new(flat));
        let result = flat_template.find(&noise_frame(20, 20, 5)).unwrap();
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_confident(0.8));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let at = MatchResult {
            location: (0, 0),
            confidence: 0.8,
        };
        let below = MatchResult {
            confidence: 0.79999,
            ..at
        };

        assert!(at.is_confident(0.8));
        assert!(!below.is_confident(0.8));
    }

    #[test]
    fn test_imperfect_match_at_its_own_score() {
        let frame = noise_frame(32, 32, 21);
        let mut template = crop(&frame, 10, 4, 8, 8);
        template.put_pixel(0, 0, Luma([255 - template.get_pixel(0, 0)[0]]));
        template.put_pixel(5, 3, Luma([255 - template.get_pixel(5, 3)[0]]));

        let result = TemplateMatcher::new(Template::new(template)).find(&frame).unwrap();
        assert_eq!(result.location, (10, 4));
        assert!(result.confidence < 1.0);
        assert!(result.is_confident(result.confidence));
        assert!(!result.is_confident(result.confidence + f32::EPSILON));
    }

    #[test]
    fn test_large_template_scores_exact_match() {
        // sum(f * t) well past 2^24
        let frame = noise_frame(120, 120, 13);
        let template = crop(&frame, 30, 50, 60, 60);

        let result = TemplateMatcher::new(Template::new(template)).find(&frame).unwrap();
        assert_eq!(result.location, (30, 50));
        assert!((result.confidence - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_template_larger_than_frame() {
        let matcher = TemplateMatcher::new(Template::new(noise_frame(30, 10, 1)));
        let err = matcher.find(&noise_frame(20, 20, 1)).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::TemplateTooLarge {
                template_width: 30,
                frame_width: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_template_center() {
        let template = Template::new(GrayImage::new(11, 6));
        assert_eq!(template.center(), (5, 3));
    }
}
