//! Template matching implementation
//!
//! Brute-force zero-mean normalized cross-correlation over every top-left offset.
//! Rows are scanned top to bottom, offsets left to right, and the running best is only
//! replaced by a strictly greater score, so on ties the first offset in scan order wins.
use super::error::MatchError;
use super::types::{Candidate, IntensityField, MatchResult};

/// Template matcher for finding a template inside a screen
pub struct TemplateMatcher;

/// Mean and population standard deviation of a sample set
fn mean_std(samples: impl Iterator<Item = u8> + Clone, n: usize) -> (f64, f64) {
    let sum: u64 = samples.clone().map(u64::from).sum();
    let mean = sum as f64 / n as f64;
    let sq: f64 = samples
        .map(|v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum();
    (mean, (sq / n as f64).sqrt())
}

impl TemplateMatcher {
    /// Search `screen` for `template`
    ///
    /// # Arguments
    /// * `screen` - intensity field of the captured screen
    /// * `template` - intensity field of the reference image
    /// * `min_confidence` - score a candidate must reach for `found`
    ///
    /// # Returns
    /// The best candidate's center and score. `found` is false for degenerate inputs
    /// (no score) and for best scores under `min_confidence` (score still reported).
    pub fn search(
        screen: &IntensityField,
        template: &IntensityField,
        min_confidence: f64,
    ) -> MatchResult {
        match Self::best_candidate(screen, template) {
            Ok(best) => {
                let result = MatchResult::from_candidate(
                    best,
                    template.width(),
                    template.height(),
                    min_confidence,
                );
                log::debug!(
                    "🔍 Best offset ({},{}) score {:.4} (threshold {:.2}, found={})",
                    best.x,
                    best.y,
                    best.score,
                    min_confidence,
                    result.found
                );
                result
            }
            Err(e) => {
                log::debug!("⚠️ Search skipped: {}", e);
                MatchResult::not_found()
            }
        }
    }

    /// Scan every offset and return the top-left of the highest-scoring one
    pub fn best_candidate(
        screen: &IntensityField,
        template: &IntensityField,
    ) -> Result<Candidate, MatchError> {
        let (sw, sh) = (screen.width(), screen.height());
        let (tw, th) = (template.width(), template.height());

        if tw > sw || th > sh {
            return Err(MatchError::DegenerateGeometry {
                template_width: tw,
                template_height: th,
                screen_width: sw,
                screen_height: sh,
            });
        }

        let n = template.len();
        if n == 0 {
            return Err(MatchError::DegenerateTemplate {
                width: tw,
                height: th,
            });
        }

        let (t_mean, t_std) = mean_std(template.samples().iter().copied(), n);
        if t_std == 0.0 {
            return Err(MatchError::DegenerateTemplate {
                width: tw,
                height: th,
            });
        }

        // Standardized template, reused at every offset
        let t_norm: Vec<f64> = template
            .samples()
            .iter()
            .map(|&v| (v as f64 - t_mean) / t_std)
            .collect();

        let rows = (sh - th + 1) as usize;
        let report_interval = (rows / 10).max(1);
        let mut best: Option<Candidate> = None;

        for oy in 0..=(sh - th) {
            for ox in 0..=(sw - tw) {
                let corr = Self::correlation_at(screen, ox, oy, tw, th, &t_norm);
                // Strict comparison keeps the earliest offset on ties
                if best.is_none_or(|b| corr > b.score) {
                    best = Some(Candidate {
                        x: ox,
                        y: oy,
                        score: corr,
                    });
                }
            }

            let done = oy as usize + 1;
            if done % report_interval == 0 {
                log::trace!("  ⏳ Correlation scanning: {}%", done * 100 / rows);
            }
        }

        // At least one offset exists because the template fits
        best.ok_or(MatchError::DegenerateGeometry {
            template_width: tw,
            template_height: th,
            screen_width: sw,
            screen_height: sh,
        })
    }

    /// Normalized correlation of the patch at `(ox, oy)` against the standardized template
    ///
    /// A flat patch cannot correlate and scores exactly 0.0.
    fn correlation_at(
        screen: &IntensityField,
        ox: u32,
        oy: u32,
        tw: u32,
        th: u32,
        t_norm: &[f64],
    ) -> f64 {
        let stride = screen.width() as usize;
        let data = screen.samples();
        let (tw, th) = (tw as usize, th as usize);
        let base = oy as usize * stride + ox as usize;

        let patch = (0..th).flat_map(move |py| {
            let row = base + py * stride;
            data[row..row + tw].iter().copied()
        });

        let n = t_norm.len();
        let (p_mean, p_std) = mean_std(patch.clone(), n);
        if p_std == 0.0 {
            return 0.0;
        }

        let sum: f64 = patch
            .zip(t_norm)
            .map(|(p, t)| ((p as f64 - p_mean) / p_std) * t)
            .sum();
        sum / n as f64
    }
}
