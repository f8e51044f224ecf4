//! Composite "very uncomfortable" score
//!
//! ```text
//! thermal            = max(very_hot, very_cold)
//! very_uncomfortable = min(100, 0.6·thermal + 0.2·very_wet + 0.2·very_windy)
//! ```
//!
//! Thermal extremes dominate; wind and rain contribute additively.

use crate::config::CompositeWeights;
use crate::hazard::PrimaryLikelihoods;
use crate::round_to_tenth;

/// Score from post-blend likelihoods, capped at 100 and rounded to one decimal.
pub fn very_uncomfortable(likelihoods: &PrimaryLikelihoods, weights: &CompositeWeights) -> f64 {
    let thermal = likelihoods.very_hot.max(likelihoods.very_cold);
    let score = weights.thermal * thermal + weights.wet * likelihoods.very_wet + weights.windy * likelihoods.very_windy;
    round_to_tenth(score.min(100.0))
}
