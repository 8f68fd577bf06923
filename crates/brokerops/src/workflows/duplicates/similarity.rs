//! Pairwise listing similarity scoring.
//!
//! All helpers are deterministic and side-effect free. Text similarity is
//! normalized Levenshtein over lower-cased, whitespace-collapsed strings, so
//! every sub-score is symmetric and bounded to [0, 1]. Missing fields degrade
//! their sub-score to 0.0 rather than erroring.

use super::domain::{GeoPoint, PropertyListing};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const GEO_EXACT_METERS: f64 = 60.0;
const GEO_DECAY_METERS: f64 = 4_000.0;

const IMAGE_WEIGHT: f64 = 0.35;
const LOCATION_WEIGHT: f64 = 0.25;
const SPECIFICS_WEIGHT: f64 = 0.25;
const PRICE_WEIGHT: f64 = 0.15;

pub(crate) fn normalize_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Normalized string similarity in [0, 1]; identical normalized strings
/// short-circuit to 1.0 and blank input on either side yields 0.0.
pub(crate) fn text_similarity(a: &str, b: &str) -> f64 {
    let aa = normalize_text(a);
    let bb = normalize_text(b);
    if aa.is_empty() || bb.is_empty() {
        return 0.0;
    }
    if aa == bb {
        return 1.0;
    }
    strsim::normalized_levenshtein(&aa, &bb)
}

/// Great-circle distance on a spherical earth.
pub(crate) fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let p1 = a.latitude.to_radians();
    let p2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

fn url_basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

pub(crate) fn image_score(a: Option<&str>, b: Option<&str>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    let na = normalize_text(a);
    let nb = normalize_text(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }
    let basename = text_similarity(url_basename(&na), url_basename(&nb)) * 0.8;
    let full = text_similarity(&na, &nb) * 0.5;
    basename.max(full)
}

pub(crate) fn location_score(a: &PropertyListing, b: &PropertyListing) -> f64 {
    let mut score = text_similarity(&a.location_text, &b.location_text);
    if let (Some(ga), Some(gb)) = (a.geo, b.geo) {
        let distance = haversine_meters(ga, gb);
        let geo = if distance <= GEO_EXACT_METERS {
            1.0
        } else {
            (1.0 - distance / GEO_DECAY_METERS).max(0.0)
        };
        score = score.max(geo);
    }
    score
}

/// Relative closeness of two positive magnitudes; 0.0 when either is absent.
fn closeness(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a > 0.0 && b > 0.0 => {
            (1.0 - (a - b).abs() / a.max(b).max(1.0)).max(0.0)
        }
        _ => 0.0,
    }
}

pub(crate) fn specifics_score(a: &PropertyListing, b: &PropertyListing) -> f64 {
    let type_match = if normalize_text(&a.asset_type) == normalize_text(&b.asset_type) {
        1.0
    } else {
        0.0
    };
    let config = text_similarity(&a.configuration, &b.configuration);
    let area = closeness(a.area_value, b.area_value);
    type_match * 0.45 + config * 0.40 + area * 0.15
}

pub(crate) fn price_score(a: &PropertyListing, b: &PropertyListing) -> f64 {
    closeness(a.price, b.price)
}

/// Duplicate-likelihood score for two listings in the same city, in [0, 100]
/// rounded to two decimals.
pub fn similarity_score(a: &PropertyListing, b: &PropertyListing) -> f64 {
    let total = image_score(a.image_url.as_deref(), b.image_url.as_deref()) * IMAGE_WEIGHT
        + location_score(a, b) * LOCATION_WEIGHT
        + specifics_score(a, b) * SPECIFICS_WEIGHT
        + price_score(a, b) * PRICE_WEIGHT;
    (total * 100.0 * 100.0).round() / 100.0
}
