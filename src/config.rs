use std::env;

use crate::dtw::LocalMetric;

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_FRAME_RATE_HZ: f64 = 10.0;

/// Engine settings. Passed explicitly to every search; nothing reads the
/// environment except `from_env`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityConfig {
    pub metric: LocalMetric,
    pub include_z: bool,
    pub normalize_direction: bool,
    pub parallelism: usize,
    pub frame_rate_hz: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            metric: LocalMetric::Euclidean,
            include_z: false,
            normalize_direction: true,
            parallelism: 6,
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
        }
    }
}

impl SimilarityConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            metric: parse_metric(opt_env("SIMILARITY_METRIC"), d.metric),
            include_z: parse_bool(opt_env("SIMILARITY_INCLUDE_Z"), d.include_z),
            normalize_direction: parse_bool(
                opt_env("SIMILARITY_NORMALIZE_DIRECTION"),
                d.normalize_direction,
            ),
            parallelism: parse_parallelism(opt_env("SIMILARITY_PARALLELISM"), d.parallelism),
            frame_rate_hz: parse_frame_rate(opt_env("SIMILARITY_FRAME_RATE_HZ"), d.frame_rate_hz),
        }
    }
}

pub fn top_n_from_env() -> usize {
    parse_top_n(opt_env("SIMILARITY_TOP_N"))
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}

fn parse_metric(raw: Option<String>, default: LocalMetric) -> LocalMetric {
    raw.and_then(|val| LocalMetric::parse(&val)).unwrap_or(default)
}

fn parse_parallelism(raw: Option<String>, default: usize) -> usize {
    raw.and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(1, 64)
}

fn parse_frame_rate(raw: Option<String>, default: f64) -> f64 {
    raw.and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|hz| hz.is_finite() && *hz > 0.0)
        .unwrap_or(default)
}

fn parse_top_n(raw: Option<String>) -> usize {
    raw.and_then(|val| val.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_TOP_N)
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) => match v.as_str() {
            "1" | "true" | "on" | "yes" => true,
            "0" | "false" | "off" | "no" => false,
            _ => default,
        },
        None => default,
    }
}
