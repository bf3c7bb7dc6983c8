//! Speedup and efficiency ratios, and their qualitative bands.
//!
//! Everything here is a pure function of measured throughput. A ratio whose
//! denominator (or numerator) was not measured is [`Ratio::NotApplicable`],
//! never a division by zero.

use crate::bench::BenchmarkResult;
use crate::config::{
    EFFICIENCY_EXCELLENT, EFFICIENCY_GOOD, ZERO_COPY_EXCELLENT_MBPS, ZERO_COPY_GOOD_MBPS,
};
use serde::{Serialize, Serializer};

/// Ratio of two throughputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    NotApplicable,
}

impl Ratio {
    /// `numerator / denominator`, or `NotApplicable` if either side was not
    /// measured.
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 && numerator > 0.0 && denominator.is_finite() && numerator.is_finite() {
            Self::Value(numerator / denominator)
        } else {
            Self::NotApplicable
        }
    }

    /// Ratio value, if applicable.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotApplicable => None,
        }
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}x"),
            Self::NotApplicable => write!(f, "n/a"),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Qualitative outcome band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Excellent,
    Good,
    NeedsWork,
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::NeedsWork => write!(f, "needs work"),
        }
    }
}

/// Band for an efficiency ratio; `None` when not applicable.
pub fn classify_efficiency(ratio: Ratio) -> Option<Band> {
    ratio.value().map(|v| {
        if v > EFFICIENCY_EXCELLENT {
            Band::Excellent
        } else if v > EFFICIENCY_GOOD {
            Band::Good
        } else {
            Band::NeedsWork
        }
    })
}

/// Band for zero-copy read throughput; `None` when not measured.
pub fn classify_zero_copy(read_mbps: f64) -> Option<Band> {
    if read_mbps <= 0.0 {
        return None;
    }
    Some(if read_mbps > ZERO_COPY_EXCELLENT_MBPS {
        Band::Excellent
    } else if read_mbps > ZERO_COPY_GOOD_MBPS {
        Band::Good
    } else {
        Band::NeedsWork
    })
}

/// `comparison / baseline`.
pub fn speedup(comparison: f64, baseline: f64) -> Ratio {
    Ratio::of(comparison, baseline)
}

/// `candidate / reference`.
pub fn efficiency(candidate: f64, reference: f64) -> Ratio {
    Ratio::of(candidate, reference)
}

/// Which phase a comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Read,
    Write,
}

impl Metric {
    fn throughput(self, result: &BenchmarkResult) -> f64 {
        match self {
            Self::Read => result.read_throughput_mbps(),
            Self::Write => result.write_throughput_mbps(),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// How a ratio is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    Speedup,
    Efficiency,
}

/// One derived ratio between two measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Heading the comparison is grouped under.
    pub title: &'static str,
    pub metric: Metric,
    pub kind: RatioKind,
    /// Target measured by the numerator.
    pub candidate: String,
    /// Target measured by the denominator.
    pub baseline: String,
    pub ratio: Ratio,
    /// Set for efficiency ratios only.
    pub band: Option<Band>,
}

/// A measured target: display name plus its result.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub name: &'a str,
    pub result: &'a BenchmarkResult,
}

impl<'a> Target<'a> {
    pub fn new(name: &'a str, result: &'a BenchmarkResult) -> Self {
        Self { name, result }
    }
}

/// Speedup of `candidate` over `baseline` for one metric.
pub fn compare_speedup(
    title: &'static str,
    metric: Metric,
    candidate: Target<'_>,
    baseline: Target<'_>,
) -> Comparison {
    Comparison {
        title,
        metric,
        kind: RatioKind::Speedup,
        candidate: candidate.name.to_string(),
        baseline: baseline.name.to_string(),
        ratio: speedup(metric.throughput(candidate.result), metric.throughput(baseline.result)),
        band: None,
    }
}

/// Efficiency of `candidate` relative to `reference` for one metric.
pub fn compare_efficiency(
    title: &'static str,
    metric: Metric,
    candidate: Target<'_>,
    reference: Target<'_>,
) -> Comparison {
    let ratio = efficiency(
        metric.throughput(candidate.result),
        metric.throughput(reference.result),
    );
    Comparison {
        title,
        metric,
        kind: RatioKind::Efficiency,
        candidate: candidate.name.to_string(),
        baseline: reference.name.to_string(),
        ratio,
        band: classify_efficiency(ratio),
    }
}

/// Absolute-throughput sanity check on zero-copy reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroCopyCheck {
    pub target: String,
    pub read_mbps: f64,
    pub band: Option<Band>,
}

/// Comparative section of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub comparisons: Vec<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_copy: Option<ZeroCopyCheck>,
}

/// Measurements of the volume comparison.
#[derive(Debug, Clone, Copy)]
pub struct VolumeTargets<'a> {
    pub regular_sync: Target<'a>,
    pub accelerated_sync: Target<'a>,
    pub accelerated_mapped: Target<'a>,
    pub memory: Target<'a>,
}

/// Zero-copy vs regular I/O, mapping vs synchronous on the accelerated
/// volume, mapped overhead against plain memory, and the zero-copy band.
pub fn analyze_volumes(targets: &VolumeTargets<'_>) -> Analysis {
    let mut comparisons = Vec::new();
    for metric in [Metric::Read, Metric::Write] {
        comparisons.push(compare_speedup(
            "Zero-copy vs regular synchronous I/O",
            metric,
            targets.accelerated_mapped,
            targets.regular_sync,
        ));
    }
    for metric in [Metric::Read, Metric::Write] {
        comparisons.push(compare_speedup(
            "Mapped vs synchronous on the accelerated volume",
            metric,
            targets.accelerated_mapped,
            targets.accelerated_sync,
        ));
    }
    for metric in [Metric::Read, Metric::Write] {
        comparisons.push(compare_efficiency(
            "Mapped access vs direct memory",
            metric,
            targets.accelerated_mapped,
            targets.memory,
        ));
    }

    let read_mbps = targets.accelerated_mapped.result.read_throughput_mbps();
    Analysis {
        comparisons,
        zero_copy: Some(ZeroCopyCheck {
            target: targets.accelerated_mapped.name.to_string(),
            read_mbps,
            band: classify_zero_copy(read_mbps),
        }),
    }
}

/// Measurements of the cache-layer comparison.
#[derive(Debug, Clone, Copy)]
pub struct CacheTargets<'a> {
    pub original: Target<'a>,
    pub direct_cache: Target<'a>,
    pub layered: Target<'a>,
}

/// Cache and layered speedups over the original store, and the layered
/// path's efficiency relative to the direct cache.
pub fn analyze_cache(targets: &CacheTargets<'_>) -> Analysis {
    let metric = Metric::Read;
    Analysis {
        comparisons: vec![
            compare_speedup("Speedup vs original", metric, targets.direct_cache, targets.original),
            compare_speedup("Speedup vs original", metric, targets.layered, targets.original),
            compare_efficiency(
                "Caching layer vs direct cache access",
                metric,
                targets.layered,
                targets.direct_cache,
            ),
        ],
        zero_copy: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::{PhaseOutcome, PhaseStats};
    use std::time::Duration;

    fn measured(mbps: f64) -> PhaseOutcome {
        PhaseOutcome::Measured(PhaseStats {
            elapsed: Duration::from_secs(1),
            attempted_ops: 1000,
            failed_ops: 0,
            bytes: 4_096_000,
            throughput_mbps: mbps,
        })
    }

    fn result(read: f64, write: f64) -> BenchmarkResult {
        let outcome = |v: f64| {
            if v > 0.0 {
                measured(v)
            } else {
                PhaseOutcome::skipped()
            }
        };
        BenchmarkResult::new("x", outcome(write), outcome(read))
    }

    #[test]
    fn test_zero_baseline_is_not_applicable() {
        assert_eq!(speedup(120.0, 0.0), Ratio::NotApplicable);
        assert_eq!(speedup(120.0, 0.0).to_string(), "n/a");
        assert_eq!(efficiency(0.0, 50.0), Ratio::NotApplicable);
        assert_eq!(classify_efficiency(Ratio::NotApplicable), None);
    }

    #[test]
    fn test_ratio_display() {
        assert_eq!(speedup(246.0, 200.0).to_string(), "1.23x");
    }

    #[test]
    fn test_efficiency_bands() {
        assert_eq!(classify_efficiency(Ratio::Value(0.81)), Some(Band::Excellent));
        assert_eq!(classify_efficiency(Ratio::Value(0.8)), Some(Band::Good));
        assert_eq!(classify_efficiency(Ratio::Value(0.51)), Some(Band::Good));
        assert_eq!(classify_efficiency(Ratio::Value(0.5)), Some(Band::NeedsWork));
    }

    #[test]
    fn test_zero_copy_bands() {
        assert_eq!(classify_zero_copy(1200.0), Some(Band::Excellent));
        assert_eq!(classify_zero_copy(500.0), Some(Band::Good));
        assert_eq!(classify_zero_copy(100.0), Some(Band::NeedsWork));
        assert_eq!(classify_zero_copy(0.0), None);
    }

    #[test]
    fn test_cache_analysis() {
        let original = result(50.0, 0.0);
        let direct = result(400.0, 0.0);
        let layered = result(300.0, 0.0);
        let analysis = analyze_cache(&CacheTargets {
            original: Target::new("original", &original),
            direct_cache: Target::new("direct cache", &direct),
            layered: Target::new("layered", &layered),
        });

        assert_eq!(analysis.comparisons[0].ratio, Ratio::Value(8.0));
        assert_eq!(analysis.comparisons[1].ratio, Ratio::Value(6.0));
        let eff = &analysis.comparisons[2];
        assert_eq!(eff.ratio, Ratio::Value(0.75));
        assert_eq!(eff.band, Some(Band::Good));
    }

    #[test]
    fn test_cache_analysis_without_original() {
        let original = result(0.0, 0.0);
        let direct = result(400.0, 0.0);
        let analysis = analyze_cache(&CacheTargets {
            original: Target::new("original", &original),
            direct_cache: Target::new("direct cache", &direct),
            layered: Target::new("layered", &direct),
        });
        assert_eq!(analysis.comparisons[0].ratio, Ratio::NotApplicable);
        assert_eq!(analysis.comparisons[2].band, Some(Band::Excellent));
    }

    #[test]
    fn test_volume_analysis() {
        let regular = result(20.0, 10.0);
        let accel_sync = result(100.0, 40.0);
        let accel_mapped = result(800.0, 400.0);
        let memory = result(1000.0, 1000.0);
        let analysis = analyze_volumes(&VolumeTargets {
            regular_sync: Target::new("regular sync", &regular),
            accelerated_sync: Target::new("accel sync", &accel_sync),
            accelerated_mapped: Target::new("accel mapped", &accel_mapped),
            memory: Target::new("memory", &memory),
        });

        let ratios: Vec<Option<f64>> = analysis.comparisons.iter().map(|c| c.ratio.value()).collect();
        assert_eq!(
            ratios,
            vec![Some(40.0), Some(40.0), Some(8.0), Some(10.0), Some(0.8), Some(0.4)]
        );
        let zero_copy = analysis.zero_copy.unwrap();
        assert_eq!(zero_copy.band, Some(Band::Excellent));
    }

    #[test]
    fn test_ratio_serializes_as_nullable_number() {
        assert_eq!(serde_json::to_value(Ratio::Value(2.5)).unwrap(), serde_json::json!(2.5));
        assert!(serde_json::to_value(Ratio::NotApplicable).unwrap().is_null());
    }
}
