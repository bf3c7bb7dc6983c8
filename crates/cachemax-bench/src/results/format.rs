//! Number formatting utilities.

use crate::results::analysis::Ratio;
use std::time::Duration;

/// Format throughput in MB/s. Zero means the phase was not measured.
pub fn format_mbps(mbps: f64) -> String {
    if mbps > 0.0 {
        format!("{mbps:.2} MB/s")
    } else {
        "not measured".to_string()
    }
}

/// Format a ratio as a percentage, e.g. "85.0%".
pub fn format_percentage(ratio: Ratio) -> String {
    match ratio {
        Ratio::Value(v) => format!("{:.1}%", v * 100.0),
        Ratio::NotApplicable => "n/a".to_string(),
    }
}

/// Format duration as human-readable latency.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos >= 1_000_000_000 {
        format!("{:.2} s", duration.as_secs_f64())
    } else if nanos >= 1_000_000 {
        format!("{:.2} ms", nanos as f64 / 1_000_000.0)
    } else if nanos >= 1_000 {
        format!("{:.2} us", nanos as f64 / 1_000.0)
    } else {
        format!("{nanos} ns")
    }
}

/// Format a byte count in binary units.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB && bytes % GIB == 0 {
        format!("{} GiB", bytes / GIB)
    } else if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mbps() {
        assert_eq!(format_mbps(123.456), "123.46 MB/s");
        assert_eq!(format_mbps(0.0), "not measured");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(Ratio::Value(0.853)), "85.3%");
        assert_eq!(format_percentage(Ratio::NotApplicable), "n/a");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500 ns");
        assert_eq!(format_duration(Duration::from_micros(500)), "500.00 us");
        assert_eq!(format_duration(Duration::from_millis(500)), "500.00 ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.00 s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(32 * 1024 * 1024), "32 MiB");
        assert_eq!(format_bytes(4096), "4 KiB");
        assert_eq!(format_bytes(1000), "1000 B");
    }
}
