//! Human-readable file sizes.
//!
//! It's easier to read "16 KB" than "16555 bytes", or "1 MB" than
//! "1048576 bytes". Units are binary (1 KB = 1024 B) and the largest unit the
//! value reaches wins.

const UNITS: &[(&str, u64)] = &[
    ("TB", 1 << 40),
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
    ("B", 1),
];

/// Format a byte count with no decimals: `16555` → `"16 KB"`.
pub fn format_size(bytes: u64) -> String {
    format_size_with(bytes, 0)
}

/// Format a byte count with a fixed number of decimals.
///
/// Rounds half away from zero and groups thousands with `,`:
/// - `format_size_with(1536, 1)` → `"1.5 KB"`
/// - `format_size_with(0, 2)` → `"0.00 B"`
pub fn format_size_with(bytes: u64, decimals: usize) -> String {
    let (unit, magnitude) = UNITS
        .iter()
        .find(|(_, mag)| bytes >= *mag)
        .copied()
        .unwrap_or(("B", 1));
    let value = bytes as f64 / magnitude as f64;
    format!("{} {}", format_number(value, decimals), unit)
}

/// Round half away from zero and render with thousands separators.
fn format_number(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    let fixed = format!("{:.*}", decimals, rounded);

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_megabyte() {
        assert_eq!(format_size(1_048_576), "1 MB");
    }

    #[test]
    fn kilobytes_round_down() {
        assert_eq!(format_size(16_555), "16 KB");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 2.5 KB
        assert_eq!(format_size(2_560), "3 KB");
        // 1.5 KB
        assert_eq!(format_size(1_536), "2 KB");
    }

    #[test]
    fn zero_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size_with(0, 2), "0.00 B");
    }

    #[test]
    fn below_one_kilobyte_stays_in_bytes() {
        assert_eq!(format_size(1), "1 B");
        assert_eq!(format_size(1023), "1,023 B");
    }

    #[test]
    fn exact_unit_boundaries() {
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1 << 30), "1 GB");
        assert_eq!(format_size(1 << 40), "1 TB");
    }

    #[test]
    fn decimals() {
        assert_eq!(format_size_with(1_536, 1), "1.5 KB");
        assert_eq!(format_size_with(1_572_864, 2), "1.50 MB");
    }

    #[test]
    fn large_values_group_thousands() {
        assert_eq!(format_size(1500 * (1u64 << 40)), "1,500 TB");
    }
}
