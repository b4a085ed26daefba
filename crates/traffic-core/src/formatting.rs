//! Number and byte-size formatting for reports and summaries.

const BYTES_PER_KB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert a byte count to mebibytes (bytes / 1024²).
pub fn bytes_to_mb(bytes: f64) -> f64 {
    bytes / BYTES_PER_MB
}

/// Convert a byte count to gibibytes (bytes / 1024³).
pub fn bytes_to_gb(bytes: f64) -> f64 {
    bytes / BYTES_PER_GB
}

/// Format a number with thousands separators and a fixed number of decimals.
///
/// # Examples
///
/// ```
/// use traffic_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && rendered.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Human-readable byte size using binary units.
///
/// ```
/// use traffic_core::formatting::format_bytes;
///
/// assert_eq!(format_bytes(512.0), "512 B");
/// assert_eq!(format_bytes(1536.0), "1.50 KB");
/// assert_eq!(format_bytes(3.0 * 1024.0 * 1024.0), "3.00 MB");
/// ```
pub fn format_bytes(bytes: f64) -> String {
    let abs = bytes.abs();
    if abs >= BYTES_PER_GB {
        format!("{} GB", format_number(bytes_to_gb(bytes), 2))
    } else if abs >= BYTES_PER_MB {
        format!("{} MB", format_number(bytes_to_mb(bytes), 2))
    } else if abs >= BYTES_PER_KB {
        format!("{} KB", format_number(bytes / BYTES_PER_KB, 2))
    } else {
        format!("{} B", format_number(bytes, 0))
    }
}

/// `(part / whole) * 100`, or `0.0` when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
