use std::sync::atomic::{AtomicBool, Ordering};

/// Check whether an optional cancellation flag has been raised.
#[must_use]
pub fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.map(|flag| flag.load(Ordering::SeqCst)).unwrap_or(false)
}

/// Render a byte count as a short human-friendly string.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let value = bytes as f64;
    if value < KIB {
        format!("{bytes} B")
    } else if value < MIB {
        format!("{:.1} KB", value / KIB)
    } else {
        format!("{:.1} MB", value / MIB)
    }
}

/// Download progress as a fraction in `0.0..=1.0`.
#[must_use]
pub fn progress_fraction(downloaded: u64, total: Option<u64>) -> f32 {
    match total {
        Some(total) if total > 0 => (downloaded as f32 / total as f32).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Status text such as `42% (1.2 MB of 2.9 MB)`.
#[must_use]
pub fn progress_text(downloaded: u64, total: Option<u64>) -> String {
    match total {
        Some(total) => format!(
            "{:.0}% ({} of {})",
            progress_fraction(downloaded, Some(total)) * 100.0,
            format_bytes(downloaded),
            format_bytes(total)
        ),
        None => format_bytes(downloaded),
    }
}
