//! Human-readable rendering of access window durations.

const UNITS: [(u64, &str); 4] = [(86_400, "day"), (3_600, "hour"), (60, "minute"), (1, "second")];

/// Render a number of seconds as its two most significant non-zero units,
/// e.g. `1 hour 30 minutes` or `1 hour 5 seconds`.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0 seconds".to_string();
    }

    let mut remaining = seconds;
    let mut parts = Vec::with_capacity(2);
    for (size, name) in UNITS {
        if remaining < size {
            continue;
        }
        let count = remaining / size;
        remaining %= size;
        parts.push(plural(count, name));
        if parts.len() == 2 || remaining == 0 {
            break;
        }
    }

    parts.join(" ")
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
