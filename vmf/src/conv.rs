// Permissive keyvalue conversions. Every reader falls back to the
// caller-provided default instead of failing.

///
/// conv_bool
///
/// Recognizes the usual truthy / falsy tokens, case-insensitively
pub fn conv_bool(value: Option<&str>, default: bool) -> bool {
    let Some(raw) = value else {
        return default;
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "0" | "false" | "no" | "n" | "f" => false,
        "1" | "true" | "yes" | "y" | "t" => true,
        _ => default,
    }
}

pub fn conv_float(value: Option<&str>, default: f64) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

pub fn conv_int(value: Option<&str>, default: i32) -> i32 {
    value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(default)
}
