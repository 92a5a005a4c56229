//! Display strings for resolved fields.

use seishdr_config::OversizePolicy;

use crate::types::{InvalidReason, Resolution, Value};

/// Significant digits for non-integral numbers.
const PRECISION: usize = 10;

/// A number in general format: integral values without a fraction, others
/// with up to ten significant digits, exponent form for very large or very
/// small magnitudes.
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if !(1e-5..1e15).contains(&magnitude) {
        let text = format!("{:.*e}", PRECISION - 1, value);
        return match text.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{exponent}", trim_fraction(mantissa)),
            None => text,
        };
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }

    let integer_digits = magnitude.log10().floor() as i64 + 1;
    let decimals = (PRECISION as i64 - integer_digits).max(0) as usize;
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// `[a, b, c]` with every component in general format.
pub fn format_vector(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().copied().map(format_general).collect();
    format!("[{}]", parts.join(", "))
}

/// The display form of a value, before width fitting.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_general(*n),
        Value::Vector(values) => format_vector(values),
        Value::Enum { id, .. } => id.clone(),
        Value::Logical(true) => "TRUE".to_string(),
        Value::Logical(false) => "FALSE".to_string(),
        Value::Text(text) => text.clone(),
        Value::Time(stamp) => stamp.display(),
    }
}

/// Render a resolution outcome.
pub fn render(resolution: &Resolution) -> String {
    match resolution {
        Resolution::Defined { value } => format_value(value),
        Resolution::Undefined { raw } => format!("UNDEFINED ({})", format_value(raw)),
        Resolution::Invalid { raw, reason } => match reason {
            InvalidReason::UnknownCode => format!("UNKNOWN ({})", format_value(raw)),
            InvalidReason::OutOfDomain => format!("INVALID ({})", format_value(raw)),
            InvalidReason::Qualifier(qualifier) => format!("INVALID QUALIFIER ({qualifier})"),
        },
        Resolution::MissingReferenceTime { raw } => format!("NO REFTIME ({})", format_value(raw)),
        Resolution::UnknownField => "NOT A FIELD".to_string(),
        Resolution::SchemaMismatch { version } => format!("SCHEMA MISMATCH (v{version})"),
    }
}

/// Right-justify `text` in `width` characters.
///
/// Text longer than `width` is cut, or replaced by `marker` under
/// [`OversizePolicy::Marker`] (the marker itself cut to `width`).
pub fn fit(text: &str, width: Option<usize>, policy: OversizePolicy, marker: &str) -> String {
    let Some(width) = width else {
        return text.to_string();
    };
    let len = text.chars().count();
    if len <= width {
        return format!("{text:>width$}");
    }
    match policy {
        OversizePolicy::Truncate => text.chars().take(width).collect(),
        OversizePolicy::Marker => {
            let marker: String = marker.chars().take(width).collect();
            format!("{marker:>width$}")
        }
    }
}
