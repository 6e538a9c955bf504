use cf_core::{Error, Operation, OperationKind, Result};

/// Check an operation's parameters against their documented ranges.
///
/// Parsing already rejects structurally invalid input; this covers numeric
/// ranges and cross-field constraints, and also applies to operations built
/// directly in code (presets, tests).
pub fn validate(op: &Operation) -> Result<()> {
    let kind = op.kind();
    match op {
        Operation::Trim { start, end, .. } => {
            finite(kind, "start", *start)?;
            finite(kind, "end", *end)?;
            if *start < 0.0 {
                return Err(invalid(kind, format!("start must be >= 0 (got {start})")));
            }
            if start >= end {
                return Err(invalid(
                    kind,
                    format!("start must be before end (got {start} >= {end})"),
                ));
            }
            Ok(())
        }
        Operation::AdjustSpeed { factor } => in_range(kind, "factor", *factor, 0.5, 2.0),
        Operation::AdjustBrightness { delta } => in_range(kind, "delta", *delta, -100.0, 100.0),
        Operation::AddText {
            text, start, end, ..
        } => {
            if text.trim().is_empty() {
                return Err(invalid(kind, "text must not be empty"));
            }
            if let Some(start) = start {
                finite(kind, "start", *start)?;
                if *start < 0.0 {
                    return Err(invalid(kind, format!("start must be >= 0 (got {start})")));
                }
            }
            if let Some(end) = end {
                finite(kind, "end", *end)?;
                if *end < 0.0 {
                    return Err(invalid(kind, format!("end must be >= 0 (got {end})")));
                }
            }
            if let (Some(start), Some(end)) = (start, end) {
                if start >= end {
                    return Err(invalid(
                        kind,
                        format!("start must be before end (got {start} >= {end})"),
                    ));
                }
            }
            Ok(())
        }
        Operation::Crop { width, height, .. } => {
            if *width == 0 || *height == 0 {
                return Err(invalid(kind, "width and height must be > 0"));
            }
            Ok(())
        }
        Operation::AdjustVolume { multiplier } => {
            in_range(kind, "multiplier", *multiplier, 0.0, 2.0)
        }
        Operation::ApplyFilter { intensity, .. } => {
            in_range(kind, "intensity", *intensity, 0.0, 1.0)
        }
        Operation::EnhanceColors { saturation } => {
            in_range(kind, "saturation", *saturation, 0.0, 3.0)
        }
        Operation::Rotate { .. }
        | Operation::CropToAspectRatio { .. }
        | Operation::Stabilize
        | Operation::NormalizeAudio => Ok(()),
    }
}

fn invalid(kind: OperationKind, message: impl std::fmt::Display) -> Error {
    Error::validation(format!("{kind}: {message}"))
}

fn finite(kind: OperationKind, name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(kind, format!("{name} must be a finite number")))
    }
}

fn in_range(kind: OperationKind, name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    finite(kind, name, value)?;
    if value < min || value > max {
        return Err(invalid(
            kind,
            format!("{name} must be between {min} and {max} (got {value})"),
        ));
    }
    Ok(())
}
