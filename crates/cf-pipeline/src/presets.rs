//! Named style presets that expand into fixed operation lists.

use cf_core::{Error, FilterName, Operation, OperationDescriptor, Result};

/// A named look built from catalog operations.
#[derive(Debug, Clone, Copy)]
pub struct StylePreset {
    pub id: &'static str,
    pub description: &'static str,
}

static STYLES: [StylePreset; 5] = [
    StylePreset {
        id: "cinematic",
        description: "Slight lift with a film-like contrast curve",
    },
    StylePreset {
        id: "vintage",
        description: "Warm, faded sepia tones",
    },
    StylePreset {
        id: "noir",
        description: "Black and white, slightly darkened",
    },
    StylePreset {
        id: "vibrant",
        description: "Boosted saturation with light sharpening",
    },
    StylePreset {
        id: "dreamy",
        description: "Brightened with a soft blur",
    },
];

/// All known presets.
pub fn styles() -> &'static [StylePreset] {
    &STYLES
}

/// Expand a style id (case-insensitive) into ordered descriptors.
///
/// # Errors
///
/// [`Error::UnsupportedOperation`] for unknown ids.
pub fn expand(style_id: &str) -> Result<Vec<OperationDescriptor>> {
    let operations = match style_id.trim().to_ascii_lowercase().as_str() {
        "cinematic" => vec![
            Operation::AdjustBrightness { delta: 10.0 },
            filter(FilterName::Cinematic, 1.0),
        ],
        "vintage" => vec![
            Operation::AdjustBrightness { delta: 5.0 },
            filter(FilterName::Vintage, 1.0),
        ],
        "noir" => vec![
            filter(FilterName::Grayscale, 1.0),
            Operation::AdjustBrightness { delta: -10.0 },
        ],
        "vibrant" => vec![
            Operation::EnhanceColors { saturation: 1.4 },
            filter(FilterName::Sharpen, 0.4),
        ],
        "dreamy" => vec![
            Operation::AdjustBrightness { delta: 8.0 },
            filter(FilterName::Blur, 0.2),
        ],
        _ => return Err(Error::unsupported(format!("style '{style_id}'"))),
    };

    Ok(operations
        .into_iter()
        .enumerate()
        .map(|(order, op)| OperationDescriptor::new(op, order as u32))
        .collect())
}

fn filter(filter: FilterName, intensity: f64) -> Operation {
    Operation::ApplyFilter { filter, intensity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{ErrorKind, OperationKind};

    #[test]
    fn every_style_expands_to_valid_operations() {
        for style in styles() {
            let ops = expand(style.id).unwrap();
            assert!(!ops.is_empty(), "{}", style.id);
            for (i, d) in ops.iter().enumerate() {
                assert_eq!(d.order as usize, i);
                cf_av::catalog::validate(&d.operation).unwrap();
            }
        }
    }

    #[test]
    fn cinematic_is_brightness_then_filter() {
        let ops = expand("Cinematic").unwrap();
        let kinds: Vec<OperationKind> = ops.iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![OperationKind::AdjustBrightness, OperationKind::ApplyFilter]
        );
        assert_eq!(ops[0].operation, Operation::AdjustBrightness { delta: 10.0 });
        assert_eq!(ops[1].operation, filter(FilterName::Cinematic, 1.0));
    }

    #[test]
    fn unknown_style_is_unsupported() {
        let err = expand("neon").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }
}
