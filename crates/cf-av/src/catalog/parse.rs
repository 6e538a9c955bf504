//! Wire form <-> typed operations.

use cf_core::wire::{WireOperation, WireParameters};
use cf_core::{
    AspectRatio, Error, FilterName, Operation, OperationDescriptor, OperationKind, Result,
    Rotation, TextPosition,
};
use serde_json::{json, Value};

use super::validate::validate;

/// Parse and validate one operation from its wire name and parameter bag.
///
/// Unknown names and filter names fail with `UnsupportedOperation`; missing,
/// mistyped, or out-of-range parameters fail with `ValidationError`.
pub fn parse_operation(op_type: &str, params: &WireParameters) -> Result<Operation> {
    let kind = OperationKind::from_wire_name(op_type)
        .ok_or_else(|| Error::unsupported(format!("operation '{op_type}'")))?;
    let p = Params { kind, raw: params };

    let operation = match kind {
        OperationKind::Trim => Operation::Trim {
            start: p.f64_opt(&["start", "startTime"])?.unwrap_or(0.0),
            end: p.f64_req(&["end", "endTime"])?,
            reencode: p.bool_opt(&["reencode"])?.unwrap_or(false),
        },
        OperationKind::AdjustSpeed => Operation::AdjustSpeed {
            factor: p.f64_req(&["factor", "speed"])?,
        },
        OperationKind::AdjustBrightness => Operation::AdjustBrightness {
            delta: p.f64_req(&["delta", "brightness"])?,
        },
        OperationKind::AddText => Operation::AddText {
            text: p.str_req(&["text"])?.to_string(),
            position: match p.str_opt(&["position"])? {
                Some(s) => s.parse::<TextPosition>()?,
                None => TextPosition::default(),
            },
            start: p.f64_opt(&["start", "startTime"])?,
            end: p.f64_opt(&["end", "endTime"])?,
        },
        OperationKind::Crop => Operation::Crop {
            x: p.u32_opt(&["x"])?.unwrap_or(0),
            y: p.u32_opt(&["y"])?.unwrap_or(0),
            width: p.u32_req(&["width"])?,
            height: p.u32_req(&["height"])?,
        },
        OperationKind::Rotate => {
            let degrees = p.f64_req(&["degrees", "angle"])?;
            if degrees.fract() != 0.0 {
                return Err(p.invalid("degrees", "must be 90, 180 or 270"));
            }
            Operation::Rotate {
                rotation: Rotation::from_degrees(degrees as i64)?,
            }
        }
        OperationKind::AdjustVolume => Operation::AdjustVolume {
            multiplier: p.f64_req(&["multiplier", "volume"])?,
        },
        OperationKind::ApplyFilter => Operation::ApplyFilter {
            filter: p.str_req(&["name", "filter"])?.parse::<FilterName>()?,
            intensity: p.f64_opt(&["intensity"])?.unwrap_or(1.0),
        },
        OperationKind::CropToAspectRatio => Operation::CropToAspectRatio {
            ratio: p.str_req(&["ratio", "aspectRatio"])?.parse::<AspectRatio>()?,
        },
        OperationKind::EnhanceColors => Operation::EnhanceColors {
            saturation: p.f64_req(&["saturation"])?,
        },
        OperationKind::Stabilize => Operation::Stabilize,
        OperationKind::NormalizeAudio => Operation::NormalizeAudio,
    };

    validate(&operation)?;
    Ok(operation)
}

/// Parse a batch entry, keeping its order.
pub fn parse_descriptor(wire: &WireOperation) -> Result<OperationDescriptor> {
    let operation = parse_operation(&wire.op_type, &wire.parameters)?;
    Ok(OperationDescriptor::new(operation, wire.order))
}

/// Encode an operation's parameters using canonical names.
pub fn encode_operation(op: &Operation) -> WireParameters {
    let value = match op {
        Operation::Trim {
            start,
            end,
            reencode,
        } => json!({ "start": start, "end": end, "reencode": reencode }),
        Operation::AdjustSpeed { factor } => json!({ "factor": factor }),
        Operation::AdjustBrightness { delta } => json!({ "delta": delta }),
        Operation::AddText {
            text,
            position,
            start,
            end,
        } => {
            let mut v = json!({ "text": text, "position": position.as_str() });
            if let Some(start) = start {
                v["start"] = json!(start);
            }
            if let Some(end) = end {
                v["end"] = json!(end);
            }
            v
        }
        Operation::Crop {
            x,
            y,
            width,
            height,
        } => json!({ "x": x, "y": y, "width": width, "height": height }),
        Operation::Rotate { rotation } => json!({ "degrees": rotation.degrees() }),
        Operation::AdjustVolume { multiplier } => json!({ "multiplier": multiplier }),
        Operation::ApplyFilter { filter, intensity } => {
            json!({ "name": filter.as_str(), "intensity": intensity })
        }
        Operation::CropToAspectRatio { ratio } => json!({ "ratio": ratio.as_str() }),
        Operation::EnhanceColors { saturation } => json!({ "saturation": saturation }),
        Operation::Stabilize | Operation::NormalizeAudio => json!({}),
    };

    match value {
        Value::Object(map) => map,
        _ => WireParameters::new(),
    }
}

/// Encode a descriptor as a batch entry.
pub fn encode_descriptor(descriptor: &OperationDescriptor) -> WireOperation {
    WireOperation {
        op_type: descriptor.kind().wire_name().to_string(),
        parameters: encode_operation(&descriptor.operation),
        order: descriptor.order,
    }
}

/// Typed accessors over a raw parameter bag. Each lookup takes the canonical
/// name first, followed by accepted aliases.
struct Params<'a> {
    kind: OperationKind,
    raw: &'a WireParameters,
}

impl<'a> Params<'a> {
    fn get(&self, names: &[&str]) -> Option<&'a Value> {
        names
            .iter()
            .find_map(|name| self.raw.get(*name).filter(|v| !v.is_null()))
    }

    fn invalid(&self, name: &str, reason: &str) -> Error {
        Error::validation(format!("{}: parameter '{name}' {reason}", self.kind))
    }

    fn missing(&self, names: &[&str]) -> Error {
        self.invalid(names[0], "is required")
    }

    fn f64_opt(&self, names: &[&str]) -> Result<Option<f64>> {
        let Some(value) = self.get(names) else {
            return Ok(None);
        };
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(self.invalid(names[0], "must be a number")),
        }
    }

    fn f64_req(&self, names: &[&str]) -> Result<f64> {
        self.f64_opt(names)?.ok_or_else(|| self.missing(names))
    }

    fn u32_opt(&self, names: &[&str]) -> Result<Option<u32>> {
        let Some(n) = self.f64_opt(names)? else {
            return Ok(None);
        };
        if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
            return Err(self.invalid(names[0], "must be a non-negative whole number"));
        }
        Ok(Some(n as u32))
    }

    fn u32_req(&self, names: &[&str]) -> Result<u32> {
        self.u32_opt(names)?.ok_or_else(|| self.missing(names))
    }

    fn str_opt(&self, names: &[&str]) -> Result<Option<&'a str>> {
        match self.get(names) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(names[0], "must be a string")),
        }
    }

    fn str_req(&self, names: &[&str]) -> Result<&'a str> {
        self.str_opt(names)?.ok_or_else(|| self.missing(names))
    }

    fn bool_opt(&self, names: &[&str]) -> Result<Option<bool>> {
        match self.get(names) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(_) => Err(self.invalid(names[0], "must be a boolean")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use cf_core::ErrorKind;

    fn params(value: Value) -> WireParameters {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn trim_accepts_aliases() {
        let op = parse_operation("trimVideo", &params(json!({"startTime": 2, "endTime": "7.5"})))
            .unwrap();
        assert_eq!(
            op,
            Operation::Trim {
                start: 2.0,
                end: 7.5,
                reencode: false
            }
        );
    }

    #[test]
    fn trim_requires_end() {
        let err = parse_operation("trimVideo", &params(json!({"start": 1}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("'end' is required"), "{err}");
    }

    #[test]
    fn speed_alias_and_range() {
        let op = parse_operation("adjustSpeed", &params(json!({"speed": 1.5}))).unwrap();
        assert_eq!(op, Operation::AdjustSpeed { factor: 1.5 });

        let err = parse_operation("adjustSpeed", &params(json!({"factor": 3}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn add_text_defaults_to_center() {
        let op = parse_operation("addText", &params(json!({"text": "Hi"}))).unwrap();
        assert_matches!(
            op,
            Operation::AddText {
                position: TextPosition::Center,
                start: None,
                end: None,
                ..
            }
        );
    }

    #[test]
    fn unknown_filter_is_unsupported() {
        let err =
            parse_operation("applyFilter", &params(json!({"name": "posterize"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = parse_operation("explodeVideo", &WireParameters::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn rotate_rejects_odd_angles() {
        for bad in [json!(45), json!(90.5), json!("sideways")] {
            let err = parse_operation("rotateVideo", &params(json!({ "degrees": bad })))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError);
        }
    }

    #[test]
    fn crop_rejects_negative_coordinates() {
        let err = parse_operation(
            "cropVideo",
            &params(json!({"x": -4, "width": 100, "height": 100})),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn descriptor_keeps_order() {
        let wire = WireOperation {
            op_type: "normalizeAudio".into(),
            parameters: WireParameters::new(),
            order: 7,
        };
        let descriptor = parse_descriptor(&wire).unwrap();
        assert_eq!(descriptor.order, 7);
        assert_eq!(encode_descriptor(&descriptor), wire);
    }

    #[test]
    fn null_parameters_count_as_absent() {
        let op = parse_operation(
            "addText",
            &params(json!({"text": "x", "position": null, "start": null})),
        )
        .unwrap();
        assert_matches!(op, Operation::AddText { start: None, .. });
    }

    #[test]
    fn null_canonical_name_falls_back_to_alias() {
        let op = parse_operation(
            "trimVideo",
            &params(json!({"start": 1, "end": null, "endTime": 7})),
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::Trim {
                start: 1.0,
                end: 7.0,
                reencode: false
            }
        );
    }
}
