//! Operation catalog: the static registry of supported operations.
//!
//! The catalog is the single source of truth shared by both backends. An
//! operation is parsed from its wire form ([`parse_operation`]), validated
//! against its parameter ranges ([`validate`]), and compiled into a
//! backend-agnostic [`CompiledInvocation`] ([`compile`]). The remote client
//! encodes operations with [`encode_operation`], so local and remote execution
//! always see the same vocabulary.

mod compile;
mod parse;
mod validate;

pub use compile::{aspect_crop_box, brightness_value, compile, CompileContext, CompiledInvocation};
pub use parse::{encode_descriptor, encode_operation, parse_descriptor, parse_operation};
pub use validate::validate;

use cf_core::{Error, OperationKind, Result};

/// Description of one parameter accepted by an operation.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    /// Alternative names accepted on the wire.
    pub aliases: &'static [&'static str],
    pub required: bool,
    /// Human-readable range or value set.
    pub range: &'static str,
}

/// Registry entry for one operation kind.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub kind: OperationKind,
    pub summary: &'static str,
    pub parameters: &'static [ParamSpec],
    /// Canonical shape of the compiled invocation.
    pub template: &'static str,
    /// Example parameter object (JSON).
    pub example: &'static str,
}

const fn param(
    name: &'static str,
    aliases: &'static [&'static str],
    required: bool,
    range: &'static str,
) -> ParamSpec {
    ParamSpec {
        name,
        aliases,
        required,
        range,
    }
}

static CATALOG: [CatalogEntry; 12] = [
    CatalogEntry {
        kind: OperationKind::Trim,
        summary: "Keep the segment between start and end seconds",
        parameters: &[
            param("start", &["startTime"], false, "seconds >= 0, default 0"),
            param("end", &["endTime"], true, "seconds > start"),
            param("reencode", &[], false, "bool, default false (stream copy)"),
        ],
        template: "-ss <start> -i <input> -t <end-start> -c copy",
        example: r#"{"start": 5, "end": 15}"#,
    },
    CatalogEntry {
        kind: OperationKind::AdjustSpeed,
        summary: "Change playback speed of video and audio",
        parameters: &[param("factor", &["speed"], true, "0.5 ..= 2.0")],
        template: "-vf setpts=<1/factor>*PTS -af atempo=<factor>",
        example: r#"{"factor": 1.5}"#,
    },
    CatalogEntry {
        kind: OperationKind::AdjustBrightness,
        summary: "Raise or lower brightness",
        parameters: &[param("delta", &["brightness"], true, "-100 ..= 100")],
        template: "-vf eq=brightness=<((delta+100)/100)-1>",
        example: r#"{"delta": 10}"#,
    },
    CatalogEntry {
        kind: OperationKind::AddText,
        summary: "Overlay text, optionally only during a time window",
        parameters: &[
            param("text", &[], true, "non-empty string"),
            param("position", &[], false, "top | center | bottom, default center"),
            param("start", &["startTime"], false, "seconds >= 0"),
            param("end", &["endTime"], false, "seconds > start"),
        ],
        template: "-vf drawtext=text='<text>':x=(w-tw)/2:y=<position>[:enable='between(t,<start>,<end>)']",
        example: r#"{"text": "Hello", "position": "bottom", "start": 1, "end": 4}"#,
    },
    CatalogEntry {
        kind: OperationKind::Crop,
        summary: "Crop to a rectangle",
        parameters: &[
            param("x", &[], false, "pixels >= 0, default 0"),
            param("y", &[], false, "pixels >= 0, default 0"),
            param("width", &[], true, "pixels > 0"),
            param("height", &[], true, "pixels > 0"),
        ],
        template: "-vf crop=<width>:<height>:<x>:<y>",
        example: r#"{"x": 0, "y": 0, "width": 1280, "height": 720}"#,
    },
    CatalogEntry {
        kind: OperationKind::Rotate,
        summary: "Rotate clockwise by a quarter, half, or three-quarter turn",
        parameters: &[param("degrees", &["angle"], true, "90 | 180 | 270")],
        template: "-vf transpose=1 | transpose=1,transpose=1 | transpose=2",
        example: r#"{"degrees": 90}"#,
    },
    CatalogEntry {
        kind: OperationKind::AdjustVolume,
        summary: "Scale audio volume",
        parameters: &[param("multiplier", &["volume"], true, "0.0 ..= 2.0")],
        template: "-af volume=<multiplier>",
        example: r#"{"multiplier": 0.5}"#,
    },
    CatalogEntry {
        kind: OperationKind::ApplyFilter,
        summary: "Apply a named look",
        parameters: &[
            param(
                "name",
                &["filter"],
                true,
                "grayscale | sepia | blur | sharpen | cinematic | vintage",
            ),
            param("intensity", &[], false, "0.0 ..= 1.0, default 1.0"),
        ],
        template: "-vf colorchannelmixer=<matrix> | boxblur=<radius>:1 | unsharp=5:5:<amount>",
        example: r#"{"name": "grayscale"}"#,
    },
    CatalogEntry {
        kind: OperationKind::CropToAspectRatio,
        summary: "Crop to the largest centred box of an aspect ratio",
        parameters: &[param("ratio", &["aspectRatio"], true, "16:9 | 9:16 | 1:1 | 4:3")],
        template: "-vf crop=<width>:<height>:<x>:<y>",
        example: r#"{"ratio": "9:16"}"#,
    },
    CatalogEntry {
        kind: OperationKind::EnhanceColors,
        summary: "Boost or reduce colour saturation",
        parameters: &[param("saturation", &[], true, "0.0 ..= 3.0")],
        template: "-vf eq=saturation=<saturation>",
        example: r#"{"saturation": 1.3}"#,
    },
    CatalogEntry {
        kind: OperationKind::Stabilize,
        summary: "Reduce camera shake",
        parameters: &[],
        template: "-vf deshake",
        example: "{}",
    },
    CatalogEntry {
        kind: OperationKind::NormalizeAudio,
        summary: "Normalize loudness to -16 LUFS",
        parameters: &[],
        template: "-af loudnorm=I=-16:TP=-1.5:LRA=11",
        example: "{}",
    },
];

/// All registered operations, in declaration order.
pub fn entries() -> &'static [CatalogEntry] {
    &CATALOG
}

/// Registry entry for a kind. Every kind is registered.
pub fn entry(kind: OperationKind) -> &'static CatalogEntry {
    CATALOG
        .iter()
        .find(|e| e.kind == kind)
        .unwrap_or_else(|| unreachable!("{kind} missing from catalog"))
}

/// Look up an entry by wire name.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperation`] for names outside the catalog.
pub fn lookup(name: &str) -> Result<&'static CatalogEntry> {
    OperationKind::from_wire_name(name)
        .map(entry)
        .ok_or_else(|| Error::unsupported(format!("operation '{name}'")))
}
