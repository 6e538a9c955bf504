//! Media-domain types: source references, frame geometry, and the closed set
//! of operations the engine knows how to execute.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ---------------------------------------------------------------------------
// Source media
// ---------------------------------------------------------------------------

/// Pointer to a source media file supplied by the conversation layer.
///
/// The engine never mutates a reference; it only reads `url` to fetch bytes
/// and uses the name/type hints to pick a scratch file extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
}

impl MediaReference {
    /// Reference with only a URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
            original_name: None,
        }
    }

    /// Best-effort container extension: original name, then content type,
    /// then `mp4`.
    pub fn extension(&self) -> String {
        if let Some(ext) = self
            .original_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
        {
            return ext;
        }

        match self.content_type.as_deref() {
            Some("video/quicktime") => "mov".into(),
            Some("video/webm") => "webm".into(),
            Some("video/x-matroska") => "mkv".into(),
            Some("video/x-msvideo") => "avi".into(),
            Some("audio/mpeg") => "mp3".into(),
            Some("audio/wav") | Some("audio/x-wav") => "wav".into(),
            _ => "mp4".into(),
        }
    }

    /// Content type to record when publishing, defaulting to `video/mp4`.
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or("video/mp4")
    }
}

/// Pixel dimensions of a video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// ---------------------------------------------------------------------------
// Parameter enums
// ---------------------------------------------------------------------------

/// Vertical placement of overlay text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

impl FromStr for TextPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "center" | "middle" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            other => Err(Error::validation(format!(
                "position must be one of top, center, bottom (got '{other}')"
            ))),
        }
    }
}

impl TextPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

/// Named look applied by `applyFilter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterName {
    Grayscale,
    Sepia,
    Blur,
    Sharpen,
    Cinematic,
    Vintage,
}

impl FilterName {
    pub const ALL: [FilterName; 6] = [
        FilterName::Grayscale,
        FilterName::Sepia,
        FilterName::Blur,
        FilterName::Sharpen,
        FilterName::Cinematic,
        FilterName::Vintage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Blur => "blur",
            Self::Sharpen => "sharpen",
            Self::Cinematic => "cinematic",
            Self::Vintage => "vintage",
        }
    }
}

impl FromStr for FilterName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == lowered)
            .ok_or_else(|| Error::unsupported(format!("filter '{s}'")))
    }
}

/// Target aspect ratio for `cropToAspectRatio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Landscape16x9,
    Portrait9x16,
    Square,
    Classic4x3,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Landscape16x9,
        AspectRatio::Portrait9x16,
        AspectRatio::Square,
        AspectRatio::Classic4x3,
    ];

    /// `(width units, height units)`.
    pub fn units(&self) -> (u32, u32) {
        match self {
            Self::Landscape16x9 => (16, 9),
            Self::Portrait9x16 => (9, 16),
            Self::Square => (1, 1),
            Self::Classic4x3 => (4, 3),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape16x9 => "16:9",
            Self::Portrait9x16 => "9:16",
            Self::Square => "1:1",
            Self::Classic4x3 => "4:3",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['/', 'x'], ":");
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| {
                Error::validation(format!(
                    "ratio must be one of 16:9, 9:16, 1:1, 4:3 (got '{s}')"
                ))
            })
    }
}

/// Clockwise rotation. Only quarter turns are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }

    pub fn from_degrees(degrees: i64) -> crate::Result<Self> {
        match degrees {
            90 => Ok(Self::Quarter),
            180 => Ok(Self::Half),
            270 => Ok(Self::ThreeQuarter),
            other => Err(Error::validation(format!(
                "degrees must be 90, 180 or 270 (got {other})"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Discriminant of [`Operation`], used for catalog lookups and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Trim,
    AdjustSpeed,
    AdjustBrightness,
    AddText,
    Crop,
    Rotate,
    AdjustVolume,
    ApplyFilter,
    CropToAspectRatio,
    EnhanceColors,
    Stabilize,
    NormalizeAudio,
}

impl OperationKind {
    pub const ALL: [OperationKind; 12] = [
        OperationKind::Trim,
        OperationKind::AdjustSpeed,
        OperationKind::AdjustBrightness,
        OperationKind::AddText,
        OperationKind::Crop,
        OperationKind::Rotate,
        OperationKind::AdjustVolume,
        OperationKind::ApplyFilter,
        OperationKind::CropToAspectRatio,
        OperationKind::EnhanceColors,
        OperationKind::Stabilize,
        OperationKind::NormalizeAudio,
    ];

    /// Name used on the wire (`type` / `operation` fields).
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Trim => "trimVideo",
            Self::AdjustSpeed => "adjustSpeed",
            Self::AdjustBrightness => "adjustBrightness",
            Self::AddText => "addText",
            Self::Crop => "cropVideo",
            Self::Rotate => "rotateVideo",
            Self::AdjustVolume => "adjustVolume",
            Self::ApplyFilter => "applyFilter",
            Self::CropToAspectRatio => "cropToAspectRatio",
            Self::EnhanceColors => "enhanceColors",
            Self::Stabilize => "stabilizeVideo",
            Self::NormalizeAudio => "normalizeAudio",
        }
    }

    /// Look up a kind by wire name. Short aliases (`trim`, `crop`, `rotate`,
    /// `stabilize`) are accepted as well.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "trim" => return Some(Self::Trim),
            "crop" => return Some(Self::Crop),
            "rotate" => return Some(Self::Rotate),
            "stabilize" => return Some(Self::Stabilize),
            _ => {}
        }
        Self::ALL.into_iter().find(|k| k.wire_name() == name)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A single requested transformation with typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Keep `[start, end)` seconds. Stream-copies unless `reencode` is set.
    Trim { start: f64, end: f64, reencode: bool },
    AdjustSpeed { factor: f64 },
    /// `delta` on the external -100..=100 scale.
    AdjustBrightness { delta: f64 },
    AddText {
        text: String,
        position: TextPosition,
        start: Option<f64>,
        end: Option<f64>,
    },
    Crop { x: u32, y: u32, width: u32, height: u32 },
    Rotate { rotation: Rotation },
    AdjustVolume { multiplier: f64 },
    ApplyFilter { filter: FilterName, intensity: f64 },
    CropToAspectRatio { ratio: AspectRatio },
    EnhanceColors { saturation: f64 },
    Stabilize,
    NormalizeAudio,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Trim { .. } => OperationKind::Trim,
            Operation::AdjustSpeed { .. } => OperationKind::AdjustSpeed,
            Operation::AdjustBrightness { .. } => OperationKind::AdjustBrightness,
            Operation::AddText { .. } => OperationKind::AddText,
            Operation::Crop { .. } => OperationKind::Crop,
            Operation::Rotate { .. } => OperationKind::Rotate,
            Operation::AdjustVolume { .. } => OperationKind::AdjustVolume,
            Operation::ApplyFilter { .. } => OperationKind::ApplyFilter,
            Operation::CropToAspectRatio { .. } => OperationKind::CropToAspectRatio,
            Operation::EnhanceColors { .. } => OperationKind::EnhanceColors,
            Operation::Stabilize => OperationKind::Stabilize,
            Operation::NormalizeAudio => OperationKind::NormalizeAudio,
        }
    }
}

/// An operation plus its position in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub operation: Operation,
    pub order: u32,
}

impl OperationDescriptor {
    pub fn new(operation: Operation, order: u32) -> Self {
        Self { operation, order }
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }
}
