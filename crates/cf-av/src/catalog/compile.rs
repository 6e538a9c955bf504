//! Lowering typed operations into engine invocations.

use std::path::Path;

use cf_core::{
    AspectRatio, Error, FilterName, FrameSize, Operation, OperationKind, Result, Rotation,
    TextPosition,
};

use super::validate::validate;

/// Boxblur radius at full intensity.
const MAX_BLUR_RADIUS: f64 = 10.0;
/// Unsharp luma amount at full intensity.
const MAX_SHARPEN_AMOUNT: f64 = 1.5;

/// Row-major 3x3 RGB mixing matrix.
type Matrix = [[f64; 3]; 3];

const GRAYSCALE: Matrix = [
    [0.299, 0.587, 0.114],
    [0.299, 0.587, 0.114],
    [0.299, 0.587, 0.114],
];

const SEPIA: Matrix = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

const LOUDNESS_TARGET: &str = "loudnorm=I=-16:TP=-1.5:LRA=11";

/// Facts about the input that some operations need at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompileContext {
    /// Frame size of the input, when known.
    pub frame: Option<FrameSize>,
}

impl CompileContext {
    pub fn with_frame(frame: FrameSize) -> Self {
        Self { frame: Some(frame) }
    }
}

/// Engine arguments for one operation, independent of file paths.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledInvocation {
    pub kind: OperationKind,
    /// Arguments placed before `-i`.
    pub input_args: Vec<String>,
    pub video_filter: Option<String>,
    pub audio_filter: Option<String>,
    /// Arguments placed after the filters, before the output path.
    pub output_args: Vec<String>,
}

impl CompiledInvocation {
    fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            input_args: Vec::new(),
            video_filter: None,
            audio_filter: None,
            output_args: Vec::new(),
        }
    }

    fn video(kind: OperationKind, graph: impl Into<String>) -> Self {
        let mut inv = Self::new(kind);
        inv.video_filter = Some(graph.into());
        inv.output_args = strings(["-c:a", "copy"]);
        inv
    }

    fn audio(kind: OperationKind, graph: impl Into<String>) -> Self {
        let mut inv = Self::new(kind);
        inv.audio_filter = Some(graph.into());
        inv.output_args = strings(["-c:v", "copy"]);
        inv
    }

    /// Full argument vector for running this invocation from `input` to
    /// `output`, overwriting the output.
    pub fn to_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        args.extend(self.input_args.iter().cloned());
        args.push("-i".into());
        args.push(input.to_string_lossy().into_owned());
        if let Some(vf) = &self.video_filter {
            args.push("-vf".into());
            args.push(vf.clone());
        }
        if let Some(af) = &self.audio_filter {
            args.push("-af".into());
            args.push(af.clone());
        }
        args.extend(self.output_args.iter().cloned());
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

/// Compile a validated operation.
///
/// `CropToAspectRatio` uses `ctx.frame` when present to compute an exact
/// crop box; otherwise it compiles to an expression the engine evaluates
/// against the input dimensions.
pub fn compile(op: &Operation, ctx: &CompileContext) -> Result<CompiledInvocation> {
    validate(op)?;
    let kind = op.kind();

    let inv = match op {
        Operation::Trim {
            start,
            end,
            reencode,
        } => {
            let mut inv = CompiledInvocation::new(kind);
            inv.input_args = vec!["-ss".into(), fmt_num(*start)];
            inv.output_args = vec!["-t".into(), fmt_num(end - start)];
            if !reencode {
                inv.output_args
                    .extend(strings(["-c", "copy", "-avoid_negative_ts", "make_zero"]));
            }
            inv
        }
        Operation::AdjustSpeed { factor } => {
            let mut inv = CompiledInvocation::new(kind);
            inv.video_filter = Some(format!("setpts={}*PTS", fmt_num(1.0 / factor)));
            inv.audio_filter = Some(format!("atempo={}", fmt_num(*factor)));
            inv
        }
        Operation::AdjustBrightness { delta } => CompiledInvocation::video(
            kind,
            format!("eq=brightness={}", fmt_num(brightness_value(*delta))),
        ),
        Operation::AddText {
            text,
            position,
            start,
            end,
        } => CompiledInvocation::video(kind, drawtext(text, *position, *start, *end)),
        Operation::Crop {
            x,
            y,
            width,
            height,
        } => CompiledInvocation::video(kind, format!("crop={width}:{height}:{x}:{y}")),
        Operation::Rotate { rotation } => {
            let graph = match rotation {
                Rotation::Quarter => "transpose=1",
                Rotation::Half => "transpose=1,transpose=1",
                Rotation::ThreeQuarter => "transpose=2",
            };
            CompiledInvocation::video(kind, graph)
        }
        Operation::AdjustVolume { multiplier } => {
            CompiledInvocation::audio(kind, format!("volume={}", fmt_num(*multiplier)))
        }
        Operation::ApplyFilter { filter, intensity } => {
            CompiledInvocation::video(kind, filter_graph(*filter, *intensity))
        }
        Operation::CropToAspectRatio { ratio } => {
            let graph = match ctx.frame {
                Some(frame) => {
                    let (x, y, width, height) = aspect_crop_box(frame, *ratio)?;
                    format!("crop={width}:{height}:{x}:{y}")
                }
                None => aspect_crop_expr(*ratio),
            };
            CompiledInvocation::video(kind, graph)
        }
        Operation::EnhanceColors { saturation } => {
            CompiledInvocation::video(kind, format!("eq=saturation={}", fmt_num(*saturation)))
        }
        Operation::Stabilize => CompiledInvocation::video(kind, "deshake"),
        Operation::NormalizeAudio => CompiledInvocation::audio(kind, LOUDNESS_TARGET),
    };

    Ok(inv)
}

/// Map the external -100..=100 brightness scale onto the engine's -1..=1 `eq`
/// brightness: `((delta + 100) / 100) - 1`.
pub fn brightness_value(delta: f64) -> f64 {
    ((delta + 100.0) / 100.0) - 1.0
}

/// Largest box of `ratio` centred in `frame`, with even dimensions.
///
/// Returns `(x, y, width, height)`.
pub fn aspect_crop_box(frame: FrameSize, ratio: AspectRatio) -> Result<(u32, u32, u32, u32)> {
    let (rw, rh) = ratio.units();
    let (fw, fh) = (u64::from(frame.width), u64::from(frame.height));
    let (rw, rh) = (u64::from(rw), u64::from(rh));

    let (mut w, mut h) = if fw * rh >= fh * rw {
        (fh * rw / rh, fh)
    } else {
        (fw, fw * rh / rw)
    };
    w -= w % 2;
    h -= h % 2;

    if w == 0 || h == 0 {
        return Err(Error::validation(format!(
            "{}: frame {}x{} is too small for {}",
            OperationKind::CropToAspectRatio,
            frame.width,
            frame.height,
            ratio.as_str()
        )));
    }

    let x = (fw - w) / 2;
    let y = (fh - h) / 2;
    // All four values are bounded by the u32 frame dimensions.
    Ok((x as u32, y as u32, w as u32, h as u32))
}

fn aspect_crop_expr(ratio: AspectRatio) -> String {
    let (rw, rh) = ratio.units();
    format!(
        "crop='trunc(min(iw,ih*{rw}/{rh})/2)*2':'trunc(min(ih,iw*{rh}/{rw})/2)*2'"
    )
}

fn filter_graph(filter: FilterName, intensity: f64) -> String {
    match filter {
        FilterName::Grayscale => mixer(&GRAYSCALE),
        FilterName::Sepia => mixer(&SEPIA),
        FilterName::Blur => format!("boxblur={}:1", fmt_num(intensity * MAX_BLUR_RADIUS)),
        FilterName::Sharpen => format!(
            "unsharp=5:5:{}:5:5:0",
            fmt_num(intensity * MAX_SHARPEN_AMOUNT)
        ),
        FilterName::Cinematic => {
            "eq=contrast=1.2:brightness=0.1:saturation=1.1,curves=all='0/0 0.5/0.58 1/1'".into()
        }
        FilterName::Vintage => format!(
            "eq=contrast=0.9:brightness=0.05:saturation=0.8,{}",
            mixer(&SEPIA)
        ),
    }
}

fn mixer(m: &Matrix) -> String {
    let mut parts = Vec::with_capacity(9);
    for (row, out) in m.iter().zip(['r', 'g', 'b']) {
        for (value, inp) in row.iter().zip(['r', 'g', 'b']) {
            parts.push(format!("{out}{inp}={}", fmt_num(*value)));
        }
    }
    format!("colorchannelmixer={}", parts.join(":"))
}

fn drawtext(text: &str, position: TextPosition, start: Option<f64>, end: Option<f64>) -> String {
    let y = match position {
        TextPosition::Top => "50",
        TextPosition::Center => "(h-th)/2",
        TextPosition::Bottom => "h-th-50",
    };
    let mut graph = format!(
        "drawtext=text='{}':expansion=none:fontcolor=white:fontsize=24:x=(w-tw)/2:y={y}",
        escape_text(text)
    );

    let window = match (start, end) {
        (Some(s), Some(e)) => Some(format!("between(t,{},{})", fmt_num(s), fmt_num(e))),
        (Some(s), None) => Some(format!("gte(t,{})", fmt_num(s))),
        (None, Some(e)) => Some(format!("lte(t,{})", fmt_num(e))),
        (None, None) => None,
    };
    if let Some(window) = window {
        graph.push_str(&format!(":enable='{window}'"));
    }
    graph
}

/// Make user text safe inside a single-quoted drawtext value.
///
/// Straight quotes cannot be escaped inside the quoted value, so they become
/// typographic apostrophes.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => out.push('\u{2019}'),
            '\\' | ':' | '%' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Render a number with at most four decimals and no trailing zeros.
pub(crate) fn fmt_num(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    let s = format!("{rounded:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".into()
    } else {
        s.to_string()
    }
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
