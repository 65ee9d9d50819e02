/*!
Figure rendering.

Figures are drawn with `plotters` into an in-memory RGB buffer and then
encoded to JPEG under `.<name>.partial` in the output directory, renamed into
place when the encoder succeeds. Raw amplitude displays use `gray_r`;
denoising comparisons use `seismic`. Amplitudes are clipped to
`±clip_std · std` of the volume so figures of the same survey share a colour
scale.

Titles, axis labels and tick values need a TrueType font (see [`fonts`]).
Without one the same figure is drawn with bare axes.
*/

pub mod colormap;
pub mod fonts;
pub mod naming;

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use ndarray::ArrayView2;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::ToolConfig;
use crate::denoise::DenoiseResult;
use crate::error::{Error, Result};
use crate::model::{LineType, Slice, TimeSlice, VolumeStats};
use crate::spectral::Spectrum;
use crate::utils::fsio::write_atomic;

pub use colormap::Colormap;
pub use naming::FigureName;

const SECTION_SIZE: (u32, u32) = (800, 600);
const SPECTRUM_SIZE: (u32, u32) = (1000, 500);
const TRIPLET_SIZE: (u32, u32) = (1800, 600);
const SUPTITLE_HEIGHT: i32 = 40;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Writes figures into one output directory with fixed display settings.
#[derive(Clone, Debug)]
pub struct Renderer {
    output_dir: PathBuf,
    clip_std: f64,
    jpeg_quality: u8,
}

/// One amplitude panel: `data[[ix, iy]]` is drawn at `(x[ix], y[iy])`.
struct Heatmap<'a> {
    data: ArrayView2<'a, f64>,
    x: (f64, f64),
    y: (f64, f64),
    /// Time sections grow downward, maps grow upward.
    y_down: bool,
    colormap: Colormap,
    range: (f64, f64),
}

struct Labels<'a> {
    title: &'a str,
    x: &'a str,
    y: Option<&'a str>,
}

impl Renderer {
    pub fn new(config: &ToolConfig) -> Self {
        Renderer {
            output_dir: config.output_dir.clone(),
            clip_std: config.clip_std,
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, name: &FigureName) -> PathBuf {
        self.output_dir.join(name.file_name())
    }

    /// Inline or crossline section: traces across, time downward.
    pub fn section(&self, slice: &Slice, stats: &VolumeStats) -> Result<PathBuf> {
        let name = FigureName::Section {
            line: slice.axis.line_type(),
            number: slice.axis.number(),
        };
        let map = section_heatmap(slice, slice.data.view(), Colormap::GrayR, stats.display_range(self.clip_std))?;
        let title = slice.axis.title();
        let x_label = match slice.axis.line_type() {
            LineType::Inline => "crossline",
            LineType::Crossline => "inline",
        };
        self.render(&name, SECTION_SIZE, |root, text| {
            let labels = Labels {
                title: &title,
                x: x_label,
                y: Some("twt (ms)"),
            };
            draw_heatmap(root, &labels, &map, text)
        })
    }

    /// Map view at one time: inline across, crossline upward.
    pub fn time_map(&self, map: &TimeSlice, stats: &VolumeStats) -> Result<PathBuf> {
        let name = FigureName::TimeMap {
            time_ms: map.time_ms,
        };
        let heatmap = Heatmap {
            data: map.data.view(),
            x: coord_span(&map.inlines)?,
            y: coord_span(&map.crosslines)?,
            y_down: false,
            colormap: Colormap::GrayR,
            range: stats.display_range(self.clip_std),
        };
        let title = format!("Two-way-time at {} ms", map.time_ms);
        self.render(&name, SECTION_SIZE, |root, text| {
            let labels = Labels {
                title: &title,
                x: "inline",
                y: Some("crossline"),
            };
            draw_heatmap(root, &labels, &heatmap, text)
        })
    }

    /// Smoothed amplitude spectrum as a line plot, both axes starting at 0.
    pub fn spectrum(&self, name: FigureName, spectrum: &Spectrum) -> Result<PathBuf> {
        let freqs = spectrum.frequencies.to_vec();
        let amps = spectrum.amplitudes().to_vec();
        let x_max = freqs.last().copied().unwrap_or(1.0).max(f64::EPSILON);
        let y_max = amps.iter().copied().fold(0.0f64, f64::max) * 1.05;
        let y_max = if y_max > 0.0 && y_max.is_finite() { y_max } else { 1.0 };
        let title = spectrum_title(&name);

        self.render(&name, SPECTRUM_SIZE, |root, text| {
            let mut builder = ChartBuilder::on(root);
            builder.margin(15);
            if text {
                builder
                    .caption(&title, (fonts::FAMILY, 28).into_font())
                    .x_label_area_size(45)
                    .y_label_area_size(70);
            }
            let mut chart = builder
                .build_cartesian_2d(0.0..x_max, 0.0..y_max)
                .map_err(draw_error)?;

            let mut mesh = chart.configure_mesh();
            mesh.bold_line_style(&RGBColor(200, 200, 200))
                .light_line_style(&RGBColor(235, 235, 235));
            if text {
                mesh.x_desc("Frequency (Hz)")
                    .y_desc("Amplitude")
                    .label_style((fonts::FAMILY, 14).into_font());
            } else {
                mesh.x_labels(0).y_labels(0);
            }
            mesh.draw().map_err(draw_error)?;

            chart
                .draw_series(LineSeries::new(
                    freqs.iter().copied().zip(amps.iter().copied()),
                    BLUE.stroke_width(2),
                ))
                .map_err(draw_error)?;
            Ok(())
        })
    }

    /// Original, denoised and residual side by side on a shared `seismic` scale.
    pub fn denoise_triplet(
        &self,
        name: FigureName,
        slice: &Slice,
        result: &DenoiseResult,
        stats: &VolumeStats,
    ) -> Result<PathBuf> {
        let range = stats.display_range(self.clip_std);
        let mut panels = Vec::with_capacity(3);
        for (title, data) in [
            ("Original Data", &result.original),
            ("Denoised Data", &result.denoised),
            ("Noise", &result.residual),
        ] {
            panels.push((title, section_heatmap(slice, data.view(), Colormap::Seismic, range)?));
        }
        let suptitle = format!("Seismic Data Comparison ({})", slice.axis.title());
        let x_label = slice.axis.trace_axis_label();

        self.render(&name, TRIPLET_SIZE, |root, text| {
            let body = if text {
                root.titled(&suptitle, (fonts::FAMILY, 26).into_font())
                    .map_err(draw_error)?
            } else {
                root.margin(SUPTITLE_HEIGHT, 0, 0, 0)
            };
            for (i, (area, (title, map))) in body.split_evenly((1, 3)).iter().zip(&panels).enumerate() {
                let labels = Labels {
                    title,
                    x: x_label,
                    y: (i == 0).then_some("TWT (ms)"),
                };
                draw_heatmap(area, &labels, map, text)?;
            }
            Ok(())
        })
    }

    /// Draw onto a white `size` bitmap and save it as `name`.
    fn render<F>(&self, name: &FigureName, (width, height): (u32, u32), draw: F) -> Result<PathBuf>
    where
        F: FnOnce(&Area<'_>, bool) -> Result<()>,
    {
        let text = fonts::text_available();
        let mut buf = vec![255u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_error)?;
            draw(&root, text)?;
            root.present().map_err(draw_error)?;
        }
        let img = RgbImage::from_raw(width, height, buf)
            .ok_or_else(|| Error::Internal(format!("{name}: bitmap does not match {width}x{height}")))?;
        self.save(name, &img)
    }

    fn save(&self, name: &FigureName, img: &RgbImage) -> Result<PathBuf> {
        let path = self.path_for(name);
        write_jpeg(img, &path, self.jpeg_quality)?;
        tracing::info!(path = %path.display(), "saved figure");
        Ok(path)
    }
}

/// Encode `img` as JPEG at `path`, all-or-nothing.
pub fn write_jpeg(img: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    write_atomic(path, |staged| {
        let file = File::create(staged).map_err(|e| Error::io(staged, e))?;
        let mut out = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode_image(img)
            .map_err(|e| Error::io(staged, std::io::Error::other(e)))?;
        out.flush().map_err(|e| Error::io(staged, e))
    })
}

fn draw_error<E: fmt::Display>(e: E) -> Error {
    Error::Internal(format!("drawing failed: {e}"))
}

fn spectrum_title(name: &FigureName) -> String {
    match name {
        FigureName::LineSpectrum { line, number } => {
            format!("Frequency Spectrum at {} {number}", line.title())
        }
        _ => "Frequency Spectrum of 3D Cube".to_string(),
    }
}

fn section_heatmap<'a>(
    slice: &Slice,
    data: ArrayView2<'a, f64>,
    colormap: Colormap,
    range: (f64, f64),
) -> Result<Heatmap<'a>> {
    let x = coord_span(slice.axis.trace_coords())?;
    let y = match (slice.samples_ms.first(), slice.samples_ms.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(Error::invalid("cannot draw a section without time samples")),
    };
    Ok(Heatmap {
        data,
        x,
        y,
        y_down: true,
        colormap,
        range,
    })
}

fn coord_span(coords: &[i32]) -> Result<(f64, f64)> {
    match (coords.first(), coords.last()) {
        (Some(&first), Some(&last)) => Ok((first as f64, last as f64)),
        _ => Err(Error::invalid("cannot draw a figure without traces")),
    }
}

/// Widen a degenerate axis so a single line or sample still gets a width.
fn padded((a, b): (f64, f64)) -> (f64, f64) {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi - lo < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

fn tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-6 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v:.1}")
    }
}

fn draw_heatmap(area: &Area<'_>, labels: &Labels<'_>, map: &Heatmap<'_>, text: bool) -> Result<()> {
    let (n_x, n_y) = map.data.dim();
    if n_x == 0 || n_y == 0 {
        return Err(Error::invalid("cannot draw an empty panel"));
    }
    let (x0, x1) = padded(map.x);
    let (y0, y1) = padded(map.y);
    // Time runs downward: plot -t and print ticks negated.
    let y_range = if map.y_down { -y1..-y0 } else { y0..y1 };

    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if text {
        builder
            .caption(labels.title, (fonts::FAMILY, 20).into_font())
            .x_label_area_size(45)
            .y_label_area_size(if labels.y.is_some() { 60 } else { 40 });
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y_range)
        .map_err(draw_error)?;

    {
        let plot = chart.plotting_area().strip_coord_spec();
        let (width, height) = plot.dim_in_pixel();
        let (vmin, vmax) = map.range;
        for py in 0..height {
            let row = py as usize * n_y / height as usize;
            let iy = if map.y_down { row } else { n_y - 1 - row };
            for px in 0..width {
                let ix = px as usize * n_x / width as usize;
                let Rgb([r, g, b]) = map.colormap.map(map.data[[ix, iy]], vmin, vmax);
                plot.draw_pixel((px as i32, py as i32), &RGBColor(r, g, b))
                    .map_err(draw_error)?;
            }
        }
    }

    draw_axes(&mut chart, labels, map.y_down, text)
}

fn draw_axes(chart: &mut Chart<'_, '_>, labels: &Labels<'_>, y_down: bool, text: bool) -> Result<()> {
    let plain = |v: &f64| tick(*v);
    let flipped = |v: &f64| tick(-*v);

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh();
    if text {
        mesh.x_desc(labels.x)
            .x_label_formatter(&plain)
            .label_style((fonts::FAMILY, 14).into_font());
        if y_down {
            mesh.y_label_formatter(&flipped);
        } else {
            mesh.y_label_formatter(&plain);
        }
        if let Some(y) = labels.y {
            mesh.y_desc(y);
        }
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(draw_error)
}
