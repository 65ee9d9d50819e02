//! Loading, conversion, plotting and spectrum tools.

use serde_json::json;

use super::params::{
    CubeSpectrumParams, DataParams, LineSpectrumParams, PlotCrosslineParams, PlotInlineParams,
    PlotTimeParams, SegyParams,
};
use super::registry::{ParamKind, ParamSpec, ToolRegistry, ToolSpec};
use super::{dataset_stem, ToolContext, ToolOutput};
use crate::error::{Error, Result};
use crate::model::{Geometry, LineType};
use crate::render::FigureName;
use crate::segy::{read_text_header, SegyCube};
use crate::spectral::{amplitude_spectrum, slice_spectrum, SpectrumConfig};
use crate::volume::{
    convert_segy, export_segy, extract_line, extract_time, volume_mean_trace, SeismicVolume,
};

const DATA_PATH: &str = "Path to the seismic record file";
const DATA_SEGY: &str = "Seismic record file, the suffix is usually .sgy or .segy";
const INLINE_BYTE: &str = "Inline header byte, usually 181 or 189";
const CROSSLINE_BYTE: &str = "Crossline header byte, usually 185 or 193";
const LINE_NUMBER: &str = "Inline or crossline number";
const LINE_TYPE: &str = "\"inline\" or \"crossline\"";
const SAMPLE_INTERVAL: &str = "Sample interval in ms; read from the file when omitted";

fn data_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::required("data_path", ParamKind::String, DATA_PATH),
        ParamSpec::required("data", ParamKind::String, DATA_SEGY),
    ]
}

fn key_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::optional("inline", ParamKind::Integer, INLINE_BYTE, json!(189)),
        ParamSpec::optional("crossline", ParamKind::Integer, CROSSLINE_BYTE, json!(193)),
    ]
}

fn interval_param() -> ParamSpec {
    ParamSpec::optional(
        "sample_interval_ms",
        ParamKind::Number,
        SAMPLE_INTERVAL,
        serde_json::Value::Null,
    )
}

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolSpec {
            name: "overview",
            description: "Overview of the seismic data: returns the SEG-Y textual header.",
            params: data_params(),
        },
        overview,
    );

    let mut params = data_params();
    params.push(ParamSpec::required("line_number", ParamKind::Integer, LINE_NUMBER));
    params.push(ParamSpec::required("line_type", ParamKind::String, LINE_TYPE));
    params.extend(key_params());
    params.push(interval_param());
    registry.register(
        ToolSpec {
            name: "frequency_spectrum_2d",
            description: "Calculate and plot the frequency spectrum of one inline or crossline of a SEG-Y file.",
            params,
        },
        frequency_spectrum_2d,
    );

    let mut params = data_params();
    params.extend(key_params());
    params.push(interval_param());
    registry.register(
        ToolSpec {
            name: "frequency_spectrum_3d",
            description: "Calculate and plot the frequency spectrum of the average trace of a 3D SEG-Y cube.",
            params,
        },
        frequency_spectrum_3d,
    );

    let mut params = data_params();
    params.extend(key_params());
    registry.register(
        ToolSpec {
            name: "segy2mdio",
            description: "Convert a SEG-Y file to the chunked MDIO store next to it. Skips conversion if the store exists.",
            params,
        },
        segy2mdio,
    );

    registry.register(
        ToolSpec {
            name: "mdio2segy",
            description: "Convert an MDIO store back to SEG-Y, written as <name>_roundtrip.sgy.",
            params: data_params(),
        },
        mdio2segy,
    );

    let mut params = data_params();
    params.push(ParamSpec::required("inline", ParamKind::Integer, "Inline number"));
    registry.register(
        ToolSpec {
            name: "mdio_plot_inline",
            description: "Read the MDIO store and plot one inline.",
            params,
        },
        mdio_plot_inline,
    );

    let mut params = data_params();
    params.push(ParamSpec::required("crossline", ParamKind::Integer, "Crossline number"));
    registry.register(
        ToolSpec {
            name: "mdio_plot_crossline",
            description: "Read the MDIO store and plot one crossline.",
            params,
        },
        mdio_plot_crossline,
    );

    let mut params = data_params();
    params.push(ParamSpec::required("time", ParamKind::Number, "Time sample (ms)"));
    registry.register(
        ToolSpec {
            name: "mdio_plot_time",
            description: "Read the MDIO store and plot the map view at one two-way time.",
            params,
        },
        mdio_plot_time,
    );
}

fn spectrum_config(geometry: &Geometry, interval_override: Option<f64>) -> Result<SpectrumConfig> {
    let interval = match interval_override {
        Some(ms) => ms,
        None => geometry
            .sample_interval_ms()
            .ok_or_else(|| Error::invalid("need at least two samples to derive the sample rate"))?,
    };
    SpectrumConfig::from_interval_ms(interval)
}

fn open_segy(ctx: &ToolContext, p: &SegyParams) -> Result<SegyCube> {
    SegyCube::open(&ctx.dataset_path(&p.data_path, &p.data), p.keys()?)
}

fn overview(ctx: &ToolContext, p: DataParams) -> Result<ToolOutput> {
    let path = ctx.dataset_path(&p.data_path, &p.data);
    Ok(ToolOutput::text(read_text_header(&path)?))
}

fn frequency_spectrum_2d(ctx: &ToolContext, p: LineSpectrumParams) -> Result<ToolOutput> {
    let line: LineType = p.line_type.parse()?;
    let cube = open_segy(
        ctx,
        &SegyParams {
            data_path: p.data_path,
            data: p.data,
            inline: p.inline,
            crossline: p.crossline,
        },
    )?;
    let slice = extract_line(&cube.volume, line, p.line_number)?;
    let config = spectrum_config(cube.volume.geometry(), p.sample_interval_ms)?;
    let spectrum = slice_spectrum(&slice, &config)?;
    let image = ctx.renderer().spectrum(
        FigureName::LineSpectrum {
            line,
            number: p.line_number,
        },
        &spectrum,
    )?;
    Ok(ToolOutput::with_image(
        format!(
            "Frequency spectrum of {} ({} bins, Fs = {} Hz) saved to {}",
            slice.axis.title(),
            spectrum.len(),
            config.sample_rate_hz,
            image.display()
        ),
        image,
    ))
}

fn frequency_spectrum_3d(ctx: &ToolContext, p: CubeSpectrumParams) -> Result<ToolOutput> {
    let cube = open_segy(
        ctx,
        &SegyParams {
            data_path: p.data_path,
            data: p.data,
            inline: p.inline,
            crossline: p.crossline,
        },
    )?;
    let trace = volume_mean_trace(&cube.volume)?;
    let config = spectrum_config(cube.volume.geometry(), p.sample_interval_ms)?;
    let spectrum = amplitude_spectrum(&trace.to_vec(), &config)?;
    let image = ctx.renderer().spectrum(FigureName::CubeSpectrum, &spectrum)?;
    Ok(ToolOutput::with_image(
        format!(
            "Frequency spectrum of the 3D cube ({} bins, Fs = {} Hz) saved to {}",
            spectrum.len(),
            config.sample_rate_hz,
            image.display()
        ),
        image,
    ))
}

fn segy2mdio(ctx: &ToolContext, p: SegyParams) -> Result<ToolOutput> {
    let target = ctx.store_path(&p.data_path, &p.data);
    if target.exists() {
        return Ok(ToolOutput::text(format!(
            "MDIO file already exists: {}. Skipping conversion.",
            target.display()
        )));
    }
    let cube = open_segy(ctx, &p)?;
    convert_segy(&cube, &target, ctx.config.chunk_inlines, None)?;
    Ok(ToolOutput::text(format!(
        "MDIO file successfully created: {}",
        target.display()
    )))
}

fn mdio2segy(ctx: &ToolContext, p: DataParams) -> Result<ToolOutput> {
    let store = ctx.open_store(&p.data_path, &p.data)?;
    let file_name = format!("{}_roundtrip.sgy", dataset_stem(&p.data));
    let target = std::path::Path::new(&p.data_path).join(&file_name);
    let traces = export_segy(&store, &target)?;
    Ok(ToolOutput::text(format!(
        "SEGY file {file_name} created ({traces} traces)"
    )))
}

fn plot_line(ctx: &ToolContext, data_path: &str, data: &str, line: LineType, number: i32) -> Result<ToolOutput> {
    let store = ctx.open_store(data_path, data)?;
    let slice = extract_line(&store, line, number)?;
    let image = ctx.renderer().section(&slice, store.stats())?;
    Ok(ToolOutput::with_image(
        format!("{} plot saved as {}", slice.axis.title(), image.display()),
        image,
    ))
}

fn mdio_plot_inline(ctx: &ToolContext, p: PlotInlineParams) -> Result<ToolOutput> {
    plot_line(ctx, &p.data_path, &p.data, LineType::Inline, p.inline)
}

fn mdio_plot_crossline(ctx: &ToolContext, p: PlotCrosslineParams) -> Result<ToolOutput> {
    plot_line(ctx, &p.data_path, &p.data, LineType::Crossline, p.crossline)
}

fn mdio_plot_time(ctx: &ToolContext, p: PlotTimeParams) -> Result<ToolOutput> {
    let store = ctx.open_store(&p.data_path, &p.data)?;
    let map = extract_time(&store, p.time)?;
    let image = ctx.renderer().time_map(&map, store.stats())?;
    Ok(ToolOutput::with_image(
        format!(
            "Two-way-time at {} ms plot saved as {}",
            p.time,
            image.display()
        ),
        image,
    ))
}
