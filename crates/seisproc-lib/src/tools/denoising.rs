//! Denoising tools: each cuts one section from the MDIO store, filters it and
//! plots original, denoised and residual side by side.

use serde_json::json;

use super::params::{GaussianParams, MedianParams, SvdParams};
use super::registry::{ParamKind, ParamSpec, ToolRegistry, ToolSpec};
use super::{ToolContext, ToolOutput};
use crate::denoise::{DenoiseResult, Filter};
use crate::error::Result;
use crate::model::LineType;
use crate::render::FigureName;
use crate::volume::{extract_line, SeismicVolume};

fn line_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::required("data_path", ParamKind::String, "Path to the seismic record file"),
        ParamSpec::required(
            "data",
            ParamKind::String,
            "Seismic record file, the suffix is usually .sgy or .segy",
        ),
        ParamSpec::required("line_number", ParamKind::Integer, "Inline or crossline number"),
        ParamSpec::required("line_type", ParamKind::String, "\"inline\" or \"crossline\""),
    ]
}

pub(super) fn register(registry: &mut ToolRegistry) {
    let mut params = line_params();
    params.push(ParamSpec::optional(
        "cutoff_ratio",
        ParamKind::Number,
        "Fraction of the largest singular value below which components are dropped",
        json!(0.5),
    ));
    registry.register(
        ToolSpec {
            name: "denoise_svd_with_cutoff",
            description: "Denoise an inline or crossline with SVD, keeping singular values at or above cutoff_ratio times the largest one.",
            params,
        },
        denoise_svd_with_cutoff,
    );

    let mut params = line_params();
    params.push(ParamSpec::optional(
        "size",
        ParamKind::IntegerPair,
        "Median window as [traces, samples]",
        json!([2, 2]),
    ));
    registry.register(
        ToolSpec {
            name: "denoise_median",
            description: "Denoise an inline or crossline with a 2D median filter.",
            params,
        },
        denoise_median,
    );

    let mut params = line_params();
    params.push(ParamSpec::optional(
        "sigma",
        ParamKind::Number,
        "Standard deviation of the Gaussian kernel in samples",
        json!(1.0),
    ));
    registry.register(
        ToolSpec {
            name: "denoise_gaussian",
            description: "Denoise an inline or crossline with a 2D Gaussian filter.",
            params,
        },
        denoise_gaussian,
    );
}

struct Figure {
    result: DenoiseResult,
    image: std::path::PathBuf,
}

fn run(
    ctx: &ToolContext,
    data_path: &str,
    data: &str,
    line: LineType,
    number: i32,
    filter: Filter,
    name: FigureName,
) -> Result<Figure> {
    let store = ctx.open_store(data_path, data)?;
    let slice = extract_line(&store, line, number)?;
    let result = filter.apply(&slice.data)?;
    let image = ctx.renderer().denoise_triplet(name, &slice, &result, store.stats())?;
    Ok(Figure { result, image })
}

fn denoise_svd_with_cutoff(ctx: &ToolContext, p: SvdParams) -> Result<ToolOutput> {
    let line: LineType = p.line_type.parse()?;
    let fig = run(
        ctx,
        &p.data_path,
        &p.data,
        line,
        p.line_number,
        Filter::SvdCutoff {
            cutoff_ratio: p.cutoff_ratio,
        },
        FigureName::SvdDenoise {
            line,
            number: p.line_number,
            cutoff_ratio: p.cutoff_ratio,
        },
    )?;
    let report = &fig.result.report;
    Ok(ToolOutput::with_image(
        format!(
            "Kept {} of {} singular values (cutoff_ratio = {}). Comparison saved to {}",
            report.retained.unwrap_or(0),
            report.total.unwrap_or(0),
            p.cutoff_ratio,
            fig.image.display()
        ),
        fig.image,
    ))
}

fn denoise_median(ctx: &ToolContext, p: MedianParams) -> Result<ToolOutput> {
    let line: LineType = p.line_type.parse()?;
    let size = (p.size[0], p.size[1]);
    let fig = run(
        ctx,
        &p.data_path,
        &p.data,
        line,
        p.line_number,
        Filter::Median { size },
        FigureName::MedianDenoise {
            line,
            number: p.line_number,
            size,
        },
    )?;
    Ok(ToolOutput::with_image(
        format!(
            "Median filter {}x{} applied to {line} {}. Comparison saved to {}",
            size.0,
            size.1,
            p.line_number,
            fig.image.display()
        ),
        fig.image,
    ))
}

fn denoise_gaussian(ctx: &ToolContext, p: GaussianParams) -> Result<ToolOutput> {
    let line: LineType = p.line_type.parse()?;
    let fig = run(
        ctx,
        &p.data_path,
        &p.data,
        line,
        p.line_number,
        Filter::Gaussian { sigma: p.sigma },
        FigureName::GaussianDenoise {
            line,
            number: p.line_number,
            sigma: p.sigma,
        },
    )?;
    Ok(ToolOutput::with_image(
        format!(
            "Gaussian filter (sigma = {}) applied to {line} {}. Comparison saved to {}",
            p.sigma,
            p.line_number,
            fig.image.display()
        ),
        fig.image,
    ))
}
