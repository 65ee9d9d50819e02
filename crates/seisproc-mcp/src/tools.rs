// Rust guideline compliant 2026-02-13

use std::sync::Arc;

use base64::Engine as _;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content},
    schemars, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};
use seisproc::{ToolContext, ToolOutput, ToolRegistry};

/// Input naming a dataset.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DataInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
}

/// Input for reading a SEG-Y file with configurable header bytes.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SegyInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Inline header byte, usually 181 or 189 (default: 189)")]
    pub inline: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Crossline header byte, usually 185 or 193 (default: 193)")]
    pub crossline: Option<usize>,
}

/// Input for the spectrum of one inline or crossline.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LineSpectrumInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[schemars(description = "Inline or crossline number")]
    pub line_number: i32,
    #[schemars(description = "\"inline\" or \"crossline\"")]
    pub line_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Inline header byte, usually 181 or 189 (default: 189)")]
    pub inline: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Crossline header byte, usually 185 or 193 (default: 193)")]
    pub crossline: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Sample interval in ms; read from the file when omitted")]
    pub sample_interval_ms: Option<f64>,
}

/// Input for the spectrum of the whole cube.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CubeSpectrumInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Inline header byte, usually 181 or 189 (default: 189)")]
    pub inline: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Crossline header byte, usually 185 or 193 (default: 193)")]
    pub crossline: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Sample interval in ms; read from the file when omitted")]
    pub sample_interval_ms: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PlotInlineInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[schemars(description = "Inline number")]
    pub inline: i32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PlotCrosslineInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[schemars(description = "Crossline number")]
    pub crossline: i32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PlotTimeInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[schemars(description = "Time sample (ms)")]
    pub time: f64,
}

/// Input for SVD denoising.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SvdInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[schemars(description = "Inline or crossline number")]
    pub line_number: i32,
    #[schemars(description = "\"inline\" or \"crossline\"")]
    pub line_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(
        description = "Threshold as a fraction of the largest singular value (default: 0.5)"
    )]
    pub cutoff_ratio: Option<f64>,
}

/// Input for median denoising.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MedianInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[schemars(description = "Inline or crossline number")]
    pub line_number: i32,
    #[schemars(description = "\"inline\" or \"crossline\"")]
    pub line_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Window as [traces, samples] (default: [2, 2])")]
    pub size: Option<[usize; 2]>,
}

/// Input for Gaussian denoising.
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GaussianInput {
    #[schemars(description = "Path to the seismic record file")]
    pub data_path: String,
    #[schemars(description = "Seismic record file, the suffix is usually .sgy or .segy")]
    pub data: String,
    #[schemars(description = "Inline or crossline number")]
    pub line_number: i32,
    #[schemars(description = "\"inline\" or \"crossline\"")]
    pub line_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Kernel standard deviation in samples (default: 1.0)")]
    pub sigma: Option<f64>,
}

/// MCP server forwarding every tool call to the shared seisproc registry.
#[derive(Debug, Clone)]
pub struct SeisprocMcpServer {
    registry: Arc<ToolRegistry>,
    ctx: Arc<ToolContext>,
    pub tool_router: ToolRouter<Self>,
}

#[rmcp::tool_router]
impl SeisprocMcpServer {
    /// Construct a server over the given registry and context.
    pub fn new(registry: Arc<ToolRegistry>, ctx: Arc<ToolContext>) -> Self {
        Self {
            registry,
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    #[rmcp::tool(description = "Overview of the seismic data: returns the SEG-Y textual header")]
    async fn overview(
        &self,
        Parameters(input): Parameters<DataInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("overview", &input).await
    }

    #[rmcp::tool(
        description = "Calculate and plot the frequency spectrum of one inline or crossline of a SEG-Y file"
    )]
    async fn frequency_spectrum_2d(
        &self,
        Parameters(input): Parameters<LineSpectrumInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("frequency_spectrum_2d", &input).await
    }

    #[rmcp::tool(
        description = "Calculate and plot the frequency spectrum of the average trace of a 3D SEG-Y cube"
    )]
    async fn frequency_spectrum_3d(
        &self,
        Parameters(input): Parameters<CubeSpectrumInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("frequency_spectrum_3d", &input).await
    }

    #[rmcp::tool(
        description = "Convert a SEG-Y file to the MDIO store next to it; skips if the store exists"
    )]
    async fn segy2mdio(
        &self,
        Parameters(input): Parameters<SegyInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("segy2mdio", &input).await
    }

    #[rmcp::tool(description = "Convert an MDIO store back to SEG-Y (<name>_roundtrip.sgy)")]
    async fn mdio2segy(
        &self,
        Parameters(input): Parameters<DataInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("mdio2segy", &input).await
    }

    #[rmcp::tool(description = "Read the MDIO store and plot one inline")]
    async fn mdio_plot_inline(
        &self,
        Parameters(input): Parameters<PlotInlineInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("mdio_plot_inline", &input).await
    }

    #[rmcp::tool(description = "Read the MDIO store and plot one crossline")]
    async fn mdio_plot_crossline(
        &self,
        Parameters(input): Parameters<PlotCrosslineInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("mdio_plot_crossline", &input).await
    }

    #[rmcp::tool(description = "Read the MDIO store and plot the map view at one two-way time")]
    async fn mdio_plot_time(
        &self,
        Parameters(input): Parameters<PlotTimeInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("mdio_plot_time", &input).await
    }

    #[rmcp::tool(
        description = "Denoise an inline or crossline with SVD, keeping singular values at or above cutoff_ratio times the largest"
    )]
    async fn denoise_svd_with_cutoff(
        &self,
        Parameters(input): Parameters<SvdInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("denoise_svd_with_cutoff", &input).await
    }

    #[rmcp::tool(description = "Denoise an inline or crossline with a 2D median filter")]
    async fn denoise_median(
        &self,
        Parameters(input): Parameters<MedianInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("denoise_median", &input).await
    }

    #[rmcp::tool(description = "Denoise an inline or crossline with a 2D Gaussian filter")]
    async fn denoise_gaussian(
        &self,
        Parameters(input): Parameters<GaussianInput>,
    ) -> Result<CallToolResult, McpError> {
        self.forward("denoise_gaussian", &input).await
    }
}

impl SeisprocMcpServer {
    /// Serialise the typed input back to JSON and run it through the registry.
    ///
    /// Tool failures become `CallToolResult::error`; only a broken input
    /// encoding is reported as a protocol error.
    async fn forward<T: Serialize>(
        &self,
        name: &str,
        input: &T,
    ) -> Result<CallToolResult, McpError> {
        let args = serde_json::to_value(input)
            .map_err(|e| McpError::internal_error(format!("cannot encode arguments: {e}"), None))?;
        let result = self
            .registry
            .clone()
            .dispatch(self.ctx.clone(), name.to_string(), args)
            .await;
        Ok(match result {
            Ok(output) => CallToolResult::success(output_contents(&output).await),
            Err(err) => CallToolResult::error(vec![Content::text(format!("Error: {err}"))]),
        })
    }
}

/// Text result, followed by the figure as base64 JPEG when the tool wrote one.
///
/// An unreadable figure only drops the image part; the text still names the path.
async fn output_contents(output: &ToolOutput) -> Vec<Content> {
    let mut contents = vec![Content::text(output.to_string())];
    if let Some(path) = &output.image {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let data = base64::engine::general_purpose::STANDARD.encode(bytes);
                contents.push(Content::image(data, "image/jpeg"));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "figure not attached");
            }
        }
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use seisproc::segy::{
        ascii_text_header, build_binary_header, build_trace_header, write_segy, SampleFormat,
        TraceKeys,
    };
    use seisproc::ToolConfig;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir().join(format!("seisproc_mcp_{tag}_{stamp}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// 2 inlines x 3 crosslines x 16 samples at 4 ms.
    fn write_survey(path: &std::path::Path) {
        let ns = 16u16;
        let text = ascii_text_header(&["C 1 MCP TEST SURVEY"]);
        let binary = build_binary_header(4000, ns, SampleFormat::IeeeFloat32);
        let keys = TraceKeys::default();
        let mut headers = Vec::new();
        let mut samples = Vec::new();
        let mut seq = 0;
        for il in [10, 11] {
            for xl in [20, 21, 22] {
                seq += 1;
                headers.push(build_trace_header(keys, il, xl, 0, ns, 4000, seq));
                samples.push(
                    (0..ns)
                        .map(|k| (k as f32 * 0.9 + xl as f32).sin())
                        .collect::<Vec<f32>>(),
                );
            }
        }
        write_segy(
            path,
            &text,
            &binary,
            4000,
            ns as usize,
            headers.iter().zip(samples.iter().map(Vec::as_slice)),
        )
        .unwrap();
    }

    fn server(output_dir: &std::path::Path) -> SeisprocMcpServer {
        let ctx = ToolContext::new(ToolConfig::default().with_output_dir(output_dir));
        SeisprocMcpServer::new(Arc::new(ToolRegistry::standard()), Arc::new(ctx))
    }

    #[tokio::test]
    async fn figure_tools_attach_the_jpeg() {
        let dir = scratch_dir("image");
        write_survey(&dir.join("cube.sgy"));
        let server = server(&dir.join("figures"));
        let input = CubeSpectrumInput {
            data_path: dir.to_string_lossy().into_owned(),
            data: "cube.sgy".into(),
            inline: None,
            crossline: None,
            sample_interval_ms: None,
        };

        let result = server
            .forward("frequency_spectrum_3d", &input)
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        assert!(matches!(&result.content[0].raw, RawContent::Text(_)));
        let image = result
            .content
            .iter()
            .find_map(|c| match &c.raw {
                RawContent::Image(img) => Some(img),
                _ => None,
            })
            .expect("image part");
        assert_eq!(image.mime_type, "image/jpeg");
        let jpeg = base64::engine::general_purpose::STANDARD
            .decode(&image.data)
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn text_only_tools_and_failures_carry_no_image() {
        let dir = scratch_dir("text");
        write_survey(&dir.join("cube.sgy"));
        let server = server(&dir);
        let input = DataInput {
            data_path: dir.to_string_lossy().into_owned(),
            data: "cube.sgy".into(),
        };
        let result = server.forward("overview", &input).await.unwrap();
        assert_eq!(result.content.len(), 1);

        let missing = DataInput {
            data_path: dir.to_string_lossy().into_owned(),
            data: "absent.sgy".into(),
        };
        let result = server.forward("overview", &missing).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn router_exposes_every_registry_tool() {
        let registry = ToolRegistry::standard();
        let mut routed: Vec<String> = SeisprocMcpServer::tool_router()
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        let mut registered: Vec<String> = registry.names().map(str::to_string).collect();
        routed.sort();
        registered.sort();
        assert_eq!(routed, registered);
    }

    #[test]
    fn omitted_options_fall_back_to_registry_defaults() {
        let input = SvdInput {
            data_path: "/d".into(),
            data: "f.sgy".into(),
            line_number: 3,
            line_type: "inline".into(),
            cutoff_ratio: None,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("cutoff_ratio").is_none());
    }
}
