mod common;

use std::sync::Arc;

use common::{scratch_dir, Survey};
use serde_json::json;
use seisproc::tools::ToolContext;
use seisproc::{Error, ToolConfig, ToolRegistry};

fn setup(tag: &str) -> (std::path::PathBuf, ToolContext) {
    let dir = scratch_dir(tag);
    Survey {
        inlines: (100..106).collect(),
        crosslines: (200..208).collect(),
        samples: 32,
        ..Survey::default()
    }
    .write(&dir.join("F3.sgy"));
    let ctx = ToolContext::new(ToolConfig::default().with_output_dir(dir.join("figures")));
    (dir, ctx)
}

fn no_partials(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .all(|e| !e.file_name().to_string_lossy().ends_with(".partial"))
        })
        .unwrap_or(true)
}

#[test]
fn test_conversion_and_plot_tools() {
    let (dir, ctx) = setup("tools_plot");
    let reg = ToolRegistry::standard();
    let data_path = dir.to_string_lossy().into_owned();
    let base = json!({ "data_path": data_path, "data": "F3.sgy" });

    // 1) overview returns the textual header.
    let out = reg.call(&ctx, "overview", base.clone()).expect("overview");
    assert!(out.text.contains("SYNTHETIC SURVEY"));

    // 2) segy2mdio converts once, then skips.
    let out = reg.call(&ctx, "segy2mdio", base.clone()).expect("convert");
    assert!(out.text.starts_with("MDIO file successfully created"));
    assert!(dir.join("F3.mdio").join("zarr.json").exists());
    let out = reg.call(&ctx, "segy2mdio", base.clone()).expect("skip");
    assert!(out.text.contains("Skipping conversion"));

    // 3) plots land under deterministic names.
    let out = reg
        .call(
            &ctx,
            "mdio_plot_inline",
            json!({ "data_path": data_path, "data": "F3.sgy", "inline": 103 }),
        )
        .expect("plot inline");
    let image = out.image.expect("inline image");
    assert_eq!(image, dir.join("figures").join("inline_103.jpg"));
    assert!(image.exists());

    let out = reg
        .call(
            &ctx,
            "mdio_plot_crossline",
            json!({ "data_path": data_path, "data": "F3.sgy", "crossline": 205 }),
        )
        .expect("plot crossline");
    assert!(out.image.expect("crossline image").ends_with("crossline_205.jpg"));

    let out = reg
        .call(
            &ctx,
            "mdio_plot_time",
            json!({ "data_path": data_path, "data": "F3.sgy", "time": 40 }),
        )
        .expect("plot time");
    assert!(out.image.expect("time image").ends_with("Two-way-time_40ms.jpg"));
    assert!(no_partials(&dir.join("figures")));

    // 4) round trip back to SEG-Y.
    let out = reg.call(&ctx, "mdio2segy", base).expect("export");
    assert!(out.text.contains("F3_roundtrip.sgy"));
    assert!(dir.join("F3_roundtrip.sgy").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_spectrum_and_denoise_tools() {
    let (dir, ctx) = setup("tools_denoise");
    let reg = ToolRegistry::standard();
    let data_path = dir.to_string_lossy().into_owned();
    reg.call(
        &ctx,
        "segy2mdio",
        json!({ "data_path": data_path, "data": "F3.sgy" }),
    )
    .expect("convert");
    let line = |extra: serde_json::Value| {
        let mut args = json!({
            "data_path": data_path,
            "data": "F3.sgy",
            "line_number": 102,
            "line_type": "inline",
        });
        if let (Some(obj), Some(more)) = (args.as_object_mut(), extra.as_object()) {
            for (k, v) in more {
                obj.insert(k.clone(), v.clone());
            }
        }
        args
    };

    let out = reg
        .call(&ctx, "frequency_spectrum_2d", line(json!({})))
        .expect("2d spectrum");
    assert!(out.image.expect("spectrum image").ends_with("Frequency_Spectrum_Inline_102.jpg"));

    let out = reg
        .call(
            &ctx,
            "frequency_spectrum_3d",
            json!({ "data_path": data_path, "data": "F3.sgy", "sample_interval_ms": 2.0 }),
        )
        .expect("3d spectrum");
    assert!(out.text.contains("Fs = 500 Hz"));

    let out = reg
        .call(&ctx, "denoise_svd_with_cutoff", line(json!({})))
        .expect("svd");
    assert!(out.text.starts_with("Kept "));
    assert!(out.image.expect("svd image").ends_with("denoised_svd_inline_102_0.5.jpg"));

    let out = reg
        .call(&ctx, "denoise_median", line(json!({ "size": [3, 2] })))
        .expect("median");
    assert!(out.image.expect("median image").ends_with("denoised_median_inline_102_3x2.jpg"));

    let out = reg
        .call(&ctx, "denoise_gaussian", line(json!({ "line_type": "Crossline", "line_number": 204 })))
        .expect("gaussian");
    assert!(out.image.expect("gaussian image").ends_with("denoised_gaussian_crossline_204_1.0.jpg"));

    // errors surface as typed variants
    let err = reg
        .call(&ctx, "denoise_median", line(json!({ "line_type": "diagonal" })))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    let err = reg
        .call(&ctx, "frequency_spectrum_2d", line(json!({ "line_number": 999 })))
        .unwrap_err();
    assert!(matches!(err, Error::CoordinateNotFound { .. }));
    let err = reg
        .call(&ctx, "denoise_svd_with_cutoff", line(json!({ "cutoff_ratio": 2.0 })))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(no_partials(&dir.join("figures")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_dispatch_runs_on_blocking_pool() {
    let (dir, ctx) = setup("tools_dispatch");
    let reg = Arc::new(ToolRegistry::standard());
    let ctx = Arc::new(ctx);
    let data_path = dir.to_string_lossy().into_owned();

    let out = reg
        .clone()
        .dispatch(
            ctx.clone(),
            "overview".to_string(),
            json!({ "data_path": data_path, "data": "F3.sgy" }),
        )
        .await
        .expect("dispatch overview");
    assert!(out.text.contains("SEISPROC TEST DATA"));

    let missing = reg
        .dispatch(
            ctx,
            "overview".to_string(),
            json!({ "data_path": data_path, "data": "absent.sgy" }),
        )
        .await;
    assert!(matches!(missing, Err(Error::FileNotFound(_))));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_figure_into_unwritable_output_dir_is_io_error() {
    // 1) the configured output directory is an existing regular file
    let (dir, _) = setup("tools_blocked");
    let blocker = dir.join("figures");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");
    let ctx = ToolContext::new(ToolConfig::default().with_output_dir(&blocker));
    let reg = ToolRegistry::standard();
    let data_path = dir.to_string_lossy().into_owned();
    reg.call(&ctx, "segy2mdio", json!({ "data_path": data_path, "data": "F3.sgy" }))
        .expect("convert");

    // 2) plotting through the tool fails with an I/O error naming the path
    let err = reg
        .call(
            &ctx,
            "mdio_plot_inline",
            json!({ "data_path": data_path, "data": "F3.sgy", "inline": 101 }),
        )
        .unwrap_err();
    match err {
        Error::Io { path, .. } => assert_eq!(path, blocker),
        other => panic!("expected Io, got {other:?}"),
    }

    // 3) so does the renderer directly, and nothing is staged anywhere
    let store = ctx.open_store(&data_path, "F3.sgy").expect("open store");
    let slice = seisproc::volume::extract_line(&store, seisproc::LineType::Inline, 102)
        .expect("extract");
    let err = ctx
        .renderer()
        .section(&slice, seisproc::SeismicVolume::stats(&store))
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert_eq!(std::fs::read(&blocker).expect("blocker intact"), b"not a directory");
    assert!(no_partials(&dir));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_oversized_filter_parameters_are_rejected() {
    let (dir, ctx) = setup("tools_oversized");
    let reg = ToolRegistry::standard();
    let data_path = dir.to_string_lossy().into_owned();
    reg.call(&ctx, "segy2mdio", json!({ "data_path": data_path, "data": "F3.sgy" }))
        .expect("convert");
    let base = json!({
        "data_path": data_path,
        "data": "F3.sgy",
        "line_number": 102,
        "line_type": "inline",
    });
    let with = |key: &str, value: serde_json::Value| {
        let mut args = base.clone();
        args[key] = value;
        args
    };

    for (tool, args) in [
        ("denoise_gaussian", with("sigma", json!(1e12))),
        ("denoise_median", with("size", json!([100000, 100000]))),
        ("denoise_median", with("size", json!([usize::MAX, 2]))),
    ] {
        let err = reg.call(&ctx, tool, args).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{tool}: {err:?}");
    }
    assert!(no_partials(&dir.join("figures")));

    let _ = std::fs::remove_dir_all(&dir);
}
