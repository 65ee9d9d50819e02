mod common;

use common::{amplitude, scratch_dir, Survey};
use seisproc::segy::{read_text_header, SegyCube, TraceKeys};
use seisproc::volume::{convert_segy, export_segy, extract_line, extract_time, ProgressCallback};
use seisproc::{ChunkedVolume, Error, LineType, SeismicVolume};
use std::sync::{Arc, Mutex};

#[test]
fn test_segy_read_builds_regular_cube() {
    let dir = scratch_dir("segy_read");
    let path = dir.join("survey.sgy");
    let survey = Survey {
        missing: vec![(102, 201)],
        delay_ms: 8,
        ..Survey::default()
    };
    assert_eq!(survey.write(&path), 5);

    let cube = SegyCube::open(&path, TraceKeys::default()).expect("open cube");
    let g = cube.volume.geometry();
    assert_eq!(g.inlines, vec![100, 101, 102]);
    assert_eq!(g.crosslines, vec![200, 201]);
    assert_eq!(g.samples_ms[0], 8.0);
    assert_eq!(g.sample_interval_ms(), Some(4.0));
    assert_eq!(cube.live_traces(), 5);
    assert_eq!(cube.live, vec![true, true, true, true, true, false]);

    // live cells carry the written samples, the dead one is zero
    let data = cube.volume.data();
    assert_eq!(data[(1, 0, 3)], amplitude(101, 200, 3));
    assert!(data.slice(ndarray::s![2, 1, ..]).iter().all(|v| *v == 0.0));

    let text = read_text_header(&path).expect("text header");
    assert!(text.starts_with("C 1 SYNTHETIC SURVEY"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_custom_key_bytes() {
    let dir = scratch_dir("segy_keys");
    let path = dir.join("keys.sgy");
    let keys = TraceKeys::new(181, 185).expect("keys");
    Survey {
        keys,
        ..Survey::default()
    }
    .write(&path);

    let cube = SegyCube::open(&path, keys).expect("open with custom keys");
    assert_eq!(cube.volume.geometry().inlines, vec![100, 101, 102]);

    // the default bytes are zero in this file, so every trace collides
    let err = SegyCube::open(&path, TraceKeys::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedFile { .. }));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_convert_then_read_matches_cube() {
    let dir = scratch_dir("store");
    let path = dir.join("survey.sgy");
    Survey {
        inlines: (10..15).collect(),
        crosslines: vec![1, 2, 3],
        missing: vec![(12, 2)],
        ..Survey::default()
    }
    .write(&path);
    let cube = SegyCube::open(&path, TraceKeys::default()).expect("open cube");

    // 1) convert with a chunk size that does not divide the inline count.
    let seen: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress: ProgressCallback = Arc::new(move |_msg, frac| {
        sink.lock().expect("progress lock").push(frac);
    });
    let store_dir = dir.join("survey.mdio");
    let meta = convert_segy(&cube, &store_dir, 2, Some(&progress)).expect("convert");
    assert_eq!(meta.chunk_count(), 3);
    assert_eq!(meta.live_traces, 14);
    assert_eq!(seen.lock().expect("progress lock").last().copied(), Some(1.0));
    for node in ["zarr.json", "data/chunked_012/zarr.json", "metadata/live_mask/zarr.json"] {
        assert!(store_dir.join(node).is_file(), "missing {node}");
    }

    // 2) every access path agrees with the in-memory cube.
    let store = ChunkedVolume::open(&store_dir).expect("open store");
    assert_eq!(store.geometry(), cube.volume.geometry());
    for il in 10..15 {
        let a = extract_line(&store, LineType::Inline, il).expect("store inline");
        let b = extract_line(&cube.volume, LineType::Inline, il).expect("cube inline");
        assert_eq!(a.data, b.data);
    }
    let a = extract_line(&store, LineType::Crossline, 3).expect("store crossline");
    let b = extract_line(&cube.volume, LineType::Crossline, 3).expect("cube crossline");
    assert_eq!(a.data, b.data);
    let a = extract_time(&store, 12.0).expect("store time");
    let b = extract_time(&cube.volume, 12.0).expect("cube time");
    assert_eq!(a.data, b.data);
    assert_eq!(store.read_cube().expect("cube"), *cube.volume.data());

    // 3) a second conversion onto the same directory is refused.
    assert!(matches!(
        convert_segy(&cube, &store_dir, 2, None),
        Err(Error::InvalidInput(_))
    ));

    // 4) export and read back.
    let round = dir.join("survey_roundtrip.sgy");
    assert_eq!(export_segy(&store, &round).expect("export"), 14);
    let again = SegyCube::open(&round, TraceKeys::default()).expect("reopen");
    assert_eq!(again.volume.data(), cube.volume.data());
    assert_eq!(again.live, cube.live);
    assert_eq!(again.text_header, cube.text_header);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_truncated_file_is_malformed() {
    let dir = scratch_dir("truncated");
    let path = dir.join("cut.sgy");
    Survey::default().write(&path);
    let bytes = std::fs::read(&path).expect("read");
    std::fs::write(&path, &bytes[..bytes.len() - 10]).expect("truncate");

    let err = SegyCube::open(&path, TraceKeys::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedFile { .. }));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_async_open_paths() {
    let dir = scratch_dir("async");
    let path = dir.join("a.sgy");
    Survey::default().write(&path);

    let cube = SegyCube::open_async(path.clone(), TraceKeys::default())
        .await
        .expect("open async");
    let store_dir = dir.join("a.mdio");
    convert_segy(&cube, &store_dir, 16, None).expect("convert");
    let store = ChunkedVolume::open_async(store_dir).await.expect("store async");
    assert_eq!(store.metadata().geometry.shape(), (3, 2, 16));

    let missing = ChunkedVolume::open_async(dir.join("nope.mdio")).await;
    assert!(matches!(missing, Err(Error::FileNotFound(_))));

    let _ = std::fs::remove_dir_all(&dir);
}
