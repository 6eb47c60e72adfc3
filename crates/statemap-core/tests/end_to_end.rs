// crates/statemap-core/tests/end_to_end.rs
//
// Loads real files from a temp dir through the controller and checks the
// rendered scene.

use statemap_core::loader::{self, Resource, Sources};
use statemap_core::{Controller, MapConfig, MapError, Metric, Period, Phase, PointerEvent, Reading};
use std::path::Path;

/// Three 10×10 squares in a row: California (06), Nevada (32), Oregon (41).
/// California and Nevada share an arc.
const BOUNDARY: &str = r#"{
    "type": "Topology",
    "objects": {
        "states": {
            "type": "GeometryCollection",
            "geometries": [
                { "type": "Polygon", "id": "06", "arcs": [[0, 1]] },
                { "type": "Polygon", "id": "32", "arcs": [[2, -1]] },
                { "type": "Polygon", "id": "41", "arcs": [[3]] }
            ]
        }
    },
    "arcs": [
        [[10, 0], [10, 10]],
        [[10, 10], [0, 10], [0, 0], [10, 0]],
        [[10, 0], [20, 0], [20, 10], [10, 10]],
        [[20, 0], [30, 0], [30, 10], [20, 10], [20, 0]]
    ]
}"#;

const CASES: &str = "\
countyFIPS,County Name,State,StateFIPS,1/22/20,1/23/20,2/1/21,2/2/21
6001,Alameda,CA,6,1,2,100,50
6029,Kern,CA,6,0,1,\"1,000\",oops
32003,Clark,NV,32,0,0,0,0
0,Statewide Unallocated,,0,5,5,5,5
";

const VACCINATIONS: &str = "\
Date,Jurisdiction,Percent of total pop with at least one dose
05/10/2023,California,84.1
05/10/2023,Nevada,73.9
05/10/2023,Federal Entities,0
";

fn write(dir: &Path, name: &str, body: &str) -> Resource {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    Resource::File(path)
}

fn config(dir: &Path) -> MapConfig {
    let mut config = MapConfig::default();
    config.sources = Sources {
        boundary: Some(write(dir, "us.json", BOUNDARY)),
        cases: Some(write(dir, "cases.csv", CASES)),
        vaccination: Some(write(dir, "vax.csv", VACCINATIONS)),
        ..Sources::default()
    };
    config
}

#[test]
fn load_and_render_default_selection() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = Controller::new(config(dir.path()));
    let scene = controller.load().unwrap();

    assert_eq!(scene.shapes.len(), 3);
    assert_eq!(scene.borders.len(), 1);

    let ca = scene.shape("California").unwrap();
    // 1 + 2 + 100 + 50 + 0 + 1 + 1000 + 0
    assert_eq!(ca.reading, Reading::Value(1154.0));
    assert_eq!(ca.label, "California: 1,154");
    assert_eq!(scene.shape("Nevada").unwrap().reading, Reading::Zero);
    assert_eq!(scene.shape("Oregon").unwrap().label, "Oregon: No data");

    assert_eq!(
        controller.phase(),
        Phase::Rendered(statemap_core::Selection::new(Metric::Cases, Period::Total))
    );
}

#[test]
fn periods_and_switching() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = Controller::new(config(dir.path()));
    controller.load().unwrap();

    let periods = controller.data().unwrap().periods(Metric::Cases);
    assert_eq!(
        periods,
        vec![
            Period::Total,
            Period::year(2020),
            Period::year(2021),
            Period::month(1, 2020),
            Period::month(2, 2021),
        ]
    );

    let scene = controller.set_period(Period::year(2020)).unwrap();
    assert_eq!(scene.shape("California").unwrap().reading, Reading::Value(4.0));

    let scene = controller.set_metric(Metric::Vaccination).unwrap();
    assert_eq!(scene.shape("California").unwrap().label, "California: 84.10%");
    assert_eq!(scene.shapes.len(), 3);

    let err = controller.set_metric(Metric::Population).unwrap_err();
    assert!(matches!(err, MapError::MetricUnavailable(_)));
    assert_eq!(
        controller.selection().map(|s| s.metric),
        Some(Metric::Vaccination)
    );
}

#[test]
fn svg_and_tooltip() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = Controller::new(config(dir.path()));
    let svg = controller.load().unwrap().to_svg();
    assert!(svg.contains("<title>California: 1,154</title>"));
    assert!(svg.contains("<title>Oregon: No data</title>"));

    // Identity projection: Nevada spans x 10..20 on screen.
    let tip = controller.handle_pointer(PointerEvent::Enter { x: 15.0, y: 5.0 });
    assert!(tip.visible);
    assert_eq!(tip.text, "Nevada: 0");
    assert_eq!((tip.x, tip.y), (25.0, -23.0));
    assert!(!controller.handle_pointer(PointerEvent::Leave).visible);
}

#[test]
fn missing_dataset_fails_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.sources.deaths = Some(Resource::File(dir.path().join("missing.csv")));
    let mut controller = Controller::new(config);
    let err = controller.load().unwrap_err();
    assert!(matches!(err, MapError::NotFound(_)));
    assert!(controller.scene().is_none());
}

#[test]
fn loader_returns_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = loader::load(&config(dir.path()).sources, "states").unwrap();
    assert_eq!(loaded.boundary.len(), 3);
    assert_eq!(
        loaded.tables.keys().copied().collect::<Vec<_>>(),
        vec![Metric::Cases, Metric::Vaccination]
    );
}

#[cfg(feature = "compact")]
#[test]
fn gzip_inputs_are_decompressed() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("us.json.gz");
    let mut enc = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
    enc.write_all(BOUNDARY.as_bytes()).unwrap();
    enc.finish().unwrap();

    let boundary = loader::load_boundary(&Resource::File(path), "states").unwrap();
    assert_eq!(boundary.len(), 3);
}
