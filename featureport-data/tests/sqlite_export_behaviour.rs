//! Behavioural tests exporting a mocked HTTP layer into SQLite datasets.

mod support;

use std::cell::RefCell;

use camino::Utf8PathBuf;
use featureport_core::{DatasetError, DatasetWriter, ExportError, ExportReport, Exporter};
use featureport_data::service::test_support::error_body;
use featureport_data::{HttpFeatureService, SqliteDataset, SqliteDatasetWriter};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::{MockLayer, QUERY_PATH};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Outcome of one export together with the dataset it produced.
type Outcome = (Result<ExportReport, ExportError>, Option<(u64, Vec<String>)>);

struct ExportWorld {
    dir: TempDir,
    layer: RefCell<Option<MockLayer>>,
    outcomes: RefCell<Vec<Outcome>>,
}

impl ExportWorld {
    fn path(&self, relative: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join(relative)).expect("utf-8 temp path")
    }

    fn serve(&self, layer: MockLayer) {
        *self.layer.borrow_mut() = Some(layer);
    }

    fn export_to(&self, relative: &str) {
        let guard = self.layer.borrow();
        let layer = guard.as_ref().expect("layer must be initialised");
        let service = HttpFeatureService::new(layer.url()).expect("service should build");
        let path = self.path(relative);

        let result = Exporter::new(&service, &SqliteDatasetWriter).export(&path);
        let snapshot = SqliteDataset::open(&path).ok().map(|dataset| {
            let count = dataset.record_count().expect("count rows");
            (count, dataset.field_names().to_vec())
        });
        self.outcomes.borrow_mut().push((result, snapshot));
    }

    fn last_report(&self) -> ExportReport {
        let outcomes = self.outcomes.borrow();
        match outcomes.last() {
            Some((Ok(report), _)) => report.clone(),
            other => panic!("expected a successful export, got {other:?}"),
        }
    }

    fn last_snapshot(&self) -> (u64, Vec<String>) {
        let outcomes = self.outcomes.borrow();
        outcomes
            .last()
            .and_then(|(_, snapshot)| snapshot.clone())
            .expect("dataset should exist")
    }

    fn feature_queries(&self) -> usize {
        let guard = self.layer.borrow();
        let layer = guard.as_ref().expect("layer must be initialised");
        layer.feature_queries().len()
    }
}

#[fixture]
fn world() -> ExportWorld {
    ExportWorld {
        dir: TempDir::new().expect("create temp dir"),
        layer: RefCell::new(None),
        outcomes: RefCell::new(Vec::new()),
    }
}

fn layer_with(count: i64, max_record_count: u32) -> MockLayer {
    let layer = MockLayer::start();
    let ids: Vec<i64> = (1..=count).collect();
    layer.serve_point_layer(&ids, max_record_count);
    layer
}

// --- Given steps ---

#[given("a feature service with 250 point features and a max record count of 1000")]
fn given_large_layer(#[from(world)] world: &ExportWorld) {
    world.serve(layer_with(250, 1000));
}

#[given("a feature service with 5 point features and a max record count of 2")]
fn given_small_limit(#[from(world)] world: &ExportWorld) {
    world.serve(layer_with(5, 2));
}

#[given("a feature service whose feature queries fail")]
fn given_failing_queries(#[from(world)] world: &ExportWorld) {
    let layer = MockLayer::start();
    layer.serve_metadata(1000);
    layer.serve_identifiers(&[1, 2, 3]);
    layer.mount(
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .and(query_param("outFields", "*"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(error_body(500, "Error performing query")),
            ),
    );
    world.serve(layer);
}

// --- When steps ---

#[when("I export the service to places.db")]
fn when_export(#[from(world)] world: &ExportWorld) {
    world.export_to("places.db");
}

#[when("I delete places.db and export the service again")]
fn when_reexport(#[from(world)] world: &ExportWorld) {
    SqliteDatasetWriter
        .delete(&world.path("places.db"))
        .expect("previous output should exist");
    world.export_to("places.db");
}

#[when("I export the service into a missing directory")]
fn when_export_missing_dir(#[from(world)] world: &ExportWorld) {
    world.export_to("missing/places.db");
}

// --- Then steps ---

#[then("the dataset holds 250 records")]
fn then_many_records(#[from(world)] world: &ExportWorld) {
    assert_eq!(world.last_report().records, 250);
    assert_eq!(world.last_snapshot().0, 250);
}

#[then("the dataset holds 5 records")]
fn then_five_records(#[from(world)] world: &ExportWorld) {
    assert_eq!(world.last_snapshot().0, 5);
}

#[then("the dataset holds 0 records")]
fn then_no_records(#[from(world)] world: &ExportWorld) {
    assert_eq!(world.last_snapshot().0, 0);
}

#[then("the dataset fields are NAME then ELEV")]
fn then_fields(#[from(world)] world: &ExportWorld) {
    assert_eq!(world.last_report().fields, ["NAME", "ELEV"]);
    assert_eq!(world.last_snapshot().1, ["NAME", "ELEV"]);
}

#[then("the service received 3 feature queries")]
fn then_three_queries(#[from(world)] world: &ExportWorld) {
    assert_eq!(world.feature_queries(), 3);
}

#[then("both exports produced the same record count and schema")]
fn then_idempotent(#[from(world)] world: &ExportWorld) {
    let outcomes = world.outcomes.borrow();
    let snapshots: Vec<&(u64, Vec<String>)> = outcomes
        .iter()
        .map(|(_, snapshot)| snapshot.as_ref().expect("dataset should exist"))
        .collect();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0], snapshots[1]);
}

#[then("a dataset creation error is reported")]
fn then_creation_error(#[from(world)] world: &ExportWorld) {
    let outcomes = world.outcomes.borrow();
    assert!(
        matches!(
            outcomes.last(),
            Some((Err(ExportError::DatasetCreation(DatasetError::ParentMissing { .. })), None))
        ),
        "expected a missing parent error, got {:?}",
        outcomes.last()
    );
}

#[then("a service error is reported")]
fn then_service_error(#[from(world)] world: &ExportWorld) {
    let outcomes = world.outcomes.borrow();
    assert!(
        matches!(outcomes.last(), Some((Err(ExportError::Service(_)), _))),
        "expected a service error, got {:?}",
        outcomes.last()
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/sqlite_export.feature", name = $title)]
        fn $fn_name(world: ExportWorld) {
            let _ = world;
        }
    };
}

register_scenario!(exporting_over_http, "exporting a point layer over HTTP");
register_scenario!(
    exporting_with_small_limit,
    "exporting a layer with a small record limit"
);
register_scenario!(
    reexporting_after_delete,
    "re-exporting after deleting the previous output"
);
register_scenario!(
    exporting_into_missing_directory,
    "exporting into a missing directory"
);
register_scenario!(
    failing_query_aborts,
    "a failing feature query aborts the export"
);
