//! Integration tests for the update-and-publish pipeline
//!
//! Exercises the full local flow: mutations committed through the record
//! store, the site rebuilt from the committed state, and the artifact tree
//! swapped into the public directory. No git transport here; that flow is
//! covered in `publish_flow`.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use stride::{
    Database, MeasureKind, Mutation, NewCheckIn, NewGoal, Publisher, RecordStore, SiteBuilder,
};

/// Create a publisher over a fresh database in a temp directory, with no
/// transport configured.
fn create_publisher(dir: &Path) -> Publisher {
    let db = Database::open(dir.join("stride.db")).expect("Failed to open database");
    let store = RecordStore::new(db.connection());
    let builder = SiteBuilder::new(dir.join("site.new"));
    Publisher::new(store, builder, dir.join("site"), None)
}

fn new_goal(slug: &str, kind: MeasureKind, target: Option<f64>, unit: Option<&str>) -> Mutation {
    Mutation::CreateGoal(NewGoal {
        slug: slug.to_string(),
        title: format!("Goal {slug}"),
        description: String::new(),
        kind,
        target,
        unit: unit.map(|u| u.to_string()),
    })
}

fn check_in(slug: &str, date: &str, value: f64) -> Mutation {
    Mutation::RecordCheckIn(NewCheckIn {
        goal_slug: slug.to_string(),
        date: date.parse().unwrap(),
        value,
        note: None,
    })
}

/// Test the full flow: goal creation, check-ins, and the resulting site
#[test]
fn test_full_pipeline_produces_site() {
    let dir = TempDir::new().unwrap();
    let publisher = create_publisher(dir.path());

    publisher
        .publish_on_update(&new_goal(
            "books",
            MeasureKind::Numeric,
            Some(12.0),
            Some("books"),
        ))
        .expect("goal creation should publish");
    publisher
        .publish_on_update(&check_in("books", "2026-01-10", 3.0))
        .unwrap();
    publisher
        .publish_on_update(&check_in("books", "2026-02-10", 4.0))
        .unwrap();
    publisher
        .publish_on_update(&check_in("books", "2026-03-10", 2.0))
        .unwrap();

    let site = dir.path().join("site");
    assert!(site.join("index.html").exists());
    assert!(site.join("assets/style.css").exists());
    assert!(site.join("goals/books/index.html").exists());
    assert!(site.join("goals/books/chart.svg").exists());

    // Delta-sum: 3 + 4 + 2 = 9 of 12
    let index = fs::read_to_string(site.join("index.html")).unwrap();
    assert!(index.contains("9 / 12 books (75%)"), "got: {index}");

    // The staging tree was consumed by the install
    assert!(!dir.path().join("site.new").exists());
}

/// Test that the JSON progress bundle matches the rendered pages
#[test]
fn test_progress_bundle_matches_data() {
    let dir = TempDir::new().unwrap();
    let publisher = create_publisher(dir.path());

    publisher
        .publish_on_update(&new_goal(
            "books",
            MeasureKind::Numeric,
            Some(12.0),
            Some("books"),
        ))
        .unwrap();
    publisher
        .publish_on_update(&check_in("books", "2026-01-10", 3.0))
        .unwrap();
    publisher
        .publish_on_update(&check_in("books", "2026-02-10", 6.0))
        .unwrap();

    let json = fs::read_to_string(dir.path().join("site/data/progress.json")).unwrap();
    let bundle: serde_json::Value = serde_json::from_str(&json).unwrap();

    let goals = bundle.as_array().expect("bundle should be a list");
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0]["slug"], "books");
    assert_eq!(goals[0]["current"], 9.0);
    assert_eq!(goals[0]["percent"], 75.0);
    assert_eq!(goals[0]["check_in_count"], 2);

    let series = goals[0]["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[1][0], "2026-02-10");
    assert_eq!(series[1][1], 9.0);
}

/// Test that rebuilding without new mutations yields a byte-identical site
#[test]
fn test_rebuild_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let publisher = create_publisher(dir.path());

    publisher
        .publish_on_update(&new_goal("run", MeasureKind::Binary, None, None))
        .unwrap();
    publisher
        .publish_on_update(&check_in("run", "2026-04-01", 1.0))
        .unwrap();

    let site = dir.path().join("site");
    let before_index = fs::read(site.join("index.html")).unwrap();
    let before_chart = fs::read(site.join("goals/run/chart.svg")).unwrap();

    publisher.rebuild().unwrap();

    assert_eq!(before_index, fs::read(site.join("index.html")).unwrap());
    assert_eq!(
        before_chart,
        fs::read(site.join("goals/run/chart.svg")).unwrap()
    );
}

/// Test that a rejected mutation leaves the published site untouched
#[test]
fn test_rejected_mutation_leaves_site_unchanged() {
    let dir = TempDir::new().unwrap();
    let publisher = create_publisher(dir.path());

    publisher
        .publish_on_update(&new_goal("spanish", MeasureKind::Percent, None, None))
        .unwrap();
    publisher
        .publish_on_update(&check_in("spanish", "2026-02-01", 55.0))
        .unwrap();

    let index_before = fs::read(dir.path().join("site/index.html")).unwrap();

    // Out-of-range percent is rejected, not clamped
    let err = publisher
        .publish_on_update(&check_in("spanish", "2026-03-01", 130.0))
        .unwrap_err();
    assert_eq!(err.stage(), "commit");

    let index_after = fs::read(dir.path().join("site/index.html")).unwrap();
    assert_eq!(index_before, index_after);

    let index = String::from_utf8(index_after).unwrap();
    assert!(index.contains("55%"));
}

/// Test that deleting a check-in is reflected on the next publish
#[test]
fn test_delete_check_in_updates_site() {
    let dir = TempDir::new().unwrap();
    let publisher = create_publisher(dir.path());

    publisher
        .publish_on_update(&new_goal("marathon", MeasureKind::Binary, None, None))
        .unwrap();
    let report = publisher
        .publish_on_update(&check_in("marathon", "2026-05-01", 1.0))
        .unwrap();
    let id = report.receipt.check_in_id.expect("receipt should carry the id");

    let index = fs::read_to_string(dir.path().join("site/index.html")).unwrap();
    assert!(index.contains("Done (100%)"));

    publisher
        .publish_on_update(&Mutation::DeleteCheckIn { id })
        .unwrap();

    let index = fs::read_to_string(dir.path().join("site/index.html")).unwrap();
    assert!(!index.contains("Done (100%)"));
    assert!(index.contains("Not started"));
}

/// Test archive and reactivate round trip through the published overview
#[test]
fn test_archive_and_reactivate_flow() {
    let dir = TempDir::new().unwrap();
    let publisher = create_publisher(dir.path());

    publisher
        .publish_on_update(&new_goal("guitar", MeasureKind::Percent, None, None))
        .unwrap();
    publisher
        .publish_on_update(&check_in("guitar", "2026-01-15", 20.0))
        .unwrap();

    publisher
        .publish_on_update(&Mutation::ArchiveGoal {
            slug: "guitar".to_string(),
        })
        .unwrap();

    let index = fs::read_to_string(dir.path().join("site/index.html")).unwrap();
    assert!(!index.contains("goal-card"), "archived goal left the cards");
    assert!(index.contains("Archived"));
    // History stays reachable
    assert!(dir.path().join("site/goals/guitar/index.html").exists());

    // Archived goals reject new check-ins
    let err = publisher
        .publish_on_update(&check_in("guitar", "2026-02-15", 30.0))
        .unwrap_err();
    assert_eq!(err.stage(), "commit");

    publisher
        .publish_on_update(&Mutation::ReactivateGoal {
            slug: "guitar".to_string(),
        })
        .unwrap();

    let index = fs::read_to_string(dir.path().join("site/index.html")).unwrap();
    assert!(index.contains("goal-card"));
    publisher
        .publish_on_update(&check_in("guitar", "2026-02-15", 30.0))
        .unwrap();
}

/// Test that multiple goals are ordered by creation on the overview
#[test]
fn test_goals_keep_creation_order() {
    let dir = TempDir::new().unwrap();
    let publisher = create_publisher(dir.path());

    publisher
        .publish_on_update(&new_goal("zebra", MeasureKind::Binary, None, None))
        .unwrap();
    publisher
        .publish_on_update(&new_goal("apple", MeasureKind::Binary, None, None))
        .unwrap();

    let index = fs::read_to_string(dir.path().join("site/index.html")).unwrap();
    let zebra = index.find("goals/zebra/").expect("zebra on overview");
    let apple = index.find("goals/apple/").expect("apple on overview");
    assert!(
        zebra < apple,
        "goals should appear in creation order, not alphabetical"
    );
}
