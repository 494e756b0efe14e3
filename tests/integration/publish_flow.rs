//! Integration tests for the git publish flow
//!
//! Tests the transport against real git repositories: a working repo with
//! a bare origin it pushes to. Covers the first publish (branch creation),
//! idempotent re-publish, and the full pipeline with transport attached.

use std::fs;
use tempfile::TempDir;

use super::common::git_fixtures::TestRepo;
use stride::{
    Database, GitTransport, MeasureKind, Mutation, NewCheckIn, NewGoal, Publisher, RecordStore,
    SiteBuilder,
};

fn write_site(dir: &std::path::Path, body: &str) {
    fs::create_dir_all(dir.join("goals")).unwrap();
    fs::write(dir.join("index.html"), body).unwrap();
    fs::write(dir.join("goals/page.html"), "<html></html>").unwrap();
}

/// Test that the first deploy creates the publish branch and pushes it
#[test]
fn test_first_deploy_creates_branch() {
    let repo = TestRepo::new();
    let site = TempDir::new().unwrap();
    write_site(site.path(), "<h1>v1</h1>");

    assert!(repo.origin_files("gh-pages").is_empty());

    let transport = GitTransport::new(repo.path.clone(), "origin", "gh-pages");
    let result = transport.deploy(site.path()).expect("deploy should succeed");

    assert!(result.pushed);
    assert!(result.commit_sha.is_some());

    let files = repo.origin_files("gh-pages");
    assert!(files.contains(&"index.html".to_string()), "got: {files:?}");
    assert!(files.contains(&"goals/page.html".to_string()));
    // The publish branch carries only the site, not the source tree
    assert!(!files.contains(&"README.md".to_string()));
}

/// Test that deploying never switches the working repository's branch
#[test]
fn test_deploy_leaves_checkout_untouched() {
    let repo = TestRepo::new();
    let site = TempDir::new().unwrap();
    write_site(site.path(), "<h1>v1</h1>");

    let transport = GitTransport::new(repo.path.clone(), "origin", "gh-pages");
    transport.deploy(site.path()).unwrap();

    assert_eq!(repo.current_branch(), "main");
    assert!(repo.path.join("README.md").exists());
}

/// Test that an unchanged site is a push-free no-op
#[test]
fn test_unchanged_site_is_noop() {
    let repo = TestRepo::new();
    let site = TempDir::new().unwrap();
    write_site(site.path(), "<h1>v1</h1>");

    let transport = GitTransport::new(repo.path.clone(), "origin", "gh-pages");
    let first = transport.deploy(site.path()).unwrap();
    assert!(first.pushed);
    let commits_after_first = repo.origin_commit_count("gh-pages");

    let second = transport.deploy(site.path()).unwrap();
    assert!(!second.pushed);
    assert!(second.commit_sha.is_none());
    assert_eq!(repo.origin_commit_count("gh-pages"), commits_after_first);
}

/// Test that a changed site produces exactly one new commit
#[test]
fn test_changed_site_pushes_new_commit() {
    let repo = TestRepo::new();
    let site = TempDir::new().unwrap();
    write_site(site.path(), "<h1>v1</h1>");

    let transport = GitTransport::new(repo.path.clone(), "origin", "gh-pages");
    transport.deploy(site.path()).unwrap();
    let before = repo.origin_commit_count("gh-pages");

    fs::write(site.path().join("index.html"), "<h1>v2</h1>").unwrap();
    let result = transport.deploy(site.path()).unwrap();

    assert!(result.pushed);
    assert_eq!(repo.origin_commit_count("gh-pages"), before + 1);
}

/// Test that files removed from the site disappear from the branch
#[test]
fn test_deploy_removes_stale_files() {
    let repo = TestRepo::new();
    let site = TempDir::new().unwrap();
    write_site(site.path(), "<h1>v1</h1>");

    let transport = GitTransport::new(repo.path.clone(), "origin", "gh-pages");
    transport.deploy(site.path()).unwrap();

    fs::remove_file(site.path().join("goals/page.html")).unwrap();
    fs::remove_dir(site.path().join("goals")).unwrap();
    transport.deploy(site.path()).unwrap();

    let files = repo.origin_files("gh-pages");
    assert!(files.contains(&"index.html".to_string()));
    assert!(!files.contains(&"goals/page.html".to_string()));
}

/// Test the full pipeline with transport: one mutation ends up on origin
#[test]
fn test_pipeline_publishes_to_origin() {
    let repo = TestRepo::new();
    let data = TempDir::new().unwrap();

    let db = Database::open(data.path().join("stride.db")).unwrap();
    let store = RecordStore::new(db.connection());
    let builder = SiteBuilder::new(data.path().join("site.new"));
    let transport = GitTransport::new(repo.path.clone(), "origin", "gh-pages");
    let publisher = Publisher::new(store, builder, data.path().join("site"), Some(transport));

    let report = publisher
        .publish_on_update(&Mutation::CreateGoal(NewGoal {
            slug: "books".to_string(),
            title: "Read 12 books".to_string(),
            description: String::new(),
            kind: MeasureKind::Numeric,
            target: Some(12.0),
            unit: Some("books".to_string()),
        }))
        .expect("publish should reach origin");

    let deploy = report.deploy.expect("transport was configured");
    assert!(deploy.pushed);

    let files = repo.origin_files("gh-pages");
    assert!(files.contains(&"index.html".to_string()), "got: {files:?}");
    assert!(files.contains(&"goals/books/index.html".to_string()));
    assert!(files.contains(&"goals/books/chart.svg".to_string()));
    assert!(files.contains(&"data/progress.json".to_string()));

    // A check-in pushes a second commit
    publisher
        .publish_on_update(&Mutation::RecordCheckIn(NewCheckIn {
            goal_slug: "books".to_string(),
            date: "2026-01-10".parse().unwrap(),
            value: 3.0,
            note: None,
        }))
        .unwrap();
    assert_eq!(repo.origin_commit_count("gh-pages"), 2);
}

/// Test recovery: a failed push is retryable via publish_site alone
#[test]
fn test_publish_site_retries_transport_only() {
    let repo = TestRepo::new();
    let data = TempDir::new().unwrap();

    let db = Database::open(data.path().join("stride.db")).unwrap();
    let store = RecordStore::new(db.connection());
    let builder = SiteBuilder::new(data.path().join("site.new"));

    // Transport pointed at a directory that is not a git repository
    let broken = GitTransport::new(data.path().join("nowhere"), "origin", "gh-pages");
    let publisher = Publisher::new(
        store.clone(),
        builder.clone(),
        data.path().join("site"),
        Some(broken),
    );

    let err = publisher
        .publish_on_update(&Mutation::CreateGoal(NewGoal {
            slug: "run".to_string(),
            title: "Run a marathon".to_string(),
            description: String::new(),
            kind: MeasureKind::Binary,
            target: None,
            unit: None,
        }))
        .unwrap_err();
    assert_eq!(err.stage(), "transport");

    // The commit and the local site both survived the failed push
    assert_eq!(store.read_all().unwrap().goals.len(), 1);
    assert!(data.path().join("site/index.html").exists());

    // Retry with a working transport, without re-entering the mutation
    let fixed = Publisher::new(
        store,
        builder,
        data.path().join("site"),
        Some(GitTransport::new(repo.path.clone(), "origin", "gh-pages")),
    );
    let deploy = fixed.publish_site().unwrap();
    assert!(deploy.pushed);
    assert!(repo
        .origin_files("gh-pages")
        .contains(&"goals/run/index.html".to_string()));
}
