#![cfg(unix)]

use core_library::{CatalogItem, SortField, SortOrder};
use core_runtime::config::PathTranslation;
use core_sync::reconciler::{self, Reconciler};
use core_sync::Grouping;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn media_file(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, b"media").unwrap();
    path.to_string_lossy().into_owned()
}

/// Link name -> link target for every entry in `dir`.
fn links(dir: &Path) -> BTreeMap<String, PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.file_name().to_string_lossy().into_owned(),
                std::fs::read_link(entry.path()).unwrap(),
            )
        })
        .collect()
}

/// File name -> contents for every regular file in `dir`.
fn snapshot_dir(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.file_name().to_string_lossy().into_owned(),
                std::fs::read(entry.path()).unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_reconcile_twice_is_idempotent() {
    let media = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let group_dir = target.path().join("Heists");

    let items = vec![
        CatalogItem::new("1", "Heat").with_path(media_file(media.path(), "Heat.mkv")),
        CatalogItem::new("2", "Thief").with_path(media_file(media.path(), "Thief.mkv")),
    ];
    let order = SortOrder::Field(SortField::CommunityRating);
    let reconciler = Reconciler::default();

    reconciler::prepare_group_dir(&group_dir).await.unwrap();
    let first_count = reconciler.materialize(&group_dir, &items, &order).await;
    let first = links(&group_dir);

    reconciler::prepare_group_dir(&group_dir).await.unwrap();
    let second_count = reconciler.materialize(&group_dir, &items, &order).await;
    let second = links(&group_dir);

    assert_eq!(first_count, 2);
    assert_eq!(second_count, 2);
    assert_eq!(first, second);
    assert_eq!(
        first.keys().cloned().collect::<Vec<_>>(),
        vec!["0001 - Heat.mkv", "0002 - Thief.mkv"]
    );
}

#[tokio::test]
async fn test_unsorted_links_keep_bare_names() {
    let media = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();

    let items = vec![CatalogItem::new("1", "Heat").with_path(media_file(media.path(), "Heat.mkv"))];
    let created = Reconciler::default()
        .materialize(target.path(), &items, &SortOrder::Unset)
        .await;

    assert_eq!(created, 1);
    assert!(links(target.path()).contains_key("Heat.mkv"));
}

#[tokio::test]
async fn test_unrecognized_sort_order_still_numbers_links() {
    let media = TempDir::new().unwrap();
    let grouping = Grouping::from_record(&json!({"name": "X", "sort_order": "Popularity"})).unwrap();

    let items = vec![
        CatalogItem::new("1", "Thief").with_path(media_file(media.path(), "Thief.mkv")),
        CatalogItem::new("2", "Heat").with_path(media_file(media.path(), "Heat.mkv")),
    ];
    let preview = Reconciler::default()
        .preview(&items, &grouping.sort_order)
        .await;

    let names: Vec<&str> = preview.items.iter().map(|item| item.file_name.as_str()).collect();
    assert_eq!(names, vec!["0001 - Thief.mkv", "0002 - Heat.mkv"]);
}

#[tokio::test]
async fn test_missing_items_are_skipped_and_numbering_keeps_position() {
    let media = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();

    let items = vec![
        CatalogItem::new("1", "Gone").with_path(media.path().join("Gone.mkv").to_string_lossy()),
        CatalogItem::new("2", "No path"),
        CatalogItem::new("3", "Heat").with_path(media_file(media.path(), "Heat.mkv")),
    ];
    let order = SortOrder::ListOrder("imdb_list_order".to_string());

    let created = Reconciler::default()
        .materialize(target.path(), &items, &order)
        .await;

    assert_eq!(created, 1);
    assert_eq!(
        links(target.path()).keys().cloned().collect::<Vec<_>>(),
        vec!["0003 - Heat.mkv"]
    );
}

#[tokio::test]
async fn test_translated_paths_are_linked() {
    let host = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    std::fs::create_dir(host.path().join("movies")).unwrap();
    let host_file = PathBuf::from(media_file(&host.path().join("movies"), "Heat.mkv"));

    let reconciler = Reconciler::new(Some(PathTranslation {
        server_root: "/media".to_string(),
        host_root: host.path().to_string_lossy().into_owned(),
    }));
    let items = vec![CatalogItem::new("1", "Heat").with_path("/media/movies/Heat.mkv")];

    let created = reconciler
        .materialize(target.path(), &items, &SortOrder::Unset)
        .await;

    assert_eq!(created, 1);
    assert_eq!(links(target.path())["Heat.mkv"], host_file);
}

#[tokio::test]
async fn test_preview_does_not_touch_filesystem() {
    let media = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    std::fs::write(target.path().join("existing.txt"), b"keep me").unwrap();
    let before = snapshot_dir(target.path());

    let items: Vec<CatalogItem> = (0..150)
        .map(|i| {
            CatalogItem::new(i.to_string(), format!("Movie {}", i))
                .with_year(2000 + i)
                .with_path(media_file(media.path(), &format!("movie-{:03}.mkv", i)))
        })
        .collect();

    let preview = Reconciler::default()
        .preview(&items, &SortOrder::Field(SortField::ProductionYear))
        .await;

    assert_eq!(preview.links, 150);
    assert_eq!(preview.items.len(), core_sync::PREVIEW_LIMIT);
    assert_eq!(preview.items[0].file_name, "0001 - movie-000.mkv");
    assert_eq!(preview.items[0].year, Some(2000));
    assert_eq!(snapshot_dir(target.path()), before);
}

#[tokio::test]
async fn test_sweep_removes_only_broken_links() {
    let root = TempDir::new().unwrap();
    let real = root.path().join("real.mkv");
    std::fs::write(&real, b"media").unwrap();

    std::os::unix::fs::symlink(&real, root.path().join("healthy")).unwrap();
    std::os::unix::fs::symlink(root.path().join("missing.mkv"), root.path().join("broken")).unwrap();
    std::fs::create_dir(root.path().join("Noir")).unwrap();
    std::os::unix::fs::symlink(
        root.path().join("missing-too.mkv"),
        root.path().join("Noir").join("0001 - gone.mkv"),
    )
    .unwrap();

    let removed = reconciler::sweep_broken_symlinks(root.path()).await;

    assert_eq!(removed, 2);
    assert!(root.path().join("healthy").exists());
    assert!(std::fs::symlink_metadata(root.path().join("broken")).is_err());
    assert!(std::fs::symlink_metadata(root.path().join("Noir").join("0001 - gone.mkv")).is_err());
    assert!(real.exists());
}

#[tokio::test]
async fn test_sweep_tolerates_missing_or_file_root() {
    let root = TempDir::new().unwrap();
    let file = root.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();

    assert_eq!(reconciler::sweep_broken_symlinks(&root.path().join("absent")).await, 0);
    assert_eq!(reconciler::sweep_broken_symlinks(&file).await, 0);
}

#[tokio::test]
async fn test_remove_group_dir_reports_absence() {
    let root = TempDir::new().unwrap();
    let group_dir = root.path().join("Holiday");

    assert!(!reconciler::remove_group_dir(&group_dir).await.unwrap());

    std::fs::create_dir(&group_dir).unwrap();
    std::fs::write(group_dir.join("poster.jpg"), b"img").unwrap();
    assert!(reconciler::remove_group_dir(&group_dir).await.unwrap());
    assert!(!group_dir.exists());
}
