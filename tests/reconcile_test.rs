//! Listing sources against the local filesystem.

use clipq::reconcile::{DirectoryListing, KeysFileListing, ListingSource};
use std::collections::BTreeSet;
use std::path::PathBuf;

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("clipq-listing-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(dir.join("batch1")).unwrap();
    std::fs::write(dir.join("a.wav"), b"").unwrap();
    std::fs::write(dir.join("notes.txt"), b"").unwrap();
    std::fs::write(dir.join("batch1").join("b.MP3"), b"").unwrap();
    dir
}

fn set(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn directory_listing_walks_subdirectories_and_filters_audio() {
    let dir = scratch_dir();
    let labels = DirectoryListing::audio(&dir).list_labels().await.unwrap();
    assert_eq!(labels, set(&["a.wav", "batch1/b.MP3"]));
    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn directory_listing_can_include_everything() {
    let dir = scratch_dir();
    let labels = DirectoryListing::all_files(&dir).list_labels().await.unwrap();
    assert_eq!(labels, set(&["a.wav", "batch1/b.MP3", "notes.txt"]));
    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn missing_directory_is_an_error() {
    let listing = DirectoryListing::audio("/definitely/not/here/clipq");
    assert!(listing.list_labels().await.is_err());
}

#[tokio::test]
async fn keys_file_trims_and_skips_blank_lines() {
    let path = std::env::temp_dir().join(format!("clipq-keys-{}.txt", uuid::Uuid::new_v4()));
    std::fs::write(&path, "a.wav\n\n  b.wav  \n\t\nc.wav").unwrap();

    let labels = KeysFileListing::new(&path).list_labels().await.unwrap();
    assert_eq!(labels, set(&["a.wav", "b.wav", "c.wav"]));
    std::fs::remove_file(path).unwrap();
}
