//! Integration tests for the import pipeline.
//!
//! These tests build real `.osz` archives and extracted folders on disk and
//! run them through `BeatmapDatabase` end to end.

use osu_import_core::{
    BeatmapDatabase, BeatmapDifficulty, BeatmapInfo, BeatmapMetadata, BeatmapSetInfo,
    BeatmapStore, Config, Error, FileStore, ImportOutcome, Storage,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Build the text of a minimal `.osu` file.
fn osu_file(set_id: i32, version: &str, overall_difficulty: f32) -> String {
    format!(
        "osu file format v14

[General]
AudioFilename: audio.mp3
Mode: 0

[Metadata]
Title:Test Song
Artist:Test Artist
Creator:Test Mapper
Version:{version}
BeatmapID:{beatmap_id}
BeatmapSetID:{set_id}

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:{overall_difficulty}
ApproachRate:8
SliderMultiplier:1.4
SliderTickRate:1

[TimingPoints]
0,500,4,2,0,100,1,0

[HitObjects]
256,192,1000,1,0,0:0:0:0:
256,192,3000,1,0,0:0:0:0:
",
        beatmap_id = set_id * 10 + version.len() as i32,
    )
}

/// Test fixture with a storage root and a scratch directory for sources.
struct TestFixture {
    _temp_dir: TempDir,
    storage_path: PathBuf,
    sources_path: PathBuf,
    db: BeatmapDatabase,
    notifications: Arc<AtomicUsize>,
}

/// Route pipeline logs to the test harness so they show next to failures.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

impl TestFixture {
    fn new() -> Self {
        init_tracing();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage_path = temp_dir.path().join("storage");
        let sources_path = temp_dir.path().join("sources");
        fs::create_dir_all(&sources_path).expect("Failed to create sources dir");

        let mut db = BeatmapDatabase::open(&Config::with_storage_path(&storage_path))
            .expect("Failed to open database");

        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = notifications.clone();
        db.on_beatmap_set_added(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            _temp_dir: temp_dir,
            storage_path,
            sources_path,
            db,
            notifications,
        }
    }

    /// Write an `.osz` with the given entries.
    fn create_osz(&self, name: &str, files: &[(&str, Vec<u8>)]) -> PathBuf {
        let path = self.sources_path.join(name);
        let mut zip = ZipWriter::new(File::create(&path).expect("Failed to create .osz"));
        let options =
            FileOptions::<()>::default().compression_method(zip::CompressionMethod::Stored);
        for (entry, content) in files {
            zip.start_file(*entry, options).expect("Failed to start entry");
            zip.write_all(content).expect("Failed to write entry");
        }
        zip.finish().expect("Failed to finish .osz");
        path
    }

    /// Write an `.osz` holding one difficulty per version plus an audio file.
    fn create_set(&self, name: &str, set_id: i32, versions: &[&str]) -> PathBuf {
        let names: Vec<String> = versions
            .iter()
            .map(|v| format!("{}.osu", v.to_lowercase()))
            .collect();
        let mut files: Vec<(&str, Vec<u8>)> = vec![("audio.mp3", b"ID3 fake audio".to_vec())];
        for (version, entry) in versions.iter().zip(&names) {
            files.push((entry.as_str(), osu_file(set_id, version, 5.0).into_bytes()));
        }
        self.create_osz(name, &files)
    }

    /// Write an extracted beatmap folder.
    fn create_folder(&self, name: &str, set_id: i32, versions: &[&str]) -> PathBuf {
        let dir = self.sources_path.join(name);
        fs::create_dir_all(&dir).expect("Failed to create folder");
        fs::write(dir.join("audio.mp3"), b"ID3").expect("Failed to write audio");
        for version in versions {
            let file = dir.join(format!("{}.osu", version.to_lowercase()));
            fs::write(file, osu_file(set_id, version, 5.0)).expect("Failed to write .osu");
        }
        dir
    }

    fn stored_blobs(&self) -> Vec<String> {
        self.db.files().list_all().expect("Failed to list store")
    }

    fn notification_count(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    fn count_sets(&self) -> usize {
        self.db.query::<BeatmapSetInfo>().unwrap().len()
    }
}

fn md5_of(path: &Path) -> String {
    FileStore::calculate_hash(&fs::read(path).unwrap())
}

// =============================================================================
// Import
// =============================================================================

#[test]
fn test_import_then_get_set() {
    let mut fixture = TestFixture::new();
    let p1 = fixture.create_set("p1.osz", 42, &["Easy"]);

    let result = fixture.db.import(&[&p1]);
    assert_eq!(result.imported_count(), 1);
    assert!(result.is_success());

    let set = fixture.db.get_beatmap_set(42).unwrap().expect("set 42 missing");
    assert_eq!(set.beatmap_set_id, 42);
    assert_eq!(set.beatmaps.len(), 1);
    assert_eq!(set.beatmaps[0].path, "easy.osu");
    assert_eq!(set.beatmaps[0].version, "Easy");
    assert_eq!(fixture.notification_count(), 1);
}

#[test]
fn test_relative_path_resolves_against_storage_root() {
    let mut fixture = TestFixture::new();
    let source = fixture.create_set("p1.osz", 42, &["Easy"]);
    fs::copy(&source, fixture.storage_path.join("dropped.osz")).unwrap();

    let result = fixture.db.import(&["dropped.osz"]);

    assert_eq!(result.imported_count(), 1);
    let set = fixture.db.get_beatmap_set(42).unwrap().expect("set 42 missing");
    assert_eq!(set.hash, Some(md5_of(&source)));
}

#[test]
fn test_duplicate_import_is_noop() {
    let mut fixture = TestFixture::new();
    let p1 = fixture.create_set("p1.osz", 42, &["Easy"]);
    fixture.db.import(&[&p1]);
    let original = fixture.db.get_beatmap_set(42).unwrap().unwrap();
    let blobs = fixture.stored_blobs();

    // Same archive again
    let again = fixture.db.import(&[&p1]);
    assert_eq!(again.skipped_count(), 1);
    assert!(matches!(
        again.entries[0].outcome,
        ImportOutcome::Skipped { beatmap_set_id: 42 }
    ));

    // Different content, same online ID
    let p2 = fixture.create_set("p2.osz", 42, &["Easy", "Hard"]);
    let different = fixture.db.import(&[&p2]);
    assert_eq!(different.skipped_count(), 1);

    assert_eq!(fixture.count_sets(), 1);
    assert_eq!(fixture.db.get_beatmap_set(42).unwrap().unwrap(), original);
    assert_eq!(fixture.stored_blobs(), blobs);
    assert_eq!(fixture.notification_count(), 1);
}

#[test]
fn test_duplicate_does_not_stop_batch() {
    let mut fixture = TestFixture::new();
    let first = fixture.create_set("first.osz", 1, &["Easy"]);
    let duplicate = fixture.create_set("duplicate.osz", 1, &["Normal"]);
    let second = fixture.create_set("second.osz", 2, &["Hard"]);

    let result = fixture.db.import(&[&first, &duplicate, &second]);

    assert_eq!(result.total(), 3);
    assert_eq!(result.imported_count(), 2);
    assert_eq!(result.skipped_count(), 1);
    assert!(fixture.db.get_beatmap_set(2).unwrap().is_some());
    assert_eq!(fixture.notification_count(), 2);
}

#[test]
fn test_relocated_archive_hash_matches_stored_bytes() {
    let mut fixture = TestFixture::new();
    let source = fixture.create_set("set.osz", 7, &["Easy", "Hard"]);
    let source_hash = md5_of(&source);

    fixture.db.import(&[&source]);
    let set = fixture.db.get_beatmap_set(7).unwrap().unwrap();

    let hash = set.hash.clone().expect("relocated set must have a hash");
    assert_eq!(hash, source_hash);
    assert_eq!(set.path, FileStore::hash_to_path(&hash));
    assert_eq!(
        set.path,
        format!("beatmaps/{}/{}/{}", &hash[..1], &hash[..2], hash)
    );

    let stored = fixture.storage_path.join(&set.path);
    assert_eq!(md5_of(&stored), hash);
    assert!(fixture.db.verify_beatmap_set(&set).is_ok());
}

#[test]
fn test_identical_content_resolves_to_same_stored_path() {
    let mut fixture = TestFixture::new();
    let original = fixture.create_set("original.osz", 9, &["Easy"]);
    let copy = fixture.sources_path.join("copy.osz");
    fs::copy(&original, &copy).unwrap();

    fixture.db.import(&[&original]);
    let set = fixture.db.get_beatmap_set(9).unwrap().unwrap();

    let placed = fixture.db.files().place_file(&copy).unwrap();
    assert_eq!(placed.path, set.path);
    assert_eq!(Some(placed.hash), set.hash);
    assert!(!placed.newly_written);
    assert_eq!(fixture.stored_blobs().len(), 1);
}

#[test]
fn test_cascading_completeness() {
    let mut fixture = TestFixture::new();
    let source = fixture.create_set("three.osz", 3, &["Easy", "Normal", "Hard"]);
    fixture.db.import(&[&source]);

    let set = fixture.db.get_beatmap_set(3).unwrap().unwrap();
    let loaded = fixture
        .db
        .get_with_children::<BeatmapSetInfo>(set.id.unwrap())
        .unwrap()
        .unwrap();

    assert_eq!(loaded.beatmaps.len(), 3);
    for beatmap in &loaded.beatmaps {
        assert!(beatmap.difficulty.id.is_some());
        assert!((beatmap.difficulty.overall_difficulty - 5.0).abs() < f32::EPSILON);
        assert!((beatmap.difficulty.approach_rate - 8.0).abs() < f32::EPSILON);
        assert!(beatmap.metadata.is_none());
        assert_eq!(beatmap.beatmap_set_id, 3);
    }

    let metadata = loaded.metadata.expect("set metadata missing");
    assert_eq!(metadata.title, "Test Song");
    assert_eq!(metadata.artist, "Test Artist");
    assert_eq!(metadata.creator, "Test Mapper");
    assert_eq!(metadata.beatmap_set_id, Some(3));

    assert_eq!(fixture.db.query::<BeatmapInfo>().unwrap().len(), 3);
    assert_eq!(fixture.db.query::<BeatmapDifficulty>().unwrap().len(), 3);
    assert_eq!(fixture.db.query::<BeatmapMetadata>().unwrap().len(), 1);
}

#[test]
fn test_import_extracted_folder_is_not_relocated() {
    let mut fixture = TestFixture::new();
    let folder = fixture.create_folder("55 Test Artist - Test Song", 55, &["Easy", "Insane"]);

    let result = fixture.db.import(&[&folder]);
    assert_eq!(result.imported_count(), 1);

    let set = fixture.db.get_beatmap_set(55).unwrap().unwrap();
    assert_eq!(set.hash, None);
    assert_eq!(PathBuf::from(&set.path), folder);
    assert_eq!(set.beatmaps.len(), 2);
    assert!(fixture.stored_blobs().is_empty());
}

#[test]
fn test_get_beatmap_decodes_from_archive() {
    let mut fixture = TestFixture::new();
    let source = fixture.create_set("set.osz", 11, &["Easy", "Hard"]);
    fixture.db.import(&[&source]);

    let set = fixture.db.get_beatmap_set(11).unwrap().unwrap();
    let hard = set.beatmap("hard.osu").expect("hard.osu missing");
    let beatmap = fixture.db.get_beatmap(hard).unwrap();

    assert_eq!(beatmap.info.version, "Hard");
    assert_eq!(beatmap.info.md5_hash, hard.md5_hash);
    assert_eq!(beatmap.hit_object_count, 2);
    assert_eq!(beatmap.length_ms, 2000);
    assert!((beatmap.bpm - 120.0).abs() < 0.001);
}

#[test]
fn test_get_reader_lists_set_files() {
    let mut fixture = TestFixture::new();
    let source = fixture.create_set("set.osz", 12, &["Easy"]);
    fixture.db.import(&[&source]);

    let set = fixture.db.get_beatmap_set(12).unwrap().unwrap();
    let reader = fixture.db.get_reader(&set).unwrap();
    assert_eq!(reader.beatmap_names(), vec!["easy.osu"]);
    assert_eq!(reader.file_names().len(), 2);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_malformed_beatmap_aborts_only_that_path() {
    let mut fixture = TestFixture::new();
    let broken = fixture.create_osz(
        "broken.osz",
        &[
            ("easy.osu", osu_file(20, "Easy", 5.0).into_bytes()),
            ("zz.osu", b"this is not a beatmap".to_vec()),
        ],
    );
    let good = fixture.create_set("good.osz", 21, &["Easy"]);

    let result = fixture.db.import(&[&broken, &good]);

    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.imported_count(), 1);
    let (path, err) = result.errors().next().unwrap();
    assert_eq!(path, broken.as_path());
    assert!(matches!(err, Error::MalformedBeatmap { name, .. } if name == "zz.osu"));

    assert!(fixture.db.get_beatmap_set(20).unwrap().is_none());
    assert_eq!(fixture.db.query::<BeatmapDifficulty>().unwrap().len(), 1);
    // Only the good archive's blob remains
    assert_eq!(fixture.stored_blobs(), vec![md5_of(&good)]);
    assert_eq!(fixture.notification_count(), 1);
}

#[test]
fn test_unreadable_source_is_reported() {
    let mut fixture = TestFixture::new();
    let missing = fixture.sources_path.join("missing.osz");
    let not_zip = fixture.sources_path.join("not-zip.osz");
    fs::write(&not_zip, b"plain text").unwrap();

    let result = fixture.db.import(&[&missing, &not_zip]);

    assert_eq!(result.failed_count(), 2);
    for (_, err) in result.errors() {
        assert!(matches!(err, Error::UnreadableArchive { .. }));
    }
    assert_eq!(fixture.count_sets(), 0);
    assert_eq!(fixture.notification_count(), 0);
}

#[test]
fn test_archive_without_set_id_fails() {
    let mut fixture = TestFixture::new();
    let unsubmitted = fixture.create_osz(
        "unsubmitted.osz",
        &[("easy.osu", osu_file(0, "Easy", 5.0).into_bytes())],
    );

    let result = fixture.db.import(&[&unsubmitted]);
    assert!(matches!(
        result.errors().next(),
        Some((_, Error::MissingSetId(_)))
    ));
    assert!(fixture.stored_blobs().is_empty());
}

#[test]
fn test_update_rejects_unknown_kind_without_writing() {
    let mut fixture = TestFixture::new();
    let source = fixture.create_set("set.osz", 30, &["Easy"]);
    fixture.db.import(&[&source]);
    let before = fixture.db.get_beatmap_set(30).unwrap().unwrap();

    let result = fixture.db.update(&vec![1u8, 2, 3], true);
    assert!(matches!(result, Err(Error::UnsupportedKind(_))));
    assert_eq!(fixture.db.get_beatmap_set(30).unwrap().unwrap(), before);
}

#[test]
fn test_cascading_update_of_imported_set() {
    let mut fixture = TestFixture::new();
    let source = fixture.create_set("set.osz", 31, &["Easy", "Hard"]);
    fixture.db.import(&[&source]);

    let mut set = fixture.db.get_beatmap_set(31).unwrap().unwrap();
    set.metadata.as_mut().unwrap().source = Some("Original".to_string());
    for beatmap in &mut set.beatmaps {
        beatmap.difficulty.hp_drain = 9.0;
    }
    fixture.db.update(&set, true).unwrap();

    let stored = fixture.db.get_beatmap_set(31).unwrap().unwrap();
    assert_eq!(stored, set);
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn test_reset_removes_rows_and_stored_archives() {
    let mut fixture = TestFixture::new();
    let a = fixture.create_set("a.osz", 100, &["Easy"]);
    let b = fixture.create_set("b.osz", 101, &["Easy", "Hard"]);
    let folder = fixture.create_folder("102 folder", 102, &["Easy"]);
    fixture.db.import(&[&a, &b, &folder]);

    let stored_paths: Vec<String> = fixture
        .db
        .query::<BeatmapSetInfo>()
        .unwrap()
        .into_iter()
        .filter(|s| s.is_relocated())
        .map(|s| s.path)
        .collect();
    assert_eq!(stored_paths.len(), 2);

    fixture.db.reset().unwrap();

    assert!(fixture.db.query::<BeatmapSetInfo>().unwrap().is_empty());
    assert!(fixture.db.query::<BeatmapInfo>().unwrap().is_empty());
    assert!(fixture.db.query::<BeatmapMetadata>().unwrap().is_empty());
    assert!(fixture.db.query::<BeatmapDifficulty>().unwrap().is_empty());
    for path in &stored_paths {
        assert!(!fixture.storage_path.join(path).exists());
    }
    assert!(fixture.stored_blobs().is_empty());

    // Referenced-in-place sources are left alone
    assert!(folder.join("easy.osu").exists());

    // Everything can be imported again afterwards
    let again = fixture.db.import(&[&a]);
    assert_eq!(again.imported_count(), 1);
}

#[test]
fn test_reopen_database_keeps_sets() {
    let temp = TempDir::new().unwrap();
    let storage_path = temp.path().join("storage");
    let config = Config::with_storage_path(&storage_path);

    let source = {
        let fixture_sources = temp.path().join("sources");
        fs::create_dir_all(&fixture_sources).unwrap();
        let path = fixture_sources.join("set.osz");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        let options = FileOptions::<()>::default();
        zip.start_file("easy.osu", options).unwrap();
        zip.write_all(osu_file(77, "Easy", 5.0).as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    };

    {
        let mut db = BeatmapDatabase::open(&config).unwrap();
        db.import(&[&source]);
    }

    let storage = Storage::new(&storage_path).unwrap();
    let store = BeatmapStore::open(&config.database_path()).unwrap();
    let db = BeatmapDatabase::new(storage, store);
    let set = db.get_beatmap_set(77).unwrap().unwrap();
    assert_eq!(set.beatmaps.len(), 1);
    assert!(db.verify_beatmap_set(&set).is_ok());
}
