//! Crash-Resume Equivalence Tests
//!
//! A crash is simulated by failing every filesystem operation from a chosen
//! point on. After the crash the stream is restarted on the real filesystem.
//! Whatever the crash point:
//!
//! - Committed chunks form a contiguous prefix of the uninterrupted run's
//!   chunks, both right after the crash and after the restart
//! - After the restart completes, committed chunks are identical (index and
//!   content) to an uninterrupted run: no element lost or duplicated
//! - Checkpoint temp files left by a crash stay inside the stream's temp
//!   directory and are gone once the restart completes

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use streamsnap_core::{parse_file_index, Element, ErrorKind, CHUNK_PREFIX};
use streamsnap_durability::testing::{FaultInjectingStore, SequenceSource};
use streamsnap_durability::{
    read_chunk, FileStore, LocalFileStore, StreamPaths, StreamWriter, StreamWriterConfig,
};
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
struct Workload {
    elements: u64,
    element_size: usize,
    max_chunk_size_bytes: u64,
}

impl Workload {
    fn config(&self, dir: &TempDir) -> StreamWriterConfig {
        StreamWriterConfig::for_testing(dir.path())
            .with_max_chunk_size_bytes(self.max_chunk_size_bytes)
    }

    fn source(&self) -> SequenceSource {
        SequenceSource::new(self.elements).with_element_size(self.element_size)
    }
}

type Chunks = BTreeMap<u64, Vec<Element>>;

fn committed(paths: &StreamPaths) -> Chunks {
    let store = LocalFileStore::new();
    store
        .list_children(&paths.committed_chunks_dir())
        .unwrap_or_default()
        .iter()
        .map(|name| {
            let index = parse_file_index(name, CHUNK_PREFIX).unwrap();
            let elements = read_chunk(&store, &paths.committed_chunk_path(index)).unwrap();
            (index, elements)
        })
        .collect()
}

/// Uninterrupted run: committed chunks and number of filesystem operations
fn reference_run(workload: Workload) -> (Chunks, u64) {
    let dir = TempDir::new().unwrap();
    let config = workload.config(&dir);
    let store = Arc::new(FaultInjectingStore::counting(LocalFileStore::new()));

    let writer = StreamWriter::new(config.clone(), Arc::clone(&store), workload.source()).unwrap();
    writer.wait().unwrap();
    drop(writer);

    (committed(&config.paths()), store.operations())
}

/// Run with every operation from `crash_at` on failing
///
/// A resumed run may need fewer operations than `crash_at` and complete.
fn crashed_run(config: &StreamWriterConfig, workload: Workload, crash_at: u64) {
    let store = FaultInjectingStore::failing_after(
        LocalFileStore::new(),
        crash_at,
    );
    let writer = StreamWriter::new(config.clone(), store, workload.source()).unwrap();
    if let Err(err) = writer.wait() {
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }
}

fn temp_files(paths: &StreamPaths) -> Vec<String> {
    LocalFileStore::new()
        .list_children(&paths.temp_dir())
        .unwrap_or_default()
}

fn assert_committed_prefix(actual: &Chunks, reference: &Chunks) {
    let indices = actual.keys().copied().collect::<Vec<_>>();
    let prefix = reference.keys().copied().take(indices.len()).collect::<Vec<_>>();
    assert_eq!(indices, prefix, "committed chunks are not a prefix");
    for (index, elements) in actual {
        assert_eq!(Some(elements), reference.get(index), "chunk {} differs", index);
    }
}

/// Returns whether any crash left a checkpoint temp file behind
fn crash_and_resume(workload: Workload, crashes: &[u64], reference: &Chunks) -> bool {
    let dir = TempDir::new().unwrap();
    let config = workload.config(&dir);
    let mut left_temp_files = false;

    for &crash_at in crashes {
        crashed_run(&config, workload, crash_at);
        assert_committed_prefix(&committed(&config.paths()), reference);
        left_temp_files |= !temp_files(&config.paths()).is_empty();
    }

    let writer = StreamWriter::new(
        config.clone(),
        LocalFileStore::new(),
        workload.source(),
    )
    .unwrap();
    writer.wait().unwrap();

    assert_eq!(&committed(&config.paths()), reference);
    assert!(temp_files(&config.paths()).is_empty());
    left_temp_files
}

#[test]
fn test_crash_at_every_operation() {
    let workload = Workload {
        elements: 40,
        element_size: 8,
        max_chunk_size_bytes: 64,
    };
    let (reference, operations) = reference_run(workload);
    assert_eq!(reference.len(), 6);

    let mut crashes_in_checkpoint_save = 0;
    for crash_at in 0..operations {
        if crash_and_resume(workload, &[crash_at], &reference) {
            crashes_in_checkpoint_save += 1;
        }
    }
    // Crashing on the write or sync of each of the 5 checkpoints leaves a
    // temp file
    assert!(crashes_in_checkpoint_save >= 5);
}

#[test]
fn test_crash_during_recovery() {
    let workload = Workload {
        elements: 30,
        element_size: 16,
        max_chunk_size_bytes: 64,
    };
    let (reference, operations) = reference_run(workload);

    // Crash mid-run, then crash again early in the restart's recovery
    for first in (0..operations).step_by(5) {
        for second in 0..6 {
            crash_and_resume(workload, &[first, second], &reference);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_crash_resume_equivalence(
        elements in 0u64..80,
        element_size in 8usize..48,
        max_chunk_size_bytes in 16u64..256,
        crash_points in prop::collection::vec(any::<prop::sample::Index>(), 1..4),
    ) {
        let workload = Workload { elements, element_size, max_chunk_size_bytes };
        let (reference, operations) = reference_run(workload);

        let crashes = crash_points
            .iter()
            .map(|index| index.index(operations as usize) as u64)
            .collect::<Vec<_>>();
        crash_and_resume(workload, &crashes, &reference);
    }
}
