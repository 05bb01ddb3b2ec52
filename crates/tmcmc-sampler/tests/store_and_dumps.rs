use tempfile::tempdir;
use tmcmc_core::TmcmcError;
use tmcmc_sampler::output::{format_entry, read_stage, stage_path, write_stage};
use tmcmc_sampler::{GenerationEntry, GenerationStore};

#[test]
fn store_refuses_entries_past_capacity() {
    let mut store = GenerationStore::with_capacity(2);
    store.append(GenerationEntry::new(vec![1.0], -1.0)).unwrap();
    store.append(GenerationEntry::new(vec![2.0], -2.0)).unwrap();
    let err = store
        .append(GenerationEntry::new(vec![3.0], -3.0))
        .unwrap_err();
    match err {
        TmcmcError::Store(info) => assert_eq!(info.code, "capacity-exceeded"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(store.len(), 2);
    assert_eq!(store.log_fitness(), vec![-1.0, -2.0]);

    store.reset();
    assert!(store.is_empty());
    assert_eq!(store.capacity(), 2);
}

#[test]
fn dump_lines_hold_point_then_fitness() {
    let entry = GenerationEntry::new(vec![0.5, -1.25], -3.0);
    assert_eq!(format_entry(&entry), "0.5 -1.25 -3.0");
}

#[test]
fn dumps_read_back_exactly() {
    let dir = tempdir().unwrap();
    let path = stage_path(dir.path(), "curgen_db_", 7);
    assert!(path.ends_with("curgen_db_007.txt"));
    let entries = vec![
        GenerationEntry::new(vec![0.1, 1.0 / 3.0], -12.345678901234567),
        GenerationEntry::new(vec![1e-300, -2.5e17], f64::NEG_INFINITY),
    ];
    write_stage(&path, &entries).unwrap();
    assert_eq!(read_stage(&path).unwrap(), entries);
}
