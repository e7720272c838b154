//! End-to-end tests driving the library entry point exactly as `main.rs`
//! does, through real files on disk.

use std::fs;
use std::io::Read;

use lifetrace::cli::Args;

fn run_trace(trace: &str) -> (Vec<serde_json::Value>, Vec<u8>, Vec<u8>, Vec<u8>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let input_path = dir.path().join("trace.jsonl");
    let objects_out = dir.path().join("objects.jsonl");
    let last_use_out = dir.path().join("last_use.bin");
    let unreachable_out = dir.path().join("unreachable.bin");
    let iid_updates_out = dir.path().join("iid_updates.bin");

    fs::write(&input_path, trace).expect("write input trace");

    let args = Args {
        input: Some(input_path),
        objects_out: objects_out.clone(),
        last_use_out: last_use_out.clone(),
        unreachable_out: unreachable_out.clone(),
        iid_updates_out: iid_updates_out.clone(),
        verbose: 0,
    };
    lifetrace::run(args).expect("run");

    let objects: Vec<serde_json::Value> = fs::read_to_string(&objects_out)
        .expect("read objects")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json line"))
        .collect();

    let mut last_use = Vec::new();
    fs::File::open(&last_use_out).unwrap().read_to_end(&mut last_use).unwrap();
    let mut unreachable = Vec::new();
    fs::File::open(&unreachable_out).unwrap().read_to_end(&mut unreachable).unwrap();
    let mut iid_updates = Vec::new();
    fs::File::open(&iid_updates_out).unwrap().read_to_end(&mut iid_updates).unwrap();

    (objects, last_use, unreachable, iid_updates)
}

#[test]
fn s1_simple_lifetime_round_trips_through_the_cli() {
    let trace = concat!(
        "{\"op\":\"init\",\"timer\":1,\"source_map\":{}}\n",
        "{\"op\":\"create\",\"site\":[1,1],\"oid\":5,\"time\":10,\"is_dom\":false}\n",
        "{\"op\":\"last_use\",\"oid\":5,\"site\":[1,2],\"time\":20}\n",
        "{\"op\":\"unreachable_object\",\"site\":[1,3],\"oid\":5,\"time\":30,\"shallow_size\":0}\n",
        "{\"op\":\"end_last_use\"}\n",
        "{\"op\":\"end_execution\",\"time\":40}\n",
    );

    let (objects, last_use, unreachable, iid_updates) = run_trace(trace);

    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0], serde_json::json!([5, "OBJECT", "1:1", 10, [], 20, "1:2", 30, "1:3"]));
    assert_eq!(last_use.len(), 20);
    assert_eq!(&last_use[0..4], &5i32.to_be_bytes());
    assert_eq!(unreachable.len(), 20);
    assert!(iid_updates.is_empty());
}

#[test]
fn s5_update_iid_round_trips_through_the_cli() {
    let trace = concat!(
        "{\"op\":\"init\",\"timer\":1,\"source_map\":{}}\n",
        "{\"op\":\"create\",\"site\":[1,1],\"oid\":5,\"time\":10,\"is_dom\":false}\n",
        "{\"op\":\"function_enter\",\"site\":[0,0],\"fun_id\":1,\"call_site\":[2,2],\"time\":15}\n",
        "{\"op\":\"update_iid\",\"oid\":5,\"new_site\":[3,3]}\n",
        "{\"op\":\"function_exit\",\"site\":[0,0],\"time\":16}\n",
        "{\"op\":\"unreachable_object\",\"site\":[1,4],\"oid\":5,\"time\":20,\"shallow_size\":0}\n",
        "{\"op\":\"end_last_use\"}\n",
        "{\"op\":\"end_execution\",\"time\":30}\n",
    );

    let (objects, _last_use, _unreachable, iid_updates) = run_trace(trace);

    assert_eq!(objects[0][2], serde_json::json!("3:3"));
    assert_eq!(objects[0][4], serde_json::json!(["2:2"]));
    assert_eq!(iid_updates.len(), 12);
    assert_eq!(&iid_updates[0..4], &5i32.to_be_bytes());
    assert_eq!(&iid_updates[4..8], &3i32.to_be_bytes());
    assert_eq!(&iid_updates[8..12], &3i32.to_be_bytes());
}

#[test]
fn fatal_trace_contract_violation_surfaces_as_an_error() {
    let trace = concat!(
        "{\"op\":\"init\",\"timer\":1,\"source_map\":{}}\n",
        "{\"op\":\"create\",\"site\":[1,1],\"oid\":5,\"time\":10,\"is_dom\":false}\n",
        "{\"op\":\"end_execution\",\"time\":30}\n",
    );

    let dir = tempfile::tempdir().expect("tempdir");
    let input_path = dir.path().join("trace.jsonl");
    fs::write(&input_path, trace).unwrap();

    let args = Args {
        input: Some(input_path),
        objects_out: dir.path().join("objects.jsonl"),
        last_use_out: dir.path().join("last_use.bin"),
        unreachable_out: dir.path().join("unreachable.bin"),
        iid_updates_out: dir.path().join("iid_updates.bin"),
        verbose: 0,
    };

    let err = lifetrace::run(args).unwrap_err();
    assert!(err.to_string().contains("still live") || format!("{err:#}").contains("still live"));
}

#[test]
fn missing_input_file_is_a_clean_error_not_a_panic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = Args {
        input: Some(dir.path().join("does-not-exist.jsonl")),
        objects_out: dir.path().join("objects.jsonl"),
        last_use_out: dir.path().join("last_use.bin"),
        unreachable_out: dir.path().join("unreachable.bin"),
        iid_updates_out: dir.path().join("iid_updates.bin"),
        verbose: 0,
    };

    let err = lifetrace::run(args).unwrap_err();
    assert!(format!("{err:#}").contains("failed to open"));
}
