use fastloop::{
    load_ndjson, DatasetId, InMemoryDataset, Reader, ReaderOptions, Record, RowState, Strategy,
    TypeCache, Value,
};
use serde_json::json;
use std::io::Write;

const ENTRIES: usize = 20;

/// Deterministic stand-in for a small physics ntuple.
fn hsimple() -> InMemoryDataset {
    let mut state: u32 = 12345;
    let mut next = move || {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (state >> 8) as f64 / (1u32 << 24) as f64
    };

    let mut px = Vec::with_capacity(ENTRIES);
    let mut py = Vec::with_capacity(ENTRIES);
    let mut random = Vec::with_capacity(ENTRIES);
    for _ in 0..ENTRIES {
        px.push((next() * 4.0 - 2.0) as f32);
        py.push((next() * 4.0 - 2.0) as f32);
        random.push(next());
    }

    InMemoryDataset::builder(DatasetId::new("./hsimple.root", "ntuple"))
        .leaf("px", "Float_t", px)
        .leaf("py", "Float_t", py)
        .leaf("random", "Double_t", random)
        .build()
        .unwrap()
}

fn reference_px(dataset: &InMemoryDataset) -> Vec<f32> {
    dataset
        .values("px")
        .unwrap()
        .iter()
        .map(|v| match v {
            Value::F32(x) => *x,
            other => panic!("unexpected value {:?}", other),
        })
        .collect()
}

#[test]
fn streaming_pass_visits_every_entry() {
    let dataset = hsimple();
    let cache = TypeCache::new();
    let mut reader = cache
        .reader(&dataset, &ReaderOptions::default().with_pattern("*"))
        .unwrap();
    let px = reader.field::<f32>("px").unwrap();

    let mut advances = 0;
    let mut sum = 0.0f32;
    while reader.advance() {
        advances += 1;
        sum += *reader.get(px);
    }

    let expected: f32 = reference_px(&dataset).iter().sum();
    assert_eq!(advances, ENTRIES);
    assert_eq!(sum, expected);
    assert!(!reader.advance());
}

#[test]
fn cached_columns_match_streaming_pass() {
    let dataset = hsimple();
    let cache = TypeCache::new();

    let streamed: Vec<Record> = cache
        .reader(&dataset, &ReaderOptions::default())
        .unwrap()
        .into_records()
        .collect();
    assert_eq!(streamed.len(), ENTRIES);

    let options = ReaderOptions::default().with_strategy(Strategy::Cached);
    let mut cached = cache.reader(&dataset, &options).unwrap();
    assert_eq!(cached.entry_count(), ENTRIES);
    assert_eq!(cached.fields().len(), 3);

    for field in cached.fields() {
        let name = field.identifier.as_str();
        let column: Vec<Value> = match field.type_name.as_str() {
            "Float_t" => {
                let handle = cached.field::<f32>(name).unwrap();
                cached.column(handle).unwrap().iter().map(|&v| Value::from(v)).collect()
            }
            "Double_t" => {
                let handle = cached.field::<f64>(name).unwrap();
                cached.column(handle).unwrap().iter().map(|&v| Value::from(v)).collect()
            }
            other => panic!("unexpected type {}", other),
        };

        let expected: Vec<Value> = streamed.iter().map(|r| r.get(name).unwrap().clone()).collect();
        assert_eq!(column, expected, "column {}", name);
    }

    let px = cached.field::<f32>("px").unwrap();
    for record in &streamed {
        assert!(cached.advance());
        assert_eq!(Some(&Value::F32(*cached.get(px))), record.get("px"));
    }
    assert!(!cached.advance());
    assert!(!cached.advance());
}

#[test]
fn glob_selection_builds_narrow_record() {
    let dataset = hsimple();
    let cache = TypeCache::new();
    let reader = cache
        .reader(&dataset, &ReaderOptions::default().with_pattern("p*"))
        .unwrap();

    let identifiers: Vec<_> = reader.fields().iter().map(|f| f.identifier.as_str()).collect();
    assert_eq!(identifiers, ["px", "py"]);
    assert!(reader.field::<f64>("random").is_err());
}

#[test]
fn selections_on_one_dataset_do_not_collide() {
    let dataset = hsimple();
    let cache = TypeCache::new();

    let mut momenta = cache
        .reader(&dataset, &ReaderOptions::default().with_pattern("p*"))
        .unwrap();
    let mut random_only = cache
        .reader(&dataset, &ReaderOptions::default().with_fields(["random"]))
        .unwrap();

    assert_eq!(cache.compilation_count(), 2);

    let px = momenta.field::<f32>("px").unwrap();
    let random = random_only.field::<f64>("random").unwrap();
    assert!(momenta.advance());
    assert!(random_only.advance());
    assert_eq!(*momenta.get(px), reference_px(&dataset)[0]);
    assert!((0.0..1.0).contains(random_only.get(random)));
}

#[test]
fn empty_dataset_exhausts_on_first_advance() {
    let dataset = InMemoryDataset::builder(DatasetId::new("empty.root", "ntuple"))
        .leaf("px", "Float_t", Vec::<f32>::new())
        .build()
        .unwrap();

    let cache = TypeCache::new();
    let options = ReaderOptions::default().with_strategy(Strategy::Cached);
    let mut reader = cache.reader(&dataset, &options).unwrap();

    assert_eq!(reader.entry_count(), 0);
    assert!(!reader.advance());
    assert!(!reader.advance());

    let Reader::Columnar(inner) = &reader else {
        panic!("Expected columnar reader");
    };
    assert_eq!(inner.row_state(), RowState::Exhausted);
}

#[test]
fn ndjson_file_round_trip() {
    let path = std::env::temp_dir().join(format!("fastloop-e2e-{}.jsonl", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        for i in 0..5 {
            writeln!(file, "{}", json!({"px": i as f64 * 0.5, "n": i, "tag": "mu"})).unwrap();
        }
    }

    let dataset = load_ndjson(&path, "events").unwrap();
    std::fs::remove_file(&path).unwrap();

    let cache = TypeCache::new();
    let records: Vec<_> = cache
        .reader(&dataset, &ReaderOptions::default().with_fields(["n", "tag"]))
        .unwrap()
        .into_records()
        .collect();

    assert_eq!(records.len(), 5);
    assert_eq!(records[4].get("n"), Some(&Value::I64(4)));
    assert_eq!(
        serde_json::to_value(&records[0]).unwrap(),
        json!({"n": 0, "tag": "mu"})
    );
}
