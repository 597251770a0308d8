//! Splits a cassette YAML file into one cassette per test identifier.
//!
//! Usage: `cassette_split <input.yaml> <output_dir>`

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::{env, fs, process};

use chrono::Utc;
use depcapture::cassette::format::Cassette;
use depcapture::record::DependencyRecord;

/// A per-test cassette that links back to the original recording session.
#[derive(serde::Serialize)]
struct PerTestCassette {
    name: String,
    recorded_at: chrono::DateTime<Utc>,
    source_session: String,
    mocks: Vec<DependencyRecord>,
}

/// Maps a test identifier to a safe file stem.
fn file_stem(test_id: &str) -> String {
    if test_id.is_empty() {
        return "unnamed".to_string();
    }
    test_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn split_cassette(input: &str, output_dir: &str) -> Result<(), String> {
    let input_path = PathBuf::from(input);
    let output_path = PathBuf::from(output_dir);

    let cassette = Cassette::load(&input_path)?;

    // Group records by test identifier, keeping recorded order
    let mut by_test: BTreeMap<String, Vec<DependencyRecord>> = BTreeMap::new();
    for mock in &cassette.mocks {
        by_test.entry(mock.name.clone()).or_default().push(mock.clone());
    }

    fs::create_dir_all(&output_path)
        .map_err(|e| format!("Failed to create {}: {e}", output_path.display()))?;

    for (test_id, mocks) in by_test {
        let per_test = PerTestCassette {
            name: format!("{}-{test_id}", cassette.name),
            recorded_at: cassette.recorded_at,
            source_session: cassette.name.clone(),
            mocks,
        };

        let file_path = output_path.join(format!("{}.yaml", file_stem(&test_id)));
        let yaml = serde_yaml::to_string(&per_test)
            .map_err(|e| format!("Failed to serialize cassette for test {test_id}: {e}"))?;
        fs::write(&file_path, yaml)
            .map_err(|e| format!("Failed to write {}: {e}", file_path.display()))?;

        println!("Wrote {}", file_path.display());
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: cassette_split <input.yaml> <output_dir>");
        process::exit(1);
    }

    if let Err(e) = split_cassette(&args[1], &args[2]) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
