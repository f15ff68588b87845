//! Temp-dir backed pipelines and batch files

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use thumbfetch::{FetchConfig, Pipeline};

use super::StubLookup;

/// Pipeline rooted in `temp_dir` with zero jitter and `workers` per pool
pub async fn test_pipeline(temp_dir: &TempDir, lookup: Arc<StubLookup>, workers: usize) -> Pipeline {
    let config = FetchConfig::for_root(temp_dir.path(), workers);
    let pipeline = Pipeline::new(config, lookup);
    pipeline.init().await.unwrap();
    pipeline
}

/// Write `posts` as a JSON array and return its path
pub fn write_batch(temp_dir: &TempDir, posts: &[Value]) -> PathBuf {
    let path = temp_dir.path().join("posts.json");
    std::fs::write(&path, serde_json::to_vec_pretty(posts).unwrap()).unwrap();
    path
}

pub fn read_json(path: &Path) -> Value {
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("Corrupt JSON in {}: {}", path.display(), e))
}
