//! Versioned parameter store for trained artifacts.
//!
//! Baselines, ensemble weights, and optimizer parameters are opaque JSON
//! payloads beyond save/load; any format is acceptable as long as
//! round-trip fidelity holds. Writes are last-writer-wins; callers
//! serialize training per model.

use crate::error::{EngineError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// A stored artifact with its version stamp.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VersionedArtifact {
    pub version: u64,
    /// JSON payload.
    pub payload: String,
}

/// Versioned load/save of opaque artifacts, last-writer-wins.
pub trait ParameterStore {
    /// Store an artifact under a key, replacing any previous version.
    fn save(&mut self, key: &str, artifact: VersionedArtifact) -> Result<()>;

    /// Load the latest artifact for a key.
    fn load(&self, key: &str) -> Result<Option<VersionedArtifact>>;
}

/// Serialize a typed artifact and save it.
pub fn save_artifact<S, T>(store: &mut S, key: &str, version: u64, value: &T) -> Result<()>
where
    S: ParameterStore + ?Sized,
    T: Serialize,
{
    let payload = serde_json::to_string(value)
        .map_err(|e| EngineError::InvalidInput(format!("artifact encoding failed: {}", e)))?;
    store.save(key, VersionedArtifact { version, payload })
}

/// Load and deserialize a typed artifact, with its version.
pub fn load_artifact<S, T>(store: &S, key: &str) -> Result<Option<(u64, T)>>
where
    S: ParameterStore + ?Sized,
    T: DeserializeOwned,
{
    match store.load(key)? {
        None => Ok(None),
        Some(artifact) => {
            let value = serde_json::from_str(&artifact.payload).map_err(|e| {
                EngineError::InvalidInput(format!("artifact decoding failed: {}", e))
            })?;
            Ok(Some((artifact.version, value)))
        }
    }
}

/// In-memory reference implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: HashMap<String, VersionedArtifact>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ParameterStore for MemoryStore {
    fn save(&mut self, key: &str, artifact: VersionedArtifact) -> Result<()> {
        self.artifacts.insert(key.to_string(), artifact);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<VersionedArtifact>> {
        Ok(self.artifacts.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::BaselineSet;
    use crate::models::EnsembleWeights;

    #[test]
    fn save_and_load_round_trip() {
        let mut store = MemoryStore::new();
        let weights = EnsembleWeights::default();

        save_artifact(&mut store, "ensemble_weights", 1, &weights).unwrap();
        let (version, restored): (u64, EnsembleWeights) =
            load_artifact(&store, "ensemble_weights").unwrap().unwrap();

        assert_eq!(version, 1);
        assert_eq!(restored, weights);
    }

    #[test]
    fn missing_key_loads_none() {
        let store = MemoryStore::new();
        let loaded: Option<(u64, EnsembleWeights)> = load_artifact(&store, "nope").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn last_writer_wins() {
        let mut store = MemoryStore::new();
        let first = EnsembleWeights::default();
        let second = EnsembleWeights {
            autoregressive: 1.0,
            seasonal: 0.0,
            boosted: 0.0,
            window: 0.0,
        };

        save_artifact(&mut store, "weights", 1, &first).unwrap();
        save_artifact(&mut store, "weights", 2, &second).unwrap();

        let (version, restored): (u64, EnsembleWeights) =
            load_artifact(&store, "weights").unwrap().unwrap();
        assert_eq!(version, 2);
        assert_eq!(restored, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn corrupt_payload_is_invalid_input() {
        let mut store = MemoryStore::new();
        store
            .save(
                "weights",
                VersionedArtifact {
                    version: 1,
                    payload: "not json".to_string(),
                },
            )
            .unwrap();

        let result: Result<Option<(u64, EnsembleWeights)>> = load_artifact(&store, "weights");
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn baseline_set_round_trips_via_store() {
        use crate::anomaly::AnomalyObservation;
        use chrono::{Duration, TimeZone, Utc};

        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let observations: Vec<AnomalyObservation> = (0..10)
            .map(|i| {
                AnomalyObservation::new(
                    base + Duration::days(i),
                    "revenue",
                    10_000.0 + i as f64 * 50.0,
                )
            })
            .collect();
        let baselines = BaselineSet::fit(&observations).unwrap();

        let mut store = MemoryStore::new();
        save_artifact(&mut store, "baselines", 3, &baselines).unwrap();
        let (_, restored): (u64, BaselineSet) =
            load_artifact(&store, "baselines").unwrap().unwrap();

        assert_eq!(
            restored.get("revenue").unwrap(),
            baselines.get("revenue").unwrap()
        );
    }
}
