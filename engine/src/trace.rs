use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("trace json is invalid in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("trace in {path} is inconsistent: {reason}")]
    Inconsistent { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry<I, E> {
    pub frame: u64,
    pub input: I,
    pub effect: Option<E>,
}

/// Ring of the most recent steps a runner took.
///
/// `frame` counts every recorded step, including the ones that have already
/// been evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace<I, E> {
    capacity: usize,
    frame: u64,
    entries: VecDeque<TraceEntry<I, E>>,
}

impl<I, E> Trace<I, E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            frame: 0,
            entries: VecDeque::with_capacity(capacity.min(crate::DEFAULT_TRACE_CAPACITY)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Steps that were recorded but no longer fit.
    pub fn evicted(&self) -> u64 {
        self.frame.saturating_sub(self.entries.len() as u64)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TraceEntry<I, E>> {
        self.entries.iter()
    }

    pub fn record(&mut self, input: I, effect: Option<E>) -> u64 {
        self.frame += 1;
        if self.capacity == 0 {
            return self.frame;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(TraceEntry {
            frame: self.frame,
            input,
            effect,
        });
        self.frame
    }

    fn enforce_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Entry frames must be 1-based, strictly increasing and no later than
    /// `frame`, otherwise recording would reuse frame numbers.
    fn check_frames(&self) -> Result<(), String> {
        let mut previous = 0u64;
        for entry in &self.entries {
            if entry.frame <= previous {
                return Err(format!(
                    "entry frame {} does not follow frame {previous}",
                    entry.frame
                ));
            }
            previous = entry.frame;
        }
        if previous > self.frame {
            return Err(format!(
                "entry frame {previous} is past the trace frame {}",
                self.frame
            ));
        }
        Ok(())
    }
}

impl<I, E: Clone> Trace<I, E> {
    pub fn effects(&self) -> Vec<E> {
        self.entries
            .iter()
            .filter_map(|entry| entry.effect.clone())
            .collect()
    }
}

impl<I, E> Trace<I, E>
where
    I: Serialize + DeserializeOwned,
    E: Serialize + DeserializeOwned,
{
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> Result<(), TraceError> {
        let path = path.as_ref();
        let io_err = |source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| TraceError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(io_err)?;
        tracing::debug!(path = %path.display(), entries = self.len(), "saved trace");
        Ok(())
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut trace: Self =
            serde_json::from_slice(&bytes).map_err(|source| TraceError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        trace
            .check_frames()
            .map_err(|reason| TraceError::Inconsistent {
                path: path.to_path_buf(),
                reason,
            })?;
        trace.enforce_capacity();
        Ok(trace)
    }
}
