// Manifest-keyed decoder registry for payload reconstruction.
//
// Purpose
// - Map the manifest string stored with each event onto a decoder, built
//   once at startup. An unregistered manifest is an explicit error at the
//   point of decoding, not a late failure deep inside the runtime.
//
// Testing guidance
// - Register decoders for test payload types with register_json.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("no decoder registered for manifest {manifest}")]
    UnknownManifest { manifest: String },

    #[error("decoding {manifest} failed: {source}")]
    Decode {
        manifest: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("encoding metadata failed: {0}")]
    Encode(#[from] serde_json::Error),
}

type Decoder<T> = Box<dyn Fn(&[u8]) -> anyhow::Result<T> + Send + Sync>;

/// Static manifest → decoder mapping. Built by the application at startup
/// and shared read-only by every replay and scan.
pub struct DecoderRegistry<T> {
    decoders: HashMap<String, Decoder<T>>,
}

impl<T> Default for DecoderRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DecoderRegistry<T> {
    pub fn new() -> Self {
        Self { decoders: HashMap::new() }
    }

    pub fn register<F>(mut self, manifest: impl Into<String>, decode: F) -> Self
    where
        F: Fn(&[u8]) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.decoders.insert(manifest.into(), Box::new(decode));
        self
    }

    /// Register a serde_json decoder for a payload type stored under the
    /// given manifest.
    pub fn register_json<P>(self, manifest: impl Into<String>) -> Self
    where
        P: DeserializeOwned + Into<T> + 'static,
    {
        self.register(manifest, |bytes| {
            let payload: P = serde_json::from_slice(bytes)?;
            Ok(payload.into())
        })
    }

    pub fn decode(&self, manifest: &str, bytes: &[u8]) -> Result<T, SerializationError> {
        let decoder = self
            .decoders
            .get(manifest)
            .ok_or_else(|| SerializationError::UnknownManifest { manifest: manifest.to_string() })?;
        decoder(bytes).map_err(|source| SerializationError::Decode {
            manifest: manifest.to_string(),
            source,
        })
    }
}
