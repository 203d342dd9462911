// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! One provider instance is built at startup and handed to indexing and
//! search. The builtin provider loads its model on first use and keeps it
//! for the lifetime of the instance.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::{EmbeddingConfig, EmbeddingProviderType};

/// Trait for embedding providers.
///
/// `embed_texts` must return exactly one vector per input, in input order.
pub trait EmbeddingProvider: Send {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Generates embeddings for the given texts.
    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut result = self.embed_texts(&[text.to_string()])?;
        result
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }
}

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let provider: Box<dyn EmbeddingProvider> = match config.provider() {
        EmbeddingProviderType::Builtin => builtin_provider(config)?,
        EmbeddingProviderType::Command => Box::new(CommandProvider::new(
            config.command().to_string(),
            config.model().to_string(),
        )),
        EmbeddingProviderType::Dummy => Box::new(DummyProvider::new(config.dimension())),
    };
    tracing::debug!("Using embedding provider '{}'", provider.model_id());
    Ok(provider)
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
fn builtin_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    Ok(Box::new(FastEmbedder::new(FastEmbedConfig::from_config(config))?))
}

#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
fn builtin_provider(_config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    bail!("The builtin embedding provider is not available on this platform; set embeddings.provider = \"command\"")
}

/// Configuration for the fastembed provider.
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    pub model_name: String,
    pub batch_size: usize,
    pub max_chars: usize,
    pub normalize: bool,
    pub cache_dir: PathBuf,
}

impl FastEmbedConfig {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model_name: config.model().to_string(),
            batch_size: config.batch_size(),
            max_chars: config.max_chars(),
            normalize: config.normalize(),
            cache_dir: config.cache_dir(),
        }
    }
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
pub use fastembed_provider::FastEmbedder;

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
mod fastembed_provider {
    use super::*;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    /// FastEmbed provider, sentence-transformers/all-MiniLM-L6-v2 by default.
    pub struct FastEmbedder {
        embedder: Option<TextEmbedding>,
        model: EmbeddingModel,
        config: FastEmbedConfig,
    }

    impl FastEmbedder {
        /// Validates the model name; the model itself is loaded on first use.
        pub fn new(config: FastEmbedConfig) -> Result<Self> {
            let model = parse_model_name(&config.model_name)?;
            Ok(Self {
                embedder: None,
                model,
                config,
            })
        }

        fn embedder(&mut self) -> Result<&mut TextEmbedding> {
            if self.embedder.is_none() {
                tracing::info!("Loading embedding model '{}'", self.config.model_name);
                std::fs::create_dir_all(&self.config.cache_dir).with_context(|| {
                    format!(
                        "Failed to create model cache directory {}",
                        self.config.cache_dir.display()
                    )
                })?;
                let init = InitOptions::new(self.model.clone())
                    .with_cache_dir(self.config.cache_dir.clone())
                    .with_show_download_progress(false);
                let embedder =
                    TextEmbedding::try_new(init).context("Failed to initialize fastembed model")?;
                self.embedder = Some(embedder);
            }
            self.embedder
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("Embedding model not loaded"))
        }
    }

    impl EmbeddingProvider for FastEmbedder {
        fn model_id(&self) -> &str {
            &self.config.model_name
        }

        fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let prepared = truncate_texts(texts, self.config.max_chars);
            let batch_size = self.config.batch_size;
            let normalize = self.config.normalize;
            let mut embeddings = self.embedder()?.embed(&prepared, Some(batch_size))?;

            if normalize {
                for embedding in embeddings.iter_mut() {
                    l2_normalize(embedding);
                }
            }

            Ok(embeddings)
        }
    }

    fn parse_model_name(name: &str) -> Result<EmbeddingModel> {
        match name.trim().to_lowercase().as_str() {
            "minilm"
            | "all-minilm-l6-v2"
            | "sentence-transformers/all-minilm-l6-v2"
            | "xenova/all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l6-v2-q" => Ok(EmbeddingModel::AllMiniLML6V2Q),
            "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "bge-small-en-v1.5-q" => Ok(EmbeddingModel::BGESmallENV15Q),
            "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
            "bge-base-en-v1.5-q" => Ok(EmbeddingModel::BGEBaseENV15Q),
            other => bail!(
                "Unsupported embedding model '{}'. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (add -q suffix for quantized)",
                other
            ),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn config(model: &str) -> FastEmbedConfig {
            FastEmbedConfig {
                model_name: model.to_string(),
                batch_size: 8,
                max_chars: 100,
                normalize: true,
                cache_dir: std::env::temp_dir().join("contexto-embed-test"),
            }
        }

        #[test]
        fn test_invalid_model_name() {
            assert!(FastEmbedder::new(config("nonexistent-model")).is_err());
        }

        #[test]
        fn test_model_not_loaded_until_used() {
            let mut provider = FastEmbedder::new(config("all-MiniLM-L6-v2")).unwrap();
            assert_eq!(provider.model_id(), "all-MiniLM-L6-v2");
            assert!(provider.embedder.is_none());
            assert!(provider.embed_texts(&[]).unwrap().is_empty());
            assert!(provider.embedder.is_none());
        }

        #[test]
        #[ignore = "requires model download"]
        fn test_embedding_generation() {
            let mut provider = FastEmbedder::new(config("all-MiniLM-L6-v2")).unwrap();
            let vectors = provider
                .embed_texts(&["Hello, world!".to_string(), "Goodbye".to_string()])
                .unwrap();
            assert_eq!(vectors.len(), 2);
            assert_eq!(vectors[0].len(), 384);

            let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 0.01);
        }
    }
}

/// Command provider that shells out to an external process.
pub struct CommandProvider {
    command: String,
    model: String,
}

impl CommandProvider {
    pub fn new(command: String, model: String) -> Self {
        Self { command, model }
    }

    fn run_command(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let payload = serde_json::json!({
            "model": self.model,
            "texts": texts,
        });

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn embedding command: {}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload_str = payload.to_string();
            stdin
                .write_all(payload_str.as_bytes())
                .context("Failed to write embeddings payload to stdin")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to read embeddings command output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Embedding command failed (status {}): {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_vectors(stdout.trim())
    }
}

impl EmbeddingProvider for CommandProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.run_command(texts)?;
        if vectors.len() != texts.len() {
            bail!(
                "Embedding command returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            );
        }
        Ok(vectors)
    }
}

/// Parse command output: either a bare array of vectors or an object
/// carrying them under `embeddings`, `vectors` or `data`.
fn parse_vectors(raw: &str) -> Result<Vec<Vec<f32>>> {
    let parsed: Value = serde_json::from_str(raw)
        .with_context(|| "Failed to parse embeddings command output as JSON")?;

    let embeddings_value = match parsed {
        Value::Array(arr) => Value::Array(arr),
        Value::Object(ref obj) => {
            if let Some(value) = obj.get("embeddings") {
                value.clone()
            } else if let Some(value) = obj.get("vectors") {
                value.clone()
            } else if let Some(value) = obj.get("data") {
                value.clone()
            } else {
                bail!("Embeddings command output missing 'embeddings' field");
            }
        }
        _ => bail!("Embeddings command output must be JSON array or object"),
    };

    embeddings_value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Embeddings output must be a JSON array"))?
        .iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(|| anyhow::anyhow!("Embedding row must be an array"))?
                .iter()
                .map(|value| {
                    value
                        .as_f64()
                        .ok_or_else(|| anyhow::anyhow!("Embedding value must be a number"))
                        .map(|v| v as f32)
                })
                .collect::<Result<Vec<f32>>>()
        })
        .collect::<Result<Vec<Vec<f32>>>>()
}

/// Dummy provider that returns zero vectors (for testing/offline use).
pub struct DummyProvider {
    model: String,
    dimension: usize,
}

impl DummyProvider {
    /// Creates a new dummy provider with specified dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            model: "dummy".to_string(),
            dimension,
        }
    }
}

impl EmbeddingProvider for DummyProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors: Vec<Vec<f32>> = texts.iter().map(|_| vec![0.0; self.dimension]).collect();

        Ok(vectors)
    }
}

fn truncate_texts(texts: &[String], max_chars: usize) -> Vec<Cow<'_, str>> {
    texts
        .iter()
        .map(|text| truncate_to_chars(text.as_str(), max_chars))
        .collect()
}

fn truncate_to_chars(input: &str, max_chars: usize) -> Cow<'_, str> {
    if max_chars == 0 {
        return Cow::Borrowed("");
    }

    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(input[..idx].to_string()),
        None => Cow::Borrowed(input),
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_provider() {
        let mut provider = DummyProvider::new(384);
        assert_eq!(provider.model_id(), "dummy");

        let result = provider
            .embed_texts(&["hello".to_string(), "world".to_string()])
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].len(), 384);
        assert!(result[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_embed() {
        let mut provider = DummyProvider::new(384);
        let result = provider.embed_texts(&[]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_embed_one() {
        let mut provider = DummyProvider::new(128);
        let vector = provider.embed_one("test").unwrap();
        assert_eq!(vector.len(), 128);
    }

    #[test]
    fn test_boxed_provider() {
        let mut provider: Box<dyn EmbeddingProvider> = Box::new(DummyProvider::new(4));
        assert_eq!(provider.model_id(), "dummy");
        assert_eq!(provider.embed_one("x").unwrap().len(), 4);
    }

    #[test]
    fn test_provider_from_config_dummy() {
        let config = EmbeddingConfig {
            provider: Some(EmbeddingProviderType::Dummy),
            dimension: Some(16),
            ..Default::default()
        };
        let mut provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.embed_one("x").unwrap().len(), 16);
    }

    #[test]
    fn test_truncate_to_chars() {
        let input = "hello";
        assert_eq!(
            truncate_to_chars(input, 2),
            Cow::<str>::Owned("he".to_string())
        );
        assert_eq!(truncate_to_chars(input, 5), Cow::Borrowed(input));
        assert_eq!(truncate_to_chars("héllo", 2), Cow::<str>::Owned("hé".to_string()));
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_parse_vectors_shapes() {
        assert_eq!(parse_vectors("[[1, 2], [3, 4]]").unwrap().len(), 2);
        assert_eq!(
            parse_vectors(r#"{"embeddings": [[0.5]]}"#).unwrap(),
            vec![vec![0.5]]
        );
        assert!(parse_vectors(r#"{"other": []}"#).is_err());
        assert!(parse_vectors(r#"[["x"]]"#).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_provider_round_trips_through_shell() {
        let mut provider = CommandProvider::new(
            r#"cat > /dev/null; echo '{"embeddings": [[1.0, 0.0], [0.0, 1.0]]}'"#.to_string(),
            "fixture".to_string(),
        );
        let vectors = provider
            .embed_texts(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        // One text in, two vectors out breaks the contract.
        assert!(provider.embed_texts(&["a".to_string()]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_provider_failure() {
        let mut provider = CommandProvider::new("exit 3".to_string(), "fixture".to_string());
        assert!(provider.embed_texts(&["a".to_string()]).is_err());
    }
}
