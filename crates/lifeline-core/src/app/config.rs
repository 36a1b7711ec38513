//! DispatcherConfig - dispatcher の設定
//!
//! すべてのフィールドにデフォルトがあるので、JSON では上書きしたい項目だけ書けば十分です。
//!
//! ```json
//! { "min_state": "started", "pool": { "max_blocking_threads": 64 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::LifecycleState;

/// ConfigError は設定読み込みのエラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// DispatcherConfig は配送判定と診断出力の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// これ以上の状態のときだけ continuation を実行する
    pub min_state: LifecycleState,

    /// スキップ時に DiagnosticSink に渡す tag
    pub diagnostic_tag: String,

    /// スキップ時に DiagnosticSink に渡す message
    pub skip_message: String,

    /// 専用 background pool を作るときの設定
    pub pool: PoolConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            min_state: LifecycleState::Created,
            diagnostic_tag: "Dispatcher".to_string(),
            skip_message: "Skipping task execution. Inactive lifecycle.".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// PoolConfig は background runtime の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// async worker 数（None なら CPU 数）
    pub worker_threads: Option<usize>,

    /// blocking pool の上限
    pub max_blocking_threads: usize,

    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_blocking_threads: 512,
            thread_name: "lifeline-bg".to_string(),
        }
    }
}
