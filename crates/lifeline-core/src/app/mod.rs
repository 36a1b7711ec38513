//! App - アプリケーション層
//!
//! ports を組み合わせて Dispatcher を実装します。
//!
//! # 主要コンポーネント
//! - **Dispatcher**: background 実行 → main context への配送
//! - **DispatcherBuilder**: 構築とワイヤリング
//! - **DispatcherConfig**: 設定
//! - **LivenessProbe**: 協調的キャンセル用の問い合わせ口

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod probe;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::config::{ConfigError, DispatcherConfig, PoolConfig};
pub use self::dispatcher::Dispatcher;
pub use self::probe::LivenessProbe;
