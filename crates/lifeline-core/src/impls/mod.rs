//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **Lifecycle**: 所有者側の状態機械（Liveness）
//! - **TokioExecutor** / **SingleThreadExecutor**: BackgroundExecutor
//! - **MainLoop** / **MainHandle**: MainScheduler
//! - **TracingSink** / **MemorySink** / **NoopSink**: DiagnosticSink

pub mod lifecycle;
pub mod main_loop;
pub mod single_thread;
pub mod sinks;
pub mod tokio_pool;

// 主要な型を再エクスポート
pub use self::lifecycle::Lifecycle;
pub use self::main_loop::{MainHandle, MainLoop};
pub use self::single_thread::SingleThreadExecutor;
pub use self::sinks::{MemorySink, NoopSink, SinkRecord, TracingSink};
pub use self::tokio_pool::{TokioExecutor, default_background_executor};
