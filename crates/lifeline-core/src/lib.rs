//! lifeline-core
//!
//! Lifecycle-aware background dispatch: run a computation off the main context,
//! then hand its result to a continuation on the main context only while the
//! owning component is still alive.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（lifecycle, ids, errors）
//! - **ports**: 抽象化レイヤー（Liveness, BackgroundExecutor, MainScheduler, DiagnosticSink）
//! - **impls**: 実装（Lifecycle, TokioExecutor, SingleThreadExecutor, MainLoop, sinks）
//! - **app**: Dispatcher とその構築（builder, config, probe）
//! - **observability**: dispatch の集計

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{Dispatcher, DispatcherBuilder, DispatcherConfig, LivenessProbe};
pub use domain::{DispatchError, LifecycleEvent, LifecycleState, TaskFailure, TaskOutcome};
pub use impls::{Lifecycle, MainHandle, MainLoop};
pub use observability::DispatchCounts;
pub use ports::Liveness;
