//! Ports - 抽象化レイヤー
//!
//! Dispatcher が依存する外部コラボレーターを trait として定義します。
//! 実装は `impls` にあり、呼び出し側が差し替えられます。

pub mod diagnostic_sink;
pub mod executor;
pub mod liveness;
pub mod main_context;

// 主要な trait を再エクスポート
pub use self::diagnostic_sink::DiagnosticSink;
pub use self::executor::{BackgroundExecutor, Job};
pub use self::liveness::Liveness;
pub use self::main_context::{MainJob, MainScheduler};
