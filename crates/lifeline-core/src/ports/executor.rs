//! BackgroundExecutor port - background 計算の実行先
//!
//! # 実装
//! - **TokioExecutor**: tokio の blocking pool（共有・事実上無制限）
//! - **SingleThreadExecutor**: 専用スレッド 1 本（FIFO）

use crate::domain::DispatchError;

/// Job は executor に投入する 0 引数の計算
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// BackgroundExecutor は Job を非同期に実行する
///
/// # 契約
/// - `submit` はブロックしない
/// - 投入された Job は 1 回実行される
/// - 他の投入との順序は保証しない
/// - 複数スレッドから同時に `submit` できる
pub trait BackgroundExecutor: Send + Sync {
    fn submit(&self, job: Job) -> Result<(), DispatchError>;
}

impl<E: BackgroundExecutor + ?Sized> BackgroundExecutor for std::sync::Arc<E> {
    fn submit(&self, job: Job) -> Result<(), DispatchError> {
        (**self).submit(job)
    }
}
