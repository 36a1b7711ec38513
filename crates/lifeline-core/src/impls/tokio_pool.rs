//! TokioExecutor - tokio の blocking pool で background 計算を実行
//!
//! # 学習ポイント
//! - `spawn_blocking` は同期クロージャを専用の blocking pool で実行する
//! - `OnceLock` でプロセス共有のデフォルト pool を遅延初期化
//! - 所有している Runtime は async context で drop すると panic するので
//!   `shutdown_background` で手放す

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

use crate::app::config::PoolConfig;
use crate::domain::DispatchError;
use crate::ports::{BackgroundExecutor, Job};

static DEFAULT_EXECUTOR: OnceLock<Arc<TokioExecutor>> = OnceLock::new();

/// 共有のデフォルト background executor を取得
///
/// 初回呼び出し時に `PoolConfig::default()` で multi-thread runtime を構築します。
/// 以後は同じ executor を返します。
pub fn default_background_executor() -> Result<Arc<TokioExecutor>, DispatchError> {
    if let Some(executor) = DEFAULT_EXECUTOR.get() {
        return Ok(Arc::clone(executor));
    }
    let executor = Arc::new(TokioExecutor::with_config(&PoolConfig::default())?);
    // 競合した場合は先に入った方が使われ、こちらは drop される
    Ok(Arc::clone(DEFAULT_EXECUTOR.get_or_init(|| executor)))
}

/// TokioExecutor は tokio runtime の blocking pool に Job を投入する
pub struct TokioExecutor {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl TokioExecutor {
    /// 既存 runtime の handle を借りる（runtime は所有しない）
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            runtime: None,
        }
    }

    /// 現在のスレッドの runtime を借りる
    pub fn current() -> Result<Self, DispatchError> {
        let handle = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        Ok(Self::from_handle(handle))
    }

    /// 専用の multi-thread runtime を構築して所有する
    pub fn with_config(config: &PoolConfig) -> Result<Self, DispatchError> {
        let mut builder = Builder::new_multi_thread();
        builder
            .thread_name(config.thread_name.clone())
            .max_blocking_threads(config.max_blocking_threads)
            .enable_all();
        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers);
        }
        let runtime = builder.build()?;
        debug!(
            thread_name = %config.thread_name,
            max_blocking_threads = config.max_blocking_threads,
            "background runtime started"
        );
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl BackgroundExecutor for TokioExecutor {
    fn submit(&self, job: Job) -> Result<(), DispatchError> {
        let lost = Arc::new(AtomicBool::new(false));
        let flag = LostFlag {
            lost: Arc::clone(&lost),
            armed: true,
        };
        // JoinHandle は不要（結果は job 自身が main context に運ぶ）
        drop(self.handle.spawn_blocking(move || {
            flag.disarm();
            job();
        }));
        // 停止済みの runtime では spawn_blocking がその場で job を捨てる
        if lost.load(Ordering::Acquire) {
            return Err(DispatchError::ExecutorClosed);
        }
        Ok(())
    }
}

/// 実行されないまま drop された job を検出する
struct LostFlag {
    lost: Arc<AtomicBool>,
    armed: bool,
}

impl LostFlag {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LostFlag {
    fn drop(&mut self) {
        if self.armed {
            self.lost.store(true, Ordering::Release);
        }
    }
}

impl Drop for TokioExecutor {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn current_runs_job_on_blocking_pool() {
        let executor = TokioExecutor::current().unwrap();
        let (tx, rx) = oneshot::channel();
        let caller = std::thread::current().id();

        executor
            .submit(Box::new(move || {
                let _ = tx.send(std::thread::current().id());
            }))
            .unwrap();

        let worker = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(worker, caller);
    }

    #[test]
    fn current_without_runtime_errors() {
        let err = TokioExecutor::current().err().unwrap();
        assert!(matches!(err, DispatchError::NoRuntime));
    }

    #[test]
    fn owned_runtime_uses_configured_thread_name() {
        let config = PoolConfig {
            worker_threads: Some(1),
            max_blocking_threads: 4,
            thread_name: "pool-test".to_string(),
        };
        let executor = TokioExecutor::with_config(&config).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        executor
            .submit(Box::new(move || {
                let name = std::thread::current().name().map(str::to_string);
                let _ = tx.send(name);
            }))
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("pool-test"));
    }

    #[test]
    fn submit_after_runtime_shutdown_errors() {
        let runtime = Builder::new_current_thread().build().unwrap();
        let executor = TokioExecutor::from_handle(runtime.handle().clone());
        drop(runtime);

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let err = executor
            .submit(Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap_err();

        assert!(matches!(err, DispatchError::ExecutorClosed));
        std::thread::sleep(Duration::from_millis(50));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn default_executor_is_shared() {
        let a = default_background_executor().unwrap();
        let b = default_background_executor().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
