//! DispatcherBuilder - Dispatcher の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - main context は必須。指定がなければ build() が BuildError を返す
//! - executor / sink は省略可能（共有 pool / TracingSink）

use std::sync::Arc;

use super::config::DispatcherConfig;
use super::dispatcher::Dispatcher;
use crate::domain::{DispatchError, LifecycleState};
use crate::impls::{TokioExecutor, TracingSink, default_background_executor};
use crate::ports::{BackgroundExecutor, DiagnosticSink, MainScheduler};

/// BuildError は Dispatcher 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no main context was configured; call `main(...)` before `build()`")]
    MissingMainContext,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// DispatcherBuilder は Dispatcher を構築
///
/// # 使用例
/// ```ignore
/// let (main, _join) = MainLoop::spawn("main")?;
/// let dispatcher = Dispatcher::builder()
///     .main(main)
///     .config(DispatcherConfig::from_json_file("lifeline.json")?)
///     .dedicated_pool()
///     .build()?;
/// ```
#[derive(Default)]
pub struct DispatcherBuilder {
    executor: Option<Arc<dyn BackgroundExecutor>>,
    main: Option<Arc<dyn MainScheduler>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    config: DispatcherConfig,
    dedicated_pool: bool,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `execute` で使う executor
    pub fn executor<E: BackgroundExecutor + 'static>(mut self, executor: E) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// 共有 pool の代わりに `config.pool` で専用 pool を作る
    ///
    /// `executor(...)` が指定されていればそちらが優先される。
    pub fn dedicated_pool(mut self) -> Self {
        self.dedicated_pool = true;
        self
    }

    pub fn main<M: MainScheduler + 'static>(mut self, main: M) -> Self {
        self.main = Some(Arc::new(main));
        self
    }

    pub fn sink<S: DiagnosticSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// `config.min_state` だけを上書き
    pub fn min_state(mut self, state: LifecycleState) -> Self {
        self.config.min_state = state;
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let main = self.main.ok_or(BuildError::MissingMainContext)?;
        let executor: Arc<dyn BackgroundExecutor> = match self.executor {
            Some(executor) => executor,
            None if self.dedicated_pool => Arc::new(TokioExecutor::with_config(&self.config.pool)?),
            None => default_background_executor()?,
        };
        let sink: Arc<dyn DiagnosticSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(TracingSink),
        };
        Ok(Dispatcher::from_parts(executor, main, sink, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{MainLoop, SingleThreadExecutor};

    #[test]
    fn build_without_main_fails() {
        let result = DispatcherBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingMainContext)));
    }

    #[test]
    fn build_with_defaults() {
        let (main, _main_loop) = MainLoop::new();
        let dispatcher = DispatcherBuilder::new().main(main).build().unwrap();
        assert_eq!(dispatcher.config(), &DispatcherConfig::default());
        assert_eq!(dispatcher.counts().submitted, 0);
    }

    #[test]
    fn min_state_overrides_config() {
        let (main, _main_loop) = MainLoop::new();
        let config = DispatcherConfig {
            diagnostic_tag: "Screen".to_string(),
            ..Default::default()
        };
        let dispatcher = DispatcherBuilder::new()
            .main(main)
            .config(config)
            .min_state(LifecycleState::Resumed)
            .build()
            .unwrap();
        assert_eq!(dispatcher.config().min_state, LifecycleState::Resumed);
        assert_eq!(dispatcher.config().diagnostic_tag, "Screen");
    }

    #[test]
    fn explicit_executor_wins_over_dedicated_pool() {
        let (main, _main_loop) = MainLoop::new();
        let executor = SingleThreadExecutor::spawn("builder-bg").unwrap();
        let dispatcher = DispatcherBuilder::new()
            .main(main)
            .executor(executor)
            .dedicated_pool()
            .build();
        assert!(dispatcher.is_ok());
    }

    #[test]
    fn dedicated_pool_is_built_from_config() {
        let (main, _main_loop) = MainLoop::new();
        let mut config = DispatcherConfig::default();
        config.pool.worker_threads = Some(1);
        config.pool.thread_name = "dedicated-bg".to_string();
        let dispatcher = DispatcherBuilder::new()
            .main(main)
            .config(config)
            .dedicated_pool()
            .build();
        assert!(dispatcher.is_ok());
    }
}
