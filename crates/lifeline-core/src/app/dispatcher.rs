//! Dispatcher - background で計算し、main context に結果を届ける
//!
//! # フロー
//! 1. task を executor に投入（呼び出し元はブロックしない）
//! 2. worker で task を 1 回実行
//! 3. 結果を main context に post
//! 4. main context で所有者の状態を 1 回だけ確認し、生きていれば continuation を実行
//!
//! 3 と 4 は同じ MainJob の中で行うので、状態確認と continuation の間に
//! 他の main context 作業が割り込むことはありません。
//!
//! # 所有者の状態は「配送時」に確認する
//! - 投入後に破棄された所有者には配送しない
//! - 投入時に未作成でも、配送時に作成済みなら配送する
//!
//! # task の panic
//! - `execute` / `execute_on`: error ログ + `failed` カウント。continuation は実行しない
//! - `execute_catching`: `Err(TaskFailure)` として continuation に渡す
//!
//! どの dispatch も `delivered` / `skipped` / `failed` / `undeliverable` の
//! どれか 1 つにだけ数えられる。

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, error, trace, trace_span, warn};

use super::builder::DispatcherBuilder;
use super::config::DispatcherConfig;
use super::probe::LivenessProbe;
use crate::domain::{DispatchError, DispatchId, TaskFailure, TaskOutcome};
use crate::observability::{DispatchCounters, DispatchCounts};
use crate::ports::{BackgroundExecutor, DiagnosticSink, Job, Liveness, MainScheduler};

/// Dispatcher はステートレスな中継役
///
/// 内部に可変の共有状態を持たない（counters は atomic のみ）ので、
/// Clone して複数スレッドから同時に使えます。
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<dyn BackgroundExecutor>,
    main: Arc<dyn MainScheduler>,
    sink: Arc<dyn DiagnosticSink>,
    config: Arc<DispatcherConfig>,
    counters: Arc<DispatchCounters>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn from_parts(
        executor: Arc<dyn BackgroundExecutor>,
        main: Arc<dyn MainScheduler>,
        sink: Arc<dyn DiagnosticSink>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            executor,
            main,
            sink,
            config: Arc::new(config),
            counters: Arc::new(DispatchCounters::default()),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn counts(&self) -> DispatchCounts {
        self.counters.snapshot()
    }

    /// デフォルトの executor で `task` を実行し、結果を `continuation` に届ける
    pub fn execute<L, T, F, C>(
        &self,
        liveness: &Arc<L>,
        task: F,
        continuation: C,
    ) -> Result<(), DispatchError>
    where
        L: Liveness + ?Sized + 'static,
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.execute_on(liveness, task, continuation, self.executor.as_ref())
    }

    /// 指定した executor で `task` を実行し、結果を `continuation` に届ける
    pub fn execute_on<L, T, F, C>(
        &self,
        liveness: &Arc<L>,
        task: F,
        continuation: C,
        executor: &dyn BackgroundExecutor,
    ) -> Result<(), DispatchError>
    where
        L: Liveness + ?Sized + 'static,
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let delivery = self.delivery(liveness);
        let id = delivery.id;
        let counters = Arc::clone(&self.counters);

        let work = move || {
            let _span = trace_span!("dispatch", dispatch_id = %id).entered();
            match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(value) => delivery.post(value, continuation),
                Err(payload) => {
                    let failure = TaskFailure::from_panic(payload);
                    error!(error = %failure, "background task failed; continuation will not run");
                    counters.record_failed();
                }
            }
        };
        self.submit(id, work, executor)
    }

    /// task の panic を `Err(TaskFailure)` として continuation に届ける
    ///
    /// 所有者が非アクティブなら、成功・失敗どちらも届けない。
    /// 失敗は `failed` としてだけ数え、`delivered` / `skipped` には含めない。
    pub fn execute_catching<L, T, F, C>(
        &self,
        liveness: &Arc<L>,
        task: F,
        continuation: C,
    ) -> Result<(), DispatchError>
    where
        L: Liveness + ?Sized + 'static,
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(TaskOutcome<T>) + Send + 'static,
    {
        let delivery = self.delivery(liveness);
        let id = delivery.id;
        let counters = Arc::clone(&self.counters);

        let work = move || {
            let _span = trace_span!("dispatch", dispatch_id = %id).entered();
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(task)).map_err(TaskFailure::from_panic);
            let delivery = match &outcome {
                Ok(_) => delivery,
                Err(failure) => {
                    warn!(error = %failure, "background task failed; forwarding failure");
                    counters.record_failed();
                    delivery.already_counted()
                }
            };
            delivery.post(outcome, continuation);
        };
        self.submit(id, work, self.executor.as_ref())
    }

    /// task に LivenessProbe を渡し、所有者が非アクティブになったら
    /// task 自身が早めに切り上げられるようにする
    pub fn execute_cooperative<L, T, F, C>(
        &self,
        liveness: &Arc<L>,
        task: F,
        continuation: C,
    ) -> Result<(), DispatchError>
    where
        L: Liveness + ?Sized + 'static,
        T: Send + 'static,
        F: FnOnce(&LivenessProbe<L>) -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.execute_cooperative_on(liveness, task, continuation, self.executor.as_ref())
    }

    /// `execute_cooperative` の executor 指定版
    pub fn execute_cooperative_on<L, T, F, C>(
        &self,
        liveness: &Arc<L>,
        task: F,
        continuation: C,
        executor: &dyn BackgroundExecutor,
    ) -> Result<(), DispatchError>
    where
        L: Liveness + ?Sized + 'static,
        T: Send + 'static,
        F: FnOnce(&LivenessProbe<L>) -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let probe = LivenessProbe::new(Arc::downgrade(liveness), self.config.min_state);
        self.execute_on(liveness, move || task(&probe), continuation, executor)
    }

    fn delivery<L: Liveness + ?Sized>(&self, liveness: &Arc<L>) -> Delivery<L> {
        Delivery {
            id: DispatchId::generate(),
            liveness: Arc::downgrade(liveness),
            main: Arc::clone(&self.main),
            sink: Arc::clone(&self.sink),
            config: Arc::clone(&self.config),
            counters: Arc::clone(&self.counters),
            counted: false,
        }
    }

    fn submit<W>(
        &self,
        id: DispatchId,
        work: W,
        executor: &dyn BackgroundExecutor,
    ) -> Result<(), DispatchError>
    where
        W: FnOnce() + Send + 'static,
    {
        let handoff = Arc::new(AtomicU8::new(SUBMITTING));
        let guard = DropGuard {
            id,
            handoff: Arc::clone(&handoff),
            counters: Arc::clone(&self.counters),
            armed: true,
        };
        let job: Job = Box::new(move || {
            guard.disarm();
            work();
        });

        // job が先に終わっても submitted が後追いにならないよう、投入前に数える
        self.counters.record_submitted();
        let accepted = executor.submit(job).and_then(|()| {
            // Ok を返しつつ job をその場で捨てる executor は投入失敗として扱う
            handoff
                .compare_exchange(SUBMITTING, ACCEPTED, Ordering::AcqRel, Ordering::Acquire)
                .map(|_| ())
                .map_err(|_| DispatchError::ExecutorClosed)
        });
        if let Err(err) = accepted {
            self.counters.record_rejected();
            warn!(dispatch_id = %id, error = %err, "failed to submit background task");
            return Err(err);
        }
        trace!(dispatch_id = %id, "background task submitted");
        Ok(())
    }
}

const SUBMITTING: u8 = 0;
const ACCEPTED: u8 = 1;
const DROPPED: u8 = 2;

/// executor が job を実行しないまま drop したことを検出する
///
/// - `submit` の最中に drop された: `submit` がエラーを返す
/// - 受け付けられた後に drop された（runtime の停止など）: `undeliverable` として数える
struct DropGuard {
    id: DispatchId,
    handoff: Arc<AtomicU8>,
    counters: Arc<DispatchCounters>,
    armed: bool,
}

impl DropGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let dropped_during_submit = self
            .handoff
            .compare_exchange(SUBMITTING, DROPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !dropped_during_submit {
            self.counters.record_undeliverable();
            warn!(dispatch_id = %self.id, "background task dropped before it ran");
        }
    }
}

/// 1 回の dispatch の配送に必要なもの
///
/// 所有者は `Weak` でしか持たないので、配送待ちの間に所有者の寿命を延ばさない。
struct Delivery<L: ?Sized> {
    id: DispatchId,
    liveness: Weak<L>,
    main: Arc<dyn MainScheduler>,
    sink: Arc<dyn DiagnosticSink>,
    config: Arc<DispatcherConfig>,
    counters: Arc<DispatchCounters>,
    /// 結果がすでに `failed` として数えられている
    counted: bool,
}

impl<L: Liveness + ?Sized + 'static> Delivery<L> {
    fn already_counted(mut self) -> Self {
        self.counted = true;
        self
    }

    /// worker 側: 結果を main context に送る
    fn post<T, C>(self, value: T, continuation: C)
    where
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let id = self.id;
        let counted = self.counted;
        let main = Arc::clone(&self.main);
        let counters = Arc::clone(&self.counters);
        if let Err(err) = main.post(Box::new(move || self.deliver(value, continuation))) {
            if !counted {
                counters.record_undeliverable();
            }
            warn!(dispatch_id = %id, error = %err, "dropping result of background task");
        }
    }

    /// main context 側: 状態を 1 回だけ確認して continuation を実行する
    fn deliver<T, C>(self, value: T, continuation: C)
    where
        C: FnOnce(T),
    {
        let _span = trace_span!("deliver", dispatch_id = %self.id).entered();
        let alive = self
            .liveness
            .upgrade()
            .is_some_and(|liveness| liveness.is_at_least(self.config.min_state));

        if alive {
            if !self.counted {
                self.counters.record_delivered();
            }
            debug!("delivering result");
            continuation(value);
        } else {
            self.sink
                .record(&self.config.diagnostic_tag, &self.config.skip_message);
            if !self.counted {
                self.counters.record_skipped();
            }
        }
    }
}
