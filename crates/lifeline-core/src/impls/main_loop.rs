//! MainLoop - 単一の main context
//!
//! # 学習ポイント
//! - unbounded mpsc で「どのスレッドからでも投入、1 スレッドで実行」
//! - 専用スレッドで回す（`MainLoop::spawn`）か、呼び出し側のスレッドで
//!   協調的に回す（`run_pending`）かを選べる
//! - 最初に駆動したスレッドに束縛し、別スレッドからの駆動はエラーにする

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::domain::{DispatchError, TaskFailure};
use crate::ports::{MainJob, MainScheduler};

/// MainHandle は main context への投入口
///
/// Clone して複数の送信元から共有できます。
#[derive(Clone)]
pub struct MainHandle {
    tx: mpsc::UnboundedSender<MainJob>,
    thread: Arc<OnceLock<ThreadId>>,
}

impl MainHandle {
    /// 呼び出し元が main context のスレッドか
    ///
    /// loop がまだ一度も駆動されていなければ false。
    pub fn is_main_thread(&self) -> bool {
        self.thread.get() == Some(&thread::current().id())
    }

    /// loop が終了している（receiver が drop された）か
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl MainScheduler for MainHandle {
    fn post(&self, job: MainJob) -> Result<(), DispatchError> {
        self.tx.send(job).map_err(|_| DispatchError::MainContextClosed)
    }
}

/// MainLoop は投入された MainJob を FIFO で 1 つずつ実行する
///
/// # 使用例
/// ```ignore
/// // 専用スレッド
/// let (main, join) = MainLoop::spawn("main")?;
///
/// // 協調的イベントループ
/// let (main, mut main_loop) = MainLoop::new();
/// loop {
///     main_loop.run_pending()?;
///     // ... 他の main context 作業 ...
/// }
/// ```
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<MainJob>,
    thread: Arc<OnceLock<ThreadId>>,
}

impl MainLoop {
    pub fn new() -> (MainHandle, MainLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        let thread = Arc::new(OnceLock::new());
        let handle = MainHandle {
            tx,
            thread: Arc::clone(&thread),
        };
        (handle, MainLoop { rx, thread })
    }

    /// 専用スレッドで loop を回す
    ///
    /// すべての MainHandle が drop されると loop は終了し、スレッドも終わる。
    pub fn spawn(name: &str) -> Result<(MainHandle, JoinHandle<()>), DispatchError> {
        let (handle, main_loop) = Self::new();
        let join = thread::Builder::new().name(name.to_string()).spawn(move || {
            // 新しいスレッドなので束縛は必ず成功する
            let _ = main_loop.run();
        })?;
        Ok((handle, join))
    }

    /// 呼び出し元のスレッドで loop を回す（すべての MainHandle が drop されるまでブロック）
    ///
    /// tokio runtime の中（`#[tokio::main]` のスレッドなど）ではブロックできないので
    /// `DispatchError::InsideRuntime` を返す。その場合は `spawn` か `run_pending` を使う。
    pub fn run(mut self) -> Result<(), DispatchError> {
        if Handle::try_current().is_ok() {
            return Err(DispatchError::InsideRuntime);
        }
        self.bind_current_thread()?;
        debug!("main loop started");
        while let Some(job) = self.rx.blocking_recv() {
            run_job(job);
        }
        debug!("main loop stopped");
        Ok(())
    }

    /// 現在キューにある MainJob をすべて実行して、実行した数を返す
    ///
    /// 実行中に投入された MainJob も同じ呼び出しの中で実行される。
    pub fn run_pending(&mut self) -> Result<usize, DispatchError> {
        self.bind_current_thread()?;
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            run_job(job);
            ran += 1;
        }
        Ok(ran)
    }

    fn bind_current_thread(&self) -> Result<(), DispatchError> {
        let current = thread::current().id();
        let bound = self.thread.get_or_init(|| current);
        if *bound == current {
            Ok(())
        } else {
            Err(DispatchError::WrongThread)
        }
    }
}

/// continuation の panic で loop が止まらないようにする
fn run_job(job: MainJob) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        let failure = TaskFailure::from_panic(payload);
        error!(error = %failure, "main context job panicked");
    }
}
