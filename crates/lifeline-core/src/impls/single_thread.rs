//! SingleThreadExecutor - 専用スレッド 1 本の executor
//!
//! 投入順（FIFO）に 1 つずつ実行します。背景処理を直列化したい場合に使います。

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::domain::{DispatchError, TaskFailure};
use crate::ports::{BackgroundExecutor, Job};

/// SingleThreadExecutor は専用スレッドで Job を順に実行する
///
/// - `shutdown()` で投入済みの Job をすべて実行してからスレッドを join する
/// - drop した場合はチャネルだけ閉じ、スレッドは残りを実行して終了する（join しない）
pub struct SingleThreadExecutor {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    join: Option<JoinHandle<()>>,
}

impl SingleThreadExecutor {
    pub fn spawn(name: &str) -> Result<Self, DispatchError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let thread_name = name.to_string();
        let join = thread::Builder::new().name(thread_name.clone()).spawn(move || {
            debug!(thread = %thread_name, "executor thread started");
            while let Some(job) = rx.blocking_recv() {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    let failure = TaskFailure::from_panic(payload);
                    error!(thread = %thread_name, error = %failure, "job panicked");
                }
            }
            debug!(thread = %thread_name, "executor thread stopped");
        })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            join: Some(join),
        })
    }

    /// 新規投入を止め、投入済みの Job を実行し終えるまで待つ
    pub fn shutdown(mut self) {
        self.close();
        if let Some(join) = self.join.take() {
            // job の panic はスレッド内で捕捉しているので join は失敗しない
            let _ = join.join();
        }
    }

    /// 新規投入を止める（投入済みの Job は実行される）
    pub fn close(&self) {
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }
    }
}

impl BackgroundExecutor for SingleThreadExecutor {
    fn submit(&self, job: Job) -> Result<(), DispatchError> {
        let guard = self.tx.lock().map_err(|_| DispatchError::ExecutorClosed)?;
        let tx = guard.as_ref().ok_or(DispatchError::ExecutorClosed)?;
        tx.send(job).map_err(|_| DispatchError::ExecutorClosed)
    }
}

impl Drop for SingleThreadExecutor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, mpsc as std_mpsc};
    use std::time::Duration;

    #[test]
    fn runs_jobs_in_submission_order_on_one_thread() {
        let executor = SingleThreadExecutor::spawn("single-test").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let seen = Arc::clone(&seen);
            executor
                .submit(Box::new(move || {
                    let name = thread::current().name().map(str::to_string);
                    seen.lock().unwrap().push((i, name));
                }))
                .unwrap();
        }
        executor.shutdown();

        let seen = seen.lock().unwrap();
        let order: Vec<i32> = seen.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert!(
            seen.iter()
                .all(|(_, name)| name.as_deref() == Some("single-test"))
        );
    }

    fn panicking_job() {
        panic!("job failed")
    }

    #[test]
    fn survives_panicking_job() {
        let executor = SingleThreadExecutor::spawn("single-panic").unwrap();
        let (tx, rx) = std_mpsc::channel();

        executor.submit(Box::new(panicking_job)).unwrap();
        executor
            .submit(Box::new(move || {
                let _ = tx.send("after");
            }))
            .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "after");
        executor.shutdown();
    }

    #[test]
    fn submit_after_close_errors() {
        let executor = SingleThreadExecutor::spawn("single-closed").unwrap();
        executor.close();
        let err = executor.submit(Box::new(|| {})).unwrap_err();
        assert!(matches!(err, DispatchError::ExecutorClosed));
        executor.shutdown();
    }
}
