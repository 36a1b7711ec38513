//! MainScheduler port - main context への投入
//!
//! main context は単一スレッド（専用スレッドまたは協調的イベントループ）で、
//! continuation はすべてここで実行されます。

use crate::domain::DispatchError;

/// MainJob は main context で実行する 0 引数の計算
pub type MainJob = Box<dyn FnOnce() + Send + 'static>;

/// MainScheduler は MainJob を main context に投入する
///
/// # 契約
/// - 同じ送信元からの投入は投入順に実行される
/// - 投入された MainJob は 1 つの単位として実行される（他の main context 作業と交錯しない）
pub trait MainScheduler: Send + Sync {
    fn post(&self, job: MainJob) -> Result<(), DispatchError>;
}

impl<M: MainScheduler + ?Sized> MainScheduler for std::sync::Arc<M> {
    fn post(&self, job: MainJob) -> Result<(), DispatchError> {
        (**self).post(job)
    }
}
