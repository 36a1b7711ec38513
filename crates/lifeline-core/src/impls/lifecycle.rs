//! Lifecycle - 所有者側の状態機械
//!
//! # 学習ポイント
//! - `tokio::sync::watch` で「最新値の共有 + 変更通知」
//! - `send_if_modified` で検証と更新を 1 回のロックで行う

use tokio::sync::watch;
use tracing::debug;

use crate::domain::{LifecycleError, LifecycleEvent, LifecycleState};
use crate::ports::Liveness;

/// Lifecycle は所有コンポーネントの状態を保持する
///
/// # 遷移ルール
/// - 同じ状態への遷移は no-op
/// - `Destroyed` は終端（以後の遷移は `LifecycleError::Destroyed`）
/// - `Initialized` へ戻ることはできない
///
/// # 使用例
/// ```ignore
/// let owner = Arc::new(Lifecycle::new());
/// owner.handle_event(LifecycleEvent::Create)?;
/// dispatcher.execute(&owner, || 42, |v| println!("{v}"))?;
/// owner.destroy();
/// ```
#[derive(Debug)]
pub struct Lifecycle {
    state: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    /// `Initialized` から始まる Lifecycle を作成
    pub fn new() -> Self {
        Self::starting_at(LifecycleState::Initialized)
    }

    pub fn starting_at(state: LifecycleState) -> Self {
        Self {
            state: watch::Sender::new(state),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// 状態を `next` に進める
    pub fn move_to(&self, next: LifecycleState) -> Result<(), LifecycleError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if current.is_terminal() {
                outcome = Err(LifecycleError::Destroyed);
                return false;
            }
            if next == LifecycleState::Initialized {
                outcome = Err(LifecycleError::InvalidTransition {
                    from: *current,
                    to: next,
                });
                return false;
            }
            debug!(from = %current, to = %next, "lifecycle transition");
            *current = next;
            true
        });
        outcome
    }

    pub fn handle_event(&self, event: LifecycleEvent) -> Result<(), LifecycleError> {
        self.move_to(event.target_state())
    }

    /// `Destroyed` に遷移する（すでに破棄済みなら何もしない）
    pub fn destroy(&self) {
        // Destroyed への遷移は常に成功する
        let _ = self.move_to(LifecycleState::Destroyed);
    }

    /// 状態変更を購読する
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness for Lifecycle {
    fn current_state(&self) -> LifecycleState {
        self.state()
    }
}
