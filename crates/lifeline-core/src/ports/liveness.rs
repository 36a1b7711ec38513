//! Liveness port - 所有コンポーネントの生存確認
//!
//! Dispatcher はこの trait を通じて状態を「読む」だけで、変更はしません。
//! 状態を進めるのは所有者側（`impls::Lifecycle` など）の責務です。

use crate::domain::LifecycleState;

/// Liveness は観測可能な lifecycle 状態を提供
///
/// # Thread Safety
/// - 配送判定は main context で行うので `Send + Sync` を要求
pub trait Liveness: Send + Sync {
    /// 現在の状態
    fn current_state(&self) -> LifecycleState;

    /// 現在の状態が `state` 以上か
    fn is_at_least(&self, state: LifecycleState) -> bool {
        self.current_state().is_at_least(state)
    }
}

/// 固定状態の Liveness（常に同じ状態を返す）
impl Liveness for LifecycleState {
    fn current_state(&self) -> LifecycleState {
        *self
    }
}
