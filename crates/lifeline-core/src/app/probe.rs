//! LivenessProbe - background 計算から所有者の生存を問い合わせる
//!
//! 実行そのものを止める仕組みはありません。task が自分で `is_alive()` を
//! ポーリングして早めに切り上げる、協調的なキャンセルのためのものです。

use std::sync::Weak;

use crate::domain::LifecycleState;
use crate::ports::Liveness;

/// LivenessProbe は所有者への弱参照と最小状態を持つ
pub struct LivenessProbe<L: ?Sized> {
    liveness: Weak<L>,
    min_state: LifecycleState,
}

impl<L: Liveness + ?Sized> LivenessProbe<L> {
    pub(crate) fn new(liveness: Weak<L>, min_state: LifecycleState) -> Self {
        Self {
            liveness,
            min_state,
        }
    }

    /// 所有者が生きていて、状態が最小状態以上か
    ///
    /// 所有者が drop されていれば false。
    pub fn is_alive(&self) -> bool {
        self.liveness
            .upgrade()
            .is_some_and(|liveness| liveness.is_at_least(self.min_state))
    }

    pub fn min_state(&self) -> LifecycleState {
        self.min_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::Lifecycle;
    use std::sync::Arc;

    #[test]
    fn probe_tracks_owner_state() {
        let owner = Arc::new(Lifecycle::starting_at(LifecycleState::Created));
        let probe = LivenessProbe::new(Arc::downgrade(&owner), LifecycleState::Created);
        assert!(probe.is_alive());

        owner.destroy();
        assert!(!probe.is_alive());
    }

    #[test]
    fn probe_reports_dropped_owner_as_dead() {
        let owner = Arc::new(Lifecycle::starting_at(LifecycleState::Resumed));
        let probe = LivenessProbe::new(Arc::downgrade(&owner), LifecycleState::Created);
        drop(owner);
        assert!(!probe.is_alive());
    }
}
