//! Lifecycle - 所有コンポーネントの状態
//!
//! # 状態の順序
//! `Destroyed < Initialized < Created < Started < Resumed`
//!
//! 継承ではなく、閉じた enum と 1 回の順序比較で「配送してよいか」を判定します。
//! `Ord` を derive しているので、宣言順がそのまま順序になります（並べ替え禁止）。

use serde::{Deserialize, Serialize};
use std::fmt;

/// LifecycleState は所有コンポーネントの現在の状態
///
/// # 状態遷移
/// - Initialized -> Created -> Started -> Resumed
/// - Resumed -> Started -> Created（pause / stop）
/// - any -> Destroyed（終端）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// 破棄済み。以後の配送はすべてスキップされる。
    Destroyed,

    /// 構築済みだが、まだ create されていない。
    #[default]
    Initialized,

    Created,

    Started,

    Resumed,
}

impl LifecycleState {
    /// `self` が `other` 以上か
    pub fn is_at_least(self, other: LifecycleState) -> bool {
        self >= other
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Destroyed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Destroyed => "destroyed",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Created => "created",
            LifecycleState::Started => "started",
            LifecycleState::Resumed => "resumed",
        };
        f.write_str(name)
    }
}

/// LifecycleEvent は所有者側から送られるイベント
///
/// 各イベントは遷移先の状態に対応します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

impl LifecycleEvent {
    /// イベント適用後の状態
    pub fn target_state(self) -> LifecycleState {
        match self {
            LifecycleEvent::Create | LifecycleEvent::Stop => LifecycleState::Created,
            LifecycleEvent::Start | LifecycleEvent::Pause => LifecycleState::Started,
            LifecycleEvent::Resume => LifecycleState::Resumed,
            LifecycleEvent::Destroy => LifecycleState::Destroyed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn states_are_ordered_by_declaration() {
        assert!(LifecycleState::Destroyed < LifecycleState::Initialized);
        assert!(LifecycleState::Initialized < LifecycleState::Created);
        assert!(LifecycleState::Created < LifecycleState::Started);
        assert!(LifecycleState::Started < LifecycleState::Resumed);
    }

    #[rstest]
    #[case::destroyed(LifecycleState::Destroyed, false)]
    #[case::initialized(LifecycleState::Initialized, false)]
    #[case::created(LifecycleState::Created, true)]
    #[case::started(LifecycleState::Started, true)]
    #[case::resumed(LifecycleState::Resumed, true)]
    fn is_at_least_created(#[case] state: LifecycleState, #[case] expected: bool) {
        assert_eq!(state.is_at_least(LifecycleState::Created), expected);
    }

    #[rstest]
    #[case::create(LifecycleEvent::Create, LifecycleState::Created)]
    #[case::start(LifecycleEvent::Start, LifecycleState::Started)]
    #[case::resume(LifecycleEvent::Resume, LifecycleState::Resumed)]
    #[case::pause(LifecycleEvent::Pause, LifecycleState::Started)]
    #[case::stop(LifecycleEvent::Stop, LifecycleState::Created)]
    #[case::destroy(LifecycleEvent::Destroy, LifecycleState::Destroyed)]
    fn event_maps_to_target_state(#[case] event: LifecycleEvent, #[case] expected: LifecycleState) {
        assert_eq!(event.target_state(), expected);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&LifecycleState::Resumed).unwrap();
        assert_eq!(json, "\"resumed\"");
        let state: LifecycleState = serde_json::from_str("\"created\"").unwrap();
        assert_eq!(state, LifecycleState::Created);
    }
}
