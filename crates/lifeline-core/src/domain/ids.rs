//! Dispatch identifiers.
//!
//! # ULID ベースの ID
//! 1 回の `execute()` 呼び出しごとに DispatchId を発行します。
//! worker 側と main 側のログを同じ id で突き合わせるために使います。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// DispatchId は 1 回の dispatch を識別する
///
/// Display は `dispatch-{ulid}` 形式。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DispatchId(Ulid);

impl DispatchId {
    /// 現在時刻ベースで新しい id を生成
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for DispatchId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dispatch-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let id1 = DispatchId::generate();
        let id2 = DispatchId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn display_has_prefix() {
        let ulid = Ulid::new();
        let id = DispatchId::from(ulid);
        assert_eq!(id.to_string(), format!("dispatch-{ulid}"));
        assert_eq!(id.as_ulid(), ulid);
    }
}
