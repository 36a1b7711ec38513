//! Errors - エラー型と分類
//!
//! # 分類
//! - **TaskFailure**: background 計算が正常終了しなかった（panic）
//! - **StaleDelivery**: lifecycle が進んでいたので continuation をスキップした。
//!   これはエラーではないので型を持たず、counts の `skipped` と
//!   DiagnosticSink への記録でのみ観測できる。

use std::any::Any;

use thiserror::Error;

use super::lifecycle::LifecycleState;

/// DispatchError は dispatch の投入・配送基盤のエラー
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("background executor is closed")]
    ExecutorClosed,

    #[error("main context is closed")]
    MainContextClosed,

    #[error("main loop is bound to another thread")]
    WrongThread,

    #[error("no tokio runtime is available on this thread")]
    NoRuntime,

    #[error("main loop cannot block inside a tokio runtime")]
    InsideRuntime,

    #[error("failed to start execution context: {0}")]
    Spawn(#[from] std::io::Error),
}

/// LifecycleError は状態遷移のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("lifecycle is destroyed")]
    Destroyed,

    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

/// TaskFailure は background 計算の panic を表す
///
/// `execute_catching` では continuation に `Err(TaskFailure)` として渡されます。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("background task panicked: {message}")]
pub struct TaskFailure {
    message: String,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// `catch_unwind` の payload から作成
    ///
    /// `&str` / `String` 以外の payload はメッセージを取り出せない。
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// TaskOutcome は `execute_catching` の continuation が受け取る値
pub type TaskOutcome<T> = Result<T, TaskFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn task_failure_from_str_payload() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        let failure = TaskFailure::from_panic(payload);
        assert_eq!(failure.message(), "boom");
    }

    #[test]
    fn task_failure_from_string_payload() {
        let code = 7;
        let payload = panic::catch_unwind(|| panic!("failed with {code}")).unwrap_err();
        let failure = TaskFailure::from_panic(payload);
        assert_eq!(failure.message(), "failed with 7");
        assert!(failure.to_string().contains("failed with 7"));
    }

    #[test]
    fn task_failure_from_opaque_payload() {
        let payload = panic::catch_unwind(|| panic::panic_any(42_u32)).unwrap_err();
        let failure = TaskFailure::from_panic(payload);
        assert_eq!(failure.message(), "non-string panic payload");
    }

    #[test]
    fn lifecycle_error_message_names_states() {
        let err = LifecycleError::InvalidTransition {
            from: LifecycleState::Created,
            to: LifecycleState::Initialized,
        };
        assert_eq!(
            err.to_string(),
            "invalid lifecycle transition: created -> initialized"
        );
    }
}
