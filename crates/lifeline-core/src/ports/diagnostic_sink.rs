//! DiagnosticSink port - 診断イベントの記録
//!
//! # 実装
//! - **TracingSink**: `tracing::trace!` に流す（デフォルト）
//! - **MemorySink**: メモリに溜める（テスト・確認用）
//! - **NoopSink**: 何もしない

/// DiagnosticSink は (tag, message) を受け取る
///
/// fire-and-forget: 呼び出し元をブロックしたり失敗させたりしてはいけない。
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, tag: &str, message: &str);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for std::sync::Arc<S> {
    fn record(&self, tag: &str, message: &str) {
        (**self).record(tag, message)
    }
}
