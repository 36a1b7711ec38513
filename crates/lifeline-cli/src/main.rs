use std::sync::Arc;

use lifeline_core::{Dispatcher, DispatcherConfig, Lifecycle, LifecycleEvent, MainLoop};
use tokio::time::{Duration, Instant, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 背景で少し時間のかかる計算
fn slow_answer(delay_ms: u64) -> u64 {
    std::thread::sleep(std::time::Duration::from_millis(delay_ms));
    42
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // (A) 設定（引数で JSON ファイルを指定できる）
    let config = match std::env::args().nth(1) {
        Some(path) => DispatcherConfig::from_json_file(path)?,
        None => DispatcherConfig::default(),
    };

    // (B) main context を専用スレッドで起動し、dispatcher を組み立てる
    let (main, main_thread) = MainLoop::spawn("main")?;
    let dispatcher = Dispatcher::builder()
        .main(main.clone())
        .config(config)
        .dedicated_pool()
        .build()?;

    // (C) 生きている所有者: 結果が届く
    let screen = Arc::new(Lifecycle::new());
    screen.handle_event(LifecycleEvent::Create)?;
    screen.handle_event(LifecycleEvent::Start)?;
    screen.handle_event(LifecycleEvent::Resume)?;

    let on_main = main.clone();
    dispatcher.execute(
        &screen,
        || slow_answer(50),
        move |answer| {
            info!(answer, on_main_thread = on_main.is_main_thread(), "delivered");
        },
    )?;

    // (D) 完了前に破棄される所有者: 結果は捨てられる
    let dialog = Arc::new(Lifecycle::new());
    dialog.handle_event(LifecycleEvent::Create)?;
    dispatcher.execute(
        &dialog,
        || slow_answer(100),
        |answer| info!(answer, "this should not be printed"),
    )?;
    sleep(Duration::from_millis(10)).await;
    dialog.destroy();

    // (E) 両方の結果が処理されるまでポーリングで待つ
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let counts = dispatcher.counts();
        if counts.delivered + counts.skipped + counts.failed + counts.undeliverable
            >= counts.submitted
        {
            println!("{}", serde_json::to_string_pretty(&counts)?);
            break;
        }
        if Instant::now() >= deadline {
            return Err("timed out waiting for deliveries".into());
        }
        sleep(Duration::from_millis(20)).await;
    }

    // (F) main context を止める（handle をすべて drop すると loop が終わる）
    drop(dispatcher);
    drop(main);
    main_thread
        .join()
        .map_err(|_| "main context thread panicked")?;
    Ok(())
}
