//! Demonstration of joint features.
//!
//! Run with: `cargo run -p joint --features demo --bin demo`
//!
//! Set `JOINT_DEBUG=1` to see every enqueue and dequeue, and `RUST_LOG` to
//! override the log filter (default `joint=debug`).

use joint::{debug, Relay, RelayConfig, RelayState};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "joint=debug".into()),
    );
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let instrumented = debug::init_from_env();
    println!(
        "=== joint Demo (instrumentation {}) ===\n",
        if instrumented { "on" } else { "off" }
    );

    demo_basic_relay().await?;
    demo_filter().await?;
    demo_backpressure().await?;
    demo_graceful_drain().await?;
    demo_stop().await?;

    println!("\n=== All demos completed successfully! ===");
    Ok(())
}

/// Demo 1: Values flow from source to sink in order
async fn demo_basic_relay() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 1: Basic Relay ---");

    let (tx, source) = mpsc::channel::<u64>(4);
    let (sink, mut rx) = mpsc::channel::<u64>(4);
    let relay = Relay::new(source, sink)?;
    println!("  Capacity: {} (minimum {})", relay.cap(), relay.min_capacity());

    for i in 0..5 {
        tx.send(i).await?;
        println!("  Sent: {}", i);
    }
    drop(tx);

    while let Some(item) = rx.recv().await {
        println!("  Received: {}", item);
    }
    relay.wait().await;
    println!("  State: {:?}\n", relay.state());
    Ok(())
}

/// Demo 2: Filtering drops values that fail the predicate
async fn demo_filter() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 2: Filter ---");

    let (tx, source) = mpsc::channel::<u64>(16);
    let (sink, mut rx) = mpsc::channel::<u64>(16);
    let relay = Relay::new(source, sink)?;
    relay.set_filter(|v| v % 3 == 0);

    for i in 0..10 {
        tx.send(i).await?;
    }
    drop(tx);

    let mut kept = Vec::new();
    while let Some(item) = rx.recv().await {
        kept.push(item);
    }
    println!("  Kept multiples of 3: {:?}\n", kept);
    Ok(())
}

/// Demo 3: A full relay blocks the producer until capacity is raised
async fn demo_backpressure() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 3: Backpressure and Elastic Capacity ---");

    let (tx, source) = mpsc::channel::<u64>(1);
    let (sink, mut rx) = mpsc::channel::<u64>(1);
    let relay = Relay::with_config(source, sink, RelayConfig::bounded(0))?;
    println!("  Starting capacity: {}", relay.cap());

    let producer = tokio::spawn(async move {
        for i in 0..8 {
            if tx.send(i).await.is_err() {
                break;
            }
        }
    });

    sleep(Duration::from_millis(50)).await;
    println!(
        "  Held while the sink is unread: {} (producer finished: {})",
        relay.len(),
        producer.is_finished()
    );

    relay.set_capacity(16)?;
    sleep(Duration::from_millis(50)).await;
    println!(
        "  Held after raising capacity to 16: {} (producer finished: {})",
        relay.len(),
        producer.is_finished()
    );

    producer.await?;
    let mut received = Vec::new();
    while let Some(item) = rx.recv().await {
        received.push(item);
    }
    println!("  Received: {:?}\n", received);
    Ok(())
}

/// Demo 4: Closing the source drains everything already accepted
async fn demo_graceful_drain() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 4: Graceful Drain ---");

    let (tx, source) = mpsc::channel::<u64>(8);
    let (sink, mut rx) = mpsc::channel::<u64>(1);
    let relay = Relay::new(source, sink)?;
    let done = relay.done();

    for i in 0..6 {
        tx.send(i).await?;
    }
    drop(tx);
    sleep(Duration::from_millis(10)).await;
    println!(
        "  After closing source: state {:?}, {} held",
        relay.state(),
        relay.len()
    );

    let mut count = 0;
    while let Some(_item) = rx.recv().await {
        count += 1;
    }
    done.wait().await;
    println!("  Delivered {} values; done: {}\n", count, done.is_done());
    Ok(())
}

/// Demo 5: Stop is immediate and drops what is still held
async fn demo_stop() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 5: Stop ---");

    let (tx, source) = mpsc::channel::<u64>(8);
    let (sink, mut rx) = mpsc::channel::<u64>(1);
    let relay = Relay::new(source, sink)?;

    for i in 0..6 {
        tx.send(i).await?;
    }
    sleep(Duration::from_millis(10)).await;
    println!("  Held before stop: {}", relay.len());

    let first = relay.stop();
    let second = relay.stop();
    println!("  stop() triggered: {}, again: {}", first, second);
    relay.wait().await;
    assert_eq!(relay.state(), RelayState::Stopped);

    let mut count = 0;
    while let Ok(Some(_item)) = timeout(Duration::from_millis(100), rx.recv()).await {
        count += 1;
    }
    println!("  Delivered {} of 6 before stop", count);
    Ok(())
}
