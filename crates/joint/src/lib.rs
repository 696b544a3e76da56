//! Elastic channel relay for tokio.
//!
//! A [`Relay`] joins a source `mpsc::Receiver<T>` to a sink `mpsc::Sender<T>`
//! and moves every value across through an internal queue whose capacity can
//! be changed while it runs.
//!
//! # Features
//!
//! - **Backpressure**: once [`Relay::cap`] values are in flight the relay
//!   stops receiving, so producers block on the source channel
//! - **Elastic capacity**: [`Relay::set_capacity`] takes effect immediately,
//!   even while the relay is held back by the old limit
//! - **Filtering**: [`Relay::set_filter`] drops values that fail a predicate
//! - **Two shutdown modes**: dropping the source senders drains everything
//!   already accepted; [`Relay::stop`] ends the relay at once and drops it
//! - **Instrumentation**: [`debug::set_enabled`] logs every enqueue and
//!   dequeue through `tracing`
//!
//! Values always reach the sink in the order they left the source.
//!
//! # Example
//!
//! ```ignore
//! use joint::Relay;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, source) = mpsc::channel::<u64>(8);
//!     let (sink, mut rx) = mpsc::channel::<u64>(8);
//!
//!     let relay = Relay::new(source, sink)?;
//!     relay.set_capacity(1024)?;
//!     relay.set_filter(|v| v % 2 == 0);
//!
//!     for i in 0..10 {
//!         tx.send(i).await?;
//!     }
//!     drop(tx);
//!
//!     while let Some(v) = rx.recv().await {
//!         println!("Received: {}", v);
//!     }
//!     relay.wait().await;
//!     Ok(())
//! }
//! ```

mod config;
pub mod debug;
mod error;
mod invariants;
mod queue;
mod relay;
mod signal;
mod transport;

pub use config::{RelayConfig, MIN_IDLE_INTERVAL};
pub use error::RelayError;
pub use relay::{Relay, RelayState, MAX_CAPACITY};
pub use signal::DoneSignal;
