//! Tests for the debug instrumentation toggle.
//!
//! The toggle is process-wide, so these tests live in their own binary and
//! run as a single test. Events are captured with a recording layer installed
//! as the thread's default subscriber; the relay runs on a current-thread
//! runtime so the worker emits on the same thread.

use joint::{debug, Relay};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    message: String,
    value: Option<String>,
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    value: Option<String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "value" => self.value = Some(format!("{value:?}")),
            _ => {}
        }
    }
}

/// Records every event emitted under the crate's target.
struct Recorder(Arc<Mutex<Vec<Recorded>>>);

impl<S: Subscriber> Layer<S> for Recorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != "joint" {
            return;
        }
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.0.lock().unwrap().push(Recorded {
            message: visitor.message,
            value: visitor.value,
        });
    }
}

fn relay_values(values: &[u32]) -> Vec<u32> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    runtime.block_on(async {
        let (tx, source) = mpsc::channel::<u32>(2);
        let (sink, mut rx) = mpsc::channel::<u32>(2);
        let relay = Relay::new(source, sink).expect("relay");

        for &v in values {
            tx.send(v).await.expect("send failed");
        }
        drop(tx);

        let mut received = Vec::new();
        while let Some(v) = rx.recv().await {
            received.push(v);
        }
        relay.wait().await;
        received
    })
}

fn values_of(events: &[Recorded], message: &str) -> Vec<Option<String>> {
    events
        .iter()
        .filter(|e| e.message == message)
        .map(|e| e.value.clone())
        .collect()
}

#[test]
fn test_enqueue_and_dequeue_logged_only_when_enabled() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(Recorder(Arc::clone(&events)));

    tracing::subscriber::with_default(subscriber, || {
        debug::set_enabled(true);
        assert_eq!(relay_values(&[10, 20, 30]), vec![10, 20, 30]);

        let enabled = events.lock().unwrap().clone();
        let expected = vec![
            Some("10".to_owned()),
            Some("20".to_owned()),
            Some("30".to_owned()),
        ];
        assert_eq!(values_of(&enabled, "enqueue"), expected);
        assert_eq!(values_of(&enabled, "dequeue"), expected);

        events.lock().unwrap().clear();
        debug::set_enabled(false);
        assert_eq!(relay_values(&[40, 50]), vec![40, 50]);

        let disabled = events.lock().unwrap().clone();
        assert!(values_of(&disabled, "enqueue").is_empty());
        assert!(values_of(&disabled, "dequeue").is_empty());
    });
}
