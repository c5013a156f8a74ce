#![forbid(unsafe_code)]

//! Log assertions for the runtime.
//!
//! A capture layer records events emitted while driving a tracker or
//! container under `tracing::subscriber::with_default`.
//!
//! Run:
//!   cargo test -p mgrid-runtime --test tracing_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mgrid_runtime::viewport::WIDTH_ADJUST_MAX;
use mgrid_runtime::{GridConfig, GridContainer, GridItem, ViewportTracker};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::Instant;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: HashMap::new(),
        };
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

#[derive(Debug)]
struct Card(u32);

impl GridItem for Card {
    type Id = u32;

    fn id(&self) -> u32 {
        self.0
    }
}

#[test]
fn oscillation_cap_logs_at_info() {
    let events = capture(|| {
        let mut tracker = ViewportTracker::new(0);
        for i in 0..14 {
            tracker.update(if i % 2 == 0 { 400 } else { 600 });
        }
        assert_eq!(tracker.width_adjust(), WIDTH_ADJUST_MAX);
    });

    let info: Vec<_> = events
        .iter()
        .filter(|e| e.level == tracing::Level::INFO)
        .collect();
    assert!(!info.is_empty(), "expected an info event at the cap");
    assert!(info.iter().all(|e| e.message.contains("maximum width adjustment")));
    assert_eq!(info[0].fields.get("width_adjust").map(String::as_str), Some("200"));
    assert!(
        events
            .iter()
            .all(|e| e.level != tracing::Level::WARN && e.level != tracing::Level::ERROR)
    );
}

#[test]
fn below_cap_stays_at_debug() {
    let events = capture(|| {
        let mut tracker = ViewportTracker::new(0);
        for w in [400, 600, 400, 600, 400] {
            tracker.update(w);
        }
    });
    assert!(events.iter().all(|e| e.level != tracing::Level::INFO));
    assert!(
        events
            .iter()
            .any(|e| e.level == tracing::Level::DEBUG && e.message.contains("oscillation damped"))
    );
}

#[test]
fn container_lifecycle_is_logged() {
    let events = capture(|| {
        let t0 = Instant::now();
        let mut grid = GridContainer::new(GridConfig::default(), 1280);
        grid.set_items((0..5).map(Card).collect(), t0);
        grid.mount_at(1280, t0);
        grid.tick_at(t0 + std::time::Duration::from_millis(10));
        grid.teardown();
    });

    let messages: Vec<_> = events.iter().map(|e| e.message.as_str()).collect();
    for expected in ["packing engine mounted", "grid mounted", "repack fired", "grid torn down"] {
        assert!(
            messages.iter().any(|m| m.contains(expected)),
            "missing {expected:?} in {messages:?}"
        );
    }
}
