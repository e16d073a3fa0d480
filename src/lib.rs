#![cfg_attr(docsrs, feature(doc_cfg))]
//! # protoq
//!
//! A deterministic event-expectation engine for black-box protocol test
//! harnesses on Tokio.
//!
//! protoq merges events from heterogeneous asynchronous sources — an RPC
//! bus, a wire-protocol stream, synthesized markers — into one ordered
//! timeline, and lets a test script block on "the next event matching this
//! pattern", wait on an unordered set of patterns, assert that certain
//! events never occur, and correlate an async call with its eventual
//! outcome so call completions can be ordered against protocol traffic.
//!
//! It is not a pub/sub system and it does not speak any protocol itself:
//! source adapters translate their origin's notifications into [`Payload`]s
//! and push them through [`EventSink`]s; the single consumer is the test
//! script driving a [`Session`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use protoq::{Pattern, Payload, Session};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> protoq::Result {
//!     let mut session = Session::new();
//!
//!     // An adapter pushes from its own task; the test script expects.
//!     let bus = session.sink("rpc-bus");
//!     tokio::spawn(async move {
//!         bus.push(Payload::Signal {
//!             member: "StatusChanged".into(),
//!             args: vec![json!(0), json!(1)],
//!         })
//!     });
//!
//!     let event = session
//!         .expect(Pattern::signal("StatusChanged").with_field("args", json!([0, 1])))
//!         .await?;
//!     println!("connected: {event}");
//!     Ok(())
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | One test run's state; hands out sinks, runs expectations |
//! | [`Event`] | One immutable occurrence on the dispatcher queue |
//! | [`Payload`] | Kind-specific structured data, one variant per [`EventKind`] |
//! | [`Pattern`] | Predicate describing which event(s) an expectation waits for |
//! | [`EventSink`] | Clonable producer handle, one per source adapter |
//! | [`Dispatcher`] | The single ordered, unbounded event queue |
//! | [`Correlator`] | Surfaces async call outcomes as ordinary events |
//! | [`ForbiddenSet`] | Standing patterns no event may match while registered |
//!
//! ## Ordering Guarantees
//!
//! Events are delivered to the consumer strictly in arrival order; the
//! dispatcher assigns each event a monotonic [`Seq`] atomically with the
//! enqueue, so concurrent producers can never reorder the timeline. A
//! timed-out wait leaves unconsumed events on the queue. The only
//! reordering anywhere is [`Session::expect_many`]'s first-fit claiming
//! among events it has already pulled.
//!
//! ## Features
//!
//! - **`serde`** - `Serialize`/`Deserialize` on events, payloads and ids,
//!   for recording timelines to disk

mod call_id;
mod correlator;
mod dispatcher;
mod error;
mod event;
mod event_kind;
mod expectation;
mod forbidden;
mod pattern;
mod payload;
mod seq;
mod session;
mod session_config;
mod source_id;
mod stanza;

pub use call_id::CallId;
pub use correlator::{CallOutcome, CallTransport, Correlator, OutboundCall};
pub use dispatcher::{Dispatcher, EventSink};
pub use error::{Error, TimeoutReport};
pub use event::Event;
pub use event_kind::EventKind;
pub use expectation::{Expect, ExpectMany};
pub use forbidden::{ForbidHandle, ForbiddenSet};
pub use pattern::Pattern;
pub use payload::Payload;
pub use seq::Seq;
pub use session::Session;
pub use session_config::SessionConfig;
pub use source_id::SourceId;
pub use stanza::{Stanza, StanzaKind};

/// Convenience alias for `Result<T, protoq::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
