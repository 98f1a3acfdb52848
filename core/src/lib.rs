//! Client core for the SaaSquatch referral platform.
//!
//! # Overview
//! `SquatchClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern), so hosts such
//! as the C ABI in `squatch-ffi` can run the round-trip themselves.
//! `Dispatcher` pairs the client with a `Transport` for callers that want an
//! async API, and `WidgetView` renders widgets into a display surface.
//!
//! # Design
//! - `SquatchClient` is stateless; it holds only `ClientOptions`.
//! - Inputs are built through validating builders. Setters reject bad values
//!   immediately and `build()` rejects missing required fields.
//! - User JWTs are only peeked at for their payload; signatures are never
//!   verified client-side.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod inputs;
pub mod jwt;
pub mod options;
pub mod render;
pub mod transport;
pub mod types;

pub use client::{AnalyticsEventKind, SquatchClient};
pub use dispatch::Dispatcher;
pub use error::{JwtError, SquatchError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use inputs::{GraphQLInput, PushWidgetAnalyticsEventInput, RenderWidgetInput, WidgetUpsertInput};
pub use jwt::jwt_payload;
pub use options::ClientOptions;
pub use render::{ChannelSurface, DisplaySurface, SurfaceContent, WidgetView};
pub use transport::{Transport, UreqTransport};
pub use types::{UserIdInput, WidgetType};
