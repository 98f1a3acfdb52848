//! Rendering adapter between the dispatcher and an embedded web view.
//!
//! # Design
//! `WidgetView` never fails silently and never throws away an error: every
//! failure shows `ERROR_PAGE_HTML` on the surface and is still returned to
//! the caller. A successful render also fires the widget `loaded` beacon on
//! the tokio runtime; its outcome is only logged.
//!
//! Display surfaces must apply content on their own UI thread.
//! `ChannelSurface` does this by handing content to whichever thread drains
//! its receiver.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::error::SquatchError;
use crate::inputs::{PushWidgetAnalyticsEventInput, RenderWidgetInput, WidgetUpsertInput};
use crate::transport::Transport;
use crate::types::{UserIdInput, WidgetType, DEFAULT_ENGAGEMENT_MEDIUM};

/// Base URL widget HTML is loaded against.
pub const WIDGET_BASE_URL: &str = "https://fast.ssqt.io";

const VIEWPORT_META: &str = r#"<meta name="viewport" content="initial-scale=1.0" />"#;

/// Shown instead of the widget when an operation fails.
pub const ERROR_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta name="viewport" content="initial-scale=1.0" />
    <link
      rel="stylesheet"
      media="all"
      href="https://fast.ssqt.io/assets/css/widget/errorpage.css"
    />
  </head>
  <body>
    <div class="squatch-container embed" style="width: 100%">
      <div class="errorbody">
        <div class="sadface">
          <img src="https://fast.ssqt.io/assets/images/face.png" />
        </div>
        <h4>Our referral program is temporarily unavailable.</h4>
        <br />
        <p>Please reload the page or check back later.</p>
        <p>If the persists please contact our support team.</p>
      </div>
    </div>
  </body>
</html>
"#;

/// A document for the surface to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceContent {
    pub html: String,
    pub base_url: &'static str,
}

/// Something that can display HTML, such as an embedded web view.
///
/// `show` may be called from any thread; implementations are responsible for
/// applying the content on their UI thread.
pub trait DisplaySurface: Send + Sync {
    fn show(&self, content: SurfaceContent);
}

/// A `DisplaySurface` that forwards content over a channel to the UI thread.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: mpsc::UnboundedSender<SurfaceContent>,
}

impl ChannelSurface {
    /// The receiver belongs to the UI thread, which applies each
    /// `SurfaceContent` in order (`blocking_recv` outside the runtime).
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceContent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DisplaySurface for ChannelSurface {
    fn show(&self, content: SurfaceContent) {
        if self.tx.send(content).is_err() {
            debug!("display surface closed, dropping content");
        }
    }
}

/// Adds the responsive viewport meta tag at the end of `<head>`.
pub fn with_viewport_meta(html: &str) -> String {
    html.replace("</head>", &format!("{VIEWPORT_META}</head>"))
}

/// Renders widgets into a `DisplaySurface`.
pub struct WidgetView<T, S> {
    dispatcher: Dispatcher<T>,
    surface: S,
}

impl<T: Transport, S: DisplaySurface> WidgetView<T, S> {
    pub fn new(dispatcher: Dispatcher<T>, surface: S) -> Self {
        Self { dispatcher, surface }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Render a widget and show it. Must be called within a tokio runtime.
    pub async fn render_widget(&self, input: RenderWidgetInput) -> Result<(), SquatchError> {
        let result = match self.dispatcher.render_widget(&input) {
            Ok(pending) => pending.await,
            Err(e) => Err(e),
        };
        let template = self.show_or_fallback(result)?;
        self.show_widget(&template);

        match (input.user(), input.user_jwt()) {
            (Some(user), Some(user_jwt)) => {
                self.record_widget_loaded(user, user_jwt, input.widget_type());
            }
            _ => debug!("anonymous render, skipping widget loaded event"),
        }
        Ok(())
    }

    /// Upsert the user, show the returned widget, and hand back the full
    /// response. Must be called within a tokio runtime.
    pub async fn widget_upsert(&self, input: WidgetUpsertInput) -> Result<Value, SquatchError> {
        let result = match self.dispatcher.widget_upsert(&input) {
            Ok(pending) => pending.await,
            Err(e) => Err(e),
        };
        let result = result.and_then(|json| match json.get("template").and_then(Value::as_str) {
            Some(template) => Ok((template.to_string(), json)),
            None => Err(SquatchError::bad_response("missing `template`")),
        });
        let (template, json) = self.show_or_fallback(result)?;
        self.show_widget(&template);

        let user = input.user();
        self.record_widget_loaded(&user, input.user_jwt(), input.widget_type());
        Ok(json)
    }

    fn show_or_fallback<R>(&self, result: Result<R, SquatchError>) -> Result<R, SquatchError> {
        result.inspect_err(|err| {
            warn!(error = %err, "widget operation failed, showing error page");
            self.surface.show(SurfaceContent {
                html: ERROR_PAGE_HTML.to_string(),
                base_url: WIDGET_BASE_URL,
            });
        })
    }

    fn show_widget(&self, template: &str) {
        self.surface.show(SurfaceContent {
            html: with_viewport_meta(template),
            base_url: WIDGET_BASE_URL,
        });
    }

    fn record_widget_loaded(
        &self,
        user: &UserIdInput,
        user_jwt: &str,
        widget_type: Option<&WidgetType>,
    ) {
        let pending = build_loaded_event(user, user_jwt, widget_type)
            .and_then(|input| self.dispatcher.push_widget_loaded_analytics_event(&input));
        match pending {
            Ok(pending) => {
                tokio::spawn(async move {
                    if let Err(err) = pending.await {
                        warn!(error = %err, "failed to push widget loaded analytics event");
                    }
                });
            }
            Err(err) => warn!(error = %err, "failed to push widget loaded analytics event"),
        }
    }
}

fn build_loaded_event(
    user: &UserIdInput,
    user_jwt: &str,
    widget_type: Option<&WidgetType>,
) -> Result<PushWidgetAnalyticsEventInput, SquatchError> {
    let mut builder = PushWidgetAnalyticsEventInput::builder()
        .user(user.clone())
        .user_jwt(user_jwt)?
        .engagement_medium(DEFAULT_ENGAGEMENT_MEDIUM)?;
    if let Some(program_id) = widget_type.and_then(WidgetType::program_id) {
        builder = builder.program_id(program_id)?;
    }
    builder.build()
}
