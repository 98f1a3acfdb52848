//! Asynchronous execution of client operations.
//!
//! # Design
//! Every operation returns `Result<impl Future, SquatchError>`. The outer
//! `Result` reports validation failures before anything is sent; once it is
//! `Ok`, the returned future performs exactly one HTTP round-trip and resolves
//! once. There is no retry. A request that is never awaited is never sent.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::client::{AnalyticsEventKind, SquatchClient};
use crate::error::SquatchError;
use crate::http::{HttpRequest, HttpResponse};
use crate::inputs::{
    GraphQLInput, PushWidgetAnalyticsEventInput, RenderWidgetInput, WidgetUpsertInput,
};
use crate::options::ClientOptions;
use crate::transport::{Transport, UreqTransport};

type Parser<R> = fn(&SquatchClient, HttpResponse) -> Result<R, SquatchError>;

/// A `SquatchClient` paired with a shared `Transport`.
///
/// Cloning is cheap and clones share the transport, so a dispatcher can be
/// handed to any number of concurrent callers.
#[derive(Debug)]
pub struct Dispatcher<T> {
    client: SquatchClient,
    transport: Arc<T>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl Dispatcher<UreqTransport> {
    pub fn new(options: ClientOptions) -> Self {
        Self::with_transport(options, UreqTransport::new())
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn with_transport(options: ClientOptions, transport: T) -> Self {
        Self {
            client: SquatchClient::new(options),
            transport: Arc::new(transport),
        }
    }

    pub fn client(&self) -> &SquatchClient {
        &self.client
    }

    pub fn graphql(
        &self,
        input: &GraphQLInput,
        user_jwt: Option<&str>,
    ) -> Result<impl Future<Output = Result<Value, SquatchError>> + Send + 'static, SquatchError> {
        let request = self.client.build_graphql(input, user_jwt)?;
        Ok(self.send(request, SquatchClient::parse_graphql))
    }

    /// Resolves to the rendered widget HTML.
    pub fn render_widget(
        &self,
        input: &RenderWidgetInput,
    ) -> Result<impl Future<Output = Result<String, SquatchError>> + Send + 'static, SquatchError> {
        let request = self.client.build_render_widget(input)?;
        Ok(self.send(request, SquatchClient::parse_render_widget))
    }

    pub fn user_upsert(
        &self,
        user_input: &Value,
        user_jwt: &str,
    ) -> Result<impl Future<Output = Result<Value, SquatchError>> + Send + 'static, SquatchError> {
        let request = self.client.build_user_upsert(user_input, user_jwt)?;
        Ok(self.send(request, SquatchClient::parse_user_upsert))
    }

    pub fn user_upsert_with_user_jwt(
        &self,
        user_jwt: &str,
    ) -> Result<impl Future<Output = Result<Value, SquatchError>> + Send + 'static, SquatchError> {
        let request = self.client.build_user_upsert_with_user_jwt(user_jwt)?;
        Ok(self.send(request, SquatchClient::parse_user_upsert))
    }

    /// Resolves to the upserted user together with the rendered `template`.
    pub fn widget_upsert(
        &self,
        input: &WidgetUpsertInput,
    ) -> Result<impl Future<Output = Result<Value, SquatchError>> + Send + 'static, SquatchError> {
        let request = self.client.build_widget_upsert(input)?;
        Ok(self.send(request, SquatchClient::parse_widget_upsert))
    }

    pub fn log_user_event(
        &self,
        user_event_input: &Value,
        user_jwt: &str,
    ) -> Result<impl Future<Output = Result<Value, SquatchError>> + Send + 'static, SquatchError> {
        let request = self.client.build_log_user_event(user_event_input, user_jwt)?;
        Ok(self.send(request, SquatchClient::parse_log_user_event))
    }

    /// Fails with `BadInput`, sending nothing, when the input has a share
    /// medium.
    pub fn push_widget_loaded_analytics_event(
        &self,
        input: &PushWidgetAnalyticsEventInput,
    ) -> Result<impl Future<Output = Result<(), SquatchError>> + Send + 'static, SquatchError> {
        self.push_widget_analytics_event(AnalyticsEventKind::Loaded, input)
    }

    pub fn push_widget_shared_analytics_event(
        &self,
        input: &PushWidgetAnalyticsEventInput,
    ) -> Result<impl Future<Output = Result<(), SquatchError>> + Send + 'static, SquatchError> {
        self.push_widget_analytics_event(AnalyticsEventKind::Shared, input)
    }

    fn push_widget_analytics_event(
        &self,
        kind: AnalyticsEventKind,
        input: &PushWidgetAnalyticsEventInput,
    ) -> Result<impl Future<Output = Result<(), SquatchError>> + Send + 'static, SquatchError> {
        let request = self.client.build_widget_analytics_event(kind, input)?;
        Ok(self.send(request, SquatchClient::parse_widget_analytics_event))
    }

    fn send<R: Send + 'static>(
        &self,
        request: HttpRequest,
        parse: Parser<R>,
    ) -> impl Future<Output = Result<R, SquatchError>> + Send + 'static {
        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        async move {
            debug!(method = request.method.as_str(), url = %request.url, "sending request");
            let response = transport.execute(request).await.map_err(SquatchError::Client)?;
            debug!(status = response.status, "received response");
            parse(&client, response)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::UserIdInput;
    use serde_json::json;

    /// Records every request and answers with a canned response.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) requests: Mutex<Vec<HttpRequest>>,
        pub(crate) response: Mutex<Option<HttpResponse>>,
    }

    impl RecordingTransport {
        pub(crate) fn answering(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Mutex::new(Some(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                })),
            }
        }

        pub(crate) fn sent(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for Arc<RecordingTransport> {
        fn execute(
            &self,
            request: HttpRequest,
        ) -> impl Future<Output = Result<HttpResponse, crate::TransportError>> + Send {
            self.requests.lock().unwrap().push(request);
            let response = self.response.lock().unwrap().clone();
            async move { response.ok_or_else(|| crate::TransportError::from("connection refused")) }
        }
    }

    pub(crate) fn options() -> ClientOptions {
        ClientOptions::builder()
            .tenant_alias("t1")
            .unwrap()
            .app_domain("app.example.com")
            .unwrap()
            .build()
            .unwrap()
    }

    fn analytics_input() -> PushWidgetAnalyticsEventInput {
        PushWidgetAnalyticsEventInput::builder()
            .user(UserIdInput::new("a1", "u1"))
            .user_jwt("h.p.s")
            .unwrap()
            .share_medium("EMAIL")
            .unwrap()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn graphql_round_trip() {
        let transport = Arc::new(RecordingTransport::answering(200, r#"{"data":{"ping":"pong"}}"#));
        let dispatcher = Dispatcher::with_transport(options(), Arc::clone(&transport));
        let input = GraphQLInput::builder().query("{ping}").unwrap().build().unwrap();

        let json = dispatcher.graphql(&input, None).unwrap().await.unwrap();
        assert_eq!(json, json!({"data": {"ping": "pong"}}));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://app.example.com/api/v1/t1/graphql");
        assert_eq!(sent[0].header("authorization"), None);
    }

    #[tokio::test]
    async fn transport_failure_is_a_client_error_and_not_retried() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::with_transport(options(), Arc::clone(&transport));
        let input = GraphQLInput::builder().query("{ping}").unwrap().build().unwrap();

        let err = dispatcher.graphql(&input, None).unwrap().await.unwrap_err();
        assert!(matches!(err, SquatchError::Client(_)));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn loaded_beacon_with_share_medium_sends_nothing() {
        let transport = Arc::new(RecordingTransport::answering(200, ""));
        let dispatcher = Dispatcher::with_transport(options(), Arc::clone(&transport));

        let err = dispatcher
            .push_widget_loaded_analytics_event(&analytics_input())
            .err()
            .unwrap();
        assert!(matches!(err, SquatchError::BadInput { .. }));
        assert!(transport.sent().is_empty());

        dispatcher
            .push_widget_shared_analytics_event(&analytics_input())
            .unwrap()
            .await
            .unwrap();
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn request_is_sent_only_when_awaited() {
        let transport = Arc::new(RecordingTransport::answering(200, "{}"));
        let dispatcher = Dispatcher::with_transport(options(), Arc::clone(&transport));

        let pending = dispatcher
            .user_upsert(&json!({"id": "u1", "accountId": "a1"}), "h.p.s")
            .unwrap();
        assert!(transport.sent().is_empty());
        pending.await.unwrap();
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn validation_errors_are_synchronous() {
        let transport = Arc::new(RecordingTransport::answering(200, "{}"));
        let dispatcher = Dispatcher::with_transport(options(), Arc::clone(&transport));

        assert!(dispatcher.user_upsert(&json!({"accountId": "a1"}), "h.p.s").is_err());
        assert!(dispatcher.log_user_event(&json!({"userId": "u1"}), "h.p.s").is_err());
        assert!(dispatcher.user_upsert_with_user_jwt("not-a-token").is_err());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_transport() {
        let transport = Arc::new(RecordingTransport::answering(
            200,
            r#"{"data":{"renderWidget":{"template":"<p>hi</p>"}}}"#,
        ));
        let dispatcher = Dispatcher::with_transport(options(), Arc::clone(&transport));
        let input = RenderWidgetInput::builder().locale("en").unwrap().build().unwrap();

        let first = dispatcher.render_widget(&input).unwrap();
        let second = dispatcher.clone().render_widget(&input).unwrap();
        let (first, second) = tokio::join!(tokio::spawn(first), tokio::spawn(second));
        assert_eq!(first.unwrap().unwrap(), "<p>hi</p>");
        assert_eq!(second.unwrap().unwrap(), "<p>hi</p>");
        assert_eq!(transport.sent().len(), 2);
    }
}
