//! The request orchestrator: composes the cache, circuit breaker,
//! retry loop, reliability fallback, context selection, and model
//! arbitration around the transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::arbitration::{ArbitrationContext, ArbitrationResult, ExecutionMode, ModelArbitrator};
use crate::cache::{request_cache_key, ResponseCache};
use crate::config::AssistConfig;
use crate::context::{ContextManager, ContextSlice};
use crate::error::{
    GeminiError, GeminiResult, NetworkError, ResourceError, ResponseError,
};
use crate::reliability::{
    NetworkFailure, NetworkReliabilityService, RequestContext, RequestKind,
};
use crate::resilience::ResilienceOrchestrator;
use crate::streaming::{ChunkParser, StreamAccumulator};
use crate::transport::{endpoints, HttpTransport, RequestBuilder, ResponseParser};
use crate::types::{
    ChatRequest, ChatResponse, ChatTurn, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, StreamEvent,
};

use super::builder::AssistClientBuilder;
use super::stats::ClientStats;

/// The assistant's backend client.
///
/// One instance owns all mutable reliability state — cache, breaker
/// counters, streaming degradation, session pin. The instance outlives
/// any single UI render; none of this state is tied to component
/// lifetime.
pub struct AssistClient {
    config: AssistConfig,
    transport: Arc<dyn HttpTransport>,
    request_builder: RequestBuilder,
    resilience: ResilienceOrchestrator,
    cache: ResponseCache<ChatResponse>,
    reliability: NetworkReliabilityService,
    context: ContextManager,
    arbitrator: ModelArbitrator,
    api_key_validated: AtomicBool,
}

impl AssistClient {
    /// Creates a client builder.
    pub fn builder() -> AssistClientBuilder {
        AssistClientBuilder::new()
    }

    /// Creates a client from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        AssistClientBuilder::new().build()
    }

    /// Assembles a client from pre-constructed parts (used by the
    /// builder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn from_parts(
        config: AssistConfig,
        transport: Arc<dyn HttpTransport>,
        request_builder: RequestBuilder,
        resilience: ResilienceOrchestrator,
        cache: ResponseCache<ChatResponse>,
        reliability: NetworkReliabilityService,
        context: ContextManager,
        arbitrator: ModelArbitrator,
    ) -> Self {
        Self {
            config,
            transport,
            request_builder,
            resilience,
            cache,
            reliability,
            context,
            arbitrator,
            api_key_validated: AtomicBool::new(false),
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Sends a non-streaming chat request.
    ///
    /// Identical conversational turns are served from the response
    /// cache; misses go through the resilient pipeline (circuit
    /// breaker around the retry loop around the transport), and
    /// transport-level failures get one strategy-fallback retry as
    /// decided by the reliability layer.
    pub async fn send_request(&self, request: &ChatRequest) -> GeminiResult<ChatResponse> {
        self.send_request_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// `send_request` with caller-controlled cancellation.
    pub async fn send_request_with_cancel(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> GeminiResult<ChatResponse> {
        self.reliability.maybe_recover();
        self.non_streaming_round(request, None, cancel).await
    }

    /// The non-streaming strategy loop: cache check, resilient call,
    /// and at most one reliability-driven fallback retry.
    async fn non_streaming_round(
        &self,
        request: &ChatRequest,
        initial_timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> GeminiResult<ChatResponse> {
        let key = request_cache_key(request);
        if let Some(hit) = self.cache.get(key) {
            tracing::debug!(model = %request.model, "response cache hit");
            return Ok(hit);
        }

        let mut attempt: u32 = 0;
        let mut timeout: Option<Duration> = initial_timeout;

        loop {
            match self.execute_generate(request, timeout, cancel).await {
                Ok(response) => {
                    self.api_key_validated.store(true, Ordering::SeqCst);
                    self.cache.insert(key, response.clone());
                    return Ok(response);
                }
                Err(e) => {
                    let context = RequestContext {
                        kind: RequestKind::NonStreaming,
                        attempt,
                        api_key_validated: self.api_key_validated.load(Ordering::SeqCst),
                    };
                    let failure = self.reliability.analyze(&e, &context);
                    let plan = self.reliability.plan_fallback(&failure, &context);

                    if !plan.should_retry {
                        return Err(self.terminal_error(e, &failure, &request.model));
                    }

                    tracing::info!(
                        kind = ?failure.kind,
                        timeout = ?plan.timeout,
                        "applying fallback strategy to non-streaming request"
                    );
                    attempt += 1;
                    timeout = Some(plan.timeout);
                }
            }
        }
    }

    /// Sends a streaming chat request, delivering incremental deltas
    /// to `on_chunk` and a terminal `Done` marker.
    ///
    /// Streaming bypasses the response cache by contract. When
    /// streaming is degraded (or a VPN-suspected failure degrades it
    /// mid-call), the request is served non-streaming and the full
    /// text is replayed as a single delta before `Done`.
    pub async fn send_stream_request<F>(
        &self,
        request: &ChatRequest,
        on_chunk: F,
    ) -> GeminiResult<ChatResponse>
    where
        F: FnMut(StreamEvent),
    {
        self.send_stream_request_with_cancel(request, on_chunk, &CancellationToken::new())
            .await
    }

    /// `send_stream_request` with caller-controlled cancellation.
    pub async fn send_stream_request_with_cancel<F>(
        &self,
        request: &ChatRequest,
        mut on_chunk: F,
        cancel: &CancellationToken,
    ) -> GeminiResult<ChatResponse>
    where
        F: FnMut(StreamEvent),
    {
        self.reliability.maybe_recover();

        if self.reliability.streaming_disabled() {
            tracing::info!("streaming degraded; serving stream request non-streaming");
            return self
                .degrade_to_non_streaming(request, None, &mut on_chunk, cancel)
                .await;
        }

        let mut attempt: u32 = 0;
        let mut timeout: Option<Duration> = None;
        let mut streaming = true;

        loop {
            let result = if streaming {
                self.execute_stream(request, timeout, &mut on_chunk, cancel).await
            } else {
                return self
                    .degrade_to_non_streaming(request, timeout, &mut on_chunk, cancel)
                    .await;
            };

            match result {
                Ok(response) => {
                    self.api_key_validated.store(true, Ordering::SeqCst);
                    on_chunk(StreamEvent::Done);
                    return Ok(response);
                }
                Err(e) => {
                    let context = RequestContext {
                        kind: RequestKind::Streaming,
                        attempt,
                        api_key_validated: self.api_key_validated.load(Ordering::SeqCst),
                    };
                    let failure = self.reliability.analyze(&e, &context);
                    let plan = self.reliability.plan_fallback(&failure, &context);

                    if !plan.should_retry {
                        return Err(self.terminal_error(e, &failure, &request.model));
                    }

                    tracing::info!(
                        kind = ?failure.kind,
                        use_streaming = plan.use_streaming,
                        timeout = ?plan.timeout,
                        "applying fallback strategy to streaming request"
                    );
                    attempt += 1;
                    timeout = Some(plan.timeout);
                    streaming = plan.use_streaming;
                }
            }
        }
    }

    /// One streaming attempt: breaker check, transport stream, chunk
    /// parsing, delta delivery.
    ///
    /// The backoff retry loop is not applied here — replaying a
    /// half-delivered stream would duplicate deltas. Failures instead
    /// route through the strategy fallback, which may degrade to the
    /// (retried) non-streaming path.
    async fn execute_stream<F>(
        &self,
        request: &ChatRequest,
        timeout: Option<Duration>,
        on_chunk: &mut F,
        cancel: &CancellationToken,
    ) -> GeminiResult<ChatResponse>
    where
        F: FnMut(StreamEvent),
    {
        let breaker = self.resilience.circuit_breaker();
        breaker.check()?;

        let result = self
            .consume_stream(request, timeout, on_chunk, cancel)
            .await;

        match &result {
            Ok(_) => breaker.record_success(),
            Err(GeminiError::Cancelled) => {}
            Err(e) if e.is_retryable() => breaker.record_failure(),
            Err(_) => {}
        }

        result
    }

    async fn consume_stream<F>(
        &self,
        request: &ChatRequest,
        timeout: Option<Duration>,
        on_chunk: &mut F,
        cancel: &CancellationToken,
    ) -> GeminiResult<ChatResponse>
    where
        F: FnMut(StreamEvent),
    {
        let body = self.wire_request(request);
        let path = endpoints::stream_generate_content(&request.model);
        let http_request = self.request_builder.build_json_request(&path, &body, timeout)?;

        let byte_stream = self.transport.send_streaming(http_request).await?;
        let error_mapped = byte_stream.map(|item| item.map_err(GeminiError::from));
        let mut parser = ChunkParser::new(Box::pin(error_mapped));
        let mut accumulator = StreamAccumulator::new();

        loop {
            let next = tokio::select! {
                () = cancel.cancelled() => return Err(GeminiError::Cancelled),
                next = parser.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    let delta = accumulator.add_chunk(&chunk);
                    if !delta.is_empty() {
                        on_chunk(StreamEvent::Delta(delta));
                    }
                }
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        if accumulator.chunk_count() == 0 {
            return Err(GeminiError::Response(ResponseError::StreamInterrupted {
                message: "stream ended before any chunk arrived".into(),
            }));
        }

        Ok(accumulator.finalize(&request.model))
    }

    /// Serves a stream request over the non-streaming path, replaying
    /// the full text as one delta so consumers observe the same event
    /// contract.
    async fn degrade_to_non_streaming<F>(
        &self,
        request: &ChatRequest,
        timeout: Option<Duration>,
        on_chunk: &mut F,
        cancel: &CancellationToken,
    ) -> GeminiResult<ChatResponse>
    where
        F: FnMut(StreamEvent),
    {
        let mut non_streaming = request.clone();
        non_streaming.stream = false;

        let response = self
            .non_streaming_round(&non_streaming, timeout, cancel)
            .await?;

        if !response.text.is_empty() {
            on_chunk(StreamEvent::Delta(response.text.clone()));
        }
        on_chunk(StreamEvent::Done);
        Ok(response)
    }

    /// One resilient non-streaming generation call.
    async fn execute_generate(
        &self,
        request: &ChatRequest,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> GeminiResult<ChatResponse> {
        let body = self.wire_request(request);
        let path = endpoints::generate_content(&request.model);

        let parsed: GenerateContentResponse = self
            .resilience
            .execute(
                || async {
                    let http_request =
                        self.request_builder.build_json_request(&path, &body, timeout)?;
                    let response = self.transport.send(http_request).await?;
                    ResponseParser::parse_response(response)
                },
                cancel,
            )
            .await?;

        if parsed.candidates.as_ref().map_or(true, |c| c.is_empty()) {
            return Err(GeminiError::Network(NetworkError::EmptyResponse));
        }

        Ok(ChatResponse {
            text: parsed.text(),
            model: request.model.clone(),
            usage: parsed.usage_metadata.clone(),
            finish_reason: parsed.finish_reason(),
        })
    }

    fn wire_request(&self, request: &ChatRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: request.wire_contents(),
            system_instruction: request
                .system_instruction
                .as_deref()
                .map(|text| Content::system(text)),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                top_k: request.top_k,
                max_output_tokens: request.max_tokens,
                stop_sequences: None,
            }),
        }
    }

    /// Maps a terminal failure to its caller-facing form.
    ///
    /// A pinned session model that the backend no longer serves
    /// surfaces as `ModelUnavailable` — the session contract forbids
    /// silently swapping models; the caller must invoke the fallback
    /// chain explicitly. VPN-suspected failures carry the diagnosis in
    /// their message.
    fn terminal_error(
        &self,
        error: GeminiError,
        failure: &NetworkFailure,
        model: &str,
    ) -> GeminiError {
        if let GeminiError::Resource(ResourceError::ModelNotFound { .. }) = &error {
            if self.arbitrator.session_model().as_deref() == Some(model) {
                return GeminiError::Resource(ResourceError::ModelUnavailable {
                    model: model.to_string(),
                });
            }
        }

        if failure.vpn_suspected {
            return GeminiError::Network(NetworkError::ConnectionFailed {
                message: format!(
                    "your API key is valid but your network or VPN is blocking requests \
                     to the backend ({})",
                    failure.message
                ),
            });
        }

        error
    }

    /// Extracts the ranked, token-bounded context for a new message.
    pub async fn extract_relevant_context(
        &self,
        history: &[ChatTurn],
        current_message: &str,
        model_id: &str,
        max_tokens: Option<u32>,
    ) -> GeminiResult<Vec<ContextSlice>> {
        self.context
            .extract_relevant_context(history, current_message, model_id, max_tokens)
            .await
    }

    /// Scores execution paths for a request without pinning anything.
    pub fn arbitrate(&self, context: &ArbitrationContext<'_>) -> ArbitrationResult {
        self.arbitrator.arbitrate(context)
    }

    /// Arbitrates and pins the session model (or returns the existing
    /// pin).
    pub fn select_model(&self, context: &ArbitrationContext<'_>) -> ArbitrationResult {
        self.arbitrator.select_for_session(context)
    }

    /// Manually pins the session model.
    pub fn pin_model(&self, model: &str, mode: ExecutionMode) {
        self.arbitrator.pin_model(model, mode);
    }

    /// The pinned session model, if any.
    pub fn session_model(&self) -> Option<String> {
        self.arbitrator.session_model()
    }

    /// The explicit fallback chain for a failed model.
    pub fn fallback_models(&self, failed_model: &str) -> Vec<String> {
        self.arbitrator.fallback_chain(failed_model)
    }

    /// Diagnostics snapshot for observability panels.
    pub fn stats(&self) -> ClientStats {
        ClientStats {
            cache: self.cache.stats(),
            circuit: self.resilience.circuit_breaker().stats(),
            last_retry_attempts: self.resilience.last_retry_attempts(),
            streaming_disabled: self.reliability.streaming_disabled(),
            session_model: self.arbitrator.session_model(),
        }
    }
}

impl std::fmt::Debug for AssistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistClient")
            .field("config", &"<redacted>")
            .finish()
    }
}
