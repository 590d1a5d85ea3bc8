use axum::{
    extract::{Multipart, State},
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
};
use futures::stream;
use std::time::Instant;
use tracing::{error, info, warn};

use super::upload::read_form;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::current_request_id;
use crate::models::ChatEvent;
use crate::services::ChatCompletionRequest;

/// Answers one question about the attached files.
///
/// Local validation failures (file type, size, unknown model, empty request)
/// come back as a JSON error before any provider call. Once the provider is
/// called the reply is an event stream: `text` then `done` on success, or a
/// single `error` event carrying a generic message.
pub async fn chat_handler(State(state): State<AppState>, multipart: Multipart) -> AppResult<impl IntoResponse> {
    let start = Instant::now();
    let request_id = current_request_id();

    info!(request_id = %request_id, "Starting chat request");

    let intake = state.intake();
    let form = read_form(multipart, intake.max_total_bytes()).await?;

    let kinds = intake.validate_all(&form.files)?;
    let model = state.catalog.resolve(form.model.as_deref())?;

    if form.message.trim().is_empty() && form.files.is_empty() {
        warn!(request_id = %request_id, "Chat request without message or files");
        return Err(AppError::EmptyRequest);
    }

    let file_count = form.files.len();
    let documents = state.extractor.extract_all(form.files, kinds).await;
    let messages = state.assembler().assemble(&form.message, &documents)?;

    info!(
        request_id = %request_id,
        model = %model,
        documents = file_count,
        "Prompt assembled, calling provider"
    );

    let request = ChatCompletionRequest {
        model,
        messages,
        temperature: state.config.temperature,
        max_tokens: state.config.max_tokens,
    };

    let events = match state.llm.complete(&request).await {
        Ok(completion) => {
            let processing_time_ms = start.elapsed().as_millis() as u64;
            info!(
                request_id = %request_id,
                model = %completion.model,
                answer_length = completion.content.len(),
                finish_reason = ?completion.finish_reason,
                processing_time_ms = processing_time_ms,
                "Chat request completed successfully"
            );

            let mut events = Vec::with_capacity(2);
            if !completion.content.is_empty() {
                events.push(ChatEvent::Text { content: completion.content });
            }
            events.push(ChatEvent::Done {
                model: completion.model,
                processing_time_ms,
            });
            events
        }
        Err(e) => {
            error!(request_id = %request_id, model = %request.model, error = %e, "Provider call failed");
            let app_error = AppError::from(e);
            vec![ChatEvent::Error { content: app_error.user_message() }]
        }
    };

    let stream = stream::iter(events.into_iter().map(|event| Event::default().json_data(event)));

    Ok(([("x-accel-buffering", "no")], Sse::new(stream)))
}
