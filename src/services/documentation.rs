use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz session backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::quizzes::create_quiz,
        crate::routes::quizzes::list_quizzes,
        crate::routes::quizzes::get_quiz,
        crate::routes::quizzes::delete_quiz,
        crate::routes::sessions::get_snapshot,
        crate::routes::sessions::get_standings,
        crate::routes::sessions::join,
        crate::routes::sessions::leave,
        crate::routes::sessions::answer,
        crate::routes::sessions::start,
        crate::routes::sessions::reveal,
        crate::routes::sessions::advance,
        crate::routes::sessions::pause,
        crate::routes::sessions::resume,
        crate::routes::sessions::reset,
        crate::routes::sse::session_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::quiz::CreateQuizRequest,
            crate::dto::quiz::QuestionInput,
            crate::dto::quiz::QuizSettingsDto,
            crate::dto::quiz::DifficultyDto,
            crate::dto::quiz::QuizSummary,
            crate::dto::quiz::QuestionSummary,
            crate::dto::quiz::QuizListItem,
            crate::dto::session::JoinRequest,
            crate::dto::session::AnswerRequest,
            crate::dto::session::AnswerReceipt,
            crate::dto::session::PlayerSummary,
            crate::dto::session::SessionSnapshotDto,
            crate::dto::session::QuestionViewDto,
            crate::dto::session::RevealSummaryDto,
            crate::dto::session::PlayerViewDto,
            crate::dto::session::StandingDto,
            crate::dto::phase::VisibleSessionPhase,
            crate::dto::sse::Handshake,
            crate::dto::sse::PlayerPresenceEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "quizzes", description = "Quiz authoring and catalogue"),
        (name = "sessions", description = "Live session commands for hosts and players"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_session_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/quizzes"));
        assert!(paths.contains_key("/sessions/{id}/answer"));
        assert!(paths.contains_key("/sessions/{id}/events"));
    }
}
