// Q&A API
// Users ask questions, answer them and vote; every mutation is gated on a
// verified bearer token and on record ownership

pub mod answers;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod ownership;
pub mod questions;
pub mod users;
pub mod validation;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::answers::{AnswerRepository, AnswerService, PgAnswerRepository};
use crate::auth::{cookie::CookieConfig, middleware::require_auth, AuthGate, PasswordService, TokenService};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::memory::InMemoryStore;
use crate::questions::{PgQuestionRepository, QuestionRepository, QuestionService};
use crate::users::{models::Links, PgUserRepository, UserRepository, UserService};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        users::handlers::me_handler,
        users::handlers::profile_handler,
        users::handlers::delete_me_handler,
        questions::handlers::create_question_handler,
        questions::handlers::get_question_handler,
        questions::handlers::update_question_handler,
        questions::handlers::delete_question_handler,
        questions::handlers::upvote_handler,
        questions::handlers::downvote_handler,
        answers::handlers::create_answer_handler,
        answers::handlers::update_answer_handler,
        answers::handlers::delete_answer_handler,
    ),
    components(schemas(
        auth::models::AuthResponse,
        users::models::RegisterRequest,
        users::models::LoginRequest,
        users::models::PublicUser,
        users::models::UserProfile,
        users::models::QuestionSummary,
        users::models::AnswerSummary,
        questions::models::CreateQuestionRequest,
        questions::models::UpdateQuestionRequest,
        questions::models::Question,
        questions::models::QuestionView,
        questions::models::VoteTally,
        answers::models::AnswerRequest,
        answers::models::Answer,
        answers::models::AnswerView,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Registration, login and profiles"),
        (name = "questions", description = "Questions and votes"),
        (name = "answers", description = "Answers to questions")
    ),
    info(title = "Q&A API", version = "1.0.0")
)]
pub struct ApiDoc;

/// Registers the bearer header and the access-token cookie as security schemes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("access-token"))),
        );
    }
}

/// Storage implementations behind the services
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
}

impl Repositories {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            questions: Arc::new(PgQuestionRepository::new(pool.clone())),
            answers: Arc::new(PgAnswerRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            questions: store.clone(),
            answers: store,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub questions: QuestionService,
    pub answers: AnswerService,
    pub tokens: Arc<TokenService>,
    pub cookie: CookieConfig,
}

impl AppState {
    pub fn new(config: &AppConfig, repositories: Repositories, passwords: PasswordService) -> Self {
        let tokens = Arc::new(TokenService::with_ttl(
            &config.jwt_secret,
            config.access_token_ttl_secs,
        ));
        let links = Links::new(&config.domain, config.use_tls);

        Self {
            users: UserService::new(repositories.users, passwords, links),
            questions: QuestionService::new(repositories.questions),
            answers: AnswerService::new(repositories.answers),
            tokens,
            cookie: CookieConfig {
                name: config.access_token_cookie.clone(),
                secure: config.use_tls,
                path: "/".to_string(),
                max_age_secs: config.access_token_ttl_secs,
            },
        }
    }
}

/// Creates and configures the application router
/// Protected routes sit behind the identity gate; reads of questions and
/// profiles are public
pub fn create_router(state: AppState) -> Router {
    let gate = AuthGate::new(state.tokens.clone(), &state.cookie.name);
    let auth = from_fn_with_state(gate, require_auth);

    let api = Router::new()
        .route("/users", post(auth::handlers::register_handler))
        .route("/users/login", post(auth::handlers::login_handler))
        .route(
            "/users/me",
            get(users::handlers::me_handler)
                .delete(users::handlers::delete_me_handler)
                .route_layer(auth.clone()),
        )
        .route("/users/:id", get(users::handlers::profile_handler))
        .route(
            "/questions",
            post(questions::handlers::create_question_handler).route_layer(auth.clone()),
        )
        .route(
            "/questions/:id",
            get(questions::handlers::get_question_handler).merge(
                put(questions::handlers::update_question_handler)
                    .delete(questions::handlers::delete_question_handler)
                    .route_layer(auth.clone()),
            ),
        )
        .route(
            "/questions/:id/upvote",
            post(questions::handlers::upvote_handler).route_layer(auth.clone()),
        )
        .route(
            "/questions/:id/downvote",
            post(questions::handlers::downvote_handler).route_layer(auth.clone()),
        )
        .route(
            "/questions/:id/answers",
            post(answers::handlers::create_answer_handler).route_layer(auth.clone()),
        )
        .route(
            "/answers/:id",
            put(answers::handlers::update_answer_handler)
                .delete(answers::handlers::delete_answer_handler)
                .route_layer(auth),
        );

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
