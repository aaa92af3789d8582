use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{
    ErrorResponse, auth_handlers, category_handlers, expense_handlers, user_handlers,
};
use crate::middleware::auth_middleware::auth_middleware;
use crate::models::{
    AuthToken, Category, CategoryColor, CategorySpending, CreateCategoryRequest,
    CreateExpenseRequest, CreateUserRequest, Expense, LoginRequest, SpendingSummary,
    UpdateCategoryRequest, UpdateExpenseRequest, UpdateUserRequest, User,
};
use crate::services::auth_service::AuthService;
use crate::services::category_service::CategoryService;
use crate::services::expense_service::ExpenseService;
use crate::services::user_service::UserService;

/// Services shared with every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub category_service: Arc<dyn CategoryService>,
    pub expense_service: Arc<dyn ExpenseService>,
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth_handlers::signup_handler,
        auth_handlers::login_handler,
        user_handlers::get_me_handler,
        user_handlers::update_me_handler,
        user_handlers::delete_me_handler,
        category_handlers::list_categories_handler,
        category_handlers::create_category_handler,
        category_handlers::get_category_handler,
        category_handlers::update_category_handler,
        category_handlers::delete_category_handler,
        category_handlers::category_expenses_handler,
        expense_handlers::list_expenses_handler,
        expense_handlers::create_expense_handler,
        expense_handlers::get_expense_handler,
        expense_handlers::update_expense_handler,
        expense_handlers::delete_expense_handler,
        expense_handlers::summary_handler,
    ),
    components(
        schemas(
            User, CreateUserRequest, UpdateUserRequest, LoginRequest, AuthToken,
            Category, CategoryColor, CreateCategoryRequest, UpdateCategoryRequest,
            Expense, CreateExpenseRequest, UpdateExpenseRequest,
            SpendingSummary, CategorySpending, ErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup and login"),
        (name = "users", description = "The authenticated user's profile"),
        (name = "categories", description = "Expense categories"),
        (name = "expenses", description = "Expenses and the spending summary")
    ),
    info(
        title = "Expense Tracker API",
        version = "0.1.0",
        description = "REST API for tracking expenses against a monthly salary",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Routes that require a bearer token
fn me_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(user_handlers::get_me_handler)
                .put(user_handlers::update_me_handler)
                .delete(user_handlers::delete_me_handler),
        )
        .route("/me/summary", get(expense_handlers::summary_handler))
        .route(
            "/me/categories",
            get(category_handlers::list_categories_handler)
                .post(category_handlers::create_category_handler),
        )
        .route(
            "/me/categories/:id",
            get(category_handlers::get_category_handler)
                .put(category_handlers::update_category_handler)
                .delete(category_handlers::delete_category_handler),
        )
        .route(
            "/me/categories/:id/expenses",
            get(category_handlers::category_expenses_handler),
        )
        .route(
            "/me/expenses",
            get(expense_handlers::list_expenses_handler)
                .post(expense_handlers::create_expense_handler),
        )
        .route(
            "/me/expenses/:id",
            get(expense_handlers::get_expense_handler)
                .put(expense_handlers::update_expense_handler)
                .delete(expense_handlers::delete_expense_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            auth_middleware,
        ))
}

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Authentication routes
        .route("/auth/signup", post(auth_handlers::signup_handler))
        .route("/auth/login", post(auth_handlers::login_handler))
        .merge(me_routes(&state))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
