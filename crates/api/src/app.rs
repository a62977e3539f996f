use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    routing::{get, post},
    Router,
};
use domain::repositories::StoreHealth;
use domain::services::{
    CoreContext, IdentityProvider, InvitationService, InvitationSettings, MembershipService,
    ProvisioningService,
};
use persistence::db::PgStoreHealth;
use persistence::repositories::{
    PgActivityLogRepository, PgInvitationRepository, PgOrganizationRepository,
    PgProfileRepository,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::handle_layer_error;
use crate::middleware::{
    metrics_handler, metrics_middleware, redeem_rate_limit, trace_id, RateLimiterState,
};
use crate::routes::{health, invitations, members};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub core: CoreContext,
    pub provisioning: ProvisioningService,
    pub invitations: InvitationService,
    pub membership: MembershipService,
    pub store_health: Arc<dyn StoreHealth>,
    pub redeem_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, core: CoreContext, store_health: Arc<dyn StoreHealth>) -> Self {
        let settings = InvitationSettings {
            site_url: config.invitations.site_url.clone(),
            default_expires_hours: config.invitations.default_expires_hours,
        };
        let redeem_limiter =
            RateLimiterState::new(config.security.redeem_rate_limit_per_minute).map(Arc::new);

        Self {
            config: Arc::new(config),
            provisioning: ProvisioningService::new(core.clone()),
            invitations: InvitationService::new(core.clone(), settings),
            membership: MembershipService::new(core.clone()),
            core,
            store_health,
            redeem_limiter,
        }
    }
}

/// Wire the PostgreSQL repositories and the given identity provider.
pub fn create_state(config: Config, pool: PgPool, identity: Arc<dyn IdentityProvider>) -> AppState {
    let core = CoreContext {
        organizations: Arc::new(PgOrganizationRepository::new(pool.clone())),
        profiles: Arc::new(PgProfileRepository::new(pool.clone())),
        invitations: Arc::new(PgInvitationRepository::new(pool.clone())),
        activity_logs: Arc::new(PgActivityLogRepository::new(pool.clone())),
        identity,
    };
    let store_health = Arc::new(PgStoreHealth::new(pool));

    AppState::new(config, core, store_health)
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Development: allow any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authenticated routes resolve the caller in the handler extractor.
    let member_routes = Router::new()
        .route("/api/v1/users", post(members::create_member))
        .route("/api/v1/members/deactivate", post(members::deactivate_member))
        .route(
            "/api/v1/invitations",
            post(invitations::issue_invitation).get(invitations::list_invitations),
        )
        .route(
            "/api/v1/invitations/:invitation_id/revoke",
            post(invitations::revoke_invitation),
        );

    // The token in the body is the only credential; limit per client IP.
    let redeem_routes = Router::new()
        .route(
            "/api/v1/invitations/accept",
            post(invitations::accept_invitation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            redeem_rate_limit,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(redeem_routes)
        .merge(member_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_layer_error))
                .timeout(Duration::from_secs(config.server.request_timeout_secs)),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
