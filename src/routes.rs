use crate::{
    api::{attendance, leave, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP quotas, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimits {
    login: LimiterConfig,
    register: LimiterConfig,
    protected: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            register: build_limiter(config.rate_register_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    let per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(per_min)).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} per minute"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&limits.register))
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(Governor::new(&limits.protected))
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::post().to(attendance::record_attendance)),
                    )
                    .service(
                        web::resource("/monthly")
                            .route(web::get().to(attendance::monthly_attendance)),
                    )
                    .service(
                        web::resource("/daily").route(web::get().to(attendance::daily_attendance)),
                    )
                    // /attendance/{date}/{id}
                    .service(
                        web::resource("/{date}/{id}")
                            .route(web::put().to(attendance::update_attendance)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::post().to(leave::apply_leave))
                            .route(web::get().to(leave::leaves_on_date)),
                    )
                    // /leave/{id}/status
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(leave::update_leave_status)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(
                        web::resource("/attendance-count")
                            .route(web::get().to(report::attendance_count_export)),
                    )
                    .service(web::resource("/presence").route(web::get().to(report::presence))),
            ),
    );
}
