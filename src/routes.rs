use crate::{
    api::{company, employee, time_record},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Protected resources, relative to the API prefix.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/companies")
            // /companies
            .service(
                web::resource("")
                    .route(web::post().to(company::create_company))
                    .route(web::get().to(company::list_companies)),
            )
            // /companies/{company_id}/employees
            .service(
                web::resource("/{company_id}/employees")
                    .route(web::post().to(employee::create_employee))
                    .route(web::get().to(employee::list_employees)),
            )
            // /companies/{company_id}/punch
            .service(
                web::resource("/{company_id}/punch").route(web::post().to(time_record::punch)),
            ),
    )
    .service(
        web::scope("/employees/{employee_id}")
            // /employees/{employee_id}
            .service(
                web::resource("")
                    .route(web::get().to(employee::get_employee))
                    .route(web::put().to(employee::update_employee))
                    .route(web::delete().to(employee::delete_employee)),
            )
            .service(
                web::resource("/time-records").route(web::get().to(time_record::list_records)),
            )
            .service(
                web::resource("/time-records/open")
                    .route(web::post().to(time_record::open_record)),
            )
            .service(
                web::resource("/time-records/close")
                    .route(web::post().to(time_record::close_record)),
            )
            .service(
                web::resource("/time-records/export")
                    .route(web::get().to(time_record::export_records)),
            ),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(build_limiter(config.rate_refresh_per_min))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .configure(configure_api),
    );
}

// LOGIN (CPF + password)
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days, single use)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new token pair
