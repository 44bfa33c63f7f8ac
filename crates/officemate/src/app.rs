use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use officemate_auth::auth_routes;

use crate::{
    audit::audit_middleware,
    handlers::{audit_logs, email, health, profile, route_preferences, safety, wallet},
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Corporate email flows live next to the auth routes
    let email_routes = Router::new()
        .route("/auth/add-corporate-email", post(email::add_corporate_email))
        .route("/auth/verify-email-otp", post(email::verify_email_otp))
        .route("/auth/resend-email-otp", post(email::resend_email_otp))
        .route(
            "/auth/update-corporate-email",
            post(email::update_corporate_email),
        )
        .route(
            "/auth/complete-email-update",
            post(email::complete_email_update),
        )
        .route(
            "/auth/corporate-email",
            delete(email::remove_corporate_email),
        );

    let profile_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_profile)
                .post(profile::create_profile)
                .put(profile::update_profile),
        )
        .route(
            "/profile/driver",
            get(profile::get_driver_profile)
                .post(profile::create_driver_profile)
                .put(profile::update_driver_profile)
                .delete(profile::delete_driver_profile),
        )
        .route(
            "/profile/driver/verify-license",
            post(profile::verify_driver_license),
        )
        .route(
            "/profile/rider",
            get(profile::get_rider_profile)
                .post(profile::create_rider_profile)
                .put(profile::update_rider_profile)
                .delete(profile::delete_rider_profile),
        )
        .route(
            "/profile/rider/gender-preference",
            put(profile::set_gender_preference),
        )
        .route(
            "/profile/rider/vehicle-types/{vehicle_type}",
            post(profile::add_vehicle_type_preference)
                .delete(profile::remove_vehicle_type_preference),
        )
        .route(
            "/profile/rider/favorite-drivers/{driver_id}",
            post(profile::add_favorite_driver).delete(profile::remove_favorite_driver),
        )
        .route(
            "/route-preferences",
            get(route_preferences::list_route_preferences)
                .put(route_preferences::save_route_preferences)
                .delete(route_preferences::delete_route_preferences),
        )
        .route(
            "/route-preferences/{route_type}",
            get(route_preferences::get_route_preference),
        );

    let wallet_routes = Router::new()
        .route(
            "/wallet",
            get(wallet::wallet_status).post(wallet::initialize_wallet),
        )
        .route("/wallet/payment-methods", post(wallet::add_payment_method))
        .route(
            "/wallet/payment-methods/{method_id}/verify",
            post(wallet::verify_payment_method),
        )
        .route(
            "/wallet/payment-methods/{method_id}/primary",
            put(wallet::set_primary_payment_method),
        )
        .route(
            "/wallet/auto-reload",
            put(wallet::configure_auto_reload).delete(wallet::disable_auto_reload),
        )
        .route(
            "/wallet/auto-reload/process",
            post(wallet::process_auto_reload),
        )
        .route("/wallet/bank-account", post(wallet::link_bank_account))
        .route("/wallet/add-funds", post(wallet::add_funds))
        .route("/wallet/withdraw", post(wallet::withdraw_funds))
        .route("/wallet/transactions", get(wallet::transaction_history))
        .route(
            "/wallet/transactions/recent",
            get(wallet::recent_transactions),
        )
        .route(
            "/wallet/qr-code",
            get(wallet::active_qr_code).post(wallet::generate_qr_code),
        )
        .route(
            "/wallet/qr-code/regenerate",
            post(wallet::regenerate_qr_code),
        )
        .route(
            "/wallet/qr-code/{qr_code_id}",
            delete(wallet::deactivate_qr_code),
        );

    let safety_routes = Router::new()
        .route(
            "/emergency-contacts",
            get(safety::list_emergency_contacts).post(safety::add_emergency_contact),
        )
        .route(
            "/emergency-contacts/primary",
            get(safety::primary_emergency_contact),
        )
        .route(
            "/emergency-contacts/{contact_id}",
            put(safety::update_emergency_contact).delete(safety::delete_emergency_contact),
        )
        .route(
            "/emergency-contacts/{contact_id}/primary",
            put(safety::set_primary_emergency_contact),
        )
        .route(
            "/family-sharing",
            get(safety::list_family_contacts).post(safety::add_family_contact),
        )
        .route(
            "/family-sharing/{sharing_id}",
            put(safety::update_family_contact).delete(safety::delete_family_contact),
        )
        .route(
            "/family-sharing/{sharing_id}/ride-updates",
            put(safety::set_ride_updates),
        )
        .route("/safety-settings", get(safety::safety_settings))
        .route(
            "/sos",
            get(safety::list_sos_alerts).post(safety::trigger_sos),
        )
        .route("/sos/active", get(safety::active_sos_alert))
        .route("/sos/{alert_id}/resolve", post(safety::resolve_sos))
        .route("/sos/{alert_id}/cancel", post(safety::cancel_sos))
        .route(
            "/location-sharing",
            post(safety::start_location_sharing).delete(safety::end_all_location_sharing),
        )
        .route(
            "/location-sharing/active",
            get(safety::active_location_share),
        )
        .route(
            "/location-sharing/{share_id}",
            put(safety::update_shared_location).delete(safety::end_location_sharing),
        );

    let api_routes = Router::new()
        .nest(
            "/users/{user_id}",
            profile_routes
                .merge(wallet_routes)
                .merge(safety_routes)
                .route("/audit-logs", get(audit_logs::list_audit_logs)),
        )
        .route("/qr-codes/validate", post(wallet::validate_qr_code))
        .route(
            "/location-shares/{token}",
            get(safety::location_share_by_token),
        );

    Router::new()
        .route("/livez", get(health::livez))
        .route("/healthz", get(health::healthz))
        .merge(email_routes)
        .nest("/api", api_routes)
        .with_state(state.clone())
        .merge(auth_routes().with_state(state.auth))
        .layer(cors)
        .layer(from_fn(audit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}
