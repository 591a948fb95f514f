use axum::{
    http::StatusCode,
    routing::{get, post, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    api::handler::{health_check, root, AppState},
    batches::handlers::{create_batch, delete_batch, get_batch, list_batches, update_batch},
    contracts::handlers::{
        create_contract, delete_contract, get_contract, list_contracts, update_contract,
    },
    customers::handlers::{
        create_customer, delete_customer, get_customer, list_customers, update_customer,
    },
    deliveries::handlers::{
        create_delivery, delete_delivery, get_delivery, list_deliveries, update_delivery,
    },
    husbandry::handlers::{
        create_feeding, create_medication, create_rearing_plan, create_weighing, delete_feeding,
        delete_medication, delete_rearing_plan, delete_weighing, get_feeding, get_medication,
        get_rearing_plan, get_weighing, list_feedings, list_medications, list_rearing_plans,
        list_weighings, update_feeding, update_medication, update_rearing_plan, update_weighing,
    },
    middleware::{create_cors_layer, MakeRequestUuid},
    settlements::handlers::{
        create_settlement, delete_settlement, get_settlement, list_settlements, trial_settlement,
        update_settlement,
    },
};

/// Mount `collection` at both `/name` and `/name/`, and `item` at `/name/:id`
fn resource(
    router: Router<AppState>,
    name: &str,
    collection: MethodRouter<AppState>,
    item: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(&format!("/{name}"), collection.clone())
        .route(&format!("/{name}/"), collection)
        .route(&format!("/{name}/:id"), item)
}

pub async fn create_app(state: AppState) -> Router {
    info!("⚙️ Setting up HTTP routes...");

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Dry-run only; registered ahead of the `:id` routes it shares a prefix with
        .route("/settlements/trial", post(trial_settlement));

    router = resource(
        router,
        "customers",
        get(list_customers).post(create_customer),
        get(get_customer).put(update_customer).delete(delete_customer),
    );
    router = resource(
        router,
        "contracts",
        get(list_contracts).post(create_contract),
        get(get_contract).put(update_contract).delete(delete_contract),
    );
    router = resource(
        router,
        "batches",
        get(list_batches).post(create_batch),
        get(get_batch).put(update_batch).delete(delete_batch),
    );
    router = resource(
        router,
        "rearing-plans",
        get(list_rearing_plans).post(create_rearing_plan),
        get(get_rearing_plan)
            .put(update_rearing_plan)
            .delete(delete_rearing_plan),
    );
    router = resource(
        router,
        "feedings",
        get(list_feedings).post(create_feeding),
        get(get_feeding).put(update_feeding).delete(delete_feeding),
    );
    router = resource(
        router,
        "medications",
        get(list_medications).post(create_medication),
        get(get_medication)
            .put(update_medication)
            .delete(delete_medication),
    );
    router = resource(
        router,
        "weighings",
        get(list_weighings).post(create_weighing),
        get(get_weighing).put(update_weighing).delete(delete_weighing),
    );
    router = resource(
        router,
        "deliveries",
        get(list_deliveries).post(create_delivery),
        get(get_delivery).put(update_delivery).delete(delete_delivery),
    );
    router = resource(
        router,
        "settlements",
        get(list_settlements).post(create_settlement),
        get(get_settlement)
            .put(update_settlement)
            .delete(delete_settlement),
    );

    let cors = create_cors_layer(&state.config);
    let timeout = state.config.request_timeout();

    let app = router
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(cors)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 Shutdown signal received, draining connections"),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
}
