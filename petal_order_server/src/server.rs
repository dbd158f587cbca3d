use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use petal_order_engine::{
    db_types::OrderNumber,
    events::{EventHandlers, EventHooks, EventProducers},
    AddressApi,
    CartApi,
    CustomerApi,
    OrderApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::{json_error_handler, path_error_handler, query_error_handler, set_verbose_validation, ServerError},
    middleware::IdentityMiddlewareFactory,
    routes::{
        health,
        AddAddressRoute,
        AddCartItemRoute,
        AddDraftCartItemRoute,
        CheckoutDraftCartRoute,
        CheckoutRoute,
        CreateDraftCartRoute,
        DeleteAddressRoute,
        MyAddressesRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByNumberRoute,
        OrderTaxRoute,
        OrdersSearchRoute,
        RemoveCartItemRoute,
        SetCustomerApprovalRoute,
        SetCustomerMultiplierRoute,
        SetDefaultAddressRoute,
        UpdateItemPriceRoute,
        UpdateOrderStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let last = db.reconcile_order_sequence().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ The next order will be numbered {}", OrderNumber::from_sequence(last + 1));
    let handlers = EventHandlers::new(10, default_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Log-only event subscribers. A deployment that needs side effects (order confirmation emails, say) swaps these
/// hooks for its own before starting the server.
pub fn default_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Order {} created for customer #{}, total {}",
                ev.order.order_number, ev.order.customer_id, ev.order.total
            );
        })
    });
    hooks.on_status_changed(|ev| {
        Box::pin(async move {
            if ev.is_cancellation() {
                info!("📬️ Order {} was cancelled", ev.order.order_number);
            } else {
                info!("📬️ Order {} moved from {} to {}", ev.order.order_number, ev.old_status, ev.order.status);
            }
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    set_verbose_validation(config.verbose_validation);
    let srv = HttpServer::new(move || {
        let order_flow_api = OrderFlowApi::new(db.clone(), db.clone(), producers.clone());
        let orders_api = OrderApi::new(db.clone());
        let carts_api = CartApi::new(db.clone());
        let addresses_api = AddressApi::new(db.clone());
        let customers_api = CustomerApi::new(db.clone());
        let identity = IdentityMiddlewareFactory::<SqliteDatabase>::new(config.gateway_secret.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pbw::access_log"))
            .app_data(web::Data::new(order_flow_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(carts_api))
            .app_data(web::Data::new(addresses_api))
            .app_data(web::Data::new(customers_api))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler));
        // Every route under /api runs behind the gateway identity check. The search route is registered before the
        // {number} routes so that "search" is never read as an order number.
        let api_scope = web::scope("/api")
            .wrap(identity)
            .service(OrdersSearchRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByNumberRoute::<SqliteDatabase>::new())
            .service(OrderTaxRoute::<SqliteDatabase>::new())
            .service(MyAddressesRoute::<SqliteDatabase>::new())
            .service(AddAddressRoute::<SqliteDatabase>::new())
            .service(DeleteAddressRoute::<SqliteDatabase>::new())
            .service(SetDefaultAddressRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(UpdateItemPriceRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(SetCustomerApprovalRoute::<SqliteDatabase>::new())
            .service(SetCustomerMultiplierRoute::<SqliteDatabase>::new())
            .service(CreateDraftCartRoute::<SqliteDatabase>::new())
            .service(AddDraftCartItemRoute::<SqliteDatabase>::new())
            .service(CheckoutDraftCartRoute::<SqliteDatabase, SqliteDatabase>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
