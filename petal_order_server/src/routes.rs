//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate
//! module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so a handler that blocks the current thread stops that
//! worker from taking new requests. Anything long and non-cpu-bound (database calls, I/O) must be awaited, never
//! blocked on; async handlers are interleaved by the worker and don't hold it up.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use petal_order_engine::{
    db_types::{NewAddress, NewCartItem, OrderNumber, Role},
    order_objects::{CheckoutRequest, CompleteOrder, OrderQueryFilter},
    traits::{
        AddressManagement,
        CartManagement,
        CheckoutDatabase,
        CustomerManagement,
        OrderManagement,
        SequenceSource,
    },
    AddressApi,
    CartApi,
    CustomerApi,
    OrderApi,
    OrderFlowApi,
};

use crate::{
    auth::AuthenticatedCustomer,
    data_objects::{
        ApprovalParams,
        CheckoutParams,
        DraftCartParams,
        MultiplierParams,
        PriceUpdateParams,
        PriceUpdateResult,
        StatusUpdateParams,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("🌸️\n")
}

//----------------------------------------------   Carts  ----------------------------------------------------

route!(my_cart => Get "/cart" impl CartManagement);
/// Route handler for the cart endpoint
///
/// Returns the customer's active cart, priced with their multiplier. A customer who has never added anything gets
/// an empty cart; the engine creates one on first touch.
pub async fn my_cart<B: CartManagement>(
    customer: AuthenticatedCustomer,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for customer #{}", customer.id);
    let cart = api.active_cart_for(&customer).await.map_err(|e| {
        debug!("💻️ Could not fetch the cart for customer #{}. {e}", customer.id);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_cart_item => Post "/cart/items" impl CartManagement);
/// Adds a product (or a specific variant) to the customer's active cart. Posting a product that is already in the
/// cart adds to the existing line's quantity rather than stacking a second line.
pub async fn add_cart_item<B: CartManagement>(
    customer: AuthenticatedCustomer,
    body: web::Json<NewCartItem>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item = body.into_inner();
    debug!("💻️ POST cart item for customer #{}: product #{} x{}", customer.id, item.product_id, item.quantity);
    let cart = api.add_item(&customer, item).await.map_err(|e| {
        debug!("💻️ Could not add the item to the cart. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(remove_cart_item => Delete "/cart/items/{id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    customer: AuthenticatedCustomer,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ DELETE cart item #{item_id} for customer #{}", customer.id);
    let cart = api.remove_item(&customer, item_id).await.map_err(|e| {
        debug!("💻️ Could not remove the item from the cart. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(cart))
}

//----------------------------------------------   Checkout  ----------------------------------------------------

route!(checkout => Post "/checkout" impl CheckoutDatabase, SequenceSource);
/// Route handler for the checkout endpoint
///
/// Converts the customer's active cart into an order. The body carries the contact details and the delivery
/// address, either as an id from the customer's address book or as a fresh address captured inline (set
/// `saveDeliveryAddress` to also add it to the book). The response is the complete order; lines priced at market
/// carry no price until an admin finalises them.
pub async fn checkout<B: CheckoutDatabase, S: SequenceSource>(
    customer: AuthenticatedCustomer,
    body: web::Json<CheckoutParams>,
    api: web::Data<OrderFlowApi<B, S>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST checkout for customer #{}", customer.id);
    let request = CheckoutRequest::try_from(body.into_inner())?;
    let order = api.checkout(customer.id, request).await.map_err(|e| {
        debug!("💻️ Checkout failed for customer #{}. {e}", customer.id);
        ServerError::from(e)
    })?;
    info!("🔄️ Customer #{} checked out order {} for {}", customer.id, order.order.order_number, order.order.total);
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(my_orders => Get "/orders" impl OrderManagement);
/// Route handler for the orders endpoint
///
/// Customers fetch their own order history here, newest first. Admins wanting anyone's orders use
/// `/orders/search` instead.
pub async fn my_orders<B: OrderManagement>(
    customer: AuthenticatedCustomer,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for customer #{}", customer.id);
    let orders = api.orders_for_customer(customer.id).await.map_err(|e| {
        debug!("💻️ Could not fetch orders for customer #{}. {e}", customer.id);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(orders_search => Get "/orders/search" impl OrderManagement where requires [Role::Admin]);
pub async fn orders_search<B: OrderManagement>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders search for [{query}]");
    let query = query.into_inner();
    let orders = api.search_orders(query).await.map_err(|e| {
        debug!("💻️ Could not search orders. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_number => Get "/orders/{number}" impl OrderManagement);
/// Route handler for the orders/{number} endpoint
///
/// Fetches a single order in full. Customers can only see their own orders; admins can see anyone's. A stranger's
/// order number answers 404 rather than 403, so the numbering sequence cannot be probed.
pub async fn order_by_number<B: OrderManagement>(
    customer: AuthenticatedCustomer,
    path: web::Path<OrderNumber>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = path.into_inner();
    debug!("💻️ GET order {number} for customer #{}", customer.id);
    let order = fetch_visible_order(&customer, &number, api.as_ref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_tax => Get "/orders/{number}/tax" impl OrderManagement);
/// The sales-tax breakdown for an order, subject to the same visibility rule as the order itself.
pub async fn order_tax<B: OrderManagement>(
    customer: AuthenticatedCustomer,
    path: web::Path<OrderNumber>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let number = path.into_inner();
    debug!("💻️ GET tax for order {number}");
    fetch_visible_order(&customer, &number, api.as_ref()).await?;
    let summary = api
        .tax_for_order(&number)
        .await
        .map_err(|e| {
            debug!("💻️ Could not compute tax for order {number}. {e}");
            ServerError::from(e)
        })?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {number} does not exist")))?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn fetch_visible_order<B: OrderManagement>(
    customer: &AuthenticatedCustomer,
    number: &OrderNumber,
    api: &OrderApi<B>,
) -> Result<CompleteOrder, ServerError> {
    let order = api.complete_order(number).await.map_err(|e| {
        debug!("💻️ Could not fetch order {number}. {e}");
        ServerError::from(e)
    })?;
    match order {
        Some(order) if customer.is_admin() || order.order.customer_id == customer.id => Ok(order),
        _ => Err(ServerError::NoRecordFound(format!("Order {number} does not exist"))),
    }
}

route!(update_order_status => Post "/orders/{number}/status" impl CheckoutDatabase, SequenceSource where requires [Role::Admin]);
/// Admin lever to move an order along its lifecycle. Transitions outside the lifecycle table are rejected with a
/// conflict, and terminal orders cannot move at all.
pub async fn update_order_status<B: CheckoutDatabase, S: SequenceSource>(
    path: web::Path<OrderNumber>,
    body: web::Json<StatusUpdateParams>,
    api: web::Data<OrderFlowApi<B, S>>,
) -> Result<HttpResponse, ServerError> {
    let number = path.into_inner();
    let new_status = body.status;
    debug!("💻️ POST status {new_status} for order {number}");
    let change = api.update_status(&number, new_status).await.map_err(|e| {
        debug!("💻️ Could not update the status of order {number}. {e}");
        ServerError::from(e)
    })?;
    info!("🔄️ Order {number} moved from {} to {}", change.old_status, change.order.status);
    Ok(HttpResponse::Ok().json(change))
}

route!(update_item_price => Post "/orders/{number}/items/{item_id}/price" impl CheckoutDatabase, SequenceSource where requires [Role::Admin]);
/// Admin lever to set the final per-unit price of an order line. This is how a market-priced flower gets its price
/// once the day's rate is known; it also serves as the general price correction tool. Returns the order with its
/// recomputed total lifted to `orderTotal`.
pub async fn update_item_price<B: CheckoutDatabase, S: SequenceSource>(
    path: web::Path<(OrderNumber, i64)>,
    body: web::Json<PriceUpdateParams>,
    api: web::Data<OrderFlowApi<B, S>>,
) -> Result<HttpResponse, ServerError> {
    let (number, item_id) = path.into_inner();
    let price = body.price;
    debug!("💻️ POST price {price} for item #{item_id} on order {number}");
    let order = api.finalize_item_price(&number, item_id, price).await.map_err(|e| {
        debug!("💻️ Could not set the price of item #{item_id} on order {number}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(PriceUpdateResult::from(order)))
}

//----------------------------------------------   Addresses  ----------------------------------------------------

route!(my_addresses => Get "/addresses" impl AddressManagement);
/// The customer's address book, default address first.
pub async fn my_addresses<B: AddressManagement>(
    customer: AuthenticatedCustomer,
    api: web::Data<AddressApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET addresses for customer #{}", customer.id);
    let addresses = api.addresses_for(customer.id).await.map_err(|e| {
        debug!("💻️ Could not fetch addresses for customer #{}. {e}", customer.id);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(addresses))
}

route!(add_address => Post "/addresses" impl AddressManagement);
/// Saves a new address to the customer's book. The first address a customer saves becomes their default.
pub async fn add_address<B: AddressManagement>(
    customer: AuthenticatedCustomer,
    body: web::Json<NewAddress>,
    api: web::Data<AddressApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST address for customer #{}", customer.id);
    let address = api.create_address(customer.id, body.into_inner(), false).await.map_err(|e| {
        debug!("💻️ Could not save the address. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(address))
}

route!(delete_address => Delete "/addresses/{id}" impl AddressManagement);
/// Removes an address from the customer's book. The response says whether the row was deleted outright or only
/// unlinked because past orders still reference it.
pub async fn delete_address<B: AddressManagement>(
    customer: AuthenticatedCustomer,
    path: web::Path<i64>,
    api: web::Data<AddressApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let address_id = path.into_inner();
    debug!("💻️ DELETE address #{address_id} for customer #{}", customer.id);
    let outcome = api.delete_address(customer.id, address_id).await.map_err(|e| {
        debug!("💻️ Could not delete address #{address_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(set_default_address => Post "/addresses/{id}/default" impl AddressManagement);
pub async fn set_default_address<B: AddressManagement>(
    customer: AuthenticatedCustomer,
    path: web::Path<i64>,
    api: web::Data<AddressApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let address_id = path.into_inner();
    debug!("💻️ POST default address #{address_id} for customer #{}", customer.id);
    let address = api.set_default(customer.id, address_id).await.map_err(|e| {
        debug!("💻️ Could not set address #{address_id} as the default. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(address))
}

//----------------------------------------------   Customers  ----------------------------------------------------

route!(set_customer_approval => Post "/customers/{id}/approval" impl CustomerManagement where requires [Role::Admin]);
/// Approves (or un-approves) a customer for purchasing. Unapproved customers can browse and fill carts but cannot
/// check out.
pub async fn set_customer_approval<B: CustomerManagement>(
    path: web::Path<i64>,
    body: web::Json<ApprovalParams>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    let approved = body.approved;
    debug!("💻️ POST approval {approved} for customer #{customer_id}");
    let customer = api.set_approved(customer_id, approved).await.map_err(|e| {
        debug!("💻️ Could not set approval for customer #{customer_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(customer))
}

route!(set_customer_multiplier => Post "/customers/{id}/multiplier" impl CustomerManagement where requires [Role::Admin]);
/// Sets the customer's price multiplier. Applies to future pricing only; orders already placed keep their prices.
pub async fn set_customer_multiplier<B: CustomerManagement>(
    path: web::Path<i64>,
    body: web::Json<MultiplierParams>,
    api: web::Data<CustomerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    let multiplier = body.multiplier;
    debug!("💻️ POST multiplier {multiplier} for customer #{customer_id}");
    let customer = api.set_price_multiplier(customer_id, multiplier).await.map_err(|e| {
        debug!("💻️ Could not set the multiplier for customer #{customer_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(customer))
}

//----------------------------------------------   Draft carts  ----------------------------------------------------

route!(create_draft_cart => Post "/carts/draft" impl CheckoutDatabase where requires [Role::Admin]);
/// Opens an empty draft cart on behalf of a customer, for orders taken over the phone or by email.
pub async fn create_draft_cart<B: CheckoutDatabase>(
    body: web::Json<DraftCartParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = body.customer_id;
    debug!("💻️ POST draft cart for customer #{customer_id}");
    let cart = api.create_draft_cart(customer_id).await.map_err(|e| {
        debug!("💻️ Could not open a draft cart for customer #{customer_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_draft_cart_item => Post "/carts/{id}/items" impl CheckoutDatabase where requires [Role::Admin]);
pub async fn add_draft_cart_item<B: CheckoutDatabase>(
    path: web::Path<i64>,
    body: web::Json<NewCartItem>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart_id = path.into_inner();
    let item = body.into_inner();
    debug!("💻️ POST item to draft cart #{cart_id}: product #{} x{}", item.product_id, item.quantity);
    let cart = api.add_item_to_draft(cart_id, item).await.map_err(|e| {
        debug!("💻️ Could not add the item to draft cart #{cart_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(checkout_draft_cart => Post "/carts/{id}/checkout" impl CheckoutDatabase, SequenceSource where requires [Role::Admin]);
/// Checks out a draft cart on behalf of its customer, through the same pipeline as a self-serve checkout. The
/// order lands in the customer's history exactly as if they had placed it themselves.
pub async fn checkout_draft_cart<B: CheckoutDatabase, S: SequenceSource>(
    path: web::Path<i64>,
    body: web::Json<CheckoutParams>,
    api: web::Data<OrderFlowApi<B, S>>,
) -> Result<HttpResponse, ServerError> {
    let cart_id = path.into_inner();
    debug!("💻️ POST checkout for draft cart #{cart_id}");
    let request = CheckoutRequest::try_from(body.into_inner())?;
    let order = api.checkout_draft_cart(cart_id, request).await.map_err(|e| {
        debug!("💻️ Could not check out draft cart #{cart_id}. {e}");
        ServerError::from(e)
    })?;
    info!("🔄️ Draft cart #{cart_id} checked out as order {}", order.order.order_number);
    Ok(HttpResponse::Ok().json(order))
}
