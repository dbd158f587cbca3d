use mockall::mock;
use petal_order_engine::{
    cart_objects::CartContents,
    db_types::{
        Address,
        Cart,
        CartItem,
        Customer,
        Money,
        NewAddress,
        NewCartItem,
        NewCustomer,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        PriceMultiplier,
        Role,
    },
    order_objects::{CompleteOrder, OrderQueryFilter, StatusChange},
    traits::{
        AddressApiError,
        AddressDeleteOutcome,
        AddressManagement,
        CartApiError,
        CartManagement,
        CheckoutDatabase,
        CheckoutError,
        CustomerApiError,
        CustomerManagement,
        OrderApiError,
        OrderManagement,
        ResolvedCheckout,
        SequenceError,
        SequenceSource,
    },
};

mock! {
    pub Backend {}

    impl Clone for Backend {
        fn clone(&self) -> Self;
    }

    impl CustomerManagement for Backend {
        async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerApiError>;
        async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError>;
        async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError>;
        async fn set_approved(&self, customer_id: i64, approved: bool) -> Result<Customer, CustomerApiError>;
        async fn set_price_multiplier(&self, customer_id: i64, multiplier: PriceMultiplier) -> Result<Customer, CustomerApiError>;
        async fn set_role(&self, customer_id: i64, role: Role) -> Result<Customer, CustomerApiError>;
    }

    impl CartManagement for Backend {
        async fn active_cart(&self, customer_id: i64) -> Result<Cart, CartApiError>;
        async fn create_draft_cart(&self, customer_id: i64) -> Result<Cart, CartApiError>;
        async fn fetch_cart(&self, cart_id: i64) -> Result<Option<Cart>, CartApiError>;
        async fn cart_contents(&self, cart_id: i64) -> Result<CartContents, CartApiError>;
        async fn upsert_cart_item(&self, cart_id: i64, item: NewCartItem) -> Result<CartItem, CartApiError>;
        async fn remove_cart_item(&self, cart_id: i64, item_id: i64) -> Result<(), CartApiError>;
    }

    impl AddressManagement for Backend {
        async fn insert_address(&self, customer_id: i64, address: NewAddress, is_default: bool) -> Result<Address, AddressApiError>;
        async fn insert_unowned_address(&self, address: NewAddress) -> Result<Address, AddressApiError>;
        async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, AddressApiError>;
        async fn addresses_for_customer(&self, customer_id: i64) -> Result<Vec<Address>, AddressApiError>;
        async fn delete_address(&self, address_id: i64, customer_id: i64) -> Result<AddressDeleteOutcome, AddressApiError>;
        async fn set_default_address(&self, address_id: i64, customer_id: i64) -> Result<Address, AddressApiError>;
    }

    impl OrderManagement for Backend {
        async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError>;
        async fn fetch_complete_order(&self, number: &OrderNumber) -> Result<Option<CompleteOrder>, OrderApiError>;
        async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;
    }

    impl CheckoutDatabase for Backend {
        fn url(&self) -> &str;
        async fn checkout_cart(&self, customer: &Customer, cart_id: i64, checkout: ResolvedCheckout) -> Result<CompleteOrder, CheckoutError>;
        async fn finalize_item_price(&self, number: &OrderNumber, item_id: i64, price: Money) -> Result<CompleteOrder, CheckoutError>;
        async fn update_order_status(&self, number: &OrderNumber, new_status: OrderStatusType) -> Result<StatusChange, CheckoutError>;
    }

    impl SequenceSource for Backend {
        async fn next_order_number(&self) -> Result<OrderNumber, SequenceError>;
    }
}
