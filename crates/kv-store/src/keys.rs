//! Names of the persisted blobs.

/// Logged-in vendor, `{name, loginTime}`; absent when logged out.
pub const VENDOR_SESSION: &str = "vendor-session";

/// Cart lines, `[{product, quantity}]`.
pub const CART_ITEMS: &str = "cart-items";

/// Customer name for the active cart, stored as a plain string.
pub const CUSTOMER_NAME: &str = "customer-name";

/// Delivery address for the active cart, stored as a plain string.
pub const CUSTOMER_ADDRESS: &str = "customer-address";

/// Full product array; only `id` and `stock` are read back.
pub const CATALOG_STOCK: &str = "catalog-stock";

/// Every finalized order, most recent first.
pub const ORDER_HISTORY: &str = "order-history";

/// Open orders, most recent first.
pub const PENDING_ORDERS: &str = "pending-orders";
