pub mod cart_items;
pub mod inventory;
pub mod order_items;
pub mod orders;
pub mod shopping_carts;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use inventory::Entity as Inventory;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use shopping_carts::Entity as ShoppingCarts;
pub use users::Entity as Users;
