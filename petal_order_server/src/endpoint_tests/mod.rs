mod addresses;
mod carts;
mod customers;
mod helpers;
mod mocks;
mod orders;
