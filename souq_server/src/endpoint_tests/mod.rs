mod helpers;
mod mocks;

mod brands_and_orders;
mod finance;
mod paymob_callbacks;
mod returns;
