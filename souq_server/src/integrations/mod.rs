pub mod paymob;
