pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod executable_utils;
pub mod loyalty;
pub mod model;
pub mod notify;
pub mod orders;
pub mod payment;
pub mod storage;
pub mod validation;
