//! Middleware applied around every RPC route.

pub mod interceptor;

pub use interceptor::{admit, intercept, CallInfo, CONSUMER_HEADER};
