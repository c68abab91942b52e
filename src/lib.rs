// Step sync service: reads today's step counts from a local step source, uploads the
// day's running total to the steps API, and keeps the hourly and 30-day series that
// the local HTTP surface displays.
pub mod authtoken;
pub mod client;
pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod source;
pub mod store;
pub mod timing;
pub mod types;
pub mod util;
pub mod viewmodel;
