/// Environment variable utilities.
pub mod env;

/// Human readable formatting of addresses, values, gas, and timestamps.
pub mod fmt;

/// HTTP request and response handling utilities.
pub mod http;

/// Plain text grid tables.
pub mod table;
