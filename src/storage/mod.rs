//! External key-value secret store, consulted once at startup.

pub mod secrets;
