pub mod cli;
pub mod client;
pub mod error;
pub mod form;
pub mod models;
pub mod poller;
pub mod view;
