pub mod auth;
pub mod checklist;
pub mod config;
pub mod db;
pub mod error;
pub mod mailer;
pub mod models;
pub mod policy;
pub mod provider;
pub mod routes;
pub mod s3;
pub mod schema;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;
pub mod tags;
pub mod view;
