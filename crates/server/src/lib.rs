pub mod config;
pub mod cors;
pub mod db;
pub mod error_convert;
pub mod health;
pub mod openapi;
pub mod repo;
pub mod rest;
pub mod storage;
pub mod telemetry;
