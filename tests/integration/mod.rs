//! Integration tests for Portus API endpoints

mod health;
mod models;
mod proxy;
