//! Client core for the BaseApp REST backend: session lifecycle, user
//! management API, local persistence and screen view-models.

pub mod api;
pub mod config;
pub mod models;
pub mod router;
pub mod session;
pub mod storage;
pub mod theme;
pub mod viewmodels;
