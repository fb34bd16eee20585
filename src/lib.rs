// Library for tests to access modules

pub mod config;
pub mod identity;
pub mod models;
pub mod routes;
pub mod snapshot_repo;
pub mod version;
pub mod worker;
