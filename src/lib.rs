pub mod app;
pub mod config;
pub mod error;
pub mod hooks;
pub mod api {
    pub mod errors;
    pub mod hooks;
    pub mod search;
}
pub mod content {
    pub mod discovery;
    pub mod visibility;
}
pub mod db {
    pub mod models;
    pub mod repository;
    pub mod schema_repository;
    pub mod settings_repository;
}
pub mod rendering {
    pub mod links;
    pub mod markup;
    pub mod snippet;
}
pub mod search {
    pub mod client;
    pub mod indextank;
}
pub mod sync {
    pub mod service;
}
