pub mod api_response;
pub mod app;
pub mod data_layer_error;
pub mod extractors;
pub mod settings;

pub mod middleware {
    pub mod auth_middleware;
}

pub mod routes {
    pub mod user_routes;
    pub mod note_routes;
}

pub mod services {
    pub mod token_service;
    pub mod account_service;
    pub mod note_service;
}
