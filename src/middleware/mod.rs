pub mod cors;
pub mod request_id;
pub mod validation;

pub use cors::create_cors_layer;
pub use request_id::MakeRequestUuid;
pub use validation::ValidatedJson;
