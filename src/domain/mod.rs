pub mod errors;
pub mod flows;
pub mod highlight;
pub mod models;
pub mod schema;
pub mod template;
pub mod types;
