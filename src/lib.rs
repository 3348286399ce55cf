mod database {
    pub mod actions;
    pub mod error;
    pub mod pagination;
    pub mod schema;
    pub mod validate;
    pub mod views;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod constants;

mod media {
    pub mod images;
}

pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use media::images::*;
