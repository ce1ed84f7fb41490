pub mod auth;
pub mod convenios;
pub mod users;
