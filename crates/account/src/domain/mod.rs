pub mod entity;
pub mod one_time_token;
pub mod repository;
pub mod value_object;
