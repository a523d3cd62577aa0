pub mod crops;
pub mod recommend;
