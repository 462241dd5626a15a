pub mod relay;
pub mod serve;
pub mod slot;
pub mod slots;
