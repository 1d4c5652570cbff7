pub mod bootstrap;
pub mod security;
