pub mod cancel;
pub mod config;
pub mod design;
pub mod layout;
pub mod lighting;
