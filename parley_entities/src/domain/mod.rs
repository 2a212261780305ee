pub mod result;
pub mod event;
pub mod case;
