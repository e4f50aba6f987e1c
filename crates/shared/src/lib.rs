pub mod arrangement;
pub mod catalog;
pub mod domain;
pub mod draft;
pub mod error;
pub mod protocol;
pub mod record;
pub mod selection;
pub mod share;
