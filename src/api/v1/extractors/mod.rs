pub mod principal;

pub use principal::{CurrentPrincipal, Principal};
