mod claims;
pub(crate) mod extractors;

#[cfg(test)]
pub use claims::Claims;
pub use extractors::AuthUser;
