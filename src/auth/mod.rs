//! Authentication module for wicket.
//!
//! This module provides password hashing and account registration.

mod password;
mod registration;

pub use password::{hash_password, verify_password, PasswordError};
pub use registration::{register, register_with_role, RegistrationError};
