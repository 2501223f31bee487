//! Router Module Index
//!
//! Organizes the routing into access-segregated modules. Access control is applied at
//! the module level through route layers, never inside handlers.

/// Routes open to anonymous visitors: health, login and refresh.
pub mod public;

/// Routes requiring any authenticated identity.
pub mod authenticated;

/// Routes restricted to vendors (and admins).
pub mod vendor;

/// Routes restricted to admins.
pub mod admin;
