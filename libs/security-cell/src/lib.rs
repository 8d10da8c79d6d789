// =====================================================================================
// SECURITY CELL - AUTHORIZATION GATE & CREDENTIAL HANDLING
// =====================================================================================
//
// - Declarative role x action x ownership policy consulted by every endpoint
// - Argon2 password hashing for the identity directory
//
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{Action, Decision, Ownership, PolicyRule, Requirement, SecurityError};
pub use services::{AccessPolicy, PasswordSecurityService, POLICY};
