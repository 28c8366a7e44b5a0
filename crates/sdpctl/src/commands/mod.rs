//! Command handlers, one module per subcommand.

pub mod login;
pub mod validate;
pub mod versions;
