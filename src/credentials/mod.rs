/// Credential protection
///
/// - `vault`: authenticated encryption of secret payloads into persisted tokens
/// - `store`: SQLite storage of named tokens and the `CredentialProvider` seam
///   the execution engine uses to hand secrets to steps

mod error;
pub mod store;
pub mod vault;

pub use error::{CredentialError, CredentialResult};
pub use store::{CredentialProvider, CredentialStore};
pub use vault::CredentialVault;
