//! Business logic services for the admin panel.
//!
//! # Services
//!
//! - `activity` - Audit trail recording that never fails the caller
//! - `auth` - Username/password authentication (Argon2id)
//! - `mail` - Email delivery via SMTP
//! - `settings` - Cached key-value site settings and the options table
//! - `storage` - Filesystem storage for accepted uploads
//! - `upload` - Image upload screening

pub mod activity;
pub mod auth;
pub mod mail;
pub mod settings;
pub mod storage;
pub mod upload;

pub use activity::ActivityLogger;
pub use auth::{AdminAuthError, AdminAuthService};
pub use mail::{MailError, MailHeaders, MailService};
pub use settings::{SettingValue, SettingsError, SettingsStore};
pub use storage::UploadStorage;
pub use upload::{AcceptedFile, UploadDirectory, UploadRejection, UploadValidator, UploadedFile};
