pub mod auth;
pub mod create;
pub mod init;
pub mod preview;
pub mod serve;
pub mod validate;

/// Printed when the user has to grant access in a browser.
pub(crate) fn show_consent_url(url: &str) {
    eprintln!("Please visit this URL to authorize this application:\n{url}");
}
