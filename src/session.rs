use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::SessionError;

const TOKEN_COOKIE: &str = "token";

/// Extracts the bearer token from a `name=value; name=value` cookie string.
///
/// Only the text between `token=` and the next `=` is returned. An empty
/// value is treated as absent.
pub fn token_from_cookies(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .find(|row| row.starts_with("token="))
        .and_then(|row| row.split('=').nth(1))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Replaces (or appends) the `token` entry in a cookie string.
pub fn with_token(cookies: &str, token: &str) -> String {
    let mut rows = other_cookies(cookies);
    rows.push(format!("{}={}", TOKEN_COOKIE, token));
    rows.join("; ")
}

/// Drops the `token` entry, keeping every other cookie.
pub fn without_token(cookies: &str) -> String {
    other_cookies(cookies).join("; ")
}

fn other_cookies(cookies: &str) -> Vec<String> {
    cookies
        .split(';')
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .filter(|row| row.split('=').next() != Some(TOKEN_COOKIE))
        .map(str::to_string)
        .collect()
}

/// Cookie string persisted between runs, optionally overridden from the environment.
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
    overridden: Option<String>,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>, overridden: Option<String>) -> Self {
        CookieStore {
            path: path.into(),
            overridden,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw cookie string. A missing file is an empty jar.
    pub fn load(&self) -> Result<String, SessionError> {
        if let Some(cookies) = &self.overridden {
            return Ok(cookies.clone());
        }
        Ok(self.read_file()?.trim().to_string())
    }

    /// Current bearer token; read errors are logged and treated as no token.
    pub fn token(&self) -> Option<String> {
        match self.load() {
            Ok(cookies) => token_from_cookies(&cookies),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> Result<(), SessionError> {
        let current = self.read_file()?;
        self.write_file(&with_token(&current, token))?;
        log::info!("Stored session token in {}", self.path.display());
        Ok(())
    }

    /// Removes the stored token. Returns whether one was present.
    pub fn clear_token(&self) -> Result<bool, SessionError> {
        let current = self.read_file()?;
        let has_token = current
            .split(';')
            .any(|row| row.trim().split('=').next() == Some(TOKEN_COOKIE));
        if !has_token {
            return Ok(false);
        }
        self.write_file(&without_token(&current))?;
        log::info!("Cleared session token in {}", self.path.display());
        Ok(true)
    }

    fn read_file(&self) -> Result<String, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(SessionError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_file(&self, cookies: &str) -> Result<(), SessionError> {
        let write_err = |source| SessionError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, cookies).map_err(write_err)
    }
}
