//! Credential lookup.
//!
//! Credentials for a hub can come from an environment variable, inline
//! configuration values, or a credentials file, tried in that order. The
//! template configuration ships angle-bracket placeholders; those never count
//! as real credentials.

use std::env;
use std::fs;

use crate::config::{Config, HubAuth};
use crate::hub::Hub;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Resolves credentials for the given hub, or `None` when every source is
/// exhausted. Callers treat `None` as a fatal precondition failure before
/// any request goes out.
pub fn get_credentials(config: &Config, hub: Hub) -> Option<Credentials> {
    let auth = match hub {
        Hub::Copernicus => config.auth.copernicus.as_ref()?,
        Hub::Eumetsat => config.auth.eumetsat.as_ref()?,
    };
    from_env(auth)
        .or_else(|| from_inline(auth))
        .or_else(|| from_file(auth))
}

fn from_env(auth: &HubAuth) -> Option<Credentials> {
    let var = auth.env.as_ref()?;
    parse_pair(&env::var(var).ok()?)
}

fn from_inline(auth: &HubAuth) -> Option<Credentials> {
    let user = auth.user.as_deref().filter(|v| !is_placeholder(v))?;
    let password = auth.password.as_deref().filter(|v| !is_placeholder(v))?;
    Some(Credentials {
        user: user.to_string(),
        password: password.to_string(),
    })
}

fn from_file(auth: &HubAuth) -> Option<Credentials> {
    let path = auth.file.as_ref()?;
    if is_placeholder(&path.to_string_lossy()) {
        return None;
    }
    parse_pair(&fs::read_to_string(path).ok()?)
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with('<') && value.ends_with('>')
}

fn parse_pair(value: &str) -> Option<Credentials> {
    let (user, password) = value.trim().split_once(':')?;
    Some(Credentials {
        user: user.to_string(),
        password: password.to_string(),
    })
}
