use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::recognition::OllamaConfig;
use crate::schedule::{DEFAULT_CONTEXT_LINES, ParserOptions};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub ollama: OllamaConfig,
    pub parser: ParserOptions,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let bind_addr = parse_bind_addr(
            &env::var("TOCAL_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        )?;
        let context_lines = match env::var("TOCAL_CONTEXT_LINES") {
            Ok(raw) => parse_context_lines(&raw)?,
            Err(_) => DEFAULT_CONTEXT_LINES,
        };

        Ok(Self {
            bind_addr,
            ollama: OllamaConfig::new_from_env()?,
            parser: ParserOptions { context_lines },
        })
    }
}

fn parse_bind_addr(raw: &str) -> Result<SocketAddr, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("TOCAL_ADDR '{}' is invalid: {}", raw, e)))
}

fn parse_context_lines(raw: &str) -> Result<usize, AppError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(AppError::Config(format!(
            "TOCAL_CONTEXT_LINES must be a positive integer, got '{}'",
            raw
        ))),
    }
}
