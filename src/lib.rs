//! research-agent library
//!
//! Query -> web search -> page fetch -> LLM summary -> JSON stores.

pub mod agent;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

/// Initialize logging. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_agent=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Longest prefix of `s` that is at most `max_bytes` long and ends on a char boundary
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
