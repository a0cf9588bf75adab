use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset: our crate at `info`, chatty
/// HTTP client crates capped at `warn`.
const DEFAULT_DIRECTIVES: [&str; 4] = [
    "acrobot=info",
    "hyper=warn",
    "reqwest=warn",
    "teloxide=warn",
];

fn env_filter() -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return EnvFilter::from_default_env();
    }
    DEFAULT_DIRECTIVES
        .iter()
        .filter_map(|d| d.parse().ok())
        .fold(EnvFilter::default(), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(json: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for directive in DEFAULT_DIRECTIVES {
            assert!(
                directive.parse::<tracing_subscriber::filter::Directive>().is_ok(),
                "{directive}"
            );
        }
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
