use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Call once at startup, before the app builder runs. `RUST_LOG` overrides
/// the default directives.
pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stillmind=debug,sm_app=debug,sm_infra=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))?;
    Ok(())
}
