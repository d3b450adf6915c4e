//! Subcommand implementations

use anyhow::{bail, Context, Result};
use clap::Args;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vista_config::{ConfigService, ConfigUpdate};
use vista_locator::{absolutize, is_absolute, parse_base, parse_locator_list};
use vista_probe::HttpProber;
use vista_resolver::{BatchOptions, BatchResolver};

/// Arguments for `vista resolve`
#[derive(Args, Debug)]
pub(crate) struct ResolveArgs {
    /// Entity the images depict (enables placeholder fallbacks)
    #[arg(long)]
    pub(crate) entity: Option<String>,

    /// Server whose root relative locators resolve against
    #[arg(long)]
    pub(crate) base: Option<String>,

    /// Resolutions in flight at once (defaults to maxConcurrent)
    #[arg(long)]
    pub(crate) concurrency: Option<NonZeroUsize>,

    /// TOML file merged over the environment configuration
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Raw locator list: JSON array or comma-separated
    #[arg(long)]
    pub(crate) list: Option<String>,

    /// Locators to resolve
    pub(crate) locators: Vec<String>,
}

/// Build the config service: environment, then the optional TOML file
fn load_config(path: Option<&Path>) -> Result<Arc<ConfigService>> {
    let service = ConfigService::from_env();
    if let Some(path) = path {
        let update = ConfigUpdate::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        service.update(update);
    }
    Ok(Arc::new(service))
}

/// Gather locators from `--list` and positionals, rooted at the `--base` server
fn collect_locators(args: &ResolveArgs) -> Result<Vec<String>> {
    let mut raw = args
        .list
        .as_deref()
        .map(parse_locator_list)
        .unwrap_or_default();
    raw.extend(
        args.locators
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
    );

    let base = args.base.as_deref().map(parse_base).transpose()?;
    raw.into_iter()
        .map(|locator| match &base {
            Some(base) => Ok(absolutize(base, &locator)?),
            None if is_absolute(&locator) => Ok(locator),
            None => bail!("relative locator {locator:?} needs --base"),
        })
        .collect()
}

pub(crate) async fn resolve(args: ResolveArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let locators = collect_locators(&args)?;
    if locators.is_empty() {
        tracing::warn!("no locators given");
    }

    let prober = HttpProber::new().context("failed to build HTTP client")?;
    let resolver = BatchResolver::with_prober(config, Arc::new(prober));

    let mut options =
        BatchOptions::new().with_progress(|percent| tracing::debug!(percent, "progress"));
    if let Some(limit) = args.concurrency {
        options = options.with_concurrency_limit(limit.get());
    }

    let report = resolver
        .resolve_batch(&locators, args.entity.as_deref(), options)
        .await;

    tracing::debug!(stats = ?resolver.cache().stats(), "cache stats");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) fn show_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    println!("{}", config.export_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn args(list: Option<&str>, base: Option<&str>, locators: &[&str]) -> ResolveArgs {
        ResolveArgs {
            entity: None,
            base: base.map(str::to_string),
            concurrency: None,
            config: None,
            list: list.map(str::to_string),
            locators: locators.iter().map(|l| (*l).to_string()).collect(),
        }
    }

    #[test]
    fn list_and_positionals_are_combined() {
        let locators = collect_locators(&args(
            Some("https://a.example/1.jpg, https://a.example/2.jpg"),
            None,
            &["https://a.example/3.jpg"],
        ))
        .unwrap();
        assert_eq!(
            locators,
            vec![
                "https://a.example/1.jpg",
                "https://a.example/2.jpg",
                "https://a.example/3.jpg"
            ]
        );
    }

    #[test]
    fn relative_locators_are_rooted_at_base_server() {
        let locators = collect_locators(&args(
            None,
            Some("https://site.example/tour/"),
            &["img/a.jpg", "/image/hall/1.jpg"],
        ))
        .unwrap();
        assert_eq!(
            locators,
            vec![
                "https://site.example/img/a.jpg",
                "https://site.example/api/v1/test-image/hall/1.jpg"
            ]
        );
    }

    #[test]
    fn relative_without_base_is_an_error() {
        let err = collect_locators(&args(None, None, &["img/a.jpg"])).unwrap_err();
        assert!(err.to_string().contains("--base"));
    }

    #[test]
    fn invalid_base_is_an_error() {
        assert!(collect_locators(&args(None, Some("not a url"), &["a.jpg"])).is_err());
    }

    #[test]
    fn config_file_is_merged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "maxConcurrent = 7\nproxyEndpoints = [\"https://p.example/?u=\"]").unwrap();

        let service = load_config(Some(file.path())).unwrap();
        let config = service.config();
        assert_eq!(config.max_concurrent, 7);
        assert_eq!(config.proxy_endpoints, vec!["https://p.example/?u="]);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/vista.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
