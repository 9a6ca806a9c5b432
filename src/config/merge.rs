use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, repo: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = repo {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Applies `REMAP_*` overrides read through `lookup`.
pub fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let value = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(url) = value("REMAP_UPSTREAM_URL") {
        config.upstream.url = Some(url);
    }

    if let Some(branch) = value("REMAP_UPSTREAM_BRANCH") {
        config.upstream.branch = branch;
    }

    if let Some(raw) = value("REMAP_MAX_COMMITS") {
        match raw.parse::<usize>() {
            Ok(max) => {
                config.sync.max_commits = max;
            }
            Err(err) => {
                tracing::warn!("invalid REMAP_MAX_COMMITS, ignoring: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn merge_layers_respects_precedence() {
        let mut user = ConfigLayer::default();
        user.upstream.branch = Some("1.20".into());
        user.sync.max_commits = Some(3);

        let mut repo = ConfigLayer::default();
        repo.upstream.branch = Some("1.21".into());

        let config = merge_layers(Some(user), Some(repo));
        assert_eq!(config.upstream.branch, "1.21");
        assert_eq!(config.sync.max_commits, 3);
        assert_eq!(config.sync.suffixes, [".java", ".accesswidener"]);
    }

    #[test]
    fn env_overrides_apply() {
        let lookup = env(&[
            ("REMAP_UPSTREAM_URL", "https://example.com/up.git"),
            ("REMAP_UPSTREAM_BRANCH", "1.21.4"),
            ("REMAP_MAX_COMMITS", "12"),
        ]);

        let mut config = Config::default();
        apply_overrides_from(&mut config, lookup);

        assert_eq!(config.upstream.url.as_deref(), Some("https://example.com/up.git"));
        assert_eq!(config.upstream.branch, "1.21.4");
        assert_eq!(config.sync.max_commits, 12);
    }

    #[test]
    fn invalid_env_value_is_ignored() {
        let mut config = Config::default();
        apply_overrides_from(&mut config, env(&[("REMAP_MAX_COMMITS", "many"), ("REMAP_UPSTREAM_URL", "  ")]));
        assert_eq!(config.upstream.url, None);
        assert_eq!(config.sync.max_commits, 1);
    }
}
