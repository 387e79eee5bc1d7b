use std::{path::PathBuf, time::Duration};

use url::Url;

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Configuration of the garage gateway.
pub struct Config {
    /// Initial contents of the store
    pub store: StoreConfig,
    /// The service `carAPI` pulls its record from. Without it, `carAPI` fails.
    pub data_source: Option<DataSourceConfig>,
    /// Services making up the served schema
    pub schema: SchemaConfig,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON file with the `cars` and `parts` to start from. Defaults to the built-in records.
    pub seed_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    /// Base URL, resources are fetched from `<url>/<resource key>`.
    pub url: Url,
    /// Timeout for a single fetch. No timeout by default.
    #[serde(default, deserialize_with = "duration_str::deserialize_option_duration")]
    pub timeout: Option<Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Merge the dealership schema into the car schema.
    pub dealership: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self { dealership: true }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use indoc::indoc;

    use super::*;

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(None, config.store.seed_path);
        assert_eq!(None, config.data_source);
        assert!(config.schema.dealership);
        assert_eq!(Config::default(), config);
    }

    #[test]
    fn store_values() {
        let input = indoc! {r#"
            [store]
            seed_path = "./seed.json"
        "#};

        let config: Config = toml::from_str(input).unwrap();

        assert_eq!(Some(Path::new("./seed.json")), config.store.seed_path.as_deref());
    }

    #[test]
    fn data_source_values() {
        let input = indoc! {r#"
            [data_source]
            url = "http://localhost:3000/api"
            timeout = "2s"
        "#};

        let config: Config = toml::from_str(input).unwrap();
        let data_source = config.data_source.unwrap();

        assert_eq!("http://localhost:3000/api", data_source.url.as_str());
        assert_eq!(Some(Duration::from_secs(2)), data_source.timeout);
    }

    #[test]
    fn data_source_without_timeout() {
        let input = indoc! {r#"
            [data_source]
            url = "http://localhost:3000"
        "#};

        let config: Config = toml::from_str(input).unwrap();

        assert_eq!(None, config.data_source.unwrap().timeout);
    }

    #[test]
    fn data_source_requires_a_url() {
        let input = indoc! {r#"
            [data_source]
            timeout = "2s"
        "#};

        let error = toml::from_str::<Config>(input).unwrap_err();

        assert!(error.to_string().contains("missing field `url`"), "{error}");
    }

    #[test]
    fn invalid_url() {
        let input = indoc! {r#"
            [data_source]
            url = "not a url"
        "#};

        assert!(toml::from_str::<Config>(input).is_err());
    }

    #[test]
    fn schema_values() {
        let input = indoc! {r#"
            [schema]
            dealership = false
        "#};

        let config: Config = toml::from_str(input).unwrap();

        assert!(!config.schema.dealership);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let input = indoc! {r#"
            [store]
            seed = "./seed.json"
        "#};

        let error = toml::from_str::<Config>(input).unwrap_err();

        assert!(error.to_string().contains("unknown field `seed`"), "{error}");
    }
}
