//! Document loading: turns a namespace [`Url`] into a parsed
//! [`serde_json::Value`], dispatching on scheme (`file`, `http(s)`,
//! `data://Module/Name`) and sniffing JSON vs. YAML bodies.
mod http;

use crate::{config::Configuration, error::CompilationError, resolver::DocumentStore};
use ahash::AHashMap;
use serde_json::Value;
use std::{fs, rc::Rc};
use url::Url;

pub(crate) struct Loader<'a> {
    config: &'a Configuration,
    cache: AHashMap<Url, Rc<Value>>,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(config: &'a Configuration) -> Self {
        Loader {
            config,
            cache: AHashMap::new(),
        }
    }

    fn fetch(&self, namespace: &Url) -> Result<String, CompilationError> {
        match namespace.scheme() {
            "file" => {
                let path = namespace
                    .to_file_path()
                    .map_err(|()| CompilationError::Load {
                        url: namespace.to_string(),
                        cause: anyhow::anyhow!("not a valid file path"),
                    })?;
                fs::read_to_string(&path).map_err(|err| CompilationError::Load {
                    url: namespace.to_string(),
                    cause: anyhow::anyhow!(err),
                })
            }
            "http" | "https" => {
                if let Some(dir) = &self.config.cache_dir {
                    if let Some(cached) = http::read(dir, namespace) {
                        return Ok(cached);
                    }
                }
                let client = self.config.http_client.as_ref().ok_or_else(|| CompilationError::Load {
                    url: namespace.to_string(),
                    cause: anyhow::anyhow!("no HTTP client is configured to resolve remote references"),
                })?;
                let body = client.fetch(namespace).map_err(|cause| CompilationError::Load {
                    url: namespace.to_string(),
                    cause,
                })?;
                if let Some(dir) = &self.config.cache_dir {
                    http::write(dir, namespace, &body);
                }
                Ok(body)
            }
            "data" => {
                let module = namespace.host_str().unwrap_or_default();
                let name = namespace.path().trim_start_matches('/');
                self.config
                    .embedded
                    .get(module, name)
                    .map(str::to_string)
                    .ok_or_else(|| CompilationError::Load {
                        url: namespace.to_string(),
                        cause: anyhow::anyhow!("no embedded resource registered under '{}/{}'", module, name),
                    })
            }
            "mem" => Err(CompilationError::Load {
                url: namespace.to_string(),
                cause: anyhow::anyhow!("'mem://' namespaces only exist in-process and cannot be fetched"),
            }),
            other => Err(CompilationError::Load {
                url: namespace.to_string(),
                cause: anyhow::anyhow!("unsupported scheme '{}'", other),
            }),
        }
    }

    fn parse(&self, body: &str, namespace: &Url) -> Result<Value, CompilationError> {
        let first_non_whitespace = body.trim_start().chars().next();
        match first_non_whitespace {
            Some('{') | Some('[') => serde_json::from_str(body).map_err(|err| CompilationError::Load {
                url: namespace.to_string(),
                cause: anyhow::anyhow!(err),
            }),
            _ => parse_yaml(body, namespace),
        }
    }
}

#[cfg(feature = "yaml")]
fn parse_yaml(body: &str, namespace: &Url) -> Result<Value, CompilationError> {
    serde_yaml::from_str(body).map_err(|err| CompilationError::Load {
        url: namespace.to_string(),
        cause: anyhow::anyhow!(err),
    })
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(_body: &str, _namespace: &Url) -> Result<Value, CompilationError> {
    Err(CompilationError::YamlBackendMissing)
}

impl DocumentStore for Loader<'_> {
    fn get(&mut self, namespace: &Url) -> Result<Rc<Value>, CompilationError> {
        if let Some(doc) = self.cache.get(namespace) {
            return Ok(Rc::clone(doc));
        }
        let body = self.fetch(namespace)?;
        let value = self.parse(&body, namespace)?;
        let rc = Rc::new(value);
        self.cache.insert(namespace.clone(), Rc::clone(&rc));
        Ok(rc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_scheme_reads_from_the_embedded_registry() {
        let mut embedded = crate::config::EmbeddedResources::new();
        embedded.register("common", "address", r#"{"type": "object"}"#);
        let config = Configuration::new().with_embedded_resources(embedded);
        let loader = Loader::new(&config);
        let namespace = Url::parse("data://common/address").unwrap();
        let body = loader.fetch(&namespace).expect("registered resource resolves");
        assert_eq!(body, r#"{"type": "object"}"#);
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let config = Configuration::new();
        let loader = Loader::new(&config);
        let namespace = Url::parse("ftp://example.com/schema.json").unwrap();
        assert!(loader.fetch(&namespace).is_err());
    }

    #[test]
    fn sniffs_yaml_when_body_does_not_start_with_brace_or_bracket() {
        let config = Configuration::new();
        let loader = Loader::new(&config);
        let namespace = Url::parse("mem://doc").unwrap();
        let value = loader.parse("type: string\n", &namespace).expect("parses as yaml");
        assert_eq!(value, serde_json::json!({"type": "string"}));
    }
}
