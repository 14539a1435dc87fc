//! WireGuard config parsing and the on-disk config store

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, WgConfError};

/// A config ready to hand out, plus the key that unlocks it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfig {
    /// Config text with the private key inlined
    pub contents: String,
    /// The interface private key
    pub private_key: String,
}

/// Normalise a WireGuard config and extract its private key
///
/// `PrivateKeyFile=` is replaced by `PrivateKey=` with the file contents, so
/// the served config is self-contained. Only the first key line counts.
pub fn parse_config(input: &str) -> Result<ParsedConfig> {
    let mut contents = String::with_capacity(input.len());
    let mut private_key = String::new();
    let mut past_private_key = false;

    for line in input.split_inclusive('\n') {
        if line.starts_with("[Interface]") {
            contents.push_str("[Interface]\n");
            continue;
        }

        if !past_private_key && line.starts_with("PrivateKey") {
            if let Some((name, value)) = line.split_once('=') {
                match name.trim() {
                    "PrivateKey" => private_key = value.trim().to_string(),
                    "PrivateKeyFile" => {
                        private_key = fs::read_to_string(value.trim())?.trim().to_string();
                    }
                    _ => {
                        contents.push_str(line);
                        continue;
                    }
                }
                contents.push_str("PrivateKey=");
                contents.push_str(&private_key);
                contents.push('\n');
                past_private_key = true;
                continue;
            }
        }

        contents.push_str(line);
    }

    if contents.is_empty() || private_key.is_empty() {
        return Err(WgConfError::InvalidConfig);
    }

    Ok(ParsedConfig {
        contents,
        private_key,
    })
}

/// Configs indexed by host name, then config name
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    hosts: HashMap<String, HashMap<String, ParsedConfig>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: &str, name: &str, config: ParsedConfig) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .insert(name.to_string(), config);
    }

    pub fn host(&self, host: &str) -> Option<&HashMap<String, ParsedConfig>> {
        self.hosts.get(host)
    }

    pub fn get(&self, host: &str, name: &str) -> Option<&ParsedConfig> {
        self.hosts.get(host)?.get(name)
    }

    /// Total number of configs across hosts
    pub fn len(&self) -> usize {
        self.hosts.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `<host>-<name>` into its parts; `name` may itself contain `-`
fn split_config_name(stem: &str) -> Option<(&str, &str)> {
    stem.split_once('-')
}

/// Load every `<host>-<name>.conf` file at the top level of `dir`
///
/// Subdirectories are not descended into. Files that cannot be read or
/// parsed are skipped with a warning.
pub fn load_configs(dir: &Path) -> Result<ConfigStore> {
    let mut store = ConfigStore::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("conf") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some((host, name)) = split_config_name(stem) else {
            debug!("Ignoring {}: no host prefix", path.display());
            continue;
        };

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read config at {}: {}", path.display(), e);
                continue;
            }
        };

        match parse_config(&text) {
            Ok(parsed) => {
                debug!("Loaded config {} for host {}", name, host);
                store.insert(host, name, parsed);
            }
            Err(e) => warn!(
                "Failed to parse config at {} ({}), omitting this config",
                path.display(),
                e
            ),
        }
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_table() {
        let cases: [(&str, Option<(&str, &str)>); 4] = [
            ("", None),
            (
                "[Interface]\nPrivateKey=foobar\n",
                Some(("[Interface]\nPrivateKey=foobar\n", "foobar")),
            ),
            (
                "[Interface]\nPrivateKey=foobar\n\n[Peer]AllowedIPs=::1\n",
                Some(("[Interface]\nPrivateKey=foobar\n\n[Peer]AllowedIPs=::1\n", "foobar")),
            ),
            (
                "# some helpful comment\n[Interface]\nAddress=::1\nPrivateKey=foobar\n",
                Some((
                    "# some helpful comment\n[Interface]\nAddress=::1\nPrivateKey=foobar\n",
                    "foobar",
                )),
            ),
        ];

        for (input, expected) in cases {
            match (parse_config(input), expected) {
                (Ok(parsed), Some((contents, key))) => {
                    assert_eq!(parsed.contents, contents);
                    assert_eq!(parsed.private_key, key);
                }
                (Err(WgConfError::InvalidConfig), None) => {}
                (other, _) => panic!("unexpected result for {:?}: {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_parse_config_without_key() {
        let err = parse_config("[Interface]\nAddress=10.0.0.2/32\n").unwrap_err();
        assert!(matches!(err, WgConfError::InvalidConfig));
    }

    #[test]
    fn test_parse_config_normalises_spacing() {
        let input = "[Interface] # wg0\nPrivateKey = abc= \nListenPort = 51820";
        let parsed = parse_config(input).unwrap();
        assert_eq!(parsed.private_key, "abc=");
        assert_eq!(parsed.contents, "[Interface]\nPrivateKey=abc=\nListenPort = 51820");
    }

    #[test]
    fn test_parse_config_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("wg0.key");
        fs::write(&key_path, "c2VjcmV0\n").unwrap();

        let input = format!("[Interface]\nPrivateKeyFile={}\n", key_path.display());
        let parsed = parse_config(&input).unwrap();
        assert_eq!(parsed.private_key, "c2VjcmV0");
        assert_eq!(parsed.contents, "[Interface]\nPrivateKey=c2VjcmV0\n");
    }

    #[test]
    fn test_parse_config_missing_key_file() {
        let err = parse_config("[Interface]\nPrivateKeyFile=/nonexistent/wg0.key\n").unwrap_err();
        assert!(matches!(err, WgConfError::Io(_)));
    }

    #[test]
    fn test_only_first_key_counts() {
        let parsed = parse_config("[Interface]\nPrivateKey=first\nPrivateKey=second\n").unwrap();
        assert_eq!(parsed.private_key, "first");
        assert!(parsed.contents.ends_with("PrivateKey=second\n"));
    }

    #[test]
    fn test_split_config_name() {
        assert_eq!(split_config_name("laptop-home"), Some(("laptop", "home")));
        assert_eq!(split_config_name("laptop-home-v6"), Some(("laptop", "home-v6")));
        assert_eq!(split_config_name("laptop"), None);
    }

    #[test]
    fn test_load_configs() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, text: &str| fs::write(dir.path().join(name), text).unwrap();
        write("laptop-home.conf", "[Interface]\nPrivateKey=k1\n");
        write("laptop-road-warrior.conf", "[Interface]\nPrivateKey=k2\n");
        write("phone-home.conf", "[Interface]\nAddress=::2\n");
        write("nohost.conf", "[Interface]\nPrivateKey=k3\n");
        write("laptop-notes.txt", "[Interface]\nPrivateKey=k4\n");
        fs::create_dir(dir.path().join("archive-old.conf")).unwrap();

        let store = load_configs(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("laptop", "home").unwrap().private_key, "k1");
        assert_eq!(store.get("laptop", "road-warrior").unwrap().private_key, "k2");
        assert!(store.get("phone", "home").is_none());
        assert!(store.host("nohost").is_none());
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_configs(&dir.path().join("missing")).is_err());
    }
}
