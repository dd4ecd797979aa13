//! Peer set configuration

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Resolve the peer list from `--peers` and/or `--peers-file`
///
/// The file holds a JSON array of peer ids. Entries are trimmed, empty ones
/// dropped, and duplicates removed (a peer registered twice would get twice
/// its share of the ring).
pub fn load_peers(inline: Option<&str>, file: Option<&Path>) -> Result<Vec<String>> {
    let mut peers = Vec::new();

    if let Some(inline) = inline {
        peers.extend(inline.split(',').map(str::to_string));
    }

    if let Some(path) = file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading peers file {}", path.display()))?;
        let listed: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing peers file {}", path.display()))?;
        peers.extend(listed);
    }

    let mut seen = std::collections::HashSet::new();
    let peers: Vec<String> = peers
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.clone()))
        .collect();

    if peers.is_empty() {
        bail!("no peers given; use --peers or --peers-file");
    }

    Ok(peers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_inline_peers() {
        let peers = load_peers(Some("a, b,,c,a"), None).unwrap();
        assert_eq!(peers, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_peers_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["http://10.0.0.1:8001", "http://10.0.0.2:8001"]"#).unwrap();

        let peers = load_peers(Some("http://10.0.0.1:8001"), Some(file.path())).unwrap();
        assert_eq!(peers, vec!["http://10.0.0.1:8001", "http://10.0.0.2:8001"]);
    }

    #[test]
    fn test_bad_peers_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(load_peers(None, Some(file.path())).is_err());
    }

    #[test]
    fn test_no_peers() {
        assert!(load_peers(None, None).is_err());
        assert!(load_peers(Some(" , "), None).is_err());
    }
}
