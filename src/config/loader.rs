// Loads and validates the YAML tool source

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::settings::Config;

/// Load a tool config from a YAML file.
///
/// Structural validation only: YAML shape plus non-empty namespaces and
/// names. Argument-level problems are reported by the schema compiler when
/// the registry is built.
pub fn load(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    for tool in &config.tools {
        if tool.namespace.is_empty() {
            bail!("tool '{}' is missing a namespace", tool.name);
        }
        if tool.name.is_empty() {
            bail!("tool in namespace '{}' is missing a name", tool.namespace);
        }
        if tool.run.cmd.is_empty() {
            bail!("tool '{}' is missing run.cmd", tool.identity());
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
tools:
  - namespace: util
    name: echo
    description: echo message
    run:
      cmd: echo
      args: [\"{{ msg }}\"]
    input:
      - name: msg
        description: message
        type: string
        required: true
    output:
      format: text
";

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sample() {
        let file = write_config(SAMPLE);
        let config = load(file.path()).unwrap();
        assert_eq!(config.tools.len(), 1);

        let tool = &config.tools[0];
        assert_eq!(tool.identity(), "util/echo");
        assert_eq!(tool.run.cmd, "echo");
        assert_eq!(tool.run.args, vec!["{{ msg }}".to_string()]);
        assert_eq!(tool.input.len(), 1);
        assert!(tool.input[0].required);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load(Path::new("/nonexistent/tools.yaml")).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let file = write_config("tools: [not, a, tool]");
        assert!(load(file.path()).is_err());
    }

    #[test]
    fn test_load_empty_namespace() {
        let file = write_config(
            "tools:\n  - namespace: \"\"\n    name: echo\n    run:\n      cmd: echo\n",
        );
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("namespace"));
    }

    #[test]
    fn test_load_missing_cmd() {
        let file = write_config(
            "tools:\n  - namespace: util\n    name: echo\n    run:\n      cmd: \"\"\n",
        );
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("run.cmd"));
    }
}
