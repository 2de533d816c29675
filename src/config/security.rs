use crate::errors::CensusError;

/// Key fragments that indicate a credential was pasted into the config file.
/// Credentials come from each provider's standard chain, never from this file.
const SECRET_KEY_PATTERNS: &[&str] = &[
    "access_key",
    "secret",
    "password",
    "token",
    "private_key",
    "credentials",
    "api_key",
];

pub fn reject_inline_secrets(value: &serde_yaml::Value) -> Result<(), CensusError> {
    check_value(value, &[])
}

fn check_value(value: &serde_yaml::Value, path: &[String]) -> Result<(), CensusError> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = k.as_str().unwrap_or("unknown").to_string();
                let lower = key.to_lowercase();
                let mut new_path = path.to_vec();
                new_path.push(key);
                if let Some(pattern) = SECRET_KEY_PATTERNS.iter().find(|p| lower.contains(*p)) {
                    return Err(CensusError::Config(format!(
                        "Credential-like key '{}' found at config path: {}; use the provider's credential chain instead",
                        pattern,
                        new_path.join(".")
                    )));
                }
                check_value(v, &new_path)?;
            }
            Ok(())
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let mut new_path = path.to_vec();
                new_path.push(format!("[{}]", i));
                check_value(v, &new_path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
