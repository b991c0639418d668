/// Gets the value of an environment variable, treating empty values as unset.
///
/// # Arguments
///
/// * `key` - The environment variable name to retrieve
///
/// # Returns
///
/// * `Option<String>` - The environment variable value if it exists and is not blank
pub fn get_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Gets the value of an environment variable and parses it.
///
/// Returns `None` when the variable is unset, blank, or fails to parse.
pub fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    get_env(key).and_then(|value| value.trim().parse::<T>().ok())
}
