use std::env;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the named variable parsed as a port number, or the default
/// if the variable is not set.
pub fn get_port(name: &str, default: u16) -> u16 {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("parse {} as u16", name)),
        Err(_) => default,
    }
}
