use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Invalid configuration: {0}")]
    Config(String),
}
