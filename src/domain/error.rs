use thiserror::Error;

/// Malformed-request failures detected before any rendering work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("q (query) post parameter is missing!")]
    MissingQuery,
    #[error("Input format \"{0}\" is not recognized!")]
    UnknownInputFormat(String),
    #[error("Output format \"{0}\" is not recognized!")]
    UnknownOutputFormat(String),
    #[error(
        "Output format {format} is disabled via config, try setting \"{flag}: true\" to enable {format} rendering."
    )]
    DisabledOutput {
        format: &'static str,
        flag: &'static str,
    },
    #[error("{format} accepts only {accepted} as the input type, {given} given!")]
    IncompatibleInput {
        format: &'static str,
        accepted: &'static str,
        given: &'static str,
    },
    #[error("Output format {0} produces nothing with the current configuration.")]
    NothingToRender(&'static str),
}
