mod shell;
mod tls;
pub(crate) mod utils;
