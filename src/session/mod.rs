pub(crate) mod opts;
pub(crate) mod service;
pub(crate) mod staged;
