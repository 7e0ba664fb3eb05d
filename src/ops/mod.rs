pub(crate) mod color_replace;
pub(crate) mod operation;
