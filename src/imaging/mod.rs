pub(crate) mod bitmap;
pub(crate) mod codec;
pub(crate) mod color;
