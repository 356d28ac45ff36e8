pub(crate) mod arena;
pub(crate) mod stream;

pub(crate) use stream::{lock, Stream};
