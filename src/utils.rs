use tokio::io::{AsyncRead, AsyncWrite};

// Socket halves accepted by the connection processor, whether TCP or Unix.
// idea from https://github.com/rust-lang/rust/issues/41517#issuecomment-1140505957
pub trait GenericAsyncWriter: AsyncWrite + Unpin + Send + Sync + 'static {}

impl<T> GenericAsyncWriter for T where T: AsyncWrite + Unpin + Send + Sync + 'static {}

pub trait GenericAsyncReader: AsyncRead + Unpin + Send + Sync + 'static {}

impl<T> GenericAsyncReader for T where T: AsyncRead + Unpin + Send + Sync + 'static {}
