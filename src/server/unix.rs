use anyhow::Context;

use async_trait::async_trait;

use log::debug;

use tokio::net::{
    unix::{OwnedReadHalf, OwnedWriteHalf, SocketAddr},
    UnixListener,
};

pub(super) async fn bind(bind_address: &str) -> anyhow::Result<UnixListener> {
    // A stale socket file from a previous run blocks bind; it may also not exist.
    let remove_result = tokio::fs::remove_file(bind_address).await;
    debug!("remove {} result = {:?}", bind_address, remove_result);

    UnixListener::bind(bind_address)
        .with_context(|| format!("UnixListener::bind error path '{}'", bind_address))
}

#[async_trait]
impl super::SocketListener for UnixListener {
    type Reader = OwnedReadHalf;
    type Writer = OwnedWriteHalf;
    type Address = SocketAddr;

    fn local_address(&self) -> anyhow::Result<SocketAddr> {
        self.local_addr().context("local_addr error")
    }

    async fn accept_split(
        &self,
    ) -> std::io::Result<((OwnedReadHalf, OwnedWriteHalf), SocketAddr)> {
        let (stream, address) = self.accept().await?;
        Ok((stream.into_split(), address))
    }
}
