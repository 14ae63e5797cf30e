use std::net::SocketAddr;

use anyhow::Context;

use async_trait::async_trait;

use tokio::net::{
    tcp::{OwnedReadHalf, OwnedWriteHalf},
    TcpListener,
};

pub(super) async fn bind(bind_address: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("TcpListener::bind error bind_address '{}'", bind_address))
}

#[async_trait]
impl super::SocketListener for TcpListener {
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
