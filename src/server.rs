mod processor;
mod tcp;
mod unix;

use std::{fmt::Debug, sync::Arc};

use anyhow::Context;

use async_trait::async_trait;

use log::{debug, info};

use crate::{
    config::{ServerConfiguration, ServerType},
    connection::FastCGIConnectionIDFactory,
    handlers::Handlers,
    server::processor::ConnectionProcessor,
    utils::{GenericAsyncReader, GenericAsyncWriter},
};

/// A bound socket that yields split connections.
#[async_trait]
trait SocketListener: Send + Sync {
    type Reader: GenericAsyncReader;
    type Writer: GenericAsyncWriter;
    type Address: Debug + Send;

    fn local_address(&self) -> anyhow::Result<Self::Address>;

    async fn accept_split(
        &self,
    ) -> std::io::Result<((Self::Reader, Self::Writer), Self::Address)>;
}

pub struct Server {
    handlers: Arc<Handlers>,
    server_configuration: ServerConfiguration,
}

impl Server {
    pub fn new(handlers: Arc<Handlers>, server_configuration: &ServerConfiguration) -> Self {
        Self {
            handlers,
            server_configuration: server_configuration.clone(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let bind_address = self.server_configuration.bind_address();

        match self.server_configuration.server_type() {
            ServerType::TCP => self.accept_loop(tcp::bind(bind_address).await?).await,
            ServerType::UNIX => self.accept_loop(unix::bind(bind_address).await?).await,
        }
    }

    async fn accept_loop(&self, listener: impl SocketListener) -> anyhow::Result<()> {
        info!(
            "{:?} server listening on {:?}",
            self.server_configuration.server_type(),
            listener.local_address()?
        );

        let connection_id_factory = FastCGIConnectionIDFactory::new();

        loop {
            let (split_socket, address) = listener
                .accept_split()
                .await
                .context("establishing connection failed")?;

            let connection_id = connection_id_factory.new_connection_id();

            debug!("connection_id {:?} from {:?}", connection_id, address);

            ConnectionProcessor::new(
                connection_id,
                Arc::clone(&self.handlers),
                self.server_configuration.fastcgi_connection_configuration(),
            )
            .start(split_socket);
        }
    }
}
