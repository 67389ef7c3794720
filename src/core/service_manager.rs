use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

const RESTART_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
#[error("{0}")]
pub struct Error(String);

impl Error {
    pub fn new(s: &str) -> Error {
        Error(s.to_string())
    }

    pub fn from<E: std::error::Error>(e: E) -> Self {
        Self(e.to_string())
    }
}

/// A long-running unit of the process. Failed services are rebuilt and restarted.
#[async_trait]
pub trait Service: Send + Sized + 'static {
    type Context: Clone + Send;
    const NAME: &'static str;
    async fn new(context: Self::Context) -> Result<Self, Error>;
    async fn run(self) -> Result<(), Error>;
}

pub struct ServiceManager<C> {
    context: C,
    services: JoinSet<()>,
    restart_delay: Duration,
}

impl<C> ServiceManager<C>
where
    C: 'static + Clone + Send,
{
    pub fn new(context: C) -> Self {
        Self {
            context,
            services: JoinSet::new(),
            restart_delay: RESTART_DELAY,
        }
    }

    pub fn with_restart_delay(mut self, restart_delay: Duration) -> Self {
        self.restart_delay = restart_delay;
        self
    }

    pub fn spawn<T: Service<Context = C>>(&mut self) {
        let context = self.context.clone();
        let restart_delay = self.restart_delay;
        self.services.spawn(async move {
            loop {
                let service = match T::new(context.clone()).await {
                    Ok(service) => service,
                    Err(e) => {
                        error!(service = T::NAME, error = %e, "Service failed to start");
                        tokio::time::sleep(restart_delay).await;
                        continue;
                    }
                };
                match service.run().await {
                    Ok(()) => {
                        info!(service = T::NAME, "Service stopped");
                        break;
                    }
                    Err(e) => {
                        error!(service = T::NAME, error = %e, "Service failed, restarting");
                        tokio::time::sleep(restart_delay).await;
                    }
                }
            }
        });
    }

    /// Resolves as soon as any service stops for good.
    pub async fn wait(&mut self) -> Result<(), Error> {
        if self.services.join_next().await.is_some() {
            return Err(Error::new("Internal Service Error"));
        }
        Ok(())
    }
}
