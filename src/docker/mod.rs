//! Container-engine client.
//!
//! Every call goes straight to the daemon; nothing is cached here. The
//! [`DockerBridge`] trait is the seam between our code and bollard so the
//! handlers and the status poller can run against a fake engine in tests.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{
    ContainerCreateResponse, ContainerSummary, CreateImageInfo, HostConfig, PortBinding,
};
use bollard::Docker;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::DatabaseKind;

#[cfg(test)]
pub(crate) mod testing;

pub type ImageStream = Pin<Box<dyn Stream<Item = Result<CreateImageInfo, DockerError>> + Send>>;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("{0}")]
    Engine(#[from] DockerError),
    #[error("Failed to pull image {image}: {source}")]
    Pull {
        image: String,
        #[source]
        source: DockerError,
    },
}

#[async_trait]
pub trait DockerBridge: Send + Sync {
    async fn ping(&self) -> Result<(), DockerError>;
    fn create_image_stream(&self, options: Option<CreateImageOptions<String>>) -> ImageStream;
    async fn create_container(
        &self,
        options: Option<CreateContainerOptions<String>>,
        config: Config<String>,
    ) -> Result<ContainerCreateResponse, DockerError>;
    async fn start_container(&self, id: &str) -> Result<(), DockerError>;
    async fn stop_container(
        &self,
        id: &str,
        options: Option<StopContainerOptions>,
    ) -> Result<(), DockerError>;
    async fn remove_container(
        &self,
        id: &str,
        options: Option<RemoveContainerOptions>,
    ) -> Result<(), DockerError>;
    async fn list_containers(
        &self,
        options: Option<ListContainersOptions<String>>,
    ) -> Result<Vec<ContainerSummary>, DockerError>;
}

#[derive(Clone)]
struct BollardBridge {
    docker: Docker,
}

#[async_trait]
impl DockerBridge for BollardBridge {
    async fn ping(&self) -> Result<(), DockerError> {
        self.docker.ping().await.map(|_| ())
    }

    fn create_image_stream(&self, options: Option<CreateImageOptions<String>>) -> ImageStream {
        self.docker.create_image(options, None, None).boxed()
    }

    async fn create_container(
        &self,
        options: Option<CreateContainerOptions<String>>,
        config: Config<String>,
    ) -> Result<ContainerCreateResponse, DockerError> {
        self.docker.create_container(options, config).await
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
    }

    async fn stop_container(
        &self,
        id: &str,
        options: Option<StopContainerOptions>,
    ) -> Result<(), DockerError> {
        self.docker.stop_container(id, options).await
    }

    async fn remove_container(
        &self,
        id: &str,
        options: Option<RemoveContainerOptions>,
    ) -> Result<(), DockerError> {
        self.docker.remove_container(id, options).await
    }

    async fn list_containers(
        &self,
        options: Option<ListContainersOptions<String>>,
    ) -> Result<Vec<ContainerSummary>, DockerError> {
        self.docker.list_containers(options).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedContainer {
    pub id: String,
    pub name: String,
}

#[derive(Clone)]
pub struct DockerClient {
    docker: Arc<dyn DockerBridge>,
    stop_timeout_secs: i64,
}

impl DockerClient {
    pub fn with_bridge(docker: impl DockerBridge + 'static, stop_timeout_secs: i64) -> Self {
        Self {
            docker: Arc::new(docker),
            stop_timeout_secs,
        }
    }

    /// Connects to the local daemon (honours `DOCKER_HOST`) and pings it once.
    pub async fn connect(stop_timeout_secs: i64) -> Result<Self, ContainerError> {
        let docker = Docker::connect_with_local_defaults()?;
        let client = Self::with_bridge(BollardBridge { docker }, stop_timeout_secs);
        client.docker.ping().await?;
        info!("Connected to Docker daemon");
        Ok(client)
    }

    /// Pulls `image` and waits for the progress stream to finish. The first
    /// error reported by the stream fails the pull.
    pub async fn pull_image(&self, image: &str) -> Result<(), ContainerError> {
        info!(image = %image, "Checking for image");

        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.create_image_stream(Some(options));

        while let Some(result) = stream.next().await {
            match result {
                Ok(progress) => {
                    if let Some(status) = progress.status {
                        debug!(image = %image, status = %status, "Pull progress");
                    }
                }
                Err(source) => {
                    return Err(ContainerError::Pull {
                        image: image.to_string(),
                        source,
                    });
                }
            }
        }

        info!(image = %image, "Image ready");
        Ok(())
    }

    /// Pull, create and start a container for `kind`, publishing its default
    /// port on `host_port`. A container created but failing to start is left
    /// in place.
    pub async fn launch(
        &self,
        kind: DatabaseKind,
        host_port: u16,
        password: &str,
    ) -> Result<LaunchedContainer, ContainerError> {
        let image = kind.image();
        self.pull_image(image).await?;

        let name = kind.container_name(Utc::now().timestamp_millis());
        let container_port = format!("{}/tcp", kind.default_port());

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            container_port.clone(),
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(host_port.to_string()),
            }]),
        );

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(container_port, HashMap::new());

        let config = Config {
            image: Some(image.to_string()),
            env: Some(kind.env(password)),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: name.clone(),
            platform: None,
        };

        let created = self.docker.create_container(Some(options), config).await?;
        self.docker.start_container(&created.id).await?;

        info!(
            container = %name,
            id = %created.id,
            host_port = host_port,
            "Launched database container"
        );
        Ok(LaunchedContainer {
            id: created.id,
            name,
        })
    }

    /// Stops then removes the container. A container that is already
    /// stopped is removed as-is.
    pub async fn stop_and_remove(&self, container_id: &str) -> Result<(), ContainerError> {
        let options = StopContainerOptions {
            t: self.stop_timeout_secs,
        };
        match self.docker.stop_container(container_id, Some(options)).await {
            Ok(()) => debug!(container_id = %container_id, "Container stopped"),
            Err(DockerError::DockerResponseServerError {
                status_code: 304, ..
            }) => debug!(container_id = %container_id, "Container already stopped"),
            Err(e) => return Err(e.into()),
        }

        self.docker
            .remove_container(container_id, Some(RemoveContainerOptions::default()))
            .await?;
        info!(container_id = %container_id, "Container removed");
        Ok(())
    }

    /// Every container the engine knows about, running or not.
    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>, ContainerError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        Ok(self.docker.list_containers(Some(options)).await?)
    }
}
