use super::{DockerBridge, ImageStream};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerCreateResponse, ContainerSummary, CreateImageInfo};
use futures::StreamExt;
use std::sync::{Arc, Mutex};

/// In-memory engine that records every call it receives.
#[derive(Clone, Default)]
pub(crate) struct RecordingBridge {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    calls: Mutex<Vec<String>>,
    containers: Mutex<Vec<ContainerSummary>>,
    last_config: Mutex<Option<Config<String>>>,
    pull_error: Mutex<Option<String>>,
    start_error: Mutex<Option<(u16, String)>>,
    stop_error: Mutex<Option<(u16, String)>>,
    list_error: Mutex<Option<String>>,
}

fn server_error(status_code: u16, message: &str) -> DockerError {
    DockerError::DockerResponseServerError {
        status_code,
        message: message.to_string(),
    }
}

pub(crate) fn summary(id: &str, name: &str, state: &str) -> ContainerSummary {
    ContainerSummary {
        id: Some(id.to_string()),
        names: Some(vec![format!("/{name}")]),
        state: Some(state.to_string()),
        status: Some(format!("{state} (test)")),
        ..Default::default()
    }
}

impl RecordingBridge {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub(crate) fn last_config(&self) -> Option<Config<String>> {
        self.inner.last_config.lock().unwrap().clone()
    }

    pub(crate) fn set_containers(&self, containers: Vec<ContainerSummary>) {
        *self.inner.containers.lock().unwrap() = containers;
    }

    pub(crate) fn fail_pull(&self, message: &str) {
        *self.inner.pull_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn fail_start(&self, status_code: u16, message: &str) {
        *self.inner.start_error.lock().unwrap() = Some((status_code, message.to_string()));
    }

    pub(crate) fn fail_stop(&self, status_code: u16, message: &str) {
        *self.inner.stop_error.lock().unwrap() = Some((status_code, message.to_string()));
    }

    pub(crate) fn fail_list(&self, message: &str) {
        *self.inner.list_error.lock().unwrap() = Some(message.to_string());
    }

    fn record(&self, call: String) {
        self.inner.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DockerBridge for RecordingBridge {
    async fn ping(&self) -> Result<(), DockerError> {
        Ok(())
    }

    fn create_image_stream(&self, options: Option<CreateImageOptions<String>>) -> ImageStream {
        let image = options.map(|o| o.from_image).unwrap_or_default();
        self.record(format!("pull {image}"));

        let progress = Ok(CreateImageInfo {
            status: Some("Pulling from library".to_string()),
            ..Default::default()
        });
        match self.inner.pull_error.lock().unwrap().clone() {
            Some(message) => {
                futures::stream::iter(vec![progress, Err(server_error(404, &message))]).boxed()
            }
            None => futures::stream::iter(vec![progress]).boxed(),
        }
    }

    async fn create_container(
        &self,
        options: Option<CreateContainerOptions<String>>,
        config: Config<String>,
    ) -> Result<ContainerCreateResponse, DockerError> {
        let name = options.map(|o| o.name).unwrap_or_default();
        self.record(format!("create {name}"));
        *self.inner.last_config.lock().unwrap() = Some(config);
        let created = self
            .calls()
            .iter()
            .filter(|c| c.starts_with("create "))
            .count();
        Ok(ContainerCreateResponse {
            id: format!("created-{}", created - 1),
            warnings: Vec::new(),
        })
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.record(format!("start {id}"));
        match self.inner.start_error.lock().unwrap().clone() {
            Some((status, message)) => Err(server_error(status, &message)),
            None => Ok(()),
        }
    }

    async fn stop_container(
        &self,
        id: &str,
        options: Option<StopContainerOptions>,
    ) -> Result<(), DockerError> {
        let timeout = options.map(|o| o.t).unwrap_or_default();
        self.record(format!("stop {id} t={timeout}"));
        match self.inner.stop_error.lock().unwrap().clone() {
            Some((status, message)) => Err(server_error(status, &message)),
            None => Ok(()),
        }
    }

    async fn remove_container(
        &self,
        id: &str,
        _options: Option<RemoveContainerOptions>,
    ) -> Result<(), DockerError> {
        self.record(format!("remove {id}"));
        Ok(())
    }

    async fn list_containers(
        &self,
        options: Option<ListContainersOptions<String>>,
    ) -> Result<Vec<ContainerSummary>, DockerError> {
        let all = options.map(|o| o.all).unwrap_or_default();
        self.record(format!("list all={all}"));
        if let Some(message) = self.inner.list_error.lock().unwrap().clone() {
            return Err(server_error(500, &message));
        }
        Ok(self.inner.containers.lock().unwrap().clone())
    }
}
