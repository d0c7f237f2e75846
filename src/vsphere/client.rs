use crate::config::VsphereEnv;
use crate::prelude::{Error, Result, Vsphere, VsphereError};
use crate::vsphere::types::*;
use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::OnceCell;

const SESSION_HEADER: HeaderName = HeaderName::from_static("vmware-api-session-id");

/// Concrete implementation of the `Vsphere` trait using `reqwest` crate.
///
/// Name lookups go through the vCenter REST API (`/api`), property reads,
/// reconfiguration and task polling through the VI/JSON API
/// (`/sdk/vim25/{release}`). Both accept the same session token.
///
pub struct VsphereClient {
    client: OnceCell<Client>,
    content: OnceCell<ServiceContent>,
    url: String,
    username: String,
    password: SecretString,
    release: String,
    accept_invalid_certs: bool,
}

impl VsphereClient {
    /// Creates a new instance of the vSphere client. No request is made until
    /// the first operation.
    ///
    pub fn new(settings: &VsphereEnv) -> Result<Self> {
        Ok(Self {
            client: OnceCell::new(),
            content: OnceCell::new(),
            url: settings.url.trim_end_matches('/').to_owned(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            release: settings.api_release.clone(),
            accept_invalid_certs: settings.accept_invalid_certs,
        })
    }

    fn builder(&self) -> reqwest::ClientBuilder {
        Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs)
    }

    /// Lazily logs in and returns a `reqwest::Client` carrying the session
    /// token as a default header.
    ///
    async fn get_client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let login = self.builder().build()?;
                let response = login
                    .post(format!("{}/api/session", self.url))
                    .basic_auth(&self.username, Some(self.password.expose_secret()))
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await?;
                    return Err(Error::Vsphere(VsphereError::Login, status, text));
                }
                let token = response.json::<String>().await?;
                tracing::debug!(target: "vsphere", url = %self.url, user = %self.username, "Session created");

                let mut session_header = HeaderValue::from_str(&token)?;
                session_header.set_sensitive(true);

                let mut headers = HeaderMap::new();
                headers.insert(SESSION_HEADER, session_header);

                self.builder()
                    .default_headers(headers)
                    .build()
                    .map_err(Error::from)
            })
            .await
    }

    /// Generic helper method to perform a request to the vSphere API.
    ///
    /// # Types
    ///
    /// * `B`: Type of the JSON request body.
    /// * `D`: Type of the response data. Methods that answer with an empty
    ///   body decode as JSON `null`, so `Option<_>` works for them.
    ///
    /// # Arguments
    ///
    /// * `method`: HTTP method to use for the request.
    /// * `path`: API endpoint path, including the query string if any.
    /// * `body`: Optional request body.
    /// * `error_var`: Specific error to use if the API call fails.
    ///
    async fn make_request<B, D>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
        error_var: VsphereError,
    ) -> Result<D>
    where
        B: Serialize,
        D: DeserializeOwned,
    {
        let client = self.get_client().await?;
        let url = format!("{}{}", self.url, path);
        tracing::trace!(target: "vsphere", %method, %url, "Request");

        let mut request = client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        match response.status() {
            status if status.is_success() => {
                let bytes = response.bytes().await?;
                if bytes.is_empty() {
                    Ok(serde_json::from_value(Value::Null)?)
                } else {
                    Ok(serde_json::from_slice(&bytes)?)
                }
            }
            status => {
                let text = response.text().await?;
                Err(Error::Vsphere(error_var, status, text))
            }
        }
    }

    /// Path of a VI/JSON method or property on a managed object.
    ///
    fn vi(&self, kind: &str, moid: &Moid, member: &str) -> String {
        format!(
            "/sdk/vim25/{}/{}/{}/{}",
            self.release,
            kind,
            moid.encoded(),
            member
        )
    }

    async fn service_content(&self) -> Result<&ServiceContent> {
        self.content
            .get_or_try_init(|| async {
                let path = self.vi("ServiceInstance", &Moid::from("ServiceInstance"), "content");
                self.make_request(Method::GET, &path, None::<()>, VsphereError::Inventory)
                    .await
            })
            .await
    }

    /// Retrieves `paths` of every object of type `kind` below the root folder
    /// with one property collector query over a container view.
    ///
    async fn retrieve_all(&self, kind: &str, paths: &[&str]) -> Result<Vec<ObjectContent>> {
        let content = self.service_content().await?;

        let path = self.vi(
            "ViewManager",
            &content.view_manager.value,
            "CreateContainerView",
        );
        let body = json!({
            "container": content.root_folder,
            "type": [kind],
            "recursive": true,
        });
        let view: ManagedObjectReference = self
            .make_request(Method::POST, &path, Some(body), VsphereError::Inventory)
            .await?;

        let result = self
            .collect_view(&content.property_collector.value, &view, kind, paths)
            .await;

        let path = self.vi("ContainerView", &view.value, "DestroyView");
        if let Err(error) = self
            .make_request::<(), Option<Value>>(Method::POST, &path, None, VsphereError::Inventory)
            .await
        {
            tracing::warn!(target: "vsphere", ?error, view = %view.value, "Failed to destroy container view");
        }

        result
    }

    async fn collect_view(
        &self,
        collector: &Moid,
        view: &ManagedObjectReference,
        kind: &str,
        paths: &[&str],
    ) -> Result<Vec<ObjectContent>> {
        let spec = json!({
            "specSet": [{
                "_typeName": "PropertyFilterSpec",
                "propSet": [{
                    "_typeName": "PropertySpec",
                    "type": kind,
                    "pathSet": paths,
                }],
                "objectSet": [{
                    "_typeName": "ObjectSpec",
                    "obj": view,
                    "skip": true,
                    "selectSet": [{
                        "_typeName": "TraversalSpec",
                        "name": "traverseView",
                        "type": "ContainerView",
                        "path": "view",
                        "skip": false,
                    }],
                }],
            }],
            "options": { "_typeName": "RetrieveOptions" },
        });

        let path = self.vi("PropertyCollector", collector, "RetrievePropertiesEx");
        let mut page: Option<RetrieveResult> = self
            .make_request(Method::POST, &path, Some(spec), VsphereError::Properties)
            .await?;

        let mut objects = Vec::new();
        while let Some(result) = page.take() {
            objects.extend(result.objects);
            if let Some(token) = result.token {
                let path = self.vi("PropertyCollector", collector, "ContinueRetrievePropertiesEx");
                page = self
                    .make_request(
                        Method::POST,
                        &path,
                        Some(json!({ "token": token })),
                        VsphereError::Properties,
                    )
                    .await?;
            }
        }

        tracing::debug!(target: "vsphere", kind, count = objects.len(), "Inventory retrieved");
        Ok(objects)
    }
}

fn names_query(name: &str) -> String {
    format!("names={}", utf8_percent_encode(name, NON_ALPHANUMERIC))
}

#[async_trait]
impl Vsphere for VsphereClient {
    async fn host_by_name(&self, name: &str) -> Result<HostDescriptor> {
        let path = format!("/api/vcenter/host?{}", names_query(name));
        let hosts: Vec<HostSummary> = self
            .make_request(Method::GET, &path, None::<()>, VsphereError::Inventory)
            .await?;
        let host = hosts
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("host '{name}'")))?;

        let path = self.vi("HostSystem", &host.host, "summary");
        let summary: HostListSummary = self
            .make_request(Method::GET, &path, None::<()>, VsphereError::Properties)
            .await?;

        Ok(HostDescriptor::new(&host.name, summary.build()))
    }

    async fn all_hosts(&self) -> Result<Vec<HostDescriptor>> {
        let objects = self
            .retrieve_all("HostSystem", &["name", "summary.config.product.build"])
            .await?;

        Ok(objects
            .iter()
            .map(|object| {
                let build = object
                    .property("summary.config.product.build")
                    .and_then(Value::as_str)
                    .and_then(|build| build.trim().parse().ok());
                HostDescriptor::new(&object.name(), build)
            })
            .collect())
    }

    async fn vm_latency(&self, name: &str) -> Result<Vec<LatencyRecord>> {
        let path = format!("/api/vcenter/vm?{}", names_query(name));
        let vms: Vec<VmSummary> = self
            .make_request(Method::GET, &path, None::<()>, VsphereError::Inventory)
            .await?;
        if vms.is_empty() {
            return Err(Error::NotFound(format!("VM '{name}'")));
        }

        let mut records = Vec::with_capacity(vms.len());
        for vm in vms {
            let path = self.vi("VirtualMachine", &vm.vm, "config");
            let config: Option<VmConfigInfo> = self
                .make_request(Method::GET, &path, None::<()>, VsphereError::Properties)
                .await?;
            let level = config
                .and_then(|config| config.latency_sensitivity)
                .and_then(|sensitivity| sensitivity.known_level());

            records.push(LatencyRecord {
                vm: vm.vm,
                vm_name: vm.name,
                level,
            });
        }

        Ok(records)
    }

    async fn all_vm_latency(&self) -> Result<Vec<LatencyRecord>> {
        let objects = self
            .retrieve_all("VirtualMachine", &["name", "config.latencySensitivity"])
            .await?;

        Ok(objects
            .iter()
            .map(|object| {
                let level = object
                    .property("config.latencySensitivity")
                    .cloned()
                    .and_then(|value| serde_json::from_value::<LatencySensitivity>(value).ok())
                    .and_then(|sensitivity| sensitivity.known_level());
                LatencyRecord {
                    vm: object.obj.value.clone(),
                    vm_name: object.name(),
                    level,
                }
            })
            .collect())
    }

    async fn reconfigure_latency(&self, vm: &Moid, level: LatencyLevel) -> Result<TaskRef> {
        let path = self.vi("VirtualMachine", vm, "ReconfigVM_Task");
        let body = json!({
            "spec": {
                "_typeName": "VirtualMachineConfigSpec",
                "latencySensitivity": LatencySensitivity::new(level),
            }
        });
        let task: ManagedObjectReference = self
            .make_request(Method::POST, &path, Some(body), VsphereError::Reconfigure)
            .await?;

        Ok(TaskRef::new(task.value))
    }

    async fn task_status(&self, task: &TaskRef) -> Result<TaskStatus> {
        let path = self.vi("Task", &task.task, "info");
        let info: TaskInfo = self
            .make_request(Method::GET, &path, None::<()>, VsphereError::Task)
            .await?;
        Ok(TaskStatus::from(info))
    }
}
