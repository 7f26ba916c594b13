use serde::Deserialize;

/// Partial nmap XML schema: only the elements the host record needs.
/// Every field is defaulted so a missing element surfaces as an empty value
/// instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub(crate) struct NmapRun {
    #[serde(rename = "host", default)]
    pub hosts: Vec<Host>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Host {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub hostnames: Option<Hostnames>,
    #[serde(default)]
    pub ports: Option<Ports>,
    #[serde(default)]
    pub os: Option<Os>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    #[serde(rename = "@state", default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Address {
    #[serde(rename = "@addr", default)]
    pub addr: String,
    #[serde(rename = "@addrtype", default)]
    pub addr_type: String,
    #[serde(rename = "@vendor", default)]
    pub vendor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hostnames {
    #[serde(rename = "hostname", default)]
    pub names: Vec<Hostname>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hostname {
    #[serde(rename = "@name", default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Os {
    #[serde(rename = "osmatch", default)]
    pub matches: Vec<OsMatch>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsMatch {
    #[serde(rename = "@name", default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ports {
    #[serde(rename = "port", default)]
    pub ports: Vec<Port>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Port {
    #[serde(rename = "@portid", default)]
    pub portid: String,
    #[serde(rename = "@protocol", default)]
    pub protocol: String,
    #[serde(default)]
    pub state: Option<State>,
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(rename = "script", default)]
    pub scripts: Vec<Script>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct State {
    #[serde(rename = "@state", default)]
    pub state: String,
    #[serde(rename = "@reason", default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Service {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@product", default)]
    pub product: String,
    #[serde(rename = "@version", default)]
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Script {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@output", default)]
    pub output: String,
}
