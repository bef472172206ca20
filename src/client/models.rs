//! Vultr API records and request bodies.
//!
//! Field names match the JSON wire names, which are also the names filters
//! refer to.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::filter::{flatten_serializable, Flatten, FlattenedRecord};
use crate::lookup::Page;

/// Listing metadata returned alongside every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    /// Total number of records across all pages.
    pub total: i64,
    /// Cursor links.
    pub links: Links,
}

/// Pagination cursors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    /// Cursor of the next page; empty on the last page.
    pub next: String,
    /// Cursor of the previous page.
    pub prev: String,
}

impl Meta {
    /// Pair this metadata with the records of its page.
    pub fn page<T>(self, items: Vec<T>) -> Page<T> {
        Page::new(items, self.links.next)
    }
}

/// Query options for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Page size.
    pub per_page: Option<u32>,
    /// Cursor taken from a previous page's `links.next`.
    pub cursor: Option<String>,
}

impl ListOptions {
    /// Options for the page following `cursor`.
    pub fn after(cursor: Option<String>) -> Self {
        Self {
            per_page: None,
            cursor,
        }
    }

    /// Set the page size.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(per_page) = self.per_page {
            query.push(("per_page", per_page.to_string()));
        }
        if let Some(cursor) = self.cursor.as_ref().filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor.clone()));
        }
        query
    }
}

/// A block storage volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockStorage {
    /// Volume id.
    pub id: String,
    /// Monthly cost in USD.
    pub cost: f64,
    /// `pending` or `active`.
    pub status: String,
    /// Size in GB.
    pub size_gb: i64,
    /// Region id.
    pub region: String,
    /// Creation time, RFC 3339.
    pub date_created: String,
    /// Instance the volume is attached to; empty when detached.
    pub attached_to_instance: String,
    /// User label.
    pub label: String,
    /// Id used to mount the volume inside the instance.
    pub mount_id: String,
}

/// A private ISO image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Iso {
    /// ISO id.
    pub id: String,
    /// Creation time, RFC 3339.
    pub date_created: String,
    /// File name taken from the download URL.
    pub filename: String,
    /// Size in bytes.
    pub size: i64,
    /// MD5 checksum.
    pub md5sum: String,
    /// SHA-512 checksum.
    pub sha512sum: String,
    /// `pending` while downloading, then `complete`.
    pub status: String,
}

/// A compute instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    /// Instance id.
    pub id: String,
    /// Operating system name.
    pub os: String,
    /// Memory in MB.
    pub ram: i64,
    /// Disk size in GB.
    pub disk: i64,
    /// Primary IPv4 address.
    pub main_ip: String,
    /// Number of vCPUs.
    pub vcpu_count: i64,
    /// Region id.
    pub region: String,
    /// Plan id.
    pub plan: String,
    /// Creation time, RFC 3339.
    pub date_created: String,
    /// Subscription status.
    pub status: String,
    /// Monthly bandwidth allowance in GB.
    pub allowed_bandwidth: i64,
    /// IPv4 netmask.
    pub netmask_v4: String,
    /// IPv4 gateway.
    pub gateway_v4: String,
    /// `running` or `stopped`.
    pub power_status: String,
    /// Server health as reported by Vultr.
    pub server_status: String,
    /// IPv6 network.
    pub v6_network: String,
    /// Primary IPv6 address.
    pub v6_main_ip: String,
    /// IPv6 prefix length.
    pub v6_network_size: i64,
    /// User label.
    pub label: String,
    /// Private network address.
    pub internal_ip: String,
    /// URL of the web console.
    pub kvm: String,
    /// User tag.
    pub tag: String,
    /// Operating system id.
    pub os_id: i64,
    /// Application id.
    pub app_id: i64,
    /// Marketplace image id.
    pub image_id: String,
    /// Firewall group the instance belongs to.
    pub firewall_group_id: String,
    /// Enabled features, such as `ipv6` or `auto_backups`.
    pub features: Vec<String>,
    /// Hostname.
    pub hostname: String,
}

/// A bare-metal server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BareMetalServer {
    /// Server id.
    pub id: String,
    /// Operating system name.
    pub os: String,
    /// Memory description.
    pub ram: String,
    /// Disk description.
    pub disk: String,
    /// Primary IPv4 address.
    pub main_ip: String,
    /// Number of CPUs.
    pub cpu_count: i64,
    /// Region id.
    pub region: String,
    /// Creation time, RFC 3339.
    pub date_created: String,
    /// Subscription status.
    pub status: String,
    /// IPv4 netmask.
    pub netmask_v4: String,
    /// IPv4 gateway.
    pub gateway_v4: String,
    /// Plan id.
    pub plan: String,
    /// IPv6 network.
    pub v6_network: String,
    /// Primary IPv6 address.
    pub v6_main_ip: String,
    /// IPv6 prefix length.
    pub v6_network_size: i64,
    /// User label.
    pub label: String,
    /// User tag.
    pub tag: String,
    /// MAC address as an integer.
    pub mac_address: i64,
    /// Operating system id.
    pub os_id: i64,
    /// Application id.
    pub app_id: i64,
    /// Marketplace image id.
    pub image_id: String,
    /// Enabled features.
    pub features: Vec<String>,
}

/// A DNS domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Domain {
    /// Domain name; also the id.
    pub domain: String,
    /// Creation time, RFC 3339.
    pub date_created: String,
    /// `enabled` or `disabled`.
    pub dns_sec: String,
}

/// An IPv4 address assigned to an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv4 {
    /// Address.
    pub ip: String,
    /// Netmask.
    pub netmask: String,
    /// Gateway.
    pub gateway: String,
    /// `main_ip` or `secondary_ip`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Reverse DNS name.
    pub reverse: String,
}

/// ISO mount state of an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoStatus {
    /// Mounted ISO; empty when none.
    pub iso_id: String,
    /// `ready` when nothing is mounted, `isomounted` otherwise.
    pub state: String,
}

/// Automatic backup schedule of an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSchedule {
    /// Whether automatic backups run.
    pub enabled: bool,
    /// `daily`, `weekly`, `monthly` and so on.
    #[serde(rename = "type")]
    pub kind: String,
    /// Next backup time.
    pub next_scheduled_time_utc: String,
    /// Hour of day, UTC.
    pub hour: i64,
    /// Day of week, for weekly schedules.
    pub dow: i64,
    /// Day of month, for monthly schedules.
    pub dom: i64,
}

/// Attachment of an instance to a private network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateNetworkAttachment {
    /// Private network id.
    pub network_id: String,
    /// MAC address of the attached interface.
    pub mac_address: String,
    /// Address on the private network.
    pub ip_address: String,
}

macro_rules! flatten_via_serde {
    ($($record:ty),+ $(,)?) => {
        $(
            impl Flatten for $record {
                fn flatten(&self) -> Result<FlattenedRecord, ProviderError> {
                    flatten_serializable(self)
                }
            }
        )+
    };
}

flatten_via_serde!(BlockStorage, Iso, Instance, BareMetalServer, Domain, Ipv4);

/// Body of `POST /blocks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateBlockRequest {
    /// Region to create the volume in.
    pub region: String,
    /// Size in GB.
    pub size_gb: i64,
    /// Optional label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Body of `PATCH /blocks/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateBlockRequest {
    /// New size in GB; volumes only grow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<i64>,
    /// New label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Body of `POST /blocks/{id}/attach`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachBlockRequest {
    /// Instance to attach to.
    pub instance_id: String,
    /// Attach without restarting the instance.
    pub live: bool,
}

/// Body of `POST /blocks/{id}/detach`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetachBlockRequest {
    /// Detach without restarting the instance.
    pub live: bool,
}

/// Body of `POST /iso`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIsoRequest {
    /// Where to download the ISO from.
    pub url: String,
}

/// Body of `POST /domains`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDomainRequest {
    /// Domain name.
    pub domain: String,
    /// Address for the default records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// `enabled` or `disabled`.
    pub dns_sec: String,
}

/// Body of `PUT /domains/{domain}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateDomainRequest {
    /// `enabled` or `disabled`.
    pub dns_sec: String,
}
