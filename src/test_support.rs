//! Fixtures shared by the unit tests.

use serde_json::{json, Value};
use std::time::Duration;
use url::Url;
use wiremock::MockServer;

use crate::config::Configuration;
use crate::hcloud::transport::Transport;
use crate::utils::polling::Poller;
use crate::HetznerCloudClient;

pub(crate) fn mock_config(server: &MockServer) -> Configuration {
    Configuration::new("test-token").with_base_url(Url::parse(&server.uri()).unwrap())
}

pub(crate) fn mock_transport(server: &MockServer) -> Transport {
    Transport::new(mock_config(server)).unwrap()
}

pub(crate) fn mock_client(server: &MockServer) -> HetznerCloudClient {
    HetznerCloudClient::new(mock_config(server)).unwrap()
}

/// Poller that does not make the test sleep for whole seconds
pub(crate) fn fast_poller(attempts: u32) -> Poller {
    Poller::with_interval(attempts, Duration::from_millis(1))
}

pub(crate) fn action_json(id: u64, status: &str) -> Value {
    json!({
        "id": id,
        "command": "start_server",
        "status": status,
        "progress": if status == "running" { 50 } else { 100 },
        "started": "2016-01-30T23:55:00+00:00",
        "finished": if status == "running" { Value::Null } else { json!("2016-01-30T23:56:00+00:00") },
        "resources": [{"id": 42, "type": "server"}],
        "error": null
    })
}

pub(crate) fn location_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "Falkenstein DC Park 1",
        "country": "DE",
        "city": "Falkenstein",
        "latitude": 50.47612,
        "longitude": 12.370071
    })
}

pub(crate) fn server_json(id: u64, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": status,
        "created": "2016-01-30T23:50:00+00:00",
        "public_net": {
            "ipv4": {"ip": "1.2.3.4", "blocked": false, "dns_ptr": "server01.example.com"},
            "ipv6": {"ip": "2001:db8::/64", "blocked": false, "dns_ptr": []},
            "floating_ips": []
        },
        "server_type": {"id": 1, "name": "cx11"},
        "datacenter": {"id": 2, "name": "fsn1-dc8", "location": location_json(1, "fsn1")},
        "image": {"id": 4711, "type": "system", "name": "ubuntu-16.04"},
        "iso": null,
        "rescue_enabled": false,
        "locked": false,
        "backup_window": null,
        "outgoing_traffic": 123456,
        "ingoing_traffic": 123456,
        "included_traffic": 654321,
        "volumes": []
    })
}

pub(crate) fn volume_json(id: u64, name: &str, server: Option<u64>) -> Value {
    json!({
        "id": id,
        "created": "2016-01-30T23:50:00+00:00",
        "name": name,
        "server": server,
        "location": location_json(1, "fsn1"),
        "size": 10,
        "linux_device": "/dev/disk/by-id/scsi-0HC_Volume_4711",
        "protection": {"delete": false},
        "labels": {},
        "status": "available",
        "format": null
    })
}

pub(crate) fn floating_ip_json(id: u64, description: &str, server: Option<u64>) -> Value {
    json!({
        "id": id,
        "description": description,
        "ip": "131.232.99.1",
        "type": "ipv4",
        "server": server,
        "dns_ptr": [{"ip": "131.232.99.1", "dns_ptr": "server.example.com"}],
        "home_location": location_json(1, "fsn1"),
        "blocked": false
    })
}

pub(crate) fn ssh_key_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "fingerprint": "b7:2f:30:a0:2f:6c:58:6c:21:04:58:61:ba:06:3b:2c",
        "public_key": "ssh-rsa AAAjjk76kgf...Xt"
    })
}

pub(crate) fn image_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "type": "snapshot",
        "status": "available",
        "name": name,
        "description": "Ubuntu 16.04 Standard 64 bit",
        "image_size": 2.3,
        "disk_size": 10,
        "created": "2016-01-30T23:50:00+00:00",
        "created_from": {"id": 1, "name": "Server"},
        "bound_to": null,
        "os_flavor": "ubuntu",
        "os_version": "16.04",
        "rapid_deploy": false
    })
}

pub(crate) fn iso_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "FreeBSD 11.0 x64",
        "type": "public",
        "deprecated": null
    })
}

pub(crate) fn server_type_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "CX11",
        "cores": 1,
        "memory": 1,
        "disk": 25,
        "prices": [],
        "storage_type": "local"
    })
}

pub(crate) fn datacenter_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "Falkenstein 1 DC 8",
        "location": location_json(1, "fsn1"),
        "server_types": {
            "supported": [1, 2, 3],
            "available": [1, 2]
        }
    })
}
