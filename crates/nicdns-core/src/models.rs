//! Service and zone descriptors
//!
//! Both are carried as element attributes in `<data>` of the listing
//! responses and deserialized with `quick_xml::de`. Attribute names are
//! accepted with either `-` or `_` as word separator since the API is not
//! consistent about it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// An account service grouping zones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicService {
    #[serde(rename = "@admin")]
    pub admin: String,
    #[serde(rename = "@domains-limit", alias = "@domains_limit")]
    pub domains_limit: u32,
    #[serde(rename = "@domains-num", alias = "@domains_num")]
    pub domains_num: u32,
    #[serde(rename = "@enable", deserialize_with = "flag")]
    pub enable: bool,
    #[serde(
        rename = "@has-primary",
        alias = "@has_primary",
        deserialize_with = "flag"
    )]
    pub has_primary: bool,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@payer")]
    pub payer: String,
    #[serde(rename = "@tariff")]
    pub tariff: String,
    #[serde(
        rename = "@rr-limit",
        alias = "@rr_limit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rr_limit: Option<u32>,
    #[serde(
        rename = "@rr-num",
        alias = "@rr_num",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rr_num: Option<u32>,
}

/// A DNS zone hosted under a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicZone {
    #[serde(rename = "@admin")]
    pub admin: String,
    #[serde(rename = "@enable", deserialize_with = "flag")]
    pub enable: bool,
    #[serde(
        rename = "@has-changes",
        alias = "@has_changes",
        deserialize_with = "flag"
    )]
    pub has_changes: bool,
    #[serde(
        rename = "@has-primary",
        alias = "@has_primary",
        deserialize_with = "flag"
    )]
    pub has_primary: bool,
    #[serde(rename = "@id")]
    pub id: u64,
    #[serde(rename = "@idn-name", alias = "@idn_name")]
    pub idn_name: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@payer")]
    pub payer: String,
    #[serde(rename = "@service")]
    pub service: String,
}

#[derive(Debug, Deserialize)]
struct ServiceListResponse {
    #[serde(default)]
    data: Option<ServiceList>,
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(rename = "service", default)]
    services: Vec<NicService>,
}

#[derive(Debug, Deserialize)]
struct ZoneListResponse {
    #[serde(default)]
    data: Option<ZoneList>,
}

#[derive(Debug, Deserialize)]
struct ZoneList {
    #[serde(rename = "zone", default)]
    zones: Vec<NicZone>,
}

impl NicService {
    /// Services of a listing response body; a missing `<data>` is an empty list
    pub fn list_from_response(body: &str) -> Result<Vec<Self>> {
        let parsed: ServiceListResponse = from_response(body)?;
        Ok(parsed.data.map(|data| data.services).unwrap_or_default())
    }
}

impl NicZone {
    /// Zones of a listing response body; a missing `<data>` is an empty list
    pub fn list_from_response(body: &str) -> Result<Vec<Self>> {
        let parsed: ZoneListResponse = from_response(body)?;
        Ok(parsed.data.map(|data| data.zones).unwrap_or_default())
    }
}

fn from_response<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T> {
    quick_xml::de::from_str(body)
        .map_err(|e| Error::protocol(format!("Failed to parse response: {e}")))
}

/// `true`/`false` in any case; the API is not consistent about it
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(D::Error::custom(format!("not a boolean: {value:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(data: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" ?>
            <response><status>success</status><data>{data}</data></response>"#
        )
    }

    #[test]
    fn test_services_from_response() {
        let body = response(
            r#"<service admin="123/NIC-REG" domains-limit="12" domains-num="5"
                enable="true" has-primary="false" name="testservice"
                payer="123/NIC-REG" tariff="Secondary L" rr_num="49"/>
               <service admin="123/NIC-REG" domains_limit="1" domains_num="0"
                enable="False" has_primary="TRUE" name="second"
                payer="123/NIC-REG" tariff="Primary" rr-limit="100"/>"#,
        );

        let services = NicService::list_from_response(&body).unwrap();
        assert_eq!(services.len(), 2);

        let service = &services[0];
        assert_eq!(service.admin, "123/NIC-REG");
        assert_eq!(service.domains_limit, 12);
        assert_eq!(service.domains_num, 5);
        assert!(service.enable);
        assert!(!service.has_primary);
        assert_eq!(service.name, "testservice");
        assert_eq!(service.tariff, "Secondary L");
        assert_eq!(service.rr_limit, None);
        assert_eq!(service.rr_num, Some(49));

        assert!(!services[1].enable);
        assert!(services[1].has_primary);
        assert_eq!(services[1].domains_limit, 1);
        assert_eq!(services[1].rr_limit, Some(100));
    }

    #[test]
    fn test_zones_from_response() {
        let body = response(
            r#"<zone admin="123/NIC-REG" enable="TRUE" has-changes="false"
                has-primary="true" id="227642" idn-name="example.ru"
                name="example.ru" payer="123/NIC-REG" service="myservice"/>"#,
        );

        let zones = NicZone::list_from_response(&body).unwrap();
        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.id, 227642);
        assert!(zone.enable);
        assert!(!zone.has_changes);
        assert!(zone.has_primary);
        assert_eq!(zone.idn_name, "example.ru");
        assert_eq!(zone.service, "myservice");
    }

    #[test]
    fn test_missing_data_is_empty_list() {
        let body = "<response><status>success</status></response>";
        assert!(NicService::list_from_response(body).unwrap().is_empty());
        assert!(NicZone::list_from_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_bad_boolean_is_protocol_error() {
        let body = response(
            r#"<zone admin="a" enable="yes" has-changes="false" has-primary="true"
                id="1" idn-name="z" name="z" payer="p" service="s"/>"#,
        );
        match NicZone::list_from_response(&body) {
            Err(Error::Protocol(msg)) => assert!(msg.contains("not a boolean")),
            other => panic!("expected Protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_number_is_protocol_error() {
        let body = response(
            r#"<zone admin="a" enable="true" has-changes="false" has-primary="true"
                id="many" idn-name="z" name="z" payer="p" service="s"/>"#,
        );
        assert!(matches!(
            NicZone::list_from_response(&body),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_missing_attribute_is_protocol_error() {
        let body = response(r#"<service name="x"/>"#);
        match NicService::list_from_response(&body) {
            Err(Error::Protocol(msg)) => assert!(msg.contains("admin")),
            other => panic!("expected Protocol error, got {other:?}"),
        }
    }
}
