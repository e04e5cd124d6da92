// # DNS Records
//
// Typed model of the resource records managed through the dns-master API.
//
// ## Variants
//
// The variant set is closed: SOA, NS, A, AAAA, CNAME, MX, TXT, SRV, PTR.
// Every record shares an optional server-assigned id, a name, an
// internationalized name and an optional TTL; the variant data lives in
// [`RecordData`].
//
// ## Writable records
//
// Only A, AAAA, CNAME and TXT records may be submitted for creation. The other
// variants are read-only (server-managed or composed of nested sub-records).
//
// ## Usage
//
// ```rust
// use nicdns_core::records::{DnsRecord, RecordData};
//
// let record = DnsRecord::a("www", "192.0.2.10".parse().unwrap()).with_ttl(3600);
// assert!(record.is_writable());
// assert!(matches!(record.data(), RecordData::A(_)));
// ```

mod codec;

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Server-assigned record identifier
///
/// Identifiers are strictly positive; `0` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(NonZeroU64);

impl RecordId {
    /// Create an identifier, rejecting `0`
    pub fn new(id: u64) -> Result<Self> {
        NonZeroU64::new(id)
            .map(Self)
            .ok_or_else(|| Error::InvalidRecordId(id.to_string()))
    }

    /// Numeric value
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidRecordId(s.to_string()))?;
        Self::new(id)
    }
}

impl TryFrom<u64> for RecordId {
    type Error = Error;

    fn try_from(id: u64) -> Result<Self> {
        Self::new(id)
    }
}

/// Record type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Soa,
    Ns,
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Srv,
    Ptr,
}

impl RecordType {
    /// Every supported type, in the order the API documents them
    pub const ALL: [RecordType; 9] = [
        RecordType::Soa,
        RecordType::Ns,
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Txt,
        RecordType::Srv,
        RecordType::Ptr,
    ];

    /// Wire tag carried in `<type>`
    pub fn tag(self) -> &'static str {
        match self {
            RecordType::Soa => "SOA",
            RecordType::Ns => "NS",
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Ptr => "PTR",
        }
    }

    /// Name of the variant sub-element (`<soa>`, `<a>`, ...)
    pub fn element_name(self) -> &'static str {
        match self {
            RecordType::Soa => "soa",
            RecordType::Ns => "ns",
            RecordType::A => "a",
            RecordType::Aaaa => "aaaa",
            RecordType::Cname => "cname",
            RecordType::Mx => "mx",
            RecordType::Txt => "txt",
            RecordType::Srv => "srv",
            RecordType::Ptr => "ptr",
        }
    }

    /// Look up a wire tag; matching is exact
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.tag() == tag)
    }

    /// Whether records of this type may be submitted for creation
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            RecordType::A | RecordType::Aaaa | RecordType::Cname | RecordType::Txt
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A host name with its internationalized form
///
/// Used for the SOA `mname`/`rname` sub-records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostName {
    pub name: String,
    pub idn_name: String,
}

impl HostName {
    /// Create a host name whose IDN form equals the name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            idn_name: name.clone(),
            name,
        }
    }

    /// Override the IDN form
    pub fn with_idn_name(mut self, idn_name: impl Into<String>) -> Self {
        self.idn_name = idn_name.into();
        self
    }
}

/// SOA record data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
    /// Primary master name server
    pub mname: HostName,
    /// Responsible mailbox
    pub rname: HostName,
}

/// MX record data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mx {
    pub preference: u16,
    pub exchange: String,
}

/// SRV record data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Srv {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

/// Variant-specific record data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    Soa(Soa),
    /// Name server host
    Ns(String),
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    /// Canonical name
    Cname(String),
    Mx(Mx),
    /// Text value
    Txt(String),
    Srv(Srv),
    /// Pointer target
    Ptr(String),
}

impl RecordData {
    /// Type tag of this variant
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::Soa(_) => RecordType::Soa,
            RecordData::Ns(_) => RecordType::Ns,
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::Aaaa,
            RecordData::Cname(_) => RecordType::Cname,
            RecordData::Mx(_) => RecordType::Mx,
            RecordData::Txt(_) => RecordType::Txt,
            RecordData::Srv(_) => RecordType::Srv,
            RecordData::Ptr(_) => RecordType::Ptr,
        }
    }
}

/// A DNS resource record as exchanged with the API
///
/// Records are value objects: the server is authoritative and local copies
/// can be dropped at any time. The identifier, once set, cannot be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    id: Option<RecordId>,
    name: String,
    idn_name: String,
    ttl: Option<u32>,
    data: RecordData,
}

impl DnsRecord {
    /// Create a record without id or TTL; the IDN name defaults to `name`
    pub fn new(name: impl Into<String>, data: RecordData) -> Self {
        let name = name.into();
        Self {
            id: None,
            idn_name: name.clone(),
            name,
            ttl: None,
            data,
        }
    }

    /// Create an A record
    pub fn a(name: impl Into<String>, address: Ipv4Addr) -> Self {
        Self::new(name, RecordData::A(address))
    }

    /// Create an AAAA record
    pub fn aaaa(name: impl Into<String>, address: Ipv6Addr) -> Self {
        Self::new(name, RecordData::Aaaa(address))
    }

    /// Create a CNAME record
    pub fn cname(name: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self::new(name, RecordData::Cname(canonical.into()))
    }

    /// Create a TXT record
    pub fn txt(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, RecordData::Txt(text.into()))
    }

    /// Attach a server-assigned identifier
    ///
    /// Fails for `0` and when the record already carries an identifier.
    pub fn with_id(mut self, id: u64) -> Result<Self> {
        let id = RecordId::new(id)?;
        if let Some(existing) = self.id {
            return Err(Error::invalid_input(format!(
                "record already has id {existing}"
            )));
        }
        self.id = Some(id);
        Ok(self)
    }

    /// Override the internationalized name
    pub fn with_idn_name(mut self, idn_name: impl Into<String>) -> Self {
        self.idn_name = idn_name.into();
        self
    }

    /// Set the time-to-live in seconds
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn idn_name(&self) -> &str {
        &self.idn_name
    }

    pub fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    pub fn data(&self) -> &RecordData {
        &self.data
    }

    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// Whether this record may be submitted for creation
    pub fn is_writable(&self) -> bool {
        self.record_type().is_writable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_id_is_rejected() {
        assert!(matches!(RecordId::new(0), Err(Error::InvalidRecordId(_))));
        assert!(matches!("0".parse::<RecordId>(), Err(Error::InvalidRecordId(_))));

        let result = DnsRecord::txt("@", "v=spf1 -all").with_id(0);
        assert!(matches!(result, Err(Error::InvalidRecordId(_))));
    }

    #[test]
    fn test_id_is_immutable_once_set() {
        let record = DnsRecord::cname("www", "example.ru.").with_id(42).unwrap();
        assert_eq!(record.id().map(RecordId::get), Some(42));
        assert!(record.with_id(43).is_err());
    }

    #[test]
    fn test_idn_name_defaults_to_name() {
        let record = DnsRecord::a("пример", Ipv4Addr::LOCALHOST);
        assert_eq!(record.idn_name(), "пример");

        let record = record.with_idn_name("xn--e1afmkfd");
        assert_eq!(record.name(), "пример");
        assert_eq!(record.idn_name(), "xn--e1afmkfd");
    }

    #[test]
    fn test_type_tags() {
        for ty in RecordType::ALL {
            assert_eq!(RecordType::from_tag(ty.tag()), Some(ty));
            assert_eq!(ty.element_name(), ty.tag().to_lowercase());
        }
        assert_eq!(RecordType::from_tag("UNKNOWN"), None);
        assert_eq!(RecordType::from_tag("a"), None);
    }

    #[test]
    fn test_writable_variants() {
        let writable: Vec<_> = RecordType::ALL
            .into_iter()
            .filter(|ty| ty.is_writable())
            .collect();
        assert_eq!(
            writable,
            vec![RecordType::A, RecordType::Aaaa, RecordType::Cname, RecordType::Txt]
        );
    }
}
