//! XML codec for [`DnsRecord`]
//!
//! Wire layout of a record:
//!
//! ```text
//! <rr id="210074">
//!     <name>@</name>
//!     <idn-name>@</idn-name>
//!     <ttl>3600</ttl>
//!     <type>MX</type>
//!     <mx>
//!         <preference>10</preference>
//!         <exchange><name>mail.example.ru.</name></exchange>
//!     </mx>
//! </rr>
//! ```
//!
//! Encoding and decoding are exact inverses of each other.

use std::str::FromStr;

use super::{DnsRecord, HostName, Mx, RecordData, RecordId, RecordType, Soa, Srv};
use crate::error::{Error, Result};
use crate::xml::Element;

type Decoder = fn(&Element) -> Result<RecordData>;

impl DnsRecord {
    /// Encode as an `<rr>` element
    pub fn to_xml(&self) -> Element {
        let mut rr = Element::new("rr");
        if let Some(id) = self.id {
            rr.set_attribute("id", id.to_string());
        }
        rr.push_child(Element::text_element("name", &self.name));
        rr.push_child(Element::text_element("idn-name", &self.idn_name));
        if let Some(ttl) = self.ttl {
            rr.push_child(Element::text_element("ttl", ttl.to_string()));
        }
        rr.push_child(Element::text_element("type", self.record_type().tag()));
        rr.push_child(encode_data(&self.data));
        rr
    }

    /// Decode any supported record, selecting the variant from `<type>`
    pub fn from_xml(rr: &Element) -> Result<Self> {
        let tag = type_tag(rr)?;
        let record_type = RecordType::from_tag(tag)
            .ok_or_else(|| Error::UnknownRecordType(tag.to_string()))?;
        Self::decode(rr, record_type)
    }

    /// Decode a record that must be of type `expected`
    pub fn decode(rr: &Element, expected: RecordType) -> Result<Self> {
        let tag = type_tag(rr)?;
        if tag != expected.tag() {
            return Err(Error::RecordTypeMismatch {
                expected: expected.tag().to_string(),
                found: tag.to_string(),
            });
        }

        let id = rr.attribute("id").map(RecordId::from_str).transpose()?;
        let name = required_text(rr, "name")?;
        let idn_name = rr.find_text("idn-name").unwrap_or(&name).to_string();
        let ttl = rr
            .find("ttl")
            .map(|_| parse_field::<u32>(rr, "ttl"))
            .transpose()?;
        let data = decoder(expected)(rr)?;

        Ok(Self {
            id,
            name,
            idn_name,
            ttl,
            data,
        })
    }
}

/// Static tag-to-decoder table; the `match` keeps it exhaustive
fn decoder(record_type: RecordType) -> Decoder {
    match record_type {
        RecordType::Soa => decode_soa,
        RecordType::Ns => decode_ns,
        RecordType::A => decode_a,
        RecordType::Aaaa => decode_aaaa,
        RecordType::Cname => decode_cname,
        RecordType::Mx => decode_mx,
        RecordType::Txt => decode_txt,
        RecordType::Srv => decode_srv,
        RecordType::Ptr => decode_ptr,
    }
}

fn decode_ns(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::Ns(required_text(rr, "ns/name")?))
}

fn decode_a(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::A(parse_field(rr, "a")?))
}

fn decode_aaaa(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::Aaaa(parse_field(rr, "aaaa")?))
}

fn decode_cname(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::Cname(required_text(rr, "cname/name")?))
}

fn decode_ptr(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::Ptr(required_text(rr, "ptr/name")?))
}

fn decode_soa(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::Soa(Soa {
        serial: parse_field(rr, "soa/serial")?,
        refresh: parse_field(rr, "soa/refresh")?,
        retry: parse_field(rr, "soa/retry")?,
        expire: parse_field(rr, "soa/expire")?,
        minimum: parse_field(rr, "soa/minimum")?,
        mname: decode_host(rr, "soa/mname")?,
        rname: decode_host(rr, "soa/rname")?,
    }))
}

fn decode_mx(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::Mx(Mx {
        preference: parse_field(rr, "mx/preference")?,
        exchange: required_text(rr, "mx/exchange/name")?,
    }))
}

fn decode_srv(rr: &Element) -> Result<RecordData> {
    Ok(RecordData::Srv(Srv {
        priority: parse_field(rr, "srv/priority")?,
        weight: parse_field(rr, "srv/weight")?,
        port: parse_field(rr, "srv/port")?,
        target: required_text(rr, "srv/target/name")?,
    }))
}

// Several <string> fragments form one value, as DNS character-strings do.
fn decode_txt(rr: &Element) -> Result<RecordData> {
    let fragments = rr.find_all("txt/string");
    if fragments.is_empty() {
        return Err(Error::malformed("missing field txt/string"));
    }
    let text = fragments
        .iter()
        .map(|fragment| fragment.text().unwrap_or(""))
        .collect::<String>();
    Ok(RecordData::Txt(text))
}

fn decode_host(rr: &Element, path: &str) -> Result<HostName> {
    let host = rr
        .find(path)
        .ok_or_else(|| Error::malformed(format!("missing field {path}")))?;
    let name = required_text(host, "name")
        .map_err(|_| Error::malformed(format!("missing field {path}/name")))?;
    let idn_name = host.find_text("idn-name").unwrap_or(&name).to_string();
    Ok(HostName { name, idn_name })
}

fn encode_data(data: &RecordData) -> Element {
    let sub = Element::new(data.record_type().element_name());
    match data {
        RecordData::Soa(soa) => sub
            .with_child(Element::text_element("serial", soa.serial.to_string()))
            .with_child(Element::text_element("refresh", soa.refresh.to_string()))
            .with_child(Element::text_element("retry", soa.retry.to_string()))
            .with_child(Element::text_element("expire", soa.expire.to_string()))
            .with_child(Element::text_element("minimum", soa.minimum.to_string()))
            .with_child(encode_host("mname", &soa.mname))
            .with_child(encode_host("rname", &soa.rname)),
        RecordData::A(address) => sub.with_text(address.to_string()),
        RecordData::Aaaa(address) => sub.with_text(address.to_string()),
        RecordData::Ns(host) | RecordData::Cname(host) | RecordData::Ptr(host) => {
            sub.with_child(Element::text_element("name", host))
        }
        RecordData::Mx(mx) => sub
            .with_child(Element::text_element("preference", mx.preference.to_string()))
            .with_child(Element::new("exchange").with_child(Element::text_element("name", &mx.exchange))),
        RecordData::Txt(text) => sub.with_child(Element::text_element("string", text)),
        RecordData::Srv(srv) => sub
            .with_child(Element::text_element("priority", srv.priority.to_string()))
            .with_child(Element::text_element("weight", srv.weight.to_string()))
            .with_child(Element::text_element("port", srv.port.to_string()))
            .with_child(Element::new("target").with_child(Element::text_element("name", &srv.target))),
    }
}

fn encode_host(element_name: &str, host: &HostName) -> Element {
    Element::new(element_name)
        .with_child(Element::text_element("name", &host.name))
        .with_child(Element::text_element("idn-name", &host.idn_name))
}

fn type_tag(rr: &Element) -> Result<&str> {
    rr.find_text("type")
        .map(str::trim)
        .ok_or_else(|| Error::malformed("missing field type"))
}

fn required_text(el: &Element, path: &str) -> Result<String> {
    el.find_text(path)
        .map(str::to_string)
        .ok_or_else(|| Error::malformed(format!("missing field {path}")))
}

fn parse_field<T: FromStr>(el: &Element, path: &str) -> Result<T> {
    let text = el
        .find_text(path)
        .ok_or_else(|| Error::malformed(format!("missing field {path}")))?;
    text.trim()
        .parse()
        .map_err(|_| Error::malformed(format!("field {path} has an invalid value: {text:?}")))
}
